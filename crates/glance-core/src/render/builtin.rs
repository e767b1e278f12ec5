//! Built-in renderers for images and plain text.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use image::GenericImageView;

use crate::error::LoadError;
use crate::model::{FileEntry, FileId};
use crate::provider::{read_all, FileProvider};
use crate::render::{RenderHandle, Renderer};

/// The number of bytes to inspect for binary (null-byte) detection.
const BINARY_CHECK_SIZE: usize = 8192;

/// Decoded image metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub color_type: String,
    pub file_size: u64,
}

/// Decodes images with the `image` crate.
#[derive(Debug, Default)]
pub struct ImageRenderer;

#[async_trait]
impl Renderer for ImageRenderer {
    fn name(&self) -> &str {
        "image"
    }

    async fn mount(
        &self,
        entry: &FileEntry,
        provider: &dyn FileProvider,
    ) -> Result<RenderHandle, LoadError> {
        let bytes = read_all(provider.download(entry.id()).await?).await?;
        let info = decode_image(&bytes)?;
        Ok(RenderHandle::new(self.name(), entry.clone(), info))
    }
}

fn decode_image(bytes: &[u8]) -> Result<ImageInfo, LoadError> {
    let format = image::guess_format(bytes)
        .map(|f| format!("{f:?}"))
        .unwrap_or_else(|_| "Unknown".to_string());
    let img = image::load_from_memory(bytes).map_err(|e| LoadError::Decode(e.to_string()))?;
    let (width, height) = img.dimensions();
    Ok(ImageInfo {
        width,
        height,
        format,
        color_type: format!("{:?}", img.color()),
        file_size: bytes.len() as u64,
    })
}

/// A decoded text file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    pub text: String,
    pub line_count: usize,
}

/// Shows and edits plain text.
///
/// Edits are kept per entry until saved or the entry is unmounted.
#[derive(Debug, Default)]
pub struct TextRenderer {
    edits: Mutex<HashMap<FileId, String>>,
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records edited text for `id`; it becomes the entry's pending changes.
    pub fn edit(&self, id: FileId, text: impl Into<String>) {
        let text = text.into();
        self.with_edits(|edits| {
            edits.insert(id, text);
        });
    }

    fn with_edits<R>(&self, f: impl FnOnce(&mut HashMap<FileId, String>) -> R) -> R {
        match self.edits.lock() {
            Ok(mut edits) => f(&mut edits),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

fn is_binary(bytes: &[u8]) -> bool {
    bytes[..bytes.len().min(BINARY_CHECK_SIZE)].contains(&0)
}

#[async_trait]
impl Renderer for TextRenderer {
    fn name(&self) -> &str {
        "text"
    }

    fn editable(&self) -> bool {
        true
    }

    async fn mount(
        &self,
        entry: &FileEntry,
        provider: &dyn FileProvider,
    ) -> Result<RenderHandle, LoadError> {
        let bytes = read_all(provider.download(entry.id()).await?).await?;
        if is_binary(&bytes) {
            return Err(LoadError::Decode(
                "binary file cannot be shown as text".to_string(),
            ));
        }
        let text = String::from_utf8(bytes).map_err(|e| LoadError::Decode(e.to_string()))?;
        let line_count = text.lines().count();
        Ok(RenderHandle::new(
            self.name(),
            entry.clone(),
            TextDocument { text, line_count },
        ))
    }

    fn unmount(&self, id: FileId) {
        self.with_edits(|edits| {
            edits.remove(&id);
        });
    }

    fn pending_changes(&self, entry: &FileEntry) -> Option<Vec<u8>> {
        self.with_edits(|edits| edits.get(&entry.id()).map(|text| text.clone().into_bytes()))
    }

    fn clear_pending_changes(&self, id: FileId) {
        self.unmount(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Permissions;
    use crate::test_support::MemoryProvider;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn entry(id: u64, path: &str, mime: &str) -> FileEntry {
        FileEntry::new(FileId(id), path, mime, Permissions::parse("RWD"))
    }

    #[tokio::test]
    async fn image_renderer_reads_dimensions() {
        let e = entry(1, "/image.png", "image/png");
        let provider = MemoryProvider::new(vec![(e.clone(), png_bytes(4, 3))]);
        let handle = ImageRenderer.mount(&e, &provider).await.unwrap();
        let info = handle.content::<ImageInfo>().unwrap();
        assert_eq!((info.width, info.height), (4, 3));
        assert_eq!(info.format, "Png");
        assert_eq!(handle.renderer(), "image");
    }

    #[tokio::test]
    async fn image_renderer_rejects_garbage() {
        let e = entry(1, "/broken.png", "image/png");
        let provider = MemoryProvider::new(vec![(e.clone(), b"not an image".to_vec())]);
        let err = ImageRenderer.mount(&e, &provider).await.unwrap_err();
        assert!(matches!(err, LoadError::Decode(_)));
    }

    #[tokio::test]
    async fn text_renderer_counts_lines() {
        let e = entry(2, "/notes.txt", "text/plain");
        let provider = MemoryProvider::new(vec![(e.clone(), b"one\ntwo\nthree".to_vec())]);
        let handle = TextRenderer::new().mount(&e, &provider).await.unwrap();
        let doc = handle.content::<TextDocument>().unwrap();
        assert_eq!(doc.line_count, 3);
        assert!(handle.content::<ImageInfo>().is_none());
    }

    #[tokio::test]
    async fn text_renderer_rejects_binary() {
        let e = entry(2, "/blob.txt", "text/plain");
        let provider = MemoryProvider::new(vec![(e.clone(), vec![b'a', 0, b'b'])]);
        let err = TextRenderer::new().mount(&e, &provider).await.unwrap_err();
        assert!(matches!(err, LoadError::Decode(_)));
    }

    #[test]
    fn text_edits_become_pending_changes() {
        let renderer = TextRenderer::new();
        let e = entry(3, "/a.txt", "text/plain");
        assert!(renderer.pending_changes(&e).is_none());

        renderer.edit(e.id(), "draft");
        assert_eq!(renderer.pending_changes(&e).unwrap(), b"draft");

        renderer.clear_pending_changes(e.id());
        assert!(renderer.pending_changes(&e).is_none());
    }
}
