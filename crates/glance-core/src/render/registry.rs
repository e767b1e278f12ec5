//! Mime-pattern -> renderer lookup.

use std::fmt;
use std::sync::Arc;

use crate::render::builtin::{ImageRenderer, TextRenderer};
use crate::render::Renderer;

/// Which mime types a renderer accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MimePattern {
    /// A single type, e.g. `image/png`.
    Exact(String),
    /// A whole family, e.g. `image/*` is stored as `Family("image")`.
    Family(String),
    /// `*`: everything.
    Any,
}

impl MimePattern {
    pub fn parse(pattern: &str) -> Self {
        let pattern = pattern.trim().to_ascii_lowercase();
        if pattern == "*" || pattern == "*/*" {
            return Self::Any;
        }
        match pattern.strip_suffix("/*") {
            Some(family) => Self::Family(family.to_string()),
            None => Self::Exact(pattern),
        }
    }

    pub fn matches(&self, mime: &str) -> bool {
        let mime = mime.to_ascii_lowercase();
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match self {
            Self::Exact(exact) => essence == exact,
            Self::Family(family) => essence
                .split_once('/')
                .is_some_and(|(top, _)| top == family),
            Self::Any => true,
        }
    }
}

impl fmt::Display for MimePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(exact) => write!(f, "{exact}"),
            Self::Family(family) => write!(f, "{family}/*"),
            Self::Any => write!(f, "*"),
        }
    }
}

struct Registration {
    pattern: MimePattern,
    priority: i32,
    renderer: Arc<dyn Renderer>,
}

/// Ordered renderer registrations.
///
/// Lookup returns the highest-priority match; equal priorities resolve to
/// the earliest registration.
#[derive(Default)]
pub struct RendererRegistry {
    registrations: Vec<Registration>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in image and text renderers.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("image/*", Arc::new(ImageRenderer));
        registry.register("text/*", Arc::new(TextRenderer::new()));
        registry
    }

    /// Registers `renderer` for `pattern` at priority 0.
    pub fn register(&mut self, pattern: &str, renderer: Arc<dyn Renderer>) {
        self.register_with_priority(pattern, 0, renderer);
    }

    pub fn register_with_priority(
        &mut self,
        pattern: &str,
        priority: i32,
        renderer: Arc<dyn Renderer>,
    ) {
        let pattern = MimePattern::parse(pattern);
        tracing::debug!(%pattern, priority, renderer = renderer.name(), "registered renderer");
        self.registrations.push(Registration {
            pattern,
            priority,
            renderer,
        });
        // stable: ties keep registration order
        self.registrations
            .sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    /// The renderer for `mime`, or `None` when nothing can display it.
    pub fn find(&self, mime: &str) -> Option<Arc<dyn Renderer>> {
        self.registrations
            .iter()
            .find(|r| r.pattern.matches(mime))
            .map(|r| Arc::clone(&r.renderer))
    }

    pub fn supports(&self, mime: &str) -> bool {
        self.registrations.iter().any(|r| r.pattern.matches(mime))
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.registrations
                    .iter()
                    .map(|r| (r.pattern.to_string(), r.priority, r.renderer.name().to_string())),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use crate::model::FileEntry;
    use crate::provider::FileProvider;
    use crate::render::RenderHandle;
    use async_trait::async_trait;

    struct Named(&'static str);

    #[async_trait]
    impl Renderer for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn mount(
            &self,
            entry: &FileEntry,
            _provider: &dyn FileProvider,
        ) -> Result<RenderHandle, LoadError> {
            Ok(RenderHandle::new(self.0, entry.clone(), ()))
        }
    }

    #[test]
    fn pattern_parse_variants() {
        assert_eq!(MimePattern::parse("image/png"), MimePattern::Exact("image/png".into()));
        assert_eq!(MimePattern::parse("video/*"), MimePattern::Family("video".into()));
        assert_eq!(MimePattern::parse("*"), MimePattern::Any);
        assert_eq!(MimePattern::parse("*/*"), MimePattern::Any);
    }

    #[test]
    fn pattern_matching_ignores_case_and_parameters() {
        assert!(MimePattern::parse("text/plain").matches("Text/Plain; charset=utf-8"));
        assert!(MimePattern::parse("image/*").matches("image/jpeg"));
        assert!(!MimePattern::parse("image/*").matches("imagex/jpeg"));
        assert!(!MimePattern::parse("image/png").matches("image/jpeg"));
    }

    #[test]
    fn first_registration_wins_on_equal_priority() {
        let mut registry = RendererRegistry::new();
        registry.register("image/*", Arc::new(Named("first")));
        registry.register("image/*", Arc::new(Named("second")));
        assert_eq!(registry.find("image/png").unwrap().name(), "first");
    }

    #[test]
    fn higher_priority_wins() {
        let mut registry = RendererRegistry::new();
        registry.register("*", Arc::new(Named("fallback")));
        registry.register("image/*", Arc::new(Named("images")));
        registry.register_with_priority("image/gif", 10, Arc::new(Named("gif")));

        assert_eq!(registry.find("image/gif").unwrap().name(), "gif");
        // equal priority: catch-all was registered first
        assert_eq!(registry.find("image/png").unwrap().name(), "fallback");
    }

    #[test]
    fn unsupported_mime_finds_nothing() {
        let registry = RendererRegistry::with_builtin();
        assert!(registry.find("application/zip").is_none());
        assert!(!registry.supports("application/zip"));
        assert!(registry.supports("image/webp"));
        assert!(registry.supports("text/markdown"));
        assert_eq!(registry.len(), 2);
    }
}
