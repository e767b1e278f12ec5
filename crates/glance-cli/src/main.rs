use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use glance_core::provider::read_all;
use glance_core::render::{ImageInfo, TextDocument};
use glance_core::{
    Action, ActionCategory, ActionOutcome, ActionRegistry, Config, Event, EventKind, Frame, Keymap,
    LoadView, LocalProvider, OpenRequest, RendererRegistry, Viewer,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "commands: n(ext) p(rev) r(etry) d(elete) dl (download) s(idebar) q(uit), or a key name";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "glance_core=info,glance_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };
    let keymap = match &args.keymap {
        Some(path) => Keymap::load(path)
            .with_context(|| format!("loading key bindings from {}", path.display()))?,
        None => Keymap::default(),
    };

    let file = args
        .path
        .canonicalize()
        .with_context(|| format!("cannot open {}", args.path.display()))?;
    let root = file.parent().unwrap_or(Path::new("/")).to_path_buf();
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .context("file name is not valid UTF-8")?
        .to_string();

    let provider = Arc::new(LocalProvider::new(&root));
    let keys = key_help(&keymap);
    let mut viewer =
        Viewer::new(provider, RendererRegistry::with_builtin(), config).with_keymap(keymap);
    viewer.on(EventKind::Navigated, |event| {
        if let Event::Navigated { from, to, .. } = event {
            tracing::debug!(%from, %to, "navigated");
        }
    });
    viewer.on(EventKind::Error, |event| {
        if let Event::Error(err) = event {
            tracing::error!("viewer failed to open: {err}");
        }
    });

    tracing::info!(root = %root.display(), %name, "opening viewer");
    viewer.open(OpenRequest::path(format!("/{name}"))).await?;
    println!("{HELP}\n{keys}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let Some(session) = viewer.session_mut() else {
            println!("viewer closed");
            break;
        };
        session.settle().await;
        session.drain();
        if let Some(frame) = session.frame() {
            println!("{}", render_frame(&frame));
        }

        let Some(line) = lines.next_line().await? else {
            viewer.close();
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let result = match parse_command(line) {
            Some(action) => viewer.dispatch(action).await,
            None => match viewer.handle_key(line).await {
                Some(result) => result,
                None => {
                    println!("{HELP}");
                    continue;
                }
            },
        };
        match result {
            Ok(ActionOutcome::Downloaded(download)) => {
                let bytes = read_all(download.stream).await?;
                println!("downloaded {} ({} bytes)", download.entry.basename(), bytes.len());
            }
            Ok(ActionOutcome::Navigated(None)) => println!("no more files in that direction"),
            Ok(ActionOutcome::Deleted(id)) => println!("deleted {id}"),
            Ok(_) => {}
            Err(err) => println!("! {err}"),
        }
    }

    Ok(())
}

/// Browse the files next to <PATH> in a line-driven viewer.
#[derive(Parser, Debug)]
#[command(name = "glance")]
#[command(version, about, long_about = None)]
struct Args {
    /// File to open; its directory becomes the view list
    path: PathBuf,

    /// Viewer settings (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Key bindings (TOML `[bindings]` table)
    #[arg(short, long, value_name = "FILE")]
    keymap: Option<PathBuf>,
}

fn parse_command(line: &str) -> Option<Action> {
    match line {
        "n" => Some(Action::Next),
        "p" => Some(Action::Previous),
        "r" => Some(Action::Retry),
        "d" => Some(Action::Delete),
        "dl" => Some(Action::Download),
        "s" => Some(Action::ToggleSidebar),
        "q" => Some(Action::Close),
        _ => None,
    }
}

/// Bound keys per action, grouped by category.
fn key_help(keymap: &Keymap) -> String {
    let registry = ActionRegistry::new();
    let mut lines = Vec::new();
    for category in [ActionCategory::Navigation, ActionCategory::File, ActionCategory::View] {
        let bound: Vec<String> = registry
            .all()
            .iter()
            .filter(|descriptor| descriptor.category == category)
            .filter_map(|descriptor| {
                let keys = keymap.keys_for_action(descriptor.action)?;
                Some(format!("{} [{}]", descriptor.id, keys.join(", ")))
            })
            .collect();
        if !bound.is_empty() {
            lines.push(format!("{}: {}", category.label(), bound.join("  ")));
        }
    }
    lines.join("\n")
}

fn render_frame(frame: &Frame) -> String {
    let body = match &frame.load {
        LoadView::Loading => "loading...".to_string(),
        LoadView::Loaded(handle) => {
            if let Some(info) = handle.content::<ImageInfo>() {
                format!("{}x{} {} {}", info.width, info.height, info.format, info.color_type)
            } else if let Some(doc) = handle.content::<TextDocument>() {
                format!("{} lines", doc.line_count)
            } else {
                format!("shown by {}", handle.renderer())
            }
        }
        LoadView::Error { message } | LoadView::Unsupported { message } => message.clone(),
    };
    let prev = if frame.has_prev { "<" } else { " " };
    let next = if frame.has_next { ">" } else { " " };
    let menu: Vec<&str> = frame.menu.iter().map(|item| item.label.as_str()).collect();
    let mut out = format!(
        "{prev} [{}] {} {next}  {body}  [{}]",
        frame.position(),
        frame.title,
        menu.join(", ")
    );
    if frame.flags.sidebar_open {
        out.push_str(&format!("\n  path: {}  mime: {}", frame.entry.path(), frame.entry.mime()));
    }
    if let Some(notice) = &frame.notice {
        out.push_str(&format!("\n  ! {}", notice.message));
    }
    out
}
