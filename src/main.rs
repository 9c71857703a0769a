#![forbid(unsafe_code)]

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{error, info, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

use image_resize_overlay::config::{default_options_path, load_options_file};
use image_resize_overlay::constants::{extension, handles, keys, tags};
use image_resize_overlay::dom::{Document, ElementId, Event};
use image_resize_overlay::geometry::{Rect, Size};
use image_resize_overlay::{register, Alignment, Editor, EditorHost, ExtensionRegistry, MemoryEditor};

/// Scripted image resize session against an in-memory editor
#[derive(Parser, Debug)]
#[command(name = "image-resize-overlay", version)]
struct Args {
    /// Options file (JSON); defaults to the user config dir when present
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// trace, debug, info, warn or error; falls back to LOG_LEVEL
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Intrinsic size of the demo image
    #[arg(long, default_value = "800x600", value_name = "WxH", value_parser = parse_size)]
    natural: Size,

    /// Drag the bottom-right handle horizontally by this many pixels
    #[arg(long, value_name = "DX", allow_negative_numbers = true)]
    drag: Option<f64>,

    /// Click an alignment button
    #[arg(long, value_enum)]
    align: Option<AlignArg>,

    /// Press Delete at the end of the session
    #[arg(long)]
    delete: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AlignArg {
    Left,
    Center,
    Right,
}

impl From<AlignArg> for Alignment {
    fn from(value: AlignArg) -> Self {
        match value {
            AlignArg::Left => Alignment::Left,
            AlignArg::Center => Alignment::Center,
            AlignArg::Right => Alignment::Right,
        }
    }
}

fn parse_size(value: &str) -> Result<Size, String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{value}'"))?;
    let width: f64 = width.trim().parse().map_err(|e| format!("bad width: {e}"))?;
    let height: f64 = height.trim().parse().map_err(|e| format!("bad height: {e}"))?;
    if width <= 0.0 || height <= 0.0 {
        return Err(format!("size must be positive, got '{value}'"));
    }
    Ok(Size::new(width, height))
}

fn log_level(flag: Option<&str>) -> TraceLevel {
    let level = flag
        .map(str::to_string)
        .unwrap_or_else(|| std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()));
    match level.to_lowercase().as_str() {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    }
}

fn load_options(path: Option<PathBuf>) -> Result<Value> {
    if let Some(path) = path {
        return load_options_file(&path);
    }
    let path = default_options_path();
    if path.exists() {
        info!(path = %path.display(), "using options file");
        load_options_file(&path)
    } else {
        Ok(Value::Null)
    }
}

/// The overlay is inserted right after the editor root
fn overlay_of(editor: &MemoryEditor) -> Option<ElementId> {
    let dom = editor.document();
    let siblings = dom.children(editor.container());
    let position = siblings.iter().position(|&id| id == editor.root())?;
    siblings.get(position + 1).copied()
}

fn descendants(dom: &Document, element: ElementId) -> Vec<ElementId> {
    let mut found = Vec::new();
    let mut stack = vec![element];
    while let Some(id) = stack.pop() {
        for &child in dom.children(id).iter().rev() {
            found.push(child);
            stack.push(child);
        }
    }
    found
}

fn report(step: &str, editor: &MemoryEditor) {
    let Some(overlay) = overlay_of(editor) else {
        info!(step, "no overlay");
        return;
    };
    let dom = editor.document();
    let style = |property: &str| dom.style(overlay, property).unwrap_or("-");
    let readout = descendants(dom, overlay)
        .into_iter()
        .find_map(|id| dom.text(id))
        .unwrap_or("-");
    info!(
        step,
        left = style("left"),
        top = style("top"),
        width = style("width"),
        height = style("height"),
        readout,
        "overlay"
    );
}

fn drag_handle(host: &mut EditorHost<MemoryEditor>, dx: f64) -> Result<()> {
    let Some(overlay) = overlay_of(&host.editor) else {
        bail!("No overlay to drag");
    };
    let dom = host.editor.document();
    let handle = dom
        .children(overlay)
        .iter()
        .copied()
        .filter(|&id| {
            dom.style(id, "cursor")
                .is_some_and(|cursor| handles::CURSORS.contains(&cursor))
        })
        .nth(2)
        .context("Resize module is not active")?;
    let html = dom.document_element();

    host.dispatch(&Event::mouse_down(handle, 0.0, 0.0))?;
    host.dispatch(&Event::mouse_move(html, dx, 0.0))?;
    host.dispatch(&Event::mouse_up(html, dx, 0.0))
}

fn click_alignment(host: &mut EditorHost<MemoryEditor>, alignment: Alignment) -> Result<()> {
    let Some(overlay) = overlay_of(&host.editor) else {
        bail!("No overlay to align");
    };
    let dom = host.editor.document();
    let icon = descendants(dom, overlay)
        .into_iter()
        .find(|&id| dom.has_tag(id, tags::SVG) && dom.attribute(id, "data-icon") == Some(alignment.icon()))
        .context("Toolbar module is not active")?;
    host.dispatch(&Event::click(icon))
}

fn run(args: Args) -> Result<()> {
    let options = load_options(args.config)?;

    let mut editor = MemoryEditor::new(Rect::new(0.0, 0.0, 1024.0, 768.0));
    editor.insert_paragraph("Resizable image demo", Rect::new(0.0, 0.0, 1024.0, 24.0));
    let image = editor.insert_image(args.natural, (16.0, 40.0));

    let mut extensions = ExtensionRegistry::default();
    register(&mut extensions);
    let mut host = EditorHost::new(editor);
    host.load(&extensions, extension::KEY, &options)?;

    host.dispatch(&Event::click(image))?;
    report("select", &host.editor);

    if let Some(dx) = args.drag {
        drag_handle(&mut host, dx)?;
        report("drag", &host.editor);
    }
    if let Some(align) = args.align {
        click_alignment(&mut host, align.into())?;
        report("align", &host.editor);
    }
    if args.delete {
        let root = host.editor.root();
        host.dispatch(&Event::key_up(root, keys::DELETE))?;
        info!(deleted = host.editor.deleted().len(), "delete");
        report("delete", &host.editor);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(args.log_level.as_deref()))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    run(args).inspect_err(|e| error!("image resize session failed: {e:#}"))?;
    Ok(())
}
