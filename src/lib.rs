//! Click-to-select image resizing for rich text editors
//!
//! Clicking an image inside the editor root wraps it in an overlay carrying
//! capability modules: a size readout, an alignment toolbar and corner drag
//! handles. The editor is reached only through the `Editor` trait; the
//! bundled `MemoryEditor` runs everything against a headless document.

#![forbid(unsafe_code)]

pub mod config;
pub mod constants;
pub mod dom;
pub mod geometry;
pub mod host;
pub mod modules;
pub mod overlay;
pub mod registry;
pub mod selection;

pub use config::Options;
pub use host::{Editor, EditorHost, Extension, ExtensionRegistry, MemoryEditor};
pub use modules::{Alignment, CapabilityModule, ModuleBase, ModuleContext};
pub use registry::{ModuleRegistry, ModuleSpec};
pub use selection::{register, ImageResize};
