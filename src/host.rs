//! Host editor interface and extension registration
//!
//! The editor owns the document and its content model; extensions only reach
//! it through `Editor`. `MemoryEditor` is a minimal editor over a headless
//! document, used by the binary and the tests.

use anyhow::{bail, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::constants::tags;
use crate::dom::{Document, ElementId, Event};
use crate::geometry::{Rect, Size};

/// What an extension may ask of the host editor
pub trait Editor {
    fn document(&self) -> &Document;

    fn document_mut(&mut self) -> &mut Document;

    /// Editable root holding the content
    fn root(&self) -> ElementId;

    /// Parent of the root, where overlays are placed
    fn container(&self) -> ElementId {
        let document = self.document();
        document.parent(self.root()).unwrap_or_else(|| document.body())
    }

    /// Drop the editor's own text selection
    fn clear_selection(&mut self);

    /// Remove the content at `element` through the editor's document model
    fn delete_at(&mut self, element: ElementId) -> Result<()>;

    /// Instance-level options, merged over anything passed to extensions
    fn settings(&self) -> Value {
        Value::Null
    }
}

pub trait Extension {
    fn handle_event(&mut self, editor: &mut dyn Editor, event: &Event) -> Result<()>;
}

pub type ExtensionConstructor = fn(&mut dyn Editor, &Value) -> Result<Box<dyn Extension>>;

/// Extension constructors by key (e.g. `modules/imageResize`)
#[derive(Default)]
pub struct ExtensionRegistry {
    constructors: BTreeMap<String, ExtensionConstructor>,
}

impl ExtensionRegistry {
    pub fn register(&mut self, key: &str, constructor: ExtensionConstructor) {
        debug!(key = %key, "registered extension");
        self.constructors.insert(key.to_string(), constructor);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.constructors.contains_key(key)
    }

    pub fn create(
        &self,
        key: &str,
        editor: &mut dyn Editor,
        options: &Value,
    ) -> Result<Box<dyn Extension>> {
        let Some(constructor) = self.constructors.get(key) else {
            bail!("No extension registered under '{key}'");
        };
        constructor(editor, options)
    }
}

/// An editor together with the extensions it loaded
pub struct EditorHost<E: Editor> {
    pub editor: E,
    extensions: Vec<Box<dyn Extension>>,
}

impl<E: Editor> EditorHost<E> {
    pub fn new(editor: E) -> Self {
        Self {
            editor,
            extensions: Vec::new(),
        }
    }

    /// Construct the extension registered under `key` against this editor
    pub fn load(&mut self, registry: &ExtensionRegistry, key: &str, options: &Value) -> Result<()> {
        let extension = registry.create(key, &mut self.editor, options)?;
        info!(key = %key, "loaded extension");
        self.extensions.push(extension);
        Ok(())
    }

    /// Deliver an event to every loaded extension in load order
    pub fn dispatch(&mut self, event: &Event) -> Result<()> {
        for extension in &mut self.extensions {
            extension.handle_event(&mut self.editor, event)?;
        }
        Ok(())
    }
}

/// In-memory editor: a container holding an editable root of block elements
#[derive(Debug)]
pub struct MemoryEditor {
    document: Document,
    container: ElementId,
    root: ElementId,
    selection: Option<usize>,
    settings: Value,
    deleted: Vec<ElementId>,
}

impl MemoryEditor {
    /// Editor whose container occupies `bounds`
    pub fn new(bounds: Rect) -> Self {
        let mut document = Document::new();
        let container = document.create_element(tags::DIV);
        let root = document.create_element(tags::DIV);
        let body = document.body();
        document.append_child(body, container);
        document.append_child(container, root);
        document.set_layout(container, bounds);
        document.set_layout(root, bounds);
        document.set_attribute(root, "contenteditable", "true");
        Self {
            document,
            container,
            root,
            selection: None,
            settings: Value::Null,
            deleted: Vec::new(),
        }
    }

    pub fn with_settings(mut self, settings: Value) -> Self {
        self.settings = settings;
        self
    }

    /// Append a text paragraph laid out at `bounds`
    pub fn insert_paragraph(&mut self, text: &str, bounds: Rect) -> ElementId {
        let paragraph = self.document.create_element("p");
        self.document.set_text(paragraph, text);
        self.document.set_layout(paragraph, bounds);
        self.document.append_child(self.root, paragraph);
        paragraph
    }

    /// Append an image with intrinsic size `natural`, its top-left corner at `origin`
    pub fn insert_image(&mut self, natural: Size, origin: (f64, f64)) -> ElementId {
        let image = self.document.create_image(natural);
        self.document
            .set_layout(image, Rect::new(origin.0, origin.1, 0.0, 0.0));
        self.document.append_child(self.root, image);
        image
    }

    pub fn set_selection(&mut self, index: Option<usize>) {
        self.selection = index;
    }

    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    /// Elements removed through `delete_at`, oldest first
    pub fn deleted(&self) -> &[ElementId] {
        &self.deleted
    }
}

impl Editor for MemoryEditor {
    fn document(&self) -> &Document {
        &self.document
    }

    fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    fn root(&self) -> ElementId {
        self.root
    }

    fn container(&self) -> ElementId {
        self.container
    }

    fn clear_selection(&mut self) {
        self.selection = None;
    }

    fn delete_at(&mut self, element: ElementId) -> Result<()> {
        if element == self.root || !self.document.contains(self.root, element) {
            bail!("Element {element:?} is not part of the editor content");
        }
        self.document.remove(element);
        self.deleted.push(element);
        Ok(())
    }

    fn settings(&self) -> Value {
        self.settings.clone()
    }
}
