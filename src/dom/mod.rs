//! Headless element tree standing in for the host page
//!
//! Elements carry a tag, inline styles, classes, attributes and text. Layout is
//! supplied by the host (`set_layout`), except for images whose rendered size
//! follows their `width` attribute and intrinsic aspect ratio. Listeners are
//! registered against elements and matched to dispatched events in capture
//! then bubble order.

use std::collections::{BTreeMap, HashMap};

use tracing::trace;

use crate::constants::{tags, text_metrics};
use crate::geometry::{parse_px, Point, Rect, Size};

mod event;
pub use event::{Event, EventKind, ListenerId, ListenerOwner, SessionId};
use event::{Listener, ListenerTable};

/// Flat style-property map (`boxSizing` → `border-box`)
pub type StyleMap = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(u32);

impl ElementId {
    #[cfg(test)]
    pub(crate) fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

#[derive(Debug, Default)]
struct Element {
    tag: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    style: StyleMap,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    text: String,
    /// `width` attribute of images
    width: Option<u32>,
    /// Intrinsic size of images
    natural_size: Option<Size>,
    layout: Option<Rect>,
    scroll: Point,
}

#[derive(Debug)]
pub struct Document {
    elements: HashMap<ElementId, Element>,
    next_id: u32,
    document_element: ElementId,
    body: ElementId,
    listeners: ListenerTable,
    next_session: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document holding `<html><body></body></html>`
    pub fn new() -> Self {
        let mut document = Self {
            elements: HashMap::new(),
            next_id: 0,
            document_element: ElementId(0),
            body: ElementId(0),
            listeners: ListenerTable::default(),
            next_session: 0,
        };
        document.document_element = document.create_element(tags::HTML);
        document.body = document.create_element(tags::BODY);
        document.append_child(document.document_element, document.body);
        document
    }

    pub fn document_element(&self) -> ElementId {
        self.document_element
    }

    pub fn body(&self) -> ElementId {
        self.body
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.elements.insert(
            id,
            Element {
                tag: tag.to_string(),
                ..Default::default()
            },
        );
        id
    }

    /// Create a detached `<img>` with the given intrinsic size
    pub fn create_image(&mut self, natural: Size) -> ElementId {
        let id = self.create_element(tags::IMAGE);
        if let Some(element) = self.elements.get_mut(&id) {
            element.natural_size = Some(natural);
        }
        id
    }

    pub fn exists(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    pub fn tag(&self, id: ElementId) -> Option<&str> {
        self.elements.get(&id).map(|e| e.tag.as_str())
    }

    /// Tag comparison ignoring ASCII case
    pub fn has_tag(&self, id: ElementId, tag: &str) -> bool {
        self.tag(id).is_some_and(|t| t.eq_ignore_ascii_case(tag))
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.elements.get(&id).and_then(|e| e.parent)
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.elements
            .get(&id)
            .map_or(&[][..], |e| e.children.as_slice())
    }

    /// Whether `node` is `ancestor` or lies below it
    pub fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Attached below the document element
    pub fn is_connected(&self, id: ElementId) -> bool {
        self.exists(id) && self.contains(self.document_element, id)
    }

    /// Append `child` as the last child of `parent`, moving it if attached elsewhere
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> bool {
        if !self.can_adopt(parent, child) {
            return false;
        }
        self.detach(child);
        if let Some(element) = self.elements.get_mut(&parent) {
            element.children.push(child);
        }
        if let Some(element) = self.elements.get_mut(&child) {
            element.parent = Some(parent);
        }
        true
    }

    /// Insert `node` as the next sibling of `reference`
    pub fn insert_after(&mut self, reference: ElementId, node: ElementId) -> bool {
        let Some(parent) = self.parent(reference) else {
            return false;
        };
        if reference == node || !self.can_adopt(parent, node) {
            return false;
        }
        self.detach(node);
        let Some(element) = self.elements.get_mut(&parent) else {
            return false;
        };
        let position = element
            .children
            .iter()
            .position(|&c| c == reference)
            .map_or(element.children.len(), |i| i + 1);
        element.children.insert(position, node);
        if let Some(element) = self.elements.get_mut(&node) {
            element.parent = Some(parent);
        }
        true
    }

    fn can_adopt(&self, parent: ElementId, child: ElementId) -> bool {
        self.exists(parent) && self.exists(child) && !self.contains(child, parent)
    }

    fn detach(&mut self, id: ElementId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(element) = self.elements.get_mut(&parent) {
            element.children.retain(|&c| c != id);
        }
        if let Some(element) = self.elements.get_mut(&id) {
            element.parent = None;
        }
    }

    /// Detach `id` and discard it with its whole subtree, including listeners
    /// registered on any discarded element
    pub fn remove(&mut self, id: ElementId) -> bool {
        if !self.exists(id) || id == self.document_element {
            return false;
        }
        self.detach(id);

        let mut pending = vec![id];
        let mut discarded = Vec::new();
        while let Some(current) = pending.pop() {
            if let Some(element) = self.elements.remove(&current) {
                pending.extend(element.children);
                discarded.push(current);
            }
        }
        let dropped = self.listeners.retain(|l| !discarded.contains(&l.target));
        trace!(element = ?id, elements = discarded.len(), listeners = dropped, "removed subtree");
        true
    }

    pub fn style(&self, id: ElementId, property: &str) -> Option<&str> {
        self.elements
            .get(&id)
            .and_then(|e| e.style.get(property))
            .map(String::as_str)
    }

    /// Set an inline style; an empty value clears it
    pub fn set_style(&mut self, id: ElementId, property: &str, value: &str) {
        if let Some(element) = self.elements.get_mut(&id) {
            if value.is_empty() {
                element.style.remove(property);
            } else {
                element.style.insert(property.to_string(), value.to_string());
            }
        }
    }

    pub fn remove_style(&mut self, id: ElementId, property: &str) {
        if let Some(element) = self.elements.get_mut(&id) {
            element.style.remove(property);
        }
    }

    pub fn apply_styles(&mut self, id: ElementId, styles: &StyleMap) {
        for (property, value) in styles {
            self.set_style(id, property, value);
        }
    }

    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.elements
            .get(&id)
            .is_some_and(|e| e.classes.iter().any(|c| c == class))
    }

    pub fn add_class(&mut self, id: ElementId, class: &str) {
        if let Some(element) = self.elements.get_mut(&id)
            && !element.classes.iter().any(|c| c == class)
        {
            element.classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, id: ElementId, class: &str) {
        if let Some(element) = self.elements.get_mut(&id) {
            element.classes.retain(|c| c != class);
        }
    }

    pub fn classes(&self, id: ElementId) -> &[String] {
        self.elements
            .get(&id)
            .map_or(&[][..], |e| e.classes.as_slice())
    }

    pub fn attribute(&self, id: ElementId, name: &str) -> Option<&str> {
        self.elements
            .get(&id)
            .and_then(|e| e.attributes.get(name))
            .map(String::as_str)
    }

    pub fn set_attribute(&mut self, id: ElementId, name: &str, value: &str) {
        if let Some(element) = self.elements.get_mut(&id) {
            element.attributes.insert(name.to_string(), value.to_string());
        }
    }

    /// Text content; `None` when empty
    pub fn text(&self, id: ElementId) -> Option<&str> {
        self.elements
            .get(&id)
            .map(|e| e.text.as_str())
            .filter(|text| !text.is_empty())
    }

    pub fn set_text(&mut self, id: ElementId, text: &str) {
        if let Some(element) = self.elements.get_mut(&id) {
            element.text = text.to_string();
        }
    }

    /// The image `width` attribute, if set
    pub fn width(&self, id: ElementId) -> Option<u32> {
        self.elements.get(&id).and_then(|e| e.width)
    }

    pub fn set_width(&mut self, id: ElementId, width: u32) {
        if let Some(element) = self.elements.get_mut(&id) {
            element.width = Some(width);
        }
    }

    pub fn natural_size(&self, id: ElementId) -> Option<Size> {
        self.elements.get(&id).and_then(|e| e.natural_size)
    }

    /// Rendered width of an image: the `width` attribute, else the intrinsic width
    pub fn rendered_width(&self, id: ElementId) -> Option<f64> {
        let element = self.elements.get(&id)?;
        let natural = element.natural_size?;
        Some(element.width.map_or(natural.width, f64::from))
    }

    /// Host-supplied layout box (client coordinates)
    pub fn set_layout(&mut self, id: ElementId, rect: Rect) {
        if let Some(element) = self.elements.get_mut(&id) {
            element.layout = Some(rect);
        }
    }

    pub fn scroll(&self, id: ElementId) -> Point {
        self.elements.get(&id).map_or(Point::default(), |e| e.scroll)
    }

    pub fn set_scroll(&mut self, id: ElementId, scroll: Point) {
        if let Some(element) = self.elements.get_mut(&id) {
            element.scroll = scroll;
        }
    }

    /// Bounding client rect; `None` once the element has left the document
    ///
    /// Images keep their layout origin and take their size from the rendered
    /// width and the intrinsic aspect ratio.
    pub fn bounding_rect(&self, id: ElementId) -> Option<Rect> {
        if !self.is_connected(id) {
            return None;
        }
        let element = self.elements.get(&id)?;
        let layout = element.layout.unwrap_or_default();
        match (element.natural_size, self.rendered_width(id)) {
            (Some(natural), Some(width)) => {
                let height = if natural.width > 0.0 {
                    width / natural.width * natural.height
                } else {
                    layout.height
                };
                Some(Rect::from_origin_size(layout.origin(), Size::new(width, height)))
            }
            _ => Some(layout),
        }
    }

    /// Size of an element for placement purposes
    ///
    /// Uses the host layout when present, otherwise estimates the box from the
    /// text content, the `font` size and the `padding` shorthand.
    pub fn measure(&self, id: ElementId) -> Size {
        let Some(element) = self.elements.get(&id) else {
            return Size::default();
        };
        if let Some(layout) = element.layout {
            return layout.size();
        }

        let (font_size, line_height) = element
            .style
            .get("font")
            .map_or((text_metrics::DEFAULT_FONT_SIZE, 1.0), |font| parse_font(font));
        let (pad_y, pad_x) = element
            .style
            .get("padding")
            .map_or((0.0, 0.0), |padding| parse_padding(padding));

        let glyphs = element.text.chars().count() as f64;
        Size::new(
            glyphs * font_size * text_metrics::CHAR_WIDTH_RATIO + 2.0 * pad_x,
            font_size * line_height + 2.0 * pad_y,
        )
    }

    /// Allocate a session tag unique within this document, whichever
    /// controller asks
    pub fn next_session_id(&mut self) -> SessionId {
        self.next_session += 1;
        SessionId(self.next_session)
    }

    pub fn add_listener(
        &mut self,
        target: ElementId,
        kind: EventKind,
        capture: bool,
        owner: ListenerOwner,
    ) -> ListenerId {
        self.listeners.insert(Listener {
            target,
            kind,
            capture,
            owner,
        })
    }

    /// Returns false for tokens already removed
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Remove every listener tagged with `session`
    pub fn remove_session_listeners(&mut self, session: SessionId) -> usize {
        self.listeners.retain(|l| l.owner.session() != Some(session))
    }

    pub fn has_listener(&self, id: ListenerId) -> bool {
        self.listeners.get(id).is_some()
    }

    pub fn listener_owner(&self, id: ListenerId) -> Option<ListenerOwner> {
        self.listeners.get(id).map(|l| l.owner)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Listeners an event reaches: capture listeners from the outermost
    /// ancestor inwards, then the remaining listeners from the target outwards
    pub fn listeners_for(&self, event: &Event) -> Vec<ListenerId> {
        let mut path = Vec::new();
        let mut current = Some(event.target).filter(|id| self.exists(*id));
        while let Some(id) = current {
            path.push(id);
            current = self.parent(id);
        }

        let mut ids = Vec::new();
        for &element in path.iter().rev() {
            ids.extend(self.matching(element, event.kind, true));
        }
        for &element in &path {
            ids.extend(self.matching(element, event.kind, false));
        }
        ids
    }

    fn matching(
        &self,
        element: ElementId,
        kind: EventKind,
        capture: bool,
    ) -> impl Iterator<Item = ListenerId> + '_ {
        self.listeners
            .iter()
            .filter(move |(_, l)| l.target == element && l.kind == kind && l.capture == capture)
            .map(|(id, _)| id)
    }
}

/// Font size and line-height multiplier from a `font` shorthand such as
/// `12px/1.0 Arial, sans-serif`
fn parse_font(font: &str) -> (f64, f64) {
    let Some(size_token) = font.split_whitespace().find(|t| parse_px(t).is_some()) else {
        return (text_metrics::DEFAULT_FONT_SIZE, 1.0);
    };
    let mut parts = size_token.splitn(2, '/');
    let size = parts
        .next()
        .and_then(parse_px)
        .unwrap_or(text_metrics::DEFAULT_FONT_SIZE);
    let line_height = parts.next().and_then(parse_px).unwrap_or(1.0);
    (size, line_height)
}

/// Vertical and horizontal padding from a `padding` shorthand
fn parse_padding(padding: &str) -> (f64, f64) {
    let values: Vec<f64> = padding
        .split_whitespace()
        .map(|t| parse_px(t).unwrap_or(0.0))
        .collect();
    match values.as_slice() {
        [all] => (*all, *all),
        [vertical, horizontal, ..] => (*vertical, *horizontal),
        [] => (0.0, 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> (Document, ElementId, ElementId) {
        let mut doc = Document::new();
        let container = doc.create_element(tags::DIV);
        let root = doc.create_element(tags::DIV);
        doc.append_child(doc.body(), container);
        doc.append_child(container, root);
        (doc, container, root)
    }

    #[test]
    fn test_insert_after_places_sibling() {
        let (mut doc, container, root) = page();
        let toolbar = doc.create_element(tags::DIV);
        doc.append_child(container, toolbar);
        let overlay = doc.create_element(tags::DIV);

        assert!(doc.insert_after(root, overlay));
        assert_eq!(doc.children(container), &[root, overlay, toolbar]);
        assert_eq!(doc.parent(overlay), Some(container));
    }

    #[test]
    fn test_append_rejects_cycles() {
        let (mut doc, container, root) = page();
        assert!(!doc.append_child(root, container));
        assert_eq!(doc.parent(root), Some(container));
    }

    #[test]
    fn test_remove_discards_subtree_and_listeners() {
        let (mut doc, _container, root) = page();
        let overlay = doc.create_element(tags::DIV);
        let handle = doc.create_element(tags::DIV);
        doc.insert_after(root, overlay);
        doc.append_child(overlay, handle);
        let listener = doc.add_listener(handle, EventKind::MouseDown, false, ListenerOwner::Extension);

        assert!(doc.remove(overlay));
        assert!(!doc.exists(overlay));
        assert!(!doc.exists(handle));
        assert!(!doc.has_listener(listener));
        assert!(!doc.remove(overlay));
    }

    #[test]
    fn test_image_geometry_follows_width_attribute() {
        let (mut doc, _container, root) = page();
        let image = doc.create_image(Size::new(800.0, 600.0));
        doc.append_child(root, image);
        doc.set_layout(image, Rect::new(20.0, 30.0, 0.0, 0.0));

        assert_eq!(doc.bounding_rect(image), Some(Rect::new(20.0, 30.0, 800.0, 600.0)));
        doc.set_width(image, 400);
        assert_eq!(doc.bounding_rect(image), Some(Rect::new(20.0, 30.0, 400.0, 300.0)));
    }

    #[test]
    fn test_detached_element_has_no_rect() {
        let (mut doc, _container, root) = page();
        let image = doc.create_image(Size::new(10.0, 10.0));
        assert_eq!(doc.bounding_rect(image), None);
        doc.append_child(root, image);
        assert!(doc.bounding_rect(image).is_some());
        doc.remove(image);
        assert_eq!(doc.bounding_rect(image), None);
    }

    #[test]
    fn test_empty_style_value_clears_property() {
        let (mut doc, _container, root) = page();
        doc.set_style(root, "userSelect", "none");
        assert_eq!(doc.style(root, "userSelect"), Some("none"));
        doc.set_style(root, "userSelect", "");
        assert_eq!(doc.style(root, "userSelect"), None);
    }

    #[test]
    fn test_measure_estimates_from_text() {
        let (mut doc, _container, root) = page();
        let label = doc.create_element(tags::DIV);
        doc.append_child(root, label);
        doc.set_style(label, "font", "10px/2.0 Arial");
        doc.set_style(label, "padding", "4px 8px");
        doc.set_text(label, "abcde");

        let size = doc.measure(label);
        assert!((size.width - (5.0 * 6.0 + 16.0)).abs() < 1e-9);
        assert!((size.height - 28.0).abs() < 1e-9);

        doc.set_layout(label, Rect::new(0.0, 0.0, 70.0, 22.0));
        assert_eq!(doc.measure(label), Size::new(70.0, 22.0));
    }

    #[test]
    fn test_listener_order_capture_then_bubble() {
        let (mut doc, _container, root) = page();
        let image = doc.create_image(Size::new(10.0, 10.0));
        doc.append_child(root, image);
        let html = doc.document_element();

        let bubble_root = doc.add_listener(root, EventKind::Click, false, ListenerOwner::Extension);
        let capture_doc = doc.add_listener(html, EventKind::Click, true, ListenerOwner::Extension);
        let on_target = doc.add_listener(image, EventKind::Click, false, ListenerOwner::Extension);
        let other_kind = doc.add_listener(image, EventKind::KeyUp, false, ListenerOwner::Extension);

        let ids = doc.listeners_for(&Event::click(image));
        assert_eq!(ids, vec![capture_doc, on_target, bubble_root]);
        assert!(!ids.contains(&other_kind));
    }

    #[test]
    fn test_session_ids_are_unique_per_document() {
        let mut doc = Document::new();
        let first = doc.next_session_id();
        let second = doc.next_session_id();
        assert_ne!(first, second);
    }

    #[test]
    fn test_remove_session_listeners() {
        let (mut doc, _container, root) = page();
        let session = SessionId(7);
        doc.add_listener(root, EventKind::Input, true, ListenerOwner::Session(session));
        doc.add_listener(root, EventKind::MouseMove, false, ListenerOwner::Module { session, index: 1 });
        let kept = doc.add_listener(root, EventKind::Click, false, ListenerOwner::Extension);

        assert_eq!(doc.remove_session_listeners(session), 2);
        assert_eq!(doc.listener_count(), 1);
        assert!(doc.has_listener(kept));
    }
}
