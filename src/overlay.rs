use anyhow::{Context, Result};
use tracing::{debug, trace, warn};

use crate::config::Options;
use crate::constants::{overlay, tags};
use crate::dom::{Document, ElementId, Event, ListenerId, ListenerOwner, SessionId, StyleMap};
use crate::geometry::px;
use crate::modules::{CapabilityModule, ModuleContext};

/// Owns the overlay element of the active selection and its live modules
pub struct OverlayController {
    // === Placement ===
    container: ElementId,

    // === Active selection (element and target exist together) ===
    element: Option<ElementId>,
    target: Option<ElementId>,
    modules: Vec<Box<dyn CapabilityModule>>,

    // === Diagnostics ===
    update_passes: u64,
}

impl OverlayController {
    /// `container` is the positioned ancestor the overlay is placed against
    pub fn new(container: ElementId) -> Self {
        Self {
            container,
            element: None,
            target: None,
            modules: Vec::new(),
            update_passes: 0,
        }
    }

    pub fn element(&self) -> Option<ElementId> {
        self.element
    }

    pub fn update_passes(&self) -> u64 {
        self.update_passes
    }

    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    /// Build a fresh, detached overlay for `target`; attaching it is the caller's job
    pub fn create_overlay(
        &mut self,
        dom: &mut Document,
        styles: &StyleMap,
        target: ElementId,
    ) -> ElementId {
        let element = dom.create_element(tags::DIV);
        dom.apply_styles(element, styles);
        self.element = Some(element);
        self.target = Some(target);
        element
    }

    /// Detach and discard the overlay with everything modules built inside it
    pub fn destroy_overlay(&mut self, dom: &mut Document) {
        if let Some(element) = self.element.take() {
            dom.remove(element);
        }
        self.target = None;
    }

    /// Place the overlay over the target; false when either is missing or
    /// the target has no geometry (e.g. removed by an external edit)
    pub fn reposition(&self, dom: &mut Document) -> bool {
        let (Some(element), Some(target)) = (self.element, self.target) else {
            return false;
        };
        let Some(image) = dom.bounding_rect(target) else {
            warn!(target = ?target, "selected image has no geometry, skipping reposition");
            return false;
        };
        let Some(container) = dom.bounding_rect(self.container) else {
            warn!("overlay container has no geometry, skipping reposition");
            return false;
        };

        let rect = image.relative_to(&container, dom.scroll(self.container));
        dom.set_style(element, "left", &px(rect.x - overlay::BORDER_COMPENSATION));
        dom.set_style(element, "top", &px(rect.y));
        dom.set_style(element, "width", &px(rect.width));
        dom.set_style(element, "height", &px(rect.height));
        true
    }

    /// Hand over freshly instantiated modules for the current overlay
    pub fn install_modules(&mut self, modules: Vec<Box<dyn CapabilityModule>>) {
        self.modules = modules;
    }

    /// Run `on_create` on every module in registration order
    ///
    /// On failure only the modules created so far stay live, so a later
    /// `destroy_modules` pairs every `on_destroy` with an `on_create`.
    pub fn create_modules(
        &mut self,
        dom: &mut Document,
        options: &Options,
        session: SessionId,
    ) -> Result<()> {
        for index in 0..self.modules.len() {
            let module = &mut self.modules[index];
            let mut cx = ModuleContext::new(dom, options, ListenerOwner::Module { session, index });
            if let Err(err) = module.on_create(&mut cx) {
                let name = module.name().to_string();
                self.modules.truncate(index);
                return Err(err.context(format!("Failed to create image module '{name}'")));
            }
        }
        Ok(())
    }

    /// Reposition, then let every module redraw in registration order
    ///
    /// All geometry-affecting actions funnel through here.
    pub fn trigger_update(
        &mut self,
        dom: &mut Document,
        options: &Options,
        session: SessionId,
    ) -> Result<()> {
        self.update_passes += 1;
        let placed = self.reposition(dom);
        trace!(pass = self.update_passes, placed, "overlay update pass");

        for (index, module) in self.modules.iter_mut().enumerate() {
            let mut cx = ModuleContext::new(dom, options, ListenerOwner::Module { session, index });
            module
                .on_update(&mut cx)
                .context(format!("Failed to update image module '{}'", module.name()))?;
        }
        Ok(())
    }

    /// Route a module-owned listener to its module; runs one update pass if the
    /// module asked for it
    pub fn dispatch_to_module(
        &mut self,
        dom: &mut Document,
        options: &Options,
        session: SessionId,
        index: usize,
        listener: ListenerId,
        event: &Event,
    ) -> Result<()> {
        let Some(module) = self.modules.get_mut(index) else {
            debug!(index, "event for a module that is no longer live");
            return Ok(());
        };
        let mut cx = ModuleContext::new(dom, options, ListenerOwner::Module { session, index });
        module
            .on_event(&mut cx, listener, event)
            .context(format!("Image module '{}' failed to handle {:?}", module.name(), event.kind))?;

        if cx.update_requested() {
            self.trigger_update(dom, options, session)?;
        }
        Ok(())
    }

    /// Run `on_destroy` on every module, then drop them
    pub fn destroy_modules(&mut self, dom: &mut Document, options: &Options, session: SessionId) {
        for (index, module) in self.modules.iter_mut().enumerate() {
            let mut cx = ModuleContext::new(dom, options, ListenerOwner::Module { session, index });
            module.on_destroy(&mut cx);
        }
        self.modules.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Rect, Size};
    use crate::registry::{ModuleRegistry, ModuleSpec};
    use crate::modules::ModuleBase;

    struct Page {
        dom: Document,
        container: ElementId,
        root: ElementId,
        image: ElementId,
    }

    fn page() -> Page {
        let mut dom = Document::new();
        let container = dom.create_element(tags::DIV);
        let root = dom.create_element(tags::DIV);
        dom.append_child(dom.body(), container);
        dom.append_child(container, root);
        dom.set_layout(container, Rect::new(100.0, 50.0, 800.0, 600.0));
        let image = dom.create_image(Size::new(800.0, 600.0));
        dom.append_child(root, image);
        dom.set_layout(image, Rect::new(130.0, 90.0, 0.0, 0.0));
        dom.set_width(image, 400);
        Page { dom, container, root, image }
    }

    fn attached(page: &mut Page) -> (OverlayController, ElementId) {
        let mut controller = OverlayController::new(page.container);
        let styles = Options::default().overlay_styles;
        let overlay = controller.create_overlay(&mut page.dom, &styles, page.image);
        page.dom.insert_after(page.root, overlay);
        (controller, overlay)
    }

    #[test]
    fn test_create_overlay_is_detached_and_styled() {
        let mut page = page();
        let mut controller = OverlayController::new(page.container);
        let styles = Options::default().overlay_styles;
        let overlay = controller.create_overlay(&mut page.dom, &styles, page.image);

        assert_eq!(page.dom.parent(overlay), None);
        assert_eq!(page.dom.style(overlay, "border"), Some("1px dashed #444"));
        assert_eq!(controller.element(), Some(overlay));
    }

    #[test]
    fn test_reposition_tracks_image_and_scroll() {
        let mut page = page();
        let (controller, overlay) = attached(&mut page);
        page.dom.set_scroll(page.container, Point::new(0.0, 25.0));

        assert!(controller.reposition(&mut page.dom));
        assert_eq!(page.dom.style(overlay, "left"), Some("29px"));
        assert_eq!(page.dom.style(overlay, "top"), Some("65px"));
        assert_eq!(page.dom.style(overlay, "width"), Some("400px"));
        assert_eq!(page.dom.style(overlay, "height"), Some("300px"));

        page.dom.set_width(page.image, 200);
        assert!(controller.reposition(&mut page.dom));
        assert_eq!(page.dom.style(overlay, "width"), Some("200px"));
        assert_eq!(page.dom.style(overlay, "height"), Some("150px"));
    }

    #[test]
    fn test_reposition_without_overlay_is_noop() {
        let mut page = page();
        let controller = OverlayController::new(page.container);
        assert!(!controller.reposition(&mut page.dom));
    }

    #[test]
    fn test_reposition_skips_removed_target() {
        let mut page = page();
        let (controller, overlay) = attached(&mut page);
        assert!(controller.reposition(&mut page.dom));
        page.dom.remove(page.image);

        assert!(!controller.reposition(&mut page.dom));
        assert_eq!(page.dom.style(overlay, "left"), Some("29px"));
    }

    #[test]
    fn test_update_pass_reaches_modules_in_order() {
        let mut page = page();
        let (mut controller, overlay) = attached(&mut page);
        let options = Options::default().with_modules(vec![ModuleSpec::Toolbar, ModuleSpec::DisplaySize]);
        let base = ModuleBase { overlay, target: page.image };
        let modules = ModuleRegistry::default().instantiate(&options.modules, base).unwrap();
        controller.install_modules(modules);

        let session = SessionId(1);
        controller.create_modules(&mut page.dom, &options, session).unwrap();
        controller.trigger_update(&mut page.dom, &options, session).unwrap();

        assert_eq!(controller.update_passes(), 1);
        assert_eq!(controller.module_names(), vec!["Toolbar", "DisplaySize"]);
        let children = page.dom.children(overlay).to_vec();
        assert_eq!(children.len(), 2);
        assert_eq!(page.dom.text(children[1]), Some("400 × 300"));

        controller.destroy_modules(&mut page.dom, &options, session);
        controller.destroy_overlay(&mut page.dom);
        assert!(controller.module_names().is_empty());
        assert!(!page.dom.exists(overlay));
        assert_eq!(controller.element(), None);
    }
}
