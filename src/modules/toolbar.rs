use anyhow::Result;
use tracing::debug;

use super::{CapabilityModule, ModuleBase, ModuleContext};
use crate::constants::{tags, toolbar};
use crate::dom::{Document, ElementId, Event, EventKind, ListenerId};

/// Image alignment variants; the marker class on the image records which one is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Alignment {
    pub const ALL: [Alignment; 3] = [Alignment::Left, Alignment::Center, Alignment::Right];

    pub fn marker_class(self) -> &'static str {
        match self {
            Alignment::Left => toolbar::CLASS_LEFT,
            Alignment::Center => toolbar::CLASS_CENTER,
            Alignment::Right => toolbar::CLASS_RIGHT,
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Alignment::Left => "align-left",
            Alignment::Center => "align-center",
            Alignment::Right => "align-right",
        }
    }

    fn float(self) -> Option<&'static str> {
        match self {
            Alignment::Left => Some("left"),
            Alignment::Center => None,
            Alignment::Right => Some("right"),
        }
    }

    fn margin(self) -> &'static str {
        match self {
            Alignment::Left => "0 1em 1em 0",
            Alignment::Center => "auto",
            Alignment::Right => "0 0 1em 1em",
        }
    }

    fn display(self) -> &'static str {
        match self {
            Alignment::Center => "block",
            Alignment::Left | Alignment::Right => "inline",
        }
    }

    pub fn is_applied(self, dom: &Document, image: ElementId) -> bool {
        dom.has_class(image, self.marker_class())
    }

    /// The alignment currently applied to `image`, if any
    pub fn applied(dom: &Document, image: ElementId) -> Option<Alignment> {
        Self::ALL.into_iter().find(|a| a.is_applied(dom, image))
    }

    /// Remove every alignment's styling and marker class from `image`
    pub fn clear(dom: &mut Document, image: ElementId) {
        for property in ["float", "margin", "display"] {
            dom.remove_style(image, property);
        }
        for alignment in Self::ALL {
            dom.remove_class(image, alignment.marker_class());
        }
    }

    /// Apply this alignment to `image`, replacing any other
    pub fn apply(self, dom: &mut Document, image: ElementId) {
        Self::clear(dom, image);
        if let Some(float) = self.float() {
            dom.set_style(image, "float", float);
        }
        dom.set_style(image, "margin", self.margin());
        dom.set_style(image, "display", self.display());
        dom.add_class(image, self.marker_class());
    }
}

#[derive(Debug)]
struct Button {
    alignment: Alignment,
    element: ElementId,
    click: ListenerId,
}

/// Strip of alignment buttons above the overlay
pub struct Toolbar {
    base: ModuleBase,
    buttons: Vec<Button>,
}

impl Toolbar {
    pub const NAME: &'static str = "Toolbar";

    pub fn new(base: ModuleBase) -> Self {
        Self {
            base,
            buttons: Vec::new(),
        }
    }

    fn create_buttons(&mut self, cx: &mut ModuleContext<'_>, strip: ElementId) {
        let image = self.base.target;
        for (i, alignment) in Alignment::ALL.into_iter().enumerate() {
            let button = cx.dom.create_element(tags::SPAN);
            let icon = cx.dom.create_element(tags::SVG);
            cx.dom.set_attribute(icon, "data-icon", alignment.icon());
            cx.dom.append_child(button, icon);

            cx.dom.apply_styles(button, &cx.options.toolbar_button_styles);
            if i > 0 {
                cx.dom.set_style(button, "borderLeftWidth", "0");
            }
            cx.dom.apply_styles(icon, &cx.options.toolbar_button_svg_styles);
            if alignment.is_applied(cx.dom, image) {
                cx.dom.set_style(button, "filter", toolbar::ACTIVE_FILTER);
            }

            let click = cx.listen(button, EventKind::Click);
            cx.dom.append_child(strip, button);
            self.buttons.push(Button {
                alignment,
                element: button,
                click,
            });
        }
    }

    fn toggle(&self, cx: &mut ModuleContext<'_>, clicked: usize) {
        let image = self.base.target;
        for button in &self.buttons {
            cx.dom.set_style(button.element, "filter", "");
        }

        let button = &self.buttons[clicked];
        if button.alignment.is_applied(cx.dom, image) {
            Alignment::clear(cx.dom, image);
            debug!(alignment = ?button.alignment, "image alignment removed");
        } else {
            button.alignment.apply(cx.dom, image);
            cx.dom
                .set_style(button.element, "filter", toolbar::ACTIVE_FILTER);
            debug!(alignment = ?button.alignment, "image alignment applied");
        }
        cx.request_update();
    }
}

impl CapabilityModule for Toolbar {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn on_create(&mut self, cx: &mut ModuleContext<'_>) -> Result<()> {
        let strip = cx.dom.create_element(tags::DIV);
        cx.dom.apply_styles(strip, &cx.options.toolbar_styles);
        cx.dom.append_child(self.base.overlay, strip);
        self.create_buttons(cx, strip);
        Ok(())
    }

    fn on_update(&mut self, _cx: &mut ModuleContext<'_>) -> Result<()> {
        Ok(())
    }

    fn on_event(
        &mut self,
        cx: &mut ModuleContext<'_>,
        listener: ListenerId,
        _event: &Event,
    ) -> Result<()> {
        if let Some(clicked) = self.buttons.iter().position(|b| b.click == listener) {
            self.toggle(cx, clicked);
        }
        Ok(())
    }

    fn on_destroy(&mut self, _cx: &mut ModuleContext<'_>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::testing::Fixture;

    fn created(fixture: &mut Fixture) -> Toolbar {
        let mut module = Toolbar::new(fixture.base);
        module.on_create(&mut fixture.cx()).unwrap();
        module
    }

    fn click(fixture: &mut Fixture, module: &mut Toolbar, alignment: Alignment) -> bool {
        let button = module
            .buttons
            .iter()
            .find(|b| b.alignment == alignment)
            .unwrap();
        let (listener, element) = (button.click, button.element);
        let mut cx = fixture.cx();
        module
            .on_event(&mut cx, listener, &Event::click(element))
            .unwrap();
        cx.update_requested()
    }

    fn highlighted(fixture: &Fixture, module: &Toolbar) -> Vec<Alignment> {
        module
            .buttons
            .iter()
            .filter(|b| fixture.dom.style(b.element, "filter") == Some(toolbar::ACTIVE_FILTER))
            .map(|b| b.alignment)
            .collect()
    }

    #[test]
    fn test_builds_strip_with_three_buttons() {
        let mut fixture = Fixture::new();
        let module = created(&mut fixture);
        let strip = fixture.dom.children(fixture.base.overlay)[0];
        assert_eq!(fixture.dom.style(strip, "top"), Some("-12px"));

        let buttons = fixture.dom.children(strip).to_vec();
        assert_eq!(buttons.len(), 3);
        assert_eq!(fixture.dom.style(buttons[0], "borderLeftWidth"), None);
        assert_eq!(fixture.dom.style(buttons[1], "borderLeftWidth"), Some("0"));
        let icon = fixture.dom.children(buttons[2])[0];
        assert_eq!(fixture.dom.attribute(icon, "data-icon"), Some("align-right"));
        assert_eq!(fixture.dom.style(icon, "fill"), Some("#444"));
        assert!(highlighted(&fixture, &module).is_empty());
    }

    #[test]
    fn test_left_then_left_toggles_off() {
        let mut fixture = Fixture::new();
        let mut module = created(&mut fixture);
        let image = fixture.base.target;

        assert!(click(&mut fixture, &mut module, Alignment::Left));
        assert!(fixture.dom.has_class(image, toolbar::CLASS_LEFT));
        assert_eq!(fixture.dom.style(image, "float"), Some("left"));
        assert_eq!(fixture.dom.style(image, "margin"), Some("0 1em 1em 0"));
        assert_eq!(fixture.dom.style(image, "display"), Some("inline"));
        assert_eq!(highlighted(&fixture, &module), vec![Alignment::Left]);

        assert!(click(&mut fixture, &mut module, Alignment::Left));
        assert!(fixture.dom.classes(image).is_empty());
        assert_eq!(fixture.dom.style(image, "float"), None);
        assert_eq!(fixture.dom.style(image, "margin"), None);
        assert_eq!(fixture.dom.style(image, "display"), None);
        assert!(highlighted(&fixture, &module).is_empty());
    }

    #[test]
    fn test_left_then_center_keeps_only_center() {
        let mut fixture = Fixture::new();
        let mut module = created(&mut fixture);
        let image = fixture.base.target;

        click(&mut fixture, &mut module, Alignment::Left);
        click(&mut fixture, &mut module, Alignment::Center);

        assert_eq!(fixture.dom.classes(image), &[toolbar::CLASS_CENTER.to_string()]);
        assert_eq!(fixture.dom.style(image, "float"), None);
        assert_eq!(fixture.dom.style(image, "margin"), Some("auto"));
        assert_eq!(fixture.dom.style(image, "display"), Some("block"));
        assert_eq!(Alignment::applied(&fixture.dom, image), Some(Alignment::Center));
        assert_eq!(highlighted(&fixture, &module), vec![Alignment::Center]);
    }

    #[test]
    fn test_unrelated_classes_survive() {
        let mut fixture = Fixture::new();
        let image = fixture.base.target;
        fixture.dom.add_class(image, "ql-embed");
        let mut module = created(&mut fixture);

        click(&mut fixture, &mut module, Alignment::Right);
        click(&mut fixture, &mut module, Alignment::Right);
        assert_eq!(fixture.dom.classes(image), &["ql-embed".to_string()]);
    }

    #[test]
    fn test_highlight_reflects_existing_marker() {
        let mut fixture = Fixture::new();
        Alignment::Right.apply(&mut fixture.dom, fixture.base.target);
        let module = created(&mut fixture);
        assert_eq!(highlighted(&fixture, &module), vec![Alignment::Right]);
    }
}
