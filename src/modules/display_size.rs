use anyhow::Result;
use tracing::trace;

use super::{CapabilityModule, ModuleBase, ModuleContext};
use crate::constants::{readout, tags};
use crate::dom::ElementId;
use crate::geometry::{px, Size};

/// Displayed width and the height implied by the intrinsic aspect ratio
pub fn readout_size(width: f64, natural: Size) -> (u32, u32) {
    let width = width.round().max(0.0);
    let height = if natural.width > 0.0 {
        (width / natural.width * natural.height).round()
    } else {
        0.0
    };
    (width as u32, height as u32)
}

/// Live "width × height" label shown on the overlay
pub struct DisplaySize {
    base: ModuleBase,
    label: Option<ElementId>,
}

impl DisplaySize {
    pub const NAME: &'static str = "DisplaySize";

    pub fn new(base: ModuleBase) -> Self {
        Self { base, label: None }
    }
}

impl CapabilityModule for DisplaySize {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn on_create(&mut self, cx: &mut ModuleContext<'_>) -> Result<()> {
        let label = cx.dom.create_element(tags::DIV);
        cx.dom.apply_styles(label, &cx.options.display_styles);
        cx.dom.append_child(self.base.overlay, label);
        self.label = Some(label);
        Ok(())
    }

    fn on_update(&mut self, cx: &mut ModuleContext<'_>) -> Result<()> {
        let Some(label) = self.label else {
            return Ok(());
        };
        let target = self.base.target;
        let (Some(width), Some(natural)) =
            (cx.dom.rendered_width(target), cx.dom.natural_size(target))
        else {
            return Ok(());
        };

        let (width, height) = readout_size(width, natural);
        cx.dom
            .set_text(label, &format!("{width}{}{height}", readout::SEPARATOR));
        trace!(width, height, "updated size readout");

        if f64::from(width) > readout::MIN_INSIDE_WIDTH
            && f64::from(height) > readout::MIN_INSIDE_HEIGHT
        {
            // Inside, bottom-right corner of the image
            cx.dom.set_style(label, "right", &px(readout::INSET));
            cx.dom.set_style(label, "bottom", &px(readout::INSET));
            cx.dom.set_style(label, "left", "auto");
            return Ok(());
        }

        let bounds = cx.dom.measure(label);
        let horizontal = px(bounds.width + readout::INSET);
        let vertical = px(bounds.height + readout::INSET);
        if cx.dom.style(target, "float") == Some("right") {
            cx.dom.set_style(label, "right", "auto");
            cx.dom.set_style(label, "bottom", &vertical);
            cx.dom.set_style(label, "left", &horizontal);
        } else {
            cx.dom.set_style(label, "right", &horizontal);
            cx.dom.set_style(label, "bottom", &vertical);
            cx.dom.set_style(label, "left", "auto");
        }
        Ok(())
    }

    fn on_destroy(&mut self, _cx: &mut ModuleContext<'_>) {
        self.label = None;
    }
}
