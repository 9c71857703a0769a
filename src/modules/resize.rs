use anyhow::Result;
use tracing::{debug, warn};

use super::{CapabilityModule, ModuleBase, ModuleContext};
use crate::constants::{handles, tags};
use crate::dom::{ElementId, Event, EventKind, ListenerId};
use crate::geometry::{parse_px, px};

#[derive(Debug, Clone, Copy)]
struct Handle {
    element: ElementId,
    press: ListenerId,
}

/// One press-drag-release cycle on a handle
#[derive(Debug)]
struct Drag {
    handle: usize,
    press_x: f64,
    baseline: f64,
    motion: ListenerId,
    release: ListenerId,
}

/// Corner handles that resize the image horizontally by dragging
pub struct Resize {
    base: ModuleBase,
    handles: Vec<Handle>,
    drag: Option<Drag>,
}

impl Resize {
    pub const NAME: &'static str = "Resize";

    pub fn new(base: ModuleBase) -> Self {
        Self {
            base,
            handles: Vec::new(),
            drag: None,
        }
    }

    /// Left-side corners (top-left, bottom-left) shrink the image as the pointer moves right
    fn is_left_side(handle: usize) -> bool {
        handle == 0 || handle == 3
    }

    fn set_cursor(&self, cx: &mut ModuleContext<'_>, cursor: &str) {
        let body = cx.dom.body();
        cx.dom.set_style(body, "cursor", cursor);
        cx.dom.set_style(self.base.target, "cursor", cursor);
    }

    fn position_handles(&self, cx: &mut ModuleContext<'_>) {
        let offset = |property: &str| {
            let size = cx
                .options
                .handle_styles
                .get(property)
                .and_then(|value| parse_px(value))
                .unwrap_or(handles::FALLBACK_SIZE);
            px(-size / 2.0)
        };
        let x_offset = offset("width");
        let y_offset = offset("height");

        let sides = [("left", "top"), ("right", "top"), ("right", "bottom"), ("left", "bottom")];
        for (handle, (horizontal, vertical)) in self.handles.iter().zip(sides) {
            cx.dom.set_style(handle.element, horizontal, &x_offset);
            cx.dom.set_style(handle.element, vertical, &y_offset);
        }
    }

    fn start_drag(&mut self, cx: &mut ModuleContext<'_>, handle: usize, event: &Event) {
        self.end_drag(cx);

        let target = self.base.target;
        let baseline = match cx.dom.width(target) {
            Some(width) if width > 0 => f64::from(width),
            _ => cx.dom.natural_size(target).map_or(0.0, |size| size.width),
        };
        let cursor = handles::CURSORS[handle];
        self.set_cursor(cx, cursor);

        let document = cx.dom.document_element();
        let motion = cx.listen(document, EventKind::MouseMove);
        let release = cx.listen(document, EventKind::MouseUp);
        debug!(handle, baseline, x = event.client.x, "resize drag started");
        self.drag = Some(Drag {
            handle,
            press_x: event.client.x,
            baseline,
            motion,
            release,
        });
    }

    fn drag_to(&self, cx: &mut ModuleContext<'_>, drag: &Drag, x: f64) {
        let delta = x - drag.press_x;
        let width = if Self::is_left_side(drag.handle) {
            (drag.baseline - delta).round()
        } else {
            (drag.baseline + delta).round()
        };
        if width < 0.0 {
            warn!(width, "resize drag went past zero width, flooring at 0");
        }
        cx.dom.set_width(self.base.target, width.max(0.0) as u32);
        cx.request_update();
    }

    fn end_drag(&mut self, cx: &mut ModuleContext<'_>) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        cx.unlisten(drag.motion);
        cx.unlisten(drag.release);
        self.set_cursor(cx, "");
        debug!(handle = drag.handle, "resize drag ended");
    }
}

impl CapabilityModule for Resize {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn on_create(&mut self, cx: &mut ModuleContext<'_>) -> Result<()> {
        for cursor in handles::CURSORS {
            let element = cx.dom.create_element(tags::DIV);
            cx.dom.apply_styles(element, &cx.options.handle_styles);
            cx.dom.set_style(element, "cursor", cursor);
            cx.dom.append_child(self.base.overlay, element);
            let press = cx.listen(element, EventKind::MouseDown);
            self.handles.push(Handle { element, press });
        }
        self.position_handles(cx);
        Ok(())
    }

    fn on_update(&mut self, _cx: &mut ModuleContext<'_>) -> Result<()> {
        Ok(())
    }

    fn on_event(
        &mut self,
        cx: &mut ModuleContext<'_>,
        listener: ListenerId,
        event: &Event,
    ) -> Result<()> {
        if let Some(handle) = self.handles.iter().position(|h| h.press == listener) {
            self.start_drag(cx, handle, event);
            return Ok(());
        }

        let Some(drag) = self.drag.as_ref() else {
            return Ok(());
        };
        if listener == drag.motion {
            self.drag_to(cx, drag, event.client.x);
        } else if listener == drag.release {
            self.end_drag(cx);
        }
        Ok(())
    }

    fn on_destroy(&mut self, cx: &mut ModuleContext<'_>) {
        // Cursor may still show a resize arrow if the session ends mid-drag
        self.drag = None;
        self.set_cursor(cx, "");
    }
}
