//! Capability modules attached to an active image selection
//!
//! Each selection gets fresh module instances. A module builds its own
//! elements inside the overlay in `on_create`, redraws in `on_update`, and
//! releases what it registered in `on_destroy`. Removing the overlay itself is
//! the owner's job.

use anyhow::Result;

use crate::config::Options;
use crate::dom::{Document, ElementId, Event, EventKind, ListenerId, ListenerOwner};

mod display_size;
mod resize;
mod toolbar;

pub use display_size::{readout_size, DisplaySize};
pub use resize::Resize;
pub use toolbar::{Alignment, Toolbar};

/// Elements every module is constructed against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleBase {
    pub overlay: ElementId,
    pub target: ElementId,
}

pub trait CapabilityModule {
    fn name(&self) -> &str;

    fn on_create(&mut self, cx: &mut ModuleContext<'_>) -> Result<()>;

    fn on_update(&mut self, cx: &mut ModuleContext<'_>) -> Result<()>;

    fn on_destroy(&mut self, cx: &mut ModuleContext<'_>);

    /// A listener this module registered through `cx.listen` fired
    fn on_event(
        &mut self,
        _cx: &mut ModuleContext<'_>,
        _listener: ListenerId,
        _event: &Event,
    ) -> Result<()> {
        Ok(())
    }
}

/// What a module may touch while one of its hooks runs
pub struct ModuleContext<'a> {
    pub dom: &'a mut Document,
    pub options: &'a Options,
    owner: ListenerOwner,
    update_requested: bool,
}

impl<'a> ModuleContext<'a> {
    pub(crate) fn new(dom: &'a mut Document, options: &'a Options, owner: ListenerOwner) -> Self {
        Self {
            dom,
            options,
            owner,
            update_requested: false,
        }
    }

    /// Register a bubbling listener owned by this module for the current session
    pub fn listen(&mut self, target: ElementId, kind: EventKind) -> ListenerId {
        self.dom.add_listener(target, kind, false, self.owner)
    }

    /// Remove one of this module's listeners; foreign or stale tokens are ignored
    pub fn unlisten(&mut self, id: ListenerId) -> bool {
        if self.dom.listener_owner(id) != Some(self.owner) {
            return false;
        }
        self.dom.remove_listener(id)
    }

    /// Ask for a global update pass once the current hook returns
    pub fn request_update(&mut self) {
        self.update_requested = true;
    }

    pub(crate) fn update_requested(&self) -> bool {
        self.update_requested
    }
}
