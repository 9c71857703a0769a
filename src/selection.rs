//! Image selection controller
//!
//! Watches clicks inside the editor root and keeps at most one image
//! selected. Selecting builds the overlay and a fresh set of capability
//! modules; deselecting tears all of it down, including any listener
//! registered during the session.

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, error, info, trace};

use crate::config::Options;
use crate::constants::{extension, overlay, selection, tags};
use crate::dom::{Document, ElementId, Event, EventKind, ListenerId, ListenerOwner, SessionId};
use crate::host::{Editor, Extension, ExtensionRegistry};
use crate::modules::ModuleBase;
use crate::overlay::OverlayController;
use crate::registry::ModuleRegistry;

#[derive(Debug, Clone, Copy)]
struct Session {
    id: SessionId,
    target: ElementId,
}

pub struct ImageResize {
    options: Options,
    registry: ModuleRegistry,
    overlay: OverlayController,
    root: ElementId,
    root_click: ListenerId,
    session: Option<Session>,
}

/// Register the extension under its host key
pub fn register(registry: &mut ExtensionRegistry) {
    registry.register(extension::KEY, construct);
}

fn construct(editor: &mut dyn Editor, options: &Value) -> Result<Box<dyn Extension>> {
    Ok(Box::new(ImageResize::new(editor, options)?))
}

impl ImageResize {
    /// Attach to `editor` with the built-in modules
    pub fn new(editor: &mut dyn Editor, options: &Value) -> Result<Self> {
        Self::with_registry(editor, options, ModuleRegistry::default())
    }

    /// Attach to `editor`, resolving module names through `registry`
    pub fn with_registry(
        editor: &mut dyn Editor,
        options: &Value,
        registry: ModuleRegistry,
    ) -> Result<Self> {
        let options = Options::from_layers(options, &editor.settings())
            .context("Failed to build image resize options")?;
        Ok(Self::with_options(editor, options, registry))
    }

    /// Attach to `editor` with already merged options
    pub fn with_options(editor: &mut dyn Editor, options: Options, registry: ModuleRegistry) -> Self {
        let root = editor.root();
        let container = editor.container();
        let dom = editor.document_mut();

        if dom.style(container, "position").is_none() {
            dom.set_style(container, "position", overlay::CONTAINER_POSITION);
        }
        let root_click = dom.add_listener(root, EventKind::Click, false, ListenerOwner::Extension);
        info!(modules = ?options.module_names(), "image resize attached");

        Self {
            options,
            registry,
            overlay: OverlayController::new(container),
            root,
            root_click,
            session: None,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// The selected image
    pub fn target(&self) -> Option<ElementId> {
        self.session.map(|s| s.target)
    }

    /// The overlay of the current selection
    pub fn overlay(&self) -> Option<ElementId> {
        self.overlay.element()
    }

    /// Names of the live modules, in registration order
    pub fn module_names(&self) -> Vec<&str> {
        self.overlay.module_names()
    }

    /// Number of update passes run since attaching
    pub fn update_passes(&self) -> u64 {
        self.overlay.update_passes()
    }

    /// Route an event to the listeners it reaches
    pub fn handle_event(&mut self, editor: &mut dyn Editor, event: &Event) -> Result<()> {
        let listeners = editor.document().listeners_for(event);
        for listener in listeners {
            // Earlier listeners may have torn the session down
            let Some(owner) = editor.document().listener_owner(listener) else {
                continue;
            };
            match owner {
                ListenerOwner::Extension if listener == self.root_click => {
                    self.on_root_click(editor, event.target)?;
                }
                ListenerOwner::Session(session) if self.is_current(session) => {
                    self.on_session_event(editor, event)?;
                }
                ListenerOwner::Module { session, index } if self.is_current(session) => {
                    self.overlay.dispatch_to_module(
                        editor.document_mut(),
                        &self.options,
                        session,
                        index,
                        listener,
                        event,
                    )?;
                }
                owner => trace!(?owner, "ignoring listener not owned by the active session"),
            }
        }
        Ok(())
    }

    /// Run an update pass after the host changed layout
    pub fn refresh(&mut self, editor: &mut dyn Editor) -> Result<()> {
        let Some(session) = self.session else {
            return Ok(());
        };
        self.overlay
            .trigger_update(editor.document_mut(), &self.options, session.id)
    }

    /// End the current selection; nothing happens without one
    pub fn deactivate(&mut self, editor: &mut dyn Editor) {
        let Some(session) = self.session else {
            return;
        };
        let root = self.root;
        let dom = editor.document_mut();

        self.overlay.destroy_overlay(dom);
        let released = dom.remove_session_listeners(session.id);
        set_user_select(dom, root, selection::RESTORED);
        self.overlay.destroy_modules(dom, &self.options, session.id);
        self.session = None;
        info!(session = session.id.0, target = ?session.target, released, "image deselected");
    }

    /// End the current selection and stop watching the editor root
    pub fn detach(mut self, editor: &mut dyn Editor) {
        self.deactivate(editor);
        editor.document_mut().remove_listener(self.root_click);
        info!("image resize detached");
    }

    fn is_current(&self, session: SessionId) -> bool {
        self.session.is_some_and(|s| s.id == session)
    }

    fn on_root_click(&mut self, editor: &mut dyn Editor, target: ElementId) -> Result<()> {
        if !editor.document().has_tag(target, tags::IMAGE) {
            self.deactivate(editor);
            return Ok(());
        }
        if self.target() == Some(target) {
            return Ok(());
        }
        if let Some(previous) = self.target() {
            debug!(from = ?previous, to = ?target, "retargeting image selection");
            self.deactivate(editor);
        }
        self.activate(editor, target)
    }

    fn on_session_event(&mut self, editor: &mut dyn Editor, event: &Event) -> Result<()> {
        let Some(session) = self.session else {
            return Ok(());
        };
        match event.kind {
            EventKind::KeyUp if event.is_delete_intent() => {
                info!(target = ?session.target, "deleting selected image");
                let deleted = editor.delete_at(session.target);
                self.deactivate(editor);
                deleted.context("Failed to delete selected image")
            }
            EventKind::Input => self.refresh(editor),
            _ => Ok(()),
        }
    }

    fn activate(&mut self, editor: &mut dyn Editor, target: ElementId) -> Result<()> {
        let session = Session {
            id: editor.document_mut().next_session_id(),
            target,
        };
        self.session = Some(session);

        let root = self.root;
        set_user_select(editor.document_mut(), root, selection::SUPPRESSED);
        editor.clear_selection();

        let dom = editor.document_mut();
        let document = dom.document_element();
        dom.add_listener(document, EventKind::KeyUp, true, ListenerOwner::Session(session.id));
        dom.add_listener(root, EventKind::Input, true, ListenerOwner::Session(session.id));

        let element = self
            .overlay
            .create_overlay(dom, &self.options.overlay_styles, target);
        dom.insert_after(root, element);
        self.overlay.reposition(dom);

        if let Err(err) = self.start_modules(dom, session, element) {
            error!(error = ?err, "image selection aborted");
            self.deactivate(editor);
            return Err(err);
        }
        info!(session = session.id.0, target = ?target, "image selected");
        Ok(())
    }

    fn start_modules(&mut self, dom: &mut Document, session: Session, element: ElementId) -> Result<()> {
        let base = ModuleBase {
            overlay: element,
            target: session.target,
        };
        let modules = self
            .registry
            .instantiate(&self.options.modules, base)
            .context("Failed to instantiate image modules")?;
        self.overlay.install_modules(modules);
        self.overlay.create_modules(dom, &self.options, session.id)?;
        self.overlay.trigger_update(dom, &self.options, session.id)
    }
}

impl Extension for ImageResize {
    fn handle_event(&mut self, editor: &mut dyn Editor, event: &Event) -> Result<()> {
        ImageResize::handle_event(self, editor, event)
    }
}

/// Toggle native text selection on the editor root and the whole document
fn set_user_select(dom: &mut Document, root: ElementId, value: &str) {
    let document = dom.document_element();
    for property in selection::USER_SELECT_PROPERTIES {
        dom.set_style(root, property, value);
        dom.set_style(document, property, value);
    }
}
