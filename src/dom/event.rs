//! Events dispatched by the host and the listener table they are matched against

use std::collections::BTreeMap;

use super::ElementId;
use crate::constants::keys;
use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    MouseDown,
    MouseMove,
    MouseUp,
    KeyUp,
    Input,
}

/// A host interaction, addressed to the element it happened on
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub target: ElementId,
    pub client: Point,
    pub key_code: Option<u32>,
}

impl Event {
    fn new(kind: EventKind, target: ElementId) -> Self {
        Self {
            kind,
            target,
            client: Point::default(),
            key_code: None,
        }
    }

    pub fn click(target: ElementId) -> Self {
        Self::new(EventKind::Click, target)
    }

    pub fn mouse_down(target: ElementId, x: f64, y: f64) -> Self {
        Self {
            client: Point::new(x, y),
            ..Self::new(EventKind::MouseDown, target)
        }
    }

    pub fn mouse_move(target: ElementId, x: f64, y: f64) -> Self {
        Self {
            client: Point::new(x, y),
            ..Self::new(EventKind::MouseMove, target)
        }
    }

    pub fn mouse_up(target: ElementId, x: f64, y: f64) -> Self {
        Self {
            client: Point::new(x, y),
            ..Self::new(EventKind::MouseUp, target)
        }
    }

    pub fn key_up(target: ElementId, key_code: u32) -> Self {
        Self {
            key_code: Some(key_code),
            ..Self::new(EventKind::KeyUp, target)
        }
    }

    pub fn input(target: ElementId) -> Self {
        Self::new(EventKind::Input, target)
    }

    /// Delete or Backspace released
    pub fn is_delete_intent(&self) -> bool {
        self.kind == EventKind::KeyUp
            && matches!(self.key_code, Some(keys::DELETE) | Some(keys::BACKSPACE))
    }
}

/// Tag of one active selection; every listener registered during it carries the tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub u64);

/// Who registered a listener and therefore receives its events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerOwner {
    /// Lives as long as the extension is attached
    Extension,
    /// Observers of the selection controller for one session
    Session(SessionId),
    /// A capability module, by its position in the session's module list
    Module { session: SessionId, index: usize },
}

impl ListenerOwner {
    pub fn session(&self) -> Option<SessionId> {
        match self {
            ListenerOwner::Extension => None,
            ListenerOwner::Session(session) => Some(*session),
            ListenerOwner::Module { session, .. } => Some(*session),
        }
    }
}

/// Deregistration token returned by `Document::add_listener`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Clone)]
pub(crate) struct Listener {
    pub target: ElementId,
    pub kind: EventKind,
    pub capture: bool,
    pub owner: ListenerOwner,
}

/// Registered listeners, iterated in registration order
#[derive(Debug, Default)]
pub(crate) struct ListenerTable {
    entries: BTreeMap<ListenerId, Listener>,
    next_id: u64,
}

impl ListenerTable {
    pub fn insert(&mut self, listener: Listener) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.entries.insert(id, listener);
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        self.entries.remove(&id).is_some()
    }

    pub fn get(&self, id: ListenerId) -> Option<&Listener> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&Listener) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, listener| keep(listener));
        before - self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ListenerId, &Listener)> {
        self.entries.iter().map(|(id, listener)| (*id, listener))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_intent() {
        let target = ElementId::from_raw(1);
        assert!(Event::key_up(target, keys::DELETE).is_delete_intent());
        assert!(Event::key_up(target, keys::BACKSPACE).is_delete_intent());
        assert!(!Event::key_up(target, 13).is_delete_intent());
        assert!(!Event::click(target).is_delete_intent());
    }

    #[test]
    fn test_owner_session() {
        let session = SessionId(3);
        assert_eq!(ListenerOwner::Extension.session(), None);
        assert_eq!(ListenerOwner::Session(session).session(), Some(session));
        assert_eq!(
            ListenerOwner::Module { session, index: 2 }.session(),
            Some(session)
        );
    }

    #[test]
    fn test_table_ids_are_never_reused() {
        let mut table = ListenerTable::default();
        let listener = Listener {
            target: ElementId::from_raw(1),
            kind: EventKind::Click,
            capture: false,
            owner: ListenerOwner::Extension,
        };
        let first = table.insert(listener.clone());
        assert!(table.remove(first));
        let second = table.insert(listener);
        assert_ne!(first, second);
        assert!(!table.remove(first));
        assert_eq!(table.len(), 1);
    }
}
