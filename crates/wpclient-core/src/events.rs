//! Host events and the listener registry.
//!
//! Hosts deliver three kinds of editor events:
//! - a document was opened (possibly from a file)
//! - a new, empty document was created
//! - a context menu is being built for a selected element
//!
//! Listeners are grouped by `EventCategory` and invoked in registration order. Context-menu
//! listeners contribute `MenuEntry` items; other listeners return an empty list.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::client::ClientAction;
use crate::highlight::ViewElement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventCategory {
    DocumentOpened,
    NewDocument,
    SelectionContextMenu,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::DocumentOpened => "document-opened",
            EventCategory::NewDocument => "new-document",
            EventCategory::SelectionContextMenu => "selection-context-menu",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// `source_file` is `None` for documents that were never saved to disk.
    DocumentOpened { source_file: Option<PathBuf> },
    NewDocument,
    SelectionContextMenu { element: ViewElement },
}

impl HostEvent {
    pub fn category(&self) -> EventCategory {
        match self {
            HostEvent::DocumentOpened { .. } => EventCategory::DocumentOpened,
            HostEvent::NewDocument => EventCategory::NewDocument,
            HostEvent::SelectionContextMenu { .. } => EventCategory::SelectionContextMenu,
        }
    }
}

/// A context-menu item contributed by a listener.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuEntry {
    pub label: String,
    pub action: ClientAction,
}

pub type Listener = Box<dyn Fn(&HostEvent) -> Vec<MenuEntry> + Send + Sync>;

type SharedListener = Arc<dyn Fn(&HostEvent) -> Vec<MenuEntry> + Send + Sync>;

/// Listeners keyed by category.
///
/// Dispatch snapshots the listener list first, so a listener may register further
/// listeners without deadlocking.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: RwLock<BTreeMap<EventCategory, Vec<SharedListener>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, category: EventCategory, listener: Listener) {
        self.listeners
            .write()
            .entry(category)
            .or_default()
            .push(Arc::from(listener));
    }

    /// Number of listeners registered for `category`.
    pub fn len(&self, category: EventCategory) -> usize {
        self.listeners.read().get(&category).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().values().all(Vec::is_empty)
    }

    /// Deliver `event` to every listener of its category; collects contributed entries.
    pub fn dispatch(&self, event: &HostEvent) -> Vec<MenuEntry> {
        let category = event.category();
        let snapshot: Vec<SharedListener> = self
            .listeners
            .read()
            .get(&category)
            .cloned()
            .unwrap_or_default();
        trace!(category = category.as_str(), listeners = snapshot.len(), "dispatch host event");
        snapshot.iter().flat_map(|l| l(event)).collect()
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: BTreeMap<&'static str, usize> = self
            .listeners
            .read()
            .iter()
            .map(|(k, v)| (k.as_str(), v.len()))
            .collect();
        f.debug_struct("ListenerRegistry").field("listeners", &counts).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ReferenceKey, Region};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn element() -> ViewElement {
        ViewElement {
            id: "a1".into(),
            label: "TP53".into(),
            reference: Some(ReferenceKey::new("Entrez Gene", "7157")),
            bounds: Region::default(),
        }
    }

    #[test]
    fn dispatch_only_reaches_matching_category() {
        let reg = ListenerRegistry::new();
        let opened = Arc::new(AtomicUsize::new(0));
        let o = opened.clone();
        reg.register(
            EventCategory::DocumentOpened,
            Box::new(move |_| {
                o.fetch_add(1, Ordering::SeqCst);
                vec![]
            }),
        );

        reg.dispatch(&HostEvent::NewDocument);
        assert_eq!(opened.load(Ordering::SeqCst), 0);
        reg.dispatch(&HostEvent::DocumentOpened { source_file: None });
        assert_eq!(opened.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn menu_entries_are_collected_in_registration_order() {
        let reg = ListenerRegistry::new();
        for label in ["first", "second"] {
            reg.register(
                EventCategory::SelectionContextMenu,
                Box::new(move |ev| match ev {
                    HostEvent::SelectionContextMenu { element } => vec![MenuEntry {
                        label: label.to_string(),
                        action: ClientAction::FindPathwaysByReference(
                            element.reference.clone().unwrap_or_else(|| ReferenceKey::new("", "")),
                        ),
                    }],
                    _ => vec![],
                }),
            );
        }
        let entries = reg.dispatch(&HostEvent::SelectionContextMenu { element: element() });
        let labels: Vec<_> = entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, ["first", "second"]);
        assert_eq!(reg.len(EventCategory::SelectionContextMenu), 2);
    }

    #[test]
    fn listener_may_register_during_dispatch() {
        let reg = Arc::new(ListenerRegistry::new());
        let inner = reg.clone();
        reg.register(
            EventCategory::NewDocument,
            Box::new(move |_| {
                inner.register(EventCategory::DocumentOpened, Box::new(|_| vec![]));
                vec![]
            }),
        );
        reg.dispatch(&HostEvent::NewDocument);
        assert_eq!(reg.len(EventCategory::DocumentOpened), 1);
    }

    #[test]
    fn category_names() {
        assert_eq!(HostEvent::NewDocument.category().as_str(), "new-document");
    }
}
