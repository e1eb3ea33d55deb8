//! Session state and action enablement.
//!
//! `SessionState` records which remote pathway the active document was opened from. It is
//! owned by the foreground controller and only mutated there; background work stages its
//! changes in an `OpenReport` instead.
//!
//! Enablement rules:
//! - "create new" requires an empty `current_id` and an active document in the host
//! - "update" requires a non-empty `current_id`

use serde::Serialize;

use crate::cache::DocumentCache;
use crate::events::HostEvent;
use crate::model::DocumentIdentifier;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    /// Remote id of the active document; empty when it did not come from the service.
    pub current_id: String,
    /// Revision of the active document; empty when unknown.
    pub current_revision: String,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful open of `identifier`.
    pub fn record_opened(&mut self, identifier: &DocumentIdentifier) {
        self.current_id = identifier.id.clone();
        self.current_revision = identifier
            .revision
            .map(|r| r.to_string())
            .unwrap_or_default();
    }

    pub fn clear(&mut self) {
        self.current_id.clear();
        self.current_revision.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.current_id.is_empty()
    }

    /// `(id, revision)` of the active remote document, if any.
    pub fn current(&self) -> Option<(&str, &str)> {
        (!self.current_id.is_empty())
            .then(|| (self.current_id.as_str(), self.current_revision.as_str()))
    }

    /// Forget the remote origin when the active document changes to something else.
    ///
    /// A new document, or a document opened from a file outside the session cache, clears
    /// the state. Opening one of our own cache entries, or a document with no backing file,
    /// leaves it untouched. Returns true when the state changed.
    pub fn apply_host_event(&mut self, event: &HostEvent, cache: &DocumentCache) -> bool {
        let clear = match event {
            HostEvent::NewDocument => true,
            HostEvent::DocumentOpened { source_file } => match source_file {
                Some(path) => !cache.contains(path),
                None => false,
            },
            HostEvent::SelectionContextMenu { .. } => false,
        };
        if clear && !self.is_empty() {
            self.clear();
            return true;
        }
        false
    }
}

/// Which remote actions the host should offer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Enablement {
    pub can_create_new: bool,
    pub can_update: bool,
}

impl Enablement {
    pub fn compute(session: &SessionState, host_has_active_document: bool) -> Self {
        Self {
            can_create_new: session.is_empty() && host_has_active_document,
            can_update: !session.is_empty(),
        }
    }
}
