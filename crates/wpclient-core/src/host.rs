//! Host editor seam.
//!
//! The client never renders anything itself. It asks the host to open files, to expose the
//! active document view, to route editor events to registered listeners and to toggle its
//! actions. Hosts must accept `register_listener` calls before any event is delivered.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::events::{EventCategory, Listener};
use crate::highlight::DocumentView;
use crate::session::Enablement;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HostError(pub String);

impl HostError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

pub trait DocumentHost: Send + Sync + 'static {
    /// Open a cached document file in the editor and make it the active document.
    fn open_document(&self, path: &Path) -> Result<(), HostError>;

    /// True when the editor currently has a document open.
    fn has_active_document(&self) -> bool;

    /// View of the active document, if any.
    fn active_view(&self) -> Option<Arc<dyn DocumentView>>;

    fn register_listener(&self, category: EventCategory, listener: Listener);

    /// Enable or disable the "create new" and "update" actions.
    fn apply_enablement(&self, enablement: Enablement);

    /// Activate an identifier-mapping connection (e.g. for the opened species).
    fn activate_id_mapper(&self, _connection: &str) -> Result<(), HostError> {
        Ok(())
    }
}
