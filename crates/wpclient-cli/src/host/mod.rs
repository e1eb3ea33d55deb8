//! Terminal document host.
//!
//! There is no editor window: "opening" a document reads the cached GPML back, parses it and
//! keeps an in-memory view of it as the active document. Enablement and identifier-mapping
//! requests are recorded so commands can report them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use wpclient_core::convert::parse_gpml;
use wpclient_core::events::{EventCategory, HostEvent, Listener, ListenerRegistry};
use wpclient_core::highlight::{DocumentView, ModelView};
use wpclient_core::host::{DocumentHost, HostError};
use wpclient_core::model::LocalDocumentModel;
use wpclient_core::session::Enablement;

pub mod progress;

pub use progress::SpinnerProgress;

struct Active {
    view: ModelView,
    path: Option<PathBuf>,
}

#[derive(Default)]
pub struct CliHost {
    listeners: ListenerRegistry,
    active: Mutex<Option<Active>>,
    enablement: Mutex<Enablement>,
    id_mapper: Mutex<Option<String>>,
}

impl CliHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `model` the active, unsaved document and announce it as a new document.
    pub fn new_document(&self, model: &LocalDocumentModel) {
        *self.active.lock() = Some(Active {
            view: ModelView::new(model),
            path: None,
        });
        self.listeners.dispatch(&HostEvent::NewDocument);
    }

    pub fn view(&self) -> Option<ModelView> {
        self.active.lock().as_ref().map(|a| a.view.clone())
    }

    pub fn active_path(&self) -> Option<PathBuf> {
        self.active.lock().as_ref().and_then(|a| a.path.clone())
    }

    pub fn enablement(&self) -> Enablement {
        *self.enablement.lock()
    }

    pub fn id_mapper(&self) -> Option<String> {
        self.id_mapper.lock().clone()
    }
}

impl DocumentHost for CliHost {
    fn open_document(&self, path: &Path) -> Result<(), HostError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| HostError::new(format!("cannot read {}: {e}", path.display())))?;
        let model = parse_gpml(&text)
            .map_err(|e| HostError::new(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), elements = model.elements.len(), "document loaded");

        *self.active.lock() = Some(Active {
            view: ModelView::new(&model),
            path: Some(path.to_path_buf()),
        });
        self.listeners.dispatch(&HostEvent::DocumentOpened {
            source_file: Some(path.to_path_buf()),
        });
        Ok(())
    }

    fn has_active_document(&self) -> bool {
        self.active.lock().is_some()
    }

    fn active_view(&self) -> Option<Arc<dyn DocumentView>> {
        self.view().map(|v| Arc::new(v) as Arc<dyn DocumentView>)
    }

    fn register_listener(&self, category: EventCategory, listener: Listener) {
        self.listeners.register(category, listener);
    }

    fn apply_enablement(&self, enablement: Enablement) {
        debug!(
            can_create_new = enablement.can_create_new,
            can_update = enablement.can_update,
            "enablement"
        );
        *self.enablement.lock() = enablement;
    }

    fn activate_id_mapper(&self, connection: &str) -> Result<(), HostError> {
        info!(%connection, "identifier mapping connection selected");
        *self.id_mapper.lock() = Some(connection.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const GPML: &str = r#"<Pathway Name="Sample" Organism="Homo sapiens">
  <DataNode TextLabel="TP53" GraphId="a1">
    <Graphics CenterX="50" CenterY="40" Width="60" Height="20"/>
    <Xref Database="Entrez Gene" ID="7157"/>
  </DataNode>
</Pathway>"#;

    fn counter(host: &CliHost, category: EventCategory) -> Arc<AtomicUsize> {
        let seen = Arc::new(AtomicUsize::new(0));
        let c = seen.clone();
        host.register_listener(
            category,
            Box::new(move |_: &HostEvent| {
                c.fetch_add(1, Ordering::SeqCst);
                Vec::new()
            }),
        );
        seen
    }

    #[test]
    fn open_loads_view_and_notifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("WP4.r1.gpml");
        std::fs::write(&path, GPML).unwrap();

        let host = CliHost::new();
        let opened = counter(&host, EventCategory::DocumentOpened);
        host.open_document(&path).unwrap();

        assert!(host.has_active_document());
        assert_eq!(host.active_path(), Some(path));
        assert_eq!(opened.load(Ordering::SeqCst), 1);
        let element = host.view().unwrap().element("a1").unwrap();
        assert_eq!(element.label, "TP53");
    }

    #[test]
    fn unreadable_or_invalid_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let host = CliHost::new();
        assert!(host.open_document(&dir.path().join("missing.gpml")).is_err());

        let bad = dir.path().join("bad.gpml");
        std::fs::write(&bad, "<html/>").unwrap();
        assert!(host.open_document(&bad).is_err());
        assert!(!host.has_active_document());
    }

    #[test]
    fn new_document_has_no_backing_file() {
        let host = CliHost::new();
        let fresh = counter(&host, EventCategory::NewDocument);
        host.new_document(&parse_gpml(GPML).unwrap());
        assert!(host.has_active_document());
        assert_eq!(host.active_path(), None);
        assert_eq!(fresh.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn records_enablement_and_id_mapper() {
        let host = CliHost::new();
        let e = Enablement {
            can_create_new: false,
            can_update: true,
        };
        host.apply_enablement(e);
        host.activate_id_mapper("idmapper-bridgerest:http://webservice.bridgedb.org/Homo sapiens")
            .unwrap();
        assert_eq!(host.enablement(), e);
        assert!(host.id_mapper().unwrap().ends_with("Homo sapiens"));
    }
}
