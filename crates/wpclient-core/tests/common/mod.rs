//! Shared fakes for wpclient-core integration tests.
//!
//! - `FakeState`: an in-memory pathway service behind the real `ReconnectingGateway`
//! - `FakeHost`: a headless editor that parses opened files into a `ModelView` and emits
//!   host events through a `ListenerRegistry`, as a desktop host would
//! - `RecordingProgress`: a progress sink that remembers what it was told

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use url::Url;

use wpclient_core::convert::parse_gpml;
use wpclient_core::events::Listener;
use wpclient_core::gateway::{PathwayService, ServiceConnector};
use wpclient_core::prelude::*;

pub const SPECIES: &str = "Homo sapiens";

/// A pathway with three annotated nodes: A and C carry `Entrez Gene:X`, B carries `Y`.
pub fn gpml(name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Pathway xmlns="http://pathvisio.org/GPML/2013a" Name="{name}" Organism="{SPECIES}">
  <DataNode TextLabel="A" GraphId="A" Type="GeneProduct">
    <Graphics CenterX="20" CenterY="20" Width="20" Height="20" />
    <Xref Database="Entrez Gene" ID="X" />
  </DataNode>
  <DataNode TextLabel="B" GraphId="B" Type="GeneProduct">
    <Graphics CenterX="60" CenterY="20" Width="20" Height="20" />
    <Xref Database="Entrez Gene" ID="Y" />
  </DataNode>
  <DataNode TextLabel="C" GraphId="C" Type="GeneProduct">
    <Graphics CenterX="100" CenterY="20" Width="20" Height="20" />
    <Xref Database="Entrez Gene" ID="X" />
  </DataNode>
</Pathway>
"#
    )
}

pub fn key(id: &str) -> ReferenceKey {
    ReferenceKey::new("Entrez Gene", id)
}

/// Holds a fetch until released, so tests can act while it is in flight.
#[derive(Default)]
pub struct FetchGate {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Default)]
pub struct FakeState {
    /// id -> revision -> GPML
    pub pathways: Mutex<BTreeMap<String, BTreeMap<u64, String>>>,
    pub fetch_error: Mutex<Option<GatewayError>>,
    pub gate: Mutex<Option<Arc<FetchGate>>>,
    pub fetches: AtomicUsize,
    pub connects: AtomicUsize,
    pub xref_hits: Mutex<Vec<SearchResult>>,
    pub logins: Mutex<Vec<String>>,
    pub uploads: Mutex<Vec<String>>,
    pub updates: Mutex<Vec<(String, u64, String)>>,
}

impl FakeState {
    pub fn add(&self, id: &str, revision: u64, gpml: String) {
        self.pathways
            .lock()
            .entry(id.to_string())
            .or_default()
            .insert(revision, gpml);
    }

    pub fn fail_fetch(&self, err: GatewayError) {
        *self.fetch_error.lock() = Some(err);
    }

    pub fn hold_fetches(&self) -> Arc<FetchGate> {
        let gate = Arc::new(FetchGate::default());
        *self.gate.lock() = Some(gate.clone());
        gate
    }
}

pub struct FakeLink(Arc<FakeState>);

fn info(id: &str, revision: u64) -> PathwayInfo {
    PathwayInfo {
        id: id.to_string(),
        url: format!("https://www.wikipathways.org/instance/{id}_r{revision}"),
        name: id.to_string(),
        species: SPECIES.to_string(),
        revision: revision.to_string(),
    }
}

#[async_trait]
impl PathwayService for FakeLink {
    async fn get_pathway(&self, id: &str, revision: u64) -> GatewayResult<RemoteDocument> {
        self.0.fetches.fetch_add(1, Ordering::SeqCst);
        let gate = self.0.gate.lock().clone();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        if let Some(err) = self.0.fetch_error.lock().clone() {
            return Err(err);
        }
        let pathways = self.0.pathways.lock();
        let revisions = pathways
            .get(id)
            .ok_or_else(|| GatewayError::NotFound(id.to_string()))?;
        let (rev, gpml) = if revision == 0 {
            revisions.iter().next_back()
        } else {
            revisions.get_key_value(&revision)
        }
        .ok_or_else(|| GatewayError::NotFound(format!("{id} revision {revision}")))?;
        Ok(RemoteDocument {
            id: id.to_string(),
            revision: *rev,
            name: id.to_string(),
            species: SPECIES.to_string(),
            url: String::new(),
            gpml: gpml.clone(),
        })
    }

    async fn list_pathways(&self, _organism: Option<&str>) -> GatewayResult<Vec<PathwayInfo>> {
        let pathways = self.0.pathways.lock();
        Ok(pathways
            .iter()
            .flat_map(|(id, revs)| revs.keys().map(move |r| info(id, *r)))
            .collect())
    }

    async fn find_by_text(
        &self,
        _text: &str,
        _organism: Option<&str>,
    ) -> GatewayResult<Vec<SearchResult>> {
        Ok(Vec::new())
    }

    async fn find_by_xrefs(&self, _keys: &[ReferenceKey]) -> GatewayResult<Vec<SearchResult>> {
        Ok(self.0.xref_hits.lock().clone())
    }

    async fn list_organisms(&self) -> GatewayResult<Vec<String>> {
        Ok(vec![SPECIES.to_string()])
    }

    async fn curation_tags(&self, _id: &str) -> GatewayResult<Vec<CurationTag>> {
        Ok(Vec::new())
    }

    async fn curation_tags_by_name(&self, _tag: &str) -> GatewayResult<Vec<CurationTag>> {
        Ok(Vec::new())
    }

    async fn pathway_info(&self, id: &str) -> GatewayResult<PathwayInfo> {
        Ok(info(id, 1))
    }

    async fn login(&self, user: &str, _password: &str) -> GatewayResult<()> {
        self.0.logins.lock().push(user.to_string());
        Ok(())
    }

    async fn create_pathway(&self, gpml: &str) -> GatewayResult<PathwayInfo> {
        self.0.uploads.lock().push(gpml.to_string());
        Ok(info("WP9000", 1))
    }

    async fn update_pathway(
        &self,
        id: &str,
        _gpml: &str,
        description: &str,
        revision: u64,
    ) -> GatewayResult<()> {
        self.0
            .updates
            .lock()
            .push((id.to_string(), revision, description.to_string()));
        Ok(())
    }
}

pub struct FakeConnector(pub Arc<FakeState>);

impl ServiceConnector for FakeConnector {
    type Service = FakeLink;

    fn connect(&self, _endpoint: &Url) -> GatewayResult<FakeLink> {
        self.0.connects.fetch_add(1, Ordering::SeqCst);
        Ok(FakeLink(self.0.clone()))
    }
}

pub type TestGateway = ReconnectingGateway<FakeConnector>;

pub fn gateway(state: &Arc<FakeState>) -> (Arc<TestGateway>, EndpointSetting) {
    let endpoint = EndpointSetting::new("https://webservice.wikipathways.org/");
    let gw = ReconnectingGateway::new(FakeConnector(state.clone()), endpoint.clone());
    (Arc::new(gw), endpoint)
}

type Hook = Box<dyn Fn() + Send + Sync>;

/// Headless editor.
#[derive(Default)]
pub struct FakeHost {
    pub listeners: ListenerRegistry,
    pub opened: Mutex<Vec<PathBuf>>,
    pub active: Mutex<Option<ModelView>>,
    pub enablements: Mutex<Vec<Enablement>>,
    pub id_mappers: Mutex<Vec<String>>,
    pub open_error: Mutex<Option<String>>,
    pub on_open: Mutex<Option<Hook>>,
}

impl FakeHost {
    /// The user creates a blank document.
    pub fn new_document(&self) {
        *self.active.lock() = Some(ModelView::new(&blank()));
        self.listeners.dispatch(&HostEvent::NewDocument);
    }

    /// The user opens a file from disk.
    pub fn open_file(&self, path: &Path) {
        *self.active.lock() = Some(ModelView::new(&blank()));
        self.listeners.dispatch(&HostEvent::DocumentOpened {
            source_file: Some(path.to_path_buf()),
        });
    }

    pub fn close_all(&self) {
        *self.active.lock() = None;
    }

    pub fn view(&self) -> Option<ModelView> {
        self.active.lock().clone()
    }

    pub fn last_enablement(&self) -> Option<Enablement> {
        self.enablements.lock().last().copied()
    }
}

pub fn blank() -> LocalDocumentModel {
    LocalDocumentModel {
        identifier: None,
        name: String::new(),
        species: String::new(),
        elements: Vec::new(),
        gpml: "<Pathway/>".to_string(),
    }
}

impl DocumentHost for FakeHost {
    fn open_document(&self, path: &Path) -> Result<(), HostError> {
        if let Some(hook) = self.on_open.lock().as_ref() {
            hook();
        }
        if let Some(msg) = self.open_error.lock().clone() {
            return Err(HostError::new(msg));
        }
        let text = std::fs::read_to_string(path).map_err(|e| HostError::new(e.to_string()))?;
        let model = parse_gpml(&text).map_err(|e| HostError::new(e.to_string()))?;
        *self.active.lock() = Some(ModelView::new(&model));
        self.opened.lock().push(path.to_path_buf());
        self.listeners.dispatch(&HostEvent::DocumentOpened {
            source_file: Some(path.to_path_buf()),
        });
        Ok(())
    }

    fn has_active_document(&self) -> bool {
        self.active.lock().is_some()
    }

    fn active_view(&self) -> Option<Arc<dyn DocumentView>> {
        self.active
            .lock()
            .clone()
            .map(|v| Arc::new(v) as Arc<dyn DocumentView>)
    }

    fn register_listener(&self, category: EventCategory, listener: Listener) {
        self.listeners.register(category, listener);
    }

    fn apply_enablement(&self, enablement: Enablement) {
        self.enablements.lock().push(enablement);
    }

    fn activate_id_mapper(&self, connection: &str) -> Result<(), HostError> {
        self.id_mappers.lock().push(connection.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingProgress {
    pub tasks: Mutex<Vec<String>>,
    pub reports: Mutex<Vec<String>>,
    pub finished: AtomicUsize,
}

impl RecordingProgress {
    pub fn finished_count(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

impl ProgressSink for RecordingProgress {
    fn set_task_name(&self, name: &str) {
        self.tasks.lock().push(name.to_string());
    }

    fn report(&self, message: &str) {
        self.reports.lock().push(message.to_string());
    }

    fn finished(&self) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}

/// A started client over the fakes, with its cache in a temp dir.
pub struct Harness {
    pub tmp: tempfile::TempDir,
    pub state: Arc<FakeState>,
    pub host: Arc<FakeHost>,
    pub endpoint: EndpointSetting,
    pub client: PathwayClient<TestGateway, FakeHost>,
    /// Invocation started by the startup parameter, if configured.
    pub startup: Option<TaskHandle<()>>,
}

pub async fn harness() -> Harness {
    harness_with(|cfg| cfg).await
}

pub async fn harness_with(configure: impl FnOnce(ClientConfig) -> ClientConfig) -> Harness {
    let tmp = tempfile::tempdir().unwrap();
    let state = Arc::new(FakeState::default());
    state.add("WP1", 1, gpml("one"));
    state.add("WP2", 3, gpml("two"));

    let (gw, endpoint) = gateway(&state);
    let host = Arc::new(FakeHost::default());
    let config = configure(ClientConfig::default().with_data_dir(tmp.path()));
    let mut client = PathwayClient::new(config, gw, host.clone()).unwrap();
    let startup = client.start().await.unwrap();

    Harness {
        tmp,
        state,
        host,
        endpoint,
        client,
        startup,
    }
}

pub fn progress() -> Arc<RecordingProgress> {
    Arc::new(RecordingProgress::default())
}
