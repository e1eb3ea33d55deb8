//! Foreground controller.
//!
//! `PathwayClient` owns the session state. Whoever holds `&mut PathwayClient` is the
//! foreground: background invocations and host listeners only post `ForegroundMessage`s to
//! an inbox, and the foreground applies them one at a time through `next_message` or
//! `process_pending`. Completion handling therefore never overlaps.
//!
//! Lifecycle:
//! - `new`: validate configuration
//! - `start`: create the cache directory, register host listeners, apply enablement and
//!   auto-open the startup pathway if configured
//! - `shutdown`: stop accepting work, cancel and wait for in-flight invocations, then
//!   remove the cache directory

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::cache::DocumentCache;
use crate::config::{validate_config, ClientConfig};
use crate::events::{EventCategory, HostEvent, MenuEntry};
use crate::gateway::{GatewayResult, QueryGateway};
use crate::host::DocumentHost;
use crate::model::{DocumentIdentifier, LocalDocumentModel, PathwayInfo, ReferenceKey, SearchResult};
use crate::pipeline::{FetchOpenPipeline, OpenOutcome, OpenReport};
use crate::progress::{NullProgress, ProgressGuard, ProgressSink};
use crate::session::{Enablement, SessionState};
use crate::task::TaskHandle;
use crate::{ClientError, ClientResult};

/// Actions contributed to host menus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    /// List pathways containing this reference key.
    FindPathwaysByReference(ReferenceKey),
}

/// Why an invocation was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOrigin {
    User,
    /// Triggered by the startup parameter.
    Startup,
}

/// Work handed back to the foreground.
#[derive(Debug)]
pub enum ForegroundMessage {
    OpenFinished {
        task: u64,
        origin: OpenOrigin,
        report: Box<OpenReport>,
    },
    Host(HostEvent),
}

pub struct PathwayClient<G: QueryGateway, H: DocumentHost> {
    config: ClientConfig,
    gateway: Arc<G>,
    host: Arc<H>,
    pipeline: FetchOpenPipeline<G, H>,
    session: SessionState,
    enablement: Enablement,
    inbox_tx: mpsc::UnboundedSender<ForegroundMessage>,
    inbox_rx: mpsc::UnboundedReceiver<ForegroundMessage>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
    started: bool,
}

impl<G: QueryGateway, H: DocumentHost> PathwayClient<G, H> {
    pub fn new(config: ClientConfig, gateway: Arc<G>, host: Arc<H>) -> ClientResult<Self> {
        validate_config(&config)?;
        let cache = DocumentCache::new(config.cache_dir());
        let pipeline = FetchOpenPipeline::new(gateway.clone(), host.clone(), cache);
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        Ok(Self {
            config,
            gateway,
            host,
            pipeline,
            session: SessionState::new(),
            enablement: Enablement::default(),
            inbox_tx,
            inbox_rx,
            shutdown: CancellationToken::new(),
            tracker: TaskTracker::new(),
            started: false,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    pub fn cache(&self) -> &DocumentCache {
        self.pipeline.cache()
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Last enablement pushed to the host.
    pub fn enablement(&self) -> Enablement {
        self.enablement
    }

    /// Token cancelled at shutdown. Cancelling it stops all work and rejects new work.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Start the session. Returns the startup invocation, if the startup parameter is set.
    pub async fn start(&mut self) -> ClientResult<Option<TaskHandle<()>>> {
        if self.started {
            return Ok(None);
        }
        let dir = self.cache().dir().to_path_buf();
        self.cache()
            .create()
            .await
            .map_err(|e| ClientError::cache_dir(&dir, e))?;
        info!(
            cache_dir = %dir.display(),
            endpoint = %self.config.endpoint,
            "pathway client started"
        );

        for category in [EventCategory::DocumentOpened, EventCategory::NewDocument] {
            let tx = self.inbox_tx.clone();
            self.host.register_listener(
                category,
                Box::new(move |event: &HostEvent| {
                    let _ = tx.send(ForegroundMessage::Host(event.clone()));
                    Vec::new()
                }),
            );
        }
        self.host
            .register_listener(EventCategory::SelectionContextMenu, Box::new(context_menu_entries));

        self.started = true;
        self.refresh_enablement();

        match self.config.startup.clone() {
            Some(startup) => {
                info!(id = %startup.pathway_id, "opening startup pathway");
                let handle = self.spawn_open(
                    DocumentIdentifier::latest(startup.pathway_id),
                    None,
                    Arc::new(NullProgress),
                    OpenOrigin::Startup,
                )?;
                Ok(Some(handle))
            }
            None => Ok(None),
        }
    }

    /// Start a fetch-open invocation in the background.
    ///
    /// The outcome arrives as `ForegroundMessage::OpenFinished`; session state changes only
    /// when the foreground applies it.
    pub fn open_document(
        &self,
        identifier: DocumentIdentifier,
        keys: Option<HashSet<ReferenceKey>>,
        progress: Arc<dyn ProgressSink>,
    ) -> ClientResult<TaskHandle<()>> {
        self.spawn_open(identifier, keys, progress, OpenOrigin::User)
    }

    /// Open a search hit and highlight the elements carrying `key`.
    pub fn open_search_result(
        &self,
        result: &SearchResult,
        key: ReferenceKey,
        progress: Arc<dyn ProgressSink>,
    ) -> ClientResult<TaskHandle<()>> {
        self.open_document(result.info.identifier(), Some(HashSet::from([key])), progress)
    }

    fn spawn_open(
        &self,
        identifier: DocumentIdentifier,
        keys: Option<HashSet<ReferenceKey>>,
        progress: Arc<dyn ProgressSink>,
        origin: OpenOrigin,
    ) -> ClientResult<TaskHandle<()>> {
        self.ensure_accepting()?;
        debug!(id = %identifier, "submitting open document");
        progress.set_task_name("Opening pathway");

        let pipeline = self.pipeline.clone();
        let tx = self.inbox_tx.clone();
        Ok(TaskHandle::spawn(&self.tracker, &self.shutdown, move |task, token| async move {
            let report = pipeline.run(identifier, keys, progress, &token).await;
            // The receiver only goes away with the client.
            let _ = tx.send(ForegroundMessage::OpenFinished {
                task,
                origin,
                report: Box::new(report),
            });
        }))
    }

    /// Run the context-menu action in the background.
    pub fn run_action(
        &self,
        action: ClientAction,
        progress: Arc<dyn ProgressSink>,
    ) -> ClientResult<TaskHandle<GatewayResult<Vec<SearchResult>>>> {
        match action {
            ClientAction::FindPathwaysByReference(key) => {
                self.find_pathways_for_reference(key, progress)
            }
        }
    }

    /// Search for pathways containing `key`. Results do not touch session state.
    pub fn find_pathways_for_reference(
        &self,
        key: ReferenceKey,
        progress: Arc<dyn ProgressSink>,
    ) -> ClientResult<TaskHandle<GatewayResult<Vec<SearchResult>>>> {
        self.ensure_accepting()?;
        let gateway = self.gateway.clone();
        Ok(TaskHandle::spawn(&self.tracker, &self.shutdown, move |_, token| async move {
            let guard = ProgressGuard::new(progress);
            let keys = std::slice::from_ref(&key);
            tokio::select! {
                res = gateway.fetch_by_reference_keys(keys, Some(guard.sink())) => res,
                _ = token.cancelled() => Ok(Vec::new()),
            }
        }))
    }

    fn ensure_accepting(&self) -> ClientResult<()> {
        if self.shutdown.is_cancelled() || self.tracker.is_closed() {
            return Err(ClientError::ShuttingDown);
        }
        Ok(())
    }

    /// Wait for the next inbox message and apply it.
    pub async fn next_message(&mut self) -> Option<ForegroundMessage> {
        let message = self.inbox_rx.recv().await?;
        self.apply(&message);
        Some(message)
    }

    /// Apply every message already waiting in the inbox, in arrival order.
    pub fn process_pending(&mut self) -> Vec<ForegroundMessage> {
        let mut applied = Vec::new();
        while let Ok(message) = self.inbox_rx.try_recv() {
            self.apply(&message);
            applied.push(message);
        }
        applied
    }

    /// Start an invocation and drive the inbox until it completes.
    pub async fn open_and_wait(
        &mut self,
        identifier: DocumentIdentifier,
        keys: Option<HashSet<ReferenceKey>>,
        progress: Arc<dyn ProgressSink>,
    ) -> ClientResult<OpenReport> {
        let handle = self.open_document(identifier, keys, progress)?;
        self.wait_for(handle).await
    }

    /// Drive the inbox until the invocation behind `handle` has been applied.
    pub async fn wait_for(&mut self, handle: TaskHandle<()>) -> ClientResult<OpenReport> {
        let wanted = handle.id();
        loop {
            match self.next_message().await {
                Some(ForegroundMessage::OpenFinished { task, report, .. }) if task == wanted => {
                    return Ok(*report);
                }
                Some(_) => continue,
                None => return Err(ClientError::ShuttingDown),
            }
        }
    }

    /// Apply one message: this is the single foreground completion path.
    fn apply(&mut self, message: &ForegroundMessage) {
        match message {
            ForegroundMessage::OpenFinished { origin, report, .. } => {
                self.complete_open(*origin, report)
            }
            ForegroundMessage::Host(event) => self.handle_host_event(event),
        }
    }

    fn complete_open(&mut self, origin: OpenOrigin, report: &OpenReport) {
        if let Some(update) = &report.session_update {
            self.session.record_opened(update);
        }
        match &report.outcome {
            OpenOutcome::Opened { document, path, .. } => {
                info!(
                    id = %document.id,
                    revision = document.wire_revision(),
                    path = %path.display(),
                    "pathway opened"
                );
                if origin == OpenOrigin::Startup {
                    self.activate_id_mapper(report.species.as_deref());
                }
            }
            OpenOutcome::Cancelled { after } => {
                info!(
                    id = %report.request.id,
                    after = after.map(|s| s.id()),
                    "open document cancelled"
                );
            }
            // Already logged with full context by the pipeline.
            OpenOutcome::Failed(_) => {}
        }
        self.refresh_enablement();
    }

    fn activate_id_mapper(&self, species: Option<&str>) {
        let (Some(startup), Some(species)) = (&self.config.startup, species) else {
            return;
        };
        if species.is_empty() {
            return;
        }
        let connection = startup.id_mapper_connection(species);
        match self.host.activate_id_mapper(&connection) {
            Ok(()) => info!(%connection, "identifier mapping activated"),
            Err(e) => warn!(%connection, error = %e, "could not activate identifier mapping"),
        }
    }

    /// Apply a host notification to session state and refresh enablement.
    ///
    /// Hosts that deliver events through registered listeners never need to call this
    /// directly; the listener posts to the inbox.
    pub fn handle_host_event(&mut self, event: &HostEvent) {
        if self.session.apply_host_event(event, self.pipeline.cache()) {
            debug!(category = event.category().as_str(), "session detached from remote pathway");
        }
        if matches!(event, HostEvent::DocumentOpened { .. } | HostEvent::NewDocument) {
            self.refresh_enablement();
        }
    }

    fn refresh_enablement(&mut self) -> Enablement {
        let enablement = Enablement::compute(&self.session, self.host.has_active_document());
        self.enablement = enablement;
        self.host.apply_enablement(enablement);
        enablement
    }

    pub async fn login(&self, user: &str, password: &str) -> ClientResult<()> {
        self.gateway.login(user, password).await?;
        info!(%user, "logged in to WikiPathways");
        Ok(())
    }

    /// Upload the active document as a new pathway. Requires "create new" to be enabled.
    ///
    /// On success the session is attached to the created pathway.
    pub async fn upload(&mut self, document: &LocalDocumentModel) -> ClientResult<PathwayInfo> {
        if !self.refresh_enablement().can_create_new {
            return Err(ClientError::NotEnabled("create new pathway"));
        }
        let created = self.gateway.upload(document).await?;
        info!(id = %created.id, revision = %created.revision, "pathway created");
        self.session.record_opened(&created.identifier());
        self.refresh_enablement();
        Ok(created)
    }

    /// Push the active document over the pathway it was opened from. Requires "update".
    pub async fn update_current(
        &mut self,
        document: &LocalDocumentModel,
        description: &str,
    ) -> ClientResult<()> {
        if !self.refresh_enablement().can_update {
            return Err(ClientError::NotEnabled("update pathway"));
        }
        let (id, revision) = match self.session.current() {
            Some((id, rev)) => (id.to_string(), rev.parse::<u64>().unwrap_or(0)),
            None => return Err(ClientError::NotEnabled("update pathway")),
        };
        self.gateway.update(document, &id, revision, description).await?;
        info!(%id, revision, "pathway updated");
        Ok(())
    }

    /// Stop accepting work, cancel and wait for in-flight invocations, remove the cache.
    pub async fn shutdown(mut self) -> ClientResult<()> {
        self.tracker.close();
        self.shutdown.cancel();
        self.tracker.wait().await;
        // Completions that arrived while waiting still update the session, for the log.
        self.process_pending();
        let dir = self.cache().dir().to_path_buf();
        self.cache()
            .teardown()
            .await
            .map_err(|e| ClientError::cache_dir(&dir, e))?;
        info!(cache_dir = %dir.display(), "pathway client stopped");
        Ok(())
    }
}

/// Context-menu contribution: "Open pathways containing {key}" for annotated elements.
fn context_menu_entries(event: &HostEvent) -> Vec<MenuEntry> {
    let HostEvent::SelectionContextMenu { element } = event else {
        return Vec::new();
    };
    match &element.reference {
        Some(key) if key.has_namespace() && !key.identifier.trim().is_empty() => vec![MenuEntry {
            label: format!("Open pathways containing {key}"),
            action: ClientAction::FindPathwaysByReference(key.clone()),
        }],
        _ => Vec::new(),
    }
}
