//! Fetch-open pipeline.
//!
//! One invocation runs these steps strictly in order:
//! - `fetch`: ask the gateway for the pathway
//! - `convert`: turn the payload into a `LocalDocumentModel`
//! - `persist`: write it to the session cache, replacing older content
//! - `open`: hand the cache path to the host
//! - `update-state`: stage the session update (committed by the foreground)
//! - `highlight`: emphasize elements matching the requested reference keys, if any
//!
//! Each step may end the invocation. Cancellation is checked only between steps; a step
//! that has started always runs to completion. Nothing a completed step did is rolled
//! back: a cache file written before a failure stays until session teardown.

use std::collections::HashSet;
use std::error::Error as StdError;
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::cache::DocumentCache;
use crate::convert::{DocumentConverter, GpmlConverter};
use crate::gateway::QueryGateway;
use crate::highlight::highlight;
use crate::host::DocumentHost;
use crate::model::{DocumentIdentifier, ReferenceKey};
use crate::progress::{ProgressGuard, ProgressSink};

mod outcome;

pub use outcome::{OpenError, OpenErrorKind, OpenOutcome, OpenReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Step {
    Fetch,
    Convert,
    Persist,
    Open,
    UpdateState,
    Highlight,
}

impl Step {
    pub fn id(&self) -> &'static str {
        match self {
            Step::Fetch => "fetch",
            Step::Convert => "convert",
            Step::Persist => "persist",
            Step::Open => "open",
            Step::UpdateState => "update-state",
            Step::Highlight => "highlight",
        }
    }
}

/// The fetch-open pipeline over a gateway and a host.
pub struct FetchOpenPipeline<G, H> {
    gateway: Arc<G>,
    host: Arc<H>,
    cache: DocumentCache,
    converter: Arc<dyn DocumentConverter>,
}

impl<G, H> Clone for FetchOpenPipeline<G, H> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            host: self.host.clone(),
            cache: self.cache.clone(),
            converter: self.converter.clone(),
        }
    }
}

impl<G: QueryGateway, H: DocumentHost> FetchOpenPipeline<G, H> {
    pub fn new(gateway: Arc<G>, host: Arc<H>, cache: DocumentCache) -> Self {
        Self {
            gateway,
            host,
            cache,
            converter: Arc::new(GpmlConverter),
        }
    }

    pub fn with_converter(mut self, converter: Arc<dyn DocumentConverter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    /// Run one invocation to its terminal outcome.
    ///
    /// The progress sink is closed before this returns, whatever the outcome.
    pub async fn run(
        &self,
        request: DocumentIdentifier,
        keys: Option<HashSet<ReferenceKey>>,
        progress: Arc<dyn ProgressSink>,
        cancel: &CancellationToken,
    ) -> OpenReport {
        let guard = ProgressGuard::new(progress);
        let mut report = OpenReport::new(request.clone());

        let result = self
            .execute(&request, keys.as_ref(), guard.sink(), cancel, &mut report)
            .await;
        report.outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(
                    operation = "open_document",
                    id = %request.id,
                    revision = request.wire_revision(),
                    kind = err.kind().as_str(),
                    error = %error_chain(&err),
                    "open document failed"
                );
                OpenOutcome::Failed(err)
            }
        };

        if let OpenOutcome::Cancelled { after } = &report.outcome {
            debug!(id = %request.id, after = after.map(|s| s.id()), "open document cancelled");
        }
        report
    }

    async fn execute(
        &self,
        request: &DocumentIdentifier,
        keys: Option<&HashSet<ReferenceKey>>,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
        report: &mut OpenReport,
    ) -> Result<OpenOutcome, OpenError> {
        macro_rules! boundary {
            () => {
                if cancel.is_cancelled() {
                    return Ok(OpenOutcome::Cancelled {
                        after: report.completed.last().copied(),
                    });
                }
            };
        }

        boundary!();
        begin(Step::Fetch);
        let remote = self
            .gateway
            .fetch_by_id(request, Some(progress))
            .await
            .map_err(|e| OpenError::from_fetch(request, e))?;
        end(Step::Fetch, report);

        boundary!();
        begin(Step::Convert);
        progress.report("Converting pathway");
        let model = self
            .converter
            .convert(&remote)
            .map_err(|e| OpenError::ConversionFailed {
                id: remote.identifier(),
                reason: e.to_string(),
            })?;
        report.species = Some(model.species.clone());
        end(Step::Convert, report);

        boundary!();
        begin(Step::Persist);
        progress.report("Saving to cache");
        let path = self
            .cache
            .write(&remote.id, remote.revision, &model)
            .await
            .map_err(|source| OpenError::CacheWriteFailed {
                path: self.cache.entry_path(&remote.id, remote.revision),
                source,
            })?;
        end(Step::Persist, report);

        boundary!();
        begin(Step::Open);
        progress.report("Opening pathway");
        self.host
            .open_document(&path)
            .map_err(|source| OpenError::OpenFailed {
                path: path.clone(),
                source,
            })?;
        end(Step::Open, report);

        boundary!();
        begin(Step::UpdateState);
        let document = remote.identifier();
        report.session_update = Some(document.clone());
        end(Step::UpdateState, report);

        let mut highlighted = None;
        if let Some(keys) = keys.filter(|k| !k.is_empty()) {
            boundary!();
            begin(Step::Highlight);
            progress.report("Highlighting matching elements");
            if let Some(view) = self.host.active_view() {
                highlighted = highlight(view.as_ref(), keys);
                if let Some(region) = highlighted {
                    view.scroll_to(region);
                }
            }
            end(Step::Highlight, report);
        }

        Ok(OpenOutcome::Opened {
            document,
            path,
            highlighted,
        })
    }
}

fn begin(step: Step) {
    debug!(step = step.id(), "pipeline step start");
}

fn end(step: Step, report: &mut OpenReport) {
    report.completed.push(step);
    debug!(step = step.id(), "pipeline step end");
}

/// `err: cause: cause...` for log lines.
pub(crate) fn error_chain(err: &dyn StdError) -> String {
    let mut out = err.to_string();
    let mut cur = err.source();
    while let Some(e) = cur {
        out.push_str(": ");
        out.push_str(&e.to_string());
        cur = e.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostError;

    #[test]
    fn step_ids_are_stable() {
        let ids: Vec<_> = [
            Step::Fetch,
            Step::Convert,
            Step::Persist,
            Step::Open,
            Step::UpdateState,
            Step::Highlight,
        ]
        .iter()
        .map(Step::id)
        .collect();
        assert_eq!(ids, ["fetch", "convert", "persist", "open", "update-state", "highlight"]);
    }

    #[test]
    fn error_chain_includes_sources() {
        let err = OpenError::OpenFailed {
            path: "/c/WP4.r1.gpml".into(),
            source: HostError::new("unsupported format"),
        };
        let chain = error_chain(&err);
        assert_eq!(chain, "host failed to open /c/WP4.r1.gpml: unsupported format");
    }
}
