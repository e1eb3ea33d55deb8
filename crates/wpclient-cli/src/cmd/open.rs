use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;

use wpclient_core::prelude::*;

use crate::args::Cli;
use crate::cmd::{self, Session};
use crate::host::{CliHost, SpinnerProgress};
use crate::output;

#[derive(Debug, Serialize)]
pub struct OpenOut {
    pub status: &'static str,
    pub id: String,
    pub revision: Option<u64>,
    pub path: Option<String>,
    pub completed: Vec<Step>,
    pub highlighted: Option<Region>,
    pub emphasized: Vec<String>,
    pub session: SessionState,
    pub enablement: Enablement,
    pub exported_to: Option<String>,
    pub error: Option<OpenErrorKind>,
}

pub async fn run(
    cli: &Cli,
    id: &str,
    revision: Option<u64>,
    highlight: &[ReferenceKey],
    to: Option<&Path>,
) -> Result<()> {
    let Session { mut client, host, .. } = cmd::connect(cli).await?;

    let keys = (!highlight.is_empty()).then(|| highlight.iter().cloned().collect::<HashSet<_>>());
    let identifier = DocumentIdentifier::new(id, revision);
    let result = open_and_report(&mut client, &host, identifier, keys, to).await;

    // Removes the cache; exports were copied out already.
    client.shutdown().await?;
    result
}

async fn open_and_report(
    client: &mut cmd::Client,
    host: &CliHost,
    identifier: DocumentIdentifier,
    keys: Option<HashSet<ReferenceKey>>,
    to: Option<&Path>,
) -> Result<()> {
    let handle = client.open_document(identifier, keys, Arc::new(SpinnerProgress::new()))?;
    let report = cmd::wait_open(client, handle).await?;
    report_open(client, host, &report, to)
}

fn report_open(
    client: &cmd::Client,
    host: &CliHost,
    report: &OpenReport,
    to: Option<&Path>,
) -> Result<()> {
    let mut out = OpenOut {
        status: "opened",
        id: report.request.id.clone(),
        revision: report.request.revision,
        path: None,
        completed: report.completed.clone(),
        highlighted: None,
        emphasized: host.view().map(|v| v.emphasized()).unwrap_or_default(),
        session: client.session().clone(),
        enablement: client.enablement(),
        exported_to: None,
        error: report.error_kind(),
    };

    match &report.outcome {
        OpenOutcome::Opened { document, path, highlighted } => {
            out.revision = document.revision;
            out.path = Some(path.display().to_string());
            out.highlighted = *highlighted;
            if let Some(dest) = to {
                fs::copy(path, dest).with_context(|| format!("export to {}", dest.display()))?;
                out.exported_to = Some(dest.display().to_string());
            }
            output::status("Opened", true, &format!("{} ({})", document, path.display()));
        }
        OpenOutcome::Cancelled { .. } => {
            out.status = "cancelled";
            output::status("Cancelled", false, &report.request.to_string());
        }
        OpenOutcome::Failed(_) => out.status = "failed",
    }

    output::print(&out)?;
    cmd::require_opened(report).map_err(|e| anyhow!("{}: {e}", report.request))
}
