use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::Serialize;

use wpclient_core::prelude::*;
use wpclient_core::progress::ProgressGuard;

use crate::args::Cli;
use crate::cmd::{self, Session};
use crate::host::SpinnerProgress;
use crate::output;

#[derive(Debug, Serialize)]
pub struct SearchOut {
    pub query: String,
    pub kind: &'static str,
    pub count: usize,
    pub results: Vec<SearchResult>,
}

pub async fn run(
    cli: &Cli,
    query: Option<&str>,
    organism: Option<&str>,
    literature: bool,
    reference: Option<ReferenceKey>,
) -> Result<()> {
    let (query, kind, results) = match (reference, query) {
        (Some(key), _) => (key.to_string(), "reference", by_reference(cli, key).await?),
        (None, Some(text)) => {
            let gw = cmd::gateway(cli)?;
            let guard = ProgressGuard::new(Arc::new(SpinnerProgress::new()));
            let results = if literature {
                gw.find_by_literature_reference(text, Some(guard.sink())).await?
            } else {
                gw.search_by_text(text, organism, Some(guard.sink())).await?
            };
            (text.to_string(), if literature { "literature" } else { "text" }, results)
        }
        (None, None) => return Err(anyhow!("a query or --reference is required")),
    };

    output::print(&SearchOut {
        query,
        kind,
        count: results.len(),
        results,
    })
}

/// Runs the "open pathways containing" action the way the context menu does.
async fn by_reference(cli: &Cli, key: ReferenceKey) -> Result<Vec<SearchResult>> {
    let Session { client, .. } = cmd::connect(cli).await?;
    let action = ClientAction::FindPathwaysByReference(key);
    let result = match client.run_action(action, Arc::new(SpinnerProgress::new())) {
        Ok(handle) => {
            let interrupt = cmd::cancel_on_interrupt(&handle);
            let joined = handle.join().await;
            interrupt.abort();
            joined.map_err(anyhow::Error::from).and_then(|r| r.map_err(Into::into))
        }
        Err(e) => Err(e.into()),
    };
    client.shutdown().await?;
    result
}
