use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;

use wpclient_core::prelude::*;
use wpclient_core::progress::ProgressGuard;

use crate::args::Cli;
use crate::cmd;
use crate::host::SpinnerProgress;
use crate::output;

#[derive(Debug, Serialize)]
pub struct BrowseOut {
    pub organism: Option<String>,
    pub tag: Option<String>,
    pub count: usize,
    pub pathways: Vec<PathwayInfo>,
}

pub async fn run(cli: &Cli, organism: Option<&str>, tag: Option<&str>) -> Result<()> {
    let gw = cmd::gateway(cli)?;
    let guard = ProgressGuard::new(Arc::new(SpinnerProgress::new()));
    let progress = Some(guard.sink());

    let found = match (organism, tag) {
        (None, None) => gw.browse_all(progress).await?,
        (Some(o), None) => gw.browse_by_organism(o, progress).await?,
        (None, Some(t)) => gw.browse_by_curation_tag(t, progress).await?,
        (Some(o), Some(t)) => gw.browse_by_organism_and_curation_tag(o, t, progress).await?,
    };
    drop(guard);

    let mut pathways: Vec<PathwayInfo> = found.into_iter().collect();
    pathways.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.revision.cmp(&b.revision)));

    output::print(&BrowseOut {
        organism: organism.map(str::to_string),
        tag: tag.map(str::to_string),
        count: pathways.len(),
        pathways,
    })
}
