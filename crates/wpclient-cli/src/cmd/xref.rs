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
pub struct XrefOut {
    pub id: String,
    pub namespace: String,
    pub count: usize,
    pub xrefs: Vec<String>,
}

pub async fn run(cli: &Cli, id: &str, namespace: &str) -> Result<()> {
    let gw = cmd::gateway(cli)?;
    let guard = ProgressGuard::new(Arc::new(SpinnerProgress::new()));
    let xrefs = gw.xref_list(id, namespace, Some(guard.sink())).await?;
    drop(guard);

    output::print(&XrefOut {
        id: id.to_string(),
        namespace: namespace.to_string(),
        count: xrefs.len(),
        xrefs,
    })
}
