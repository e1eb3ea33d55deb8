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
pub struct OrganismsOut {
    pub count: usize,
    pub organisms: Vec<String>,
}

pub async fn run(cli: &Cli) -> Result<()> {
    let gw = cmd::gateway(cli)?;
    let guard = ProgressGuard::new(Arc::new(SpinnerProgress::new()));
    let organisms = gw.list_organisms(Some(guard.sink())).await?;
    drop(guard);

    output::print(&OrganismsOut {
        count: organisms.len(),
        organisms,
    })
}
