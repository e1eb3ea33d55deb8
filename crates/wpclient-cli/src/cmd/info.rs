use std::sync::Arc;

use anyhow::Result;

use wpclient_core::prelude::*;
use wpclient_core::progress::ProgressGuard;

use crate::args::Cli;
use crate::cmd;
use crate::host::SpinnerProgress;
use crate::output;

pub async fn run(cli: &Cli, id: &str) -> Result<()> {
    let gw = cmd::gateway(cli)?;
    let guard = ProgressGuard::new(Arc::new(SpinnerProgress::new()));
    let info = gw.pathway_info(id, Some(guard.sink())).await?;
    drop(guard);
    output::print(&info)
}
