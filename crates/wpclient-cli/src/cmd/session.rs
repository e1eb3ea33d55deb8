use anyhow::Result;
use serde::Serialize;

use wpclient_core::prelude::*;

use crate::args::Cli;
use crate::cmd::{self, Session};
use crate::output;

#[derive(Debug, Serialize)]
pub struct SessionOut {
    pub cache_dir: String,
    pub startup: Option<String>,
    pub outcome: Option<String>,
    pub session: SessionState,
    pub enablement: Enablement,
    pub active_document: Option<String>,
    pub id_mapper: Option<String>,
}

pub async fn run(cli: &Cli) -> Result<()> {
    let Session { mut client, host, startup } = cmd::connect(cli).await?;

    let outcome = match startup {
        Some(handle) => {
            let report = cmd::wait_open(&mut client, handle).await;
            Some(match report {
                Ok(r) => match r.error() {
                    Some(e) => e.user_message(),
                    None if r.is_cancelled() => "cancelled".to_string(),
                    None => "opened".to_string(),
                },
                Err(e) => e.to_string(),
            })
        }
        None => None,
    };

    let out = SessionOut {
        cache_dir: client.cache().dir().display().to_string(),
        startup: client.config().startup.as_ref().map(|s| s.pathway_id.clone()),
        outcome,
        session: client.session().clone(),
        enablement: client.enablement(),
        active_document: host.active_path().map(|p| p.display().to_string()),
        id_mapper: host.id_mapper(),
    };
    client.shutdown().await?;
    output::print(&out)
}
