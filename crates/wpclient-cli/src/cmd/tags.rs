use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::Serialize;

use wpclient_core::prelude::*;
use wpclient_core::progress::ProgressGuard;

use crate::args::{Cli, Login};
use crate::cmd;
use crate::host::SpinnerProgress;
use crate::output;

#[derive(Debug, Serialize)]
pub struct TagsOut {
    pub id: String,
    pub count: usize,
    pub tags: Vec<CurationTag>,
}

#[derive(Debug, Serialize)]
pub struct TagSavedOut {
    pub id: String,
    pub tag: String,
    pub revision: u64,
}

pub async fn run(
    cli: &Cli,
    id: &str,
    save: Option<&str>,
    text: &str,
    revision: Option<u64>,
    login: &Login,
) -> Result<()> {
    let gw = cmd::gateway(cli)?;

    if let Some(tag) = save {
        let revision = revision.ok_or_else(|| anyhow!("--revision is required with --save"))?;
        let (user, password) = login.require()?;
        gw.login(user, password).await?;
        gw.update_curation_tag(tag, id, text, revision).await?;
        output::status("Saved", true, &format!("{tag} on {id} r{revision}"));
        return output::print(&TagSavedOut {
            id: id.to_string(),
            tag: tag.to_string(),
            revision,
        });
    }

    let guard = ProgressGuard::new(Arc::new(SpinnerProgress::new()));
    let found = gw.curation_tags(id, Some(guard.sink())).await?;
    drop(guard);

    let mut tags: Vec<CurationTag> = found.into_iter().collect();
    tags.sort_by(|a, b| a.name.cmp(&b.name));
    output::print(&TagsOut {
        id: id.to_string(),
        count: tags.len(),
        tags,
    })
}
