use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;

use wpclient_core::prelude::*;

use crate::args::{Cli, Login};
use crate::cmd::{self, upload::load_document, Client, Session};
use crate::host::SpinnerProgress;
use crate::output;

#[derive(Debug, Serialize)]
pub struct UpdateOut {
    pub id: String,
    pub base_revision: String,
    pub description: String,
}

pub async fn run(
    cli: &Cli,
    id: &str,
    file: &Path,
    revision: Option<u64>,
    description: &str,
    login: &Login,
) -> Result<()> {
    let (user, password) = login.require()?;
    let document = load_document(file)?;

    let Session { mut client, .. } = cmd::connect(cli).await?;
    let identifier = DocumentIdentifier::new(id, revision);
    let result =
        open_then_update(&mut client, identifier, &document, description, user, password).await;
    client.shutdown().await?;

    let out = result?;
    output::status("Updated", true, &format!("{} (based on r{})", out.id, out.base_revision));
    output::print(&out)
}

/// Attach the session to the remote pathway, then push the local file over it.
async fn open_then_update(
    client: &mut Client,
    identifier: DocumentIdentifier,
    document: &LocalDocumentModel,
    description: &str,
    user: &str,
    password: &str,
) -> Result<UpdateOut> {
    let handle = client.open_document(identifier, None, Arc::new(SpinnerProgress::new()))?;
    let report = cmd::wait_open(client, handle).await?;
    cmd::require_opened(&report)?;

    client.login(user, password).await?;
    client.update_current(document, description).await?;

    let (id, base_revision) = client
        .session()
        .current()
        .map(|(id, rev)| (id.to_string(), rev.to_string()))
        .unwrap_or_default();
    Ok(UpdateOut {
        id,
        base_revision,
        description: description.to_string(),
    })
}
