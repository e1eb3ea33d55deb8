use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use wpclient_core::convert::parse_gpml;
use wpclient_core::prelude::*;

use crate::args::{Cli, Login};
use crate::cmd::{self, Session};
use crate::output;

#[derive(Debug, Serialize)]
pub struct UploadOut {
    pub created: PathwayInfo,
    pub session: SessionState,
    pub enablement: Enablement,
}

/// Read a GPML file into a document model.
pub fn load_document(file: &Path) -> Result<LocalDocumentModel> {
    let text = fs::read_to_string(file).with_context(|| format!("read {}", file.display()))?;
    parse_gpml(&text).with_context(|| format!("parse {}", file.display()))
}

pub async fn run(cli: &Cli, file: &Path, login: &Login) -> Result<()> {
    let (user, password) = login.require()?;
    let document = load_document(file)?;

    let Session { mut client, host, .. } = cmd::connect(cli).await?;
    // A local file with no remote origin is a new document as far as the session is concerned.
    host.new_document(&document);
    client.process_pending();

    let result = async {
        client.login(user, password).await?;
        let created = client.upload(&document).await?;
        Ok::<_, anyhow::Error>(created)
    }
    .await;

    let out = result.map(|created| UploadOut {
        created,
        session: client.session().clone(),
        enablement: client.enablement(),
    });
    client.shutdown().await?;

    let out = out?;
    output::status("Created", true, &format!("{} r{}", out.created.id, out.created.revision));
    output::print(&out)
}
