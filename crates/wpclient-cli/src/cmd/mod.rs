use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::warn;

use wpclient_core::config::{validate_config, ClientConfig, EndpointSetting, StartupParameter};
use wpclient_core::prelude::*;
use wpclient_webservice::WebserviceGateway;

use crate::args::{Cli, Command};
use crate::host::CliHost;

mod browse;
mod doctor;
mod info;
mod open;
mod organisms;
mod search;
mod session;
mod tags;
mod update;
mod upload;
mod xref;

pub type Client = PathwayClient<WebserviceGateway, CliHost>;

pub async fn dispatch(cli: Cli) -> Result<()> {
    match &cli.command {
        Command::Open { id, revision, highlight, to } => {
            open::run(&cli, id, *revision, highlight, to.as_deref()).await
        }
        Command::Session => session::run(&cli).await,
        Command::Search { query, organism, literature, reference } => {
            let (query, organism) = (query.as_deref(), organism.as_deref());
            search::run(&cli, query, organism, *literature, reference.clone()).await
        }
        Command::Browse { organism, tag } => {
            browse::run(&cli, organism.as_deref(), tag.as_deref()).await
        }
        Command::Organisms => organisms::run(&cli).await,
        Command::Info { id } => info::run(&cli, id).await,
        Command::Tags { id, save, text, revision, login } => {
            tags::run(&cli, id, save.as_deref(), text, *revision, login).await
        }
        Command::Xref { id, namespace } => xref::run(&cli, id, namespace).await,
        Command::Upload { file, login } => upload::run(&cli, file, login).await,
        Command::Update { id, file, revision, description, login } => {
            update::run(&cli, id, file, *revision, description, login).await
        }
        Command::Doctor => doctor::run(&cli).await,
    }
}

/// Client configuration from flags and environment.
pub fn config(cli: &Cli) -> Result<ClientConfig> {
    let mut cfg = ClientConfig::default().with_endpoint(cli.url.clone());
    if let Some(dir) = &cli.data_dir {
        cfg = cfg.with_data_dir(dir);
    }
    if let Some(id) = &cli.wp_id {
        cfg = cfg.with_startup(StartupParameter::new(id.clone()));
    }
    cfg.request_timeout_ms = cli.timeout_ms;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Gateway for commands that only query the service.
pub fn gateway(cli: &Cli) -> Result<WebserviceGateway> {
    let cfg = config(cli)?;
    Ok(wpclient_webservice::gateway(
        EndpointSetting::new(cfg.endpoint),
        Duration::from_millis(cfg.request_timeout_ms),
    ))
}

/// A started client with its host and the startup invocation, if any.
pub struct Session {
    pub client: Client,
    pub host: Arc<CliHost>,
    pub startup: Option<TaskHandle<()>>,
}

pub async fn connect(cli: &Cli) -> Result<Session> {
    let cfg = config(cli)?;
    let gateway = Arc::new(wpclient_webservice::gateway(
        EndpointSetting::new(cfg.endpoint.clone()),
        Duration::from_millis(cfg.request_timeout_ms),
    ));
    let host = Arc::new(CliHost::new());
    let mut client = PathwayClient::new(cfg, gateway, host.clone())?;
    let startup = client.start().await?;
    Ok(Session { client, host, startup })
}

/// Cancel the invocation when the user presses Ctrl-C.
pub fn cancel_on_interrupt<T>(handle: &TaskHandle<T>) -> JoinHandle<()> {
    let token = handle.token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted; cancelling at the next step boundary");
            token.cancel();
        }
    })
}

/// Wait for an open invocation, honouring Ctrl-C.
pub async fn wait_open(client: &mut Client, handle: TaskHandle<()>) -> Result<OpenReport> {
    let interrupt = cancel_on_interrupt(&handle);
    let report = client.wait_for(handle).await;
    interrupt.abort();
    Ok(report?)
}

/// Turn a failed or cancelled invocation into an error carrying the user-facing message.
pub fn require_opened(report: &OpenReport) -> Result<()> {
    match &report.outcome {
        OpenOutcome::Opened { .. } => Ok(()),
        OpenOutcome::Cancelled { .. } => Err(anyhow::anyhow!("cancelled")),
        OpenOutcome::Failed(err) => Err(anyhow::anyhow!(err.user_message())),
    }
}
