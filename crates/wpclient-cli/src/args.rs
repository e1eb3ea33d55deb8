use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};

use wpclient_core::defaults;
use wpclient_core::model::ReferenceKey;

#[derive(Parser, Debug, Clone)]
#[command(name = "wpclient", version, about = "WikiPathways client")]
pub struct Cli {
    /// Emit JSON output on stdout (and JSON logs on stderr).
    #[arg(long, global = true)]
    pub json: bool,

    /// Webservice base URL.
    #[arg(long, global = true, env = "WP_URL", default_value = defaults::ENDPOINT_URL)]
    pub url: String,

    /// Data directory; the session cache is created underneath it.
    #[arg(long, global = true, env = "WP_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Pathway to open as soon as the client starts.
    #[arg(long, global = true, env = "WP_ID")]
    pub wp_id: Option<String>,

    /// Per-request timeout in milliseconds.
    #[arg(
        long,
        global = true,
        env = "WP_TIMEOUT_MS",
        default_value_t = defaults::REQUEST_TIMEOUT_MS
    )]
    pub timeout_ms: u64,

    #[command(subcommand)]
    pub command: Command,
}

/// Webservice credentials for write operations.
#[derive(Args, Debug, Clone, Default)]
pub struct Login {
    #[arg(long, env = "WP_USER")]
    pub user: Option<String>,

    #[arg(long, env = "WP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl Login {
    pub fn require(&self) -> Result<(&str, &str)> {
        match (self.user.as_deref(), self.password.as_deref()) {
            (Some(u), Some(p)) if !u.is_empty() => Ok((u, p)),
            _ => Err(anyhow!("--user and --password (or WP_USER / WP_PASSWORD) are required")),
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Fetch a pathway, cache it and open it.
    Open {
        /// Pathway id, e.g. WP4.
        id: String,

        /// Revision to open (default: latest).
        #[arg(long)]
        revision: Option<u64>,

        /// Highlight elements annotated with this reference (NAMESPACE:ID). Repeatable.
        #[arg(long = "highlight", value_name = "NAMESPACE:ID")]
        highlight: Vec<ReferenceKey>,

        /// Copy the opened document here before the cache is removed.
        #[arg(long)]
        to: Option<PathBuf>,
    },

    /// Start the client (honouring --wp-id) and print session state and enablement.
    Session,

    /// Search pathways by text, literature reference or cross reference.
    Search {
        #[arg(required_unless_present = "reference")]
        query: Option<String>,

        /// Restrict a text search to one species.
        #[arg(long)]
        organism: Option<String>,

        /// Treat the query as a literature reference.
        #[arg(long, conflicts_with = "organism")]
        literature: bool,

        /// Find pathways containing this reference (NAMESPACE:ID).
        #[arg(long, value_name = "NAMESPACE:ID", conflicts_with_all = ["query", "literature"])]
        reference: Option<ReferenceKey>,
    },

    /// List pathways, optionally by species and/or curation tag.
    Browse {
        #[arg(long)]
        organism: Option<String>,

        #[arg(long)]
        tag: Option<String>,
    },

    /// List the species known to the webservice.
    Organisms,

    /// Show summary information for a pathway.
    Info { id: String },

    /// List the curation tags of a pathway, or save one with --save.
    Tags {
        id: String,

        /// Tag name to save.
        #[arg(long, requires = "revision")]
        save: Option<String>,

        /// Tag text.
        #[arg(long, default_value = "")]
        text: String,

        /// Revision the tag applies to.
        #[arg(long)]
        revision: Option<u64>,

        #[command(flatten)]
        login: Login,
    },

    /// List the cross references of a pathway in one database.
    Xref {
        id: String,

        #[arg(long, default_value = "Entrez Gene")]
        namespace: String,
    },

    /// Upload a local GPML file as a new pathway.
    Upload {
        file: PathBuf,

        #[command(flatten)]
        login: Login,
    },

    /// Replace a pathway with a local GPML file.
    Update {
        id: String,

        file: PathBuf,

        /// Revision the edit is based on (default: latest).
        #[arg(long)]
        revision: Option<u64>,

        #[arg(long, default_value = "Updated from wpclient")]
        description: String,

        #[command(flatten)]
        login: Login,
    },

    /// Run environment and connectivity checks.
    Doctor,
}
