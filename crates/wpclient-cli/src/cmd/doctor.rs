use anyhow::Result;
use serde::Serialize;

use wpclient_core::prelude::*;

use crate::args::Cli;
use crate::cmd;
use crate::output;

#[derive(Debug, Serialize)]
pub struct Check {
    pub name: String,
    pub ok: bool,
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct DoctorOut {
    pub ok: bool,
    pub checks: Vec<Check>,
}

pub async fn run(cli: &Cli) -> Result<()> {
    let mut checks = Vec::new();

    let cfg = match cmd::config(cli) {
        Ok(cfg) => {
            checks.push(Check {
                name: "config".to_string(),
                ok: true,
                detail: format!("endpoint {}", cfg.endpoint),
            });
            cfg
        }
        Err(e) => {
            checks.push(Check {
                name: "config".to_string(),
                ok: false,
                detail: e.to_string(),
            });
            return output::print(&DoctorOut { ok: false, checks });
        }
    };

    // Round-trip a scratch cache next to the real one.
    let scratch = DocumentCache::new(cfg.data_dir.join(format!("{}-doctor", cfg.cache_subdir)));
    let cache_ok = match scratch.create().await {
        Ok(()) => scratch.teardown().await.map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    checks.push(Check {
        name: "data_dir".to_string(),
        ok: cache_ok.is_ok(),
        detail: match cache_ok {
            Ok(()) => format!("{} is writable", cfg.data_dir.display()),
            Err(e) => e,
        },
    });

    let gw = cmd::gateway(cli)?;
    let reach = gw.list_organisms(None).await;
    checks.push(Check {
        name: "webservice".to_string(),
        ok: reach.is_ok(),
        detail: match reach {
            Ok(organisms) => format!("{} organisms listed", organisms.len()),
            Err(e) => e.to_string(),
        },
    });

    let ok = checks.iter().all(|c| c.ok);
    output::print(&DoctorOut { ok, checks })
}
