// src/lib.rs

pub mod api;
pub mod channel;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod render;
pub mod session;
pub mod state;
pub mod sync;
pub mod types;

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::api::{HttpLiveApi, LiveApi};
use crate::channel::WsChannelBackend;
use crate::cli::{CliArgs, Command};
use crate::config::load_config;
use crate::config::model::ConfigFile;
use crate::render::{describe_changes, format_header, render_summary};
use crate::session::LiveSession;
use crate::state::ExecutionState;
use crate::types::{ControlAction, ExecutionId};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the HTTP client and websocket backend
/// - the live session for the requested execution
/// - Ctrl-C handling (for `watch`)
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_config(args.config.as_deref(), args.api_url.as_deref())?;
    info!(
        api = %cfg.server.api_url,
        stream = %cfg.server.stream_url,
        "configuration loaded"
    );

    let execution_id = args.command.execution_id().clone();
    match args.command.control_action() {
        Some(action) => run_control(&cfg, execution_id, action).await,
        None => match args.command {
            Command::Show { .. } => run_show(&cfg, execution_id).await,
            _ => run_watch(&cfg, execution_id).await,
        },
    }
}

/// Build a session against the configured backend.
///
/// Must be called from within a Tokio runtime.
pub fn open_session(cfg: &ConfigFile, execution_id: ExecutionId) -> errors::Result<LiveSession> {
    let api = Arc::new(HttpLiveApi::new(
        cfg.server.api_url.clone(),
        cfg.server.request_timeout,
    )?);
    let stream_url = cfg.server.stream_url.clone();

    Ok(LiveSession::spawn(
        execution_id,
        cfg.engine_options(),
        api,
        move |events_tx| WsChannelBackend::new(stream_url, events_tx),
    ))
}

/// Read-only view: one snapshot, no stream.
async fn run_show(cfg: &ConfigFile, execution_id: ExecutionId) -> Result<()> {
    let api = HttpLiveApi::new(cfg.server.api_url.clone(), cfg.server.request_timeout)?;
    let snapshot = api.fetch_snapshot(&execution_id).await?;

    let mut state = ExecutionState::new(execution_id);
    sync::seed(&mut state, snapshot);
    print!("{}", render_summary(&state));
    Ok(())
}

/// Follow an execution until it reaches a terminal status or Ctrl-C.
async fn run_watch(cfg: &ConfigFile, execution_id: ExecutionId) -> Result<()> {
    let session = open_session(cfg, execution_id)?;
    let mut updates = session.subscribe();

    let status = session.connect().await?;
    let mut last = updates.borrow_and_update().clone();
    print!("{}", render_summary(&last));

    if status.is_terminal() {
        info!(%status, "execution already finished; nothing to follow");
        session.shutdown().await?;
        return Ok(());
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    warn!("live session ended unexpectedly");
                    break;
                }
                let next = updates.borrow_and_update().clone();
                for line in describe_changes(&last, &next) {
                    println!("{line}");
                }
                last = next;

                if last.control_status.is_terminal() {
                    info!(status = %last.control_status, "execution finished");
                    break;
                }
            }
            res = &mut ctrl_c => {
                if let Err(e) = res {
                    warn!(error = %e, "failed to listen for Ctrl+C");
                }
                info!("interrupted; disconnecting");
                break;
            }
        }
    }

    println!("{}", format_header(&last));
    session.shutdown().await?;
    Ok(())
}

/// Connect, dispatch one control action, report the resulting status.
async fn run_control(
    cfg: &ConfigFile,
    execution_id: ExecutionId,
    action: ControlAction,
) -> Result<()> {
    let session = open_session(cfg, execution_id.clone())?;

    let outcome = match session.connect().await {
        Ok(_) => session.control(action).await,
        Err(e) => Err(e),
    };

    session.shutdown().await?;

    let status = outcome?;
    println!("execution {execution_id}: {action} accepted, now {status}");
    Ok(())
}
