use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    ActionDispatcher, CommandExecutor, IdentityProvider, MissingIdentityProvider,
    RestIdentityProvider, ScriptCommandExecutor, SessionManager, Workspace,
};
use storage::{prepare_database_url, SessionStore, SqliteSessionStore};
use tokio::io::{stdin, stdout, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod render;
mod shell;

use config::{load_settings, SettingsOverrides};

#[derive(Parser, Debug)]
#[command(name = "securedoc", about = "Terminal client for the document workspace")]
struct Args {
    #[command(flatten)]
    settings: SettingsOverrides,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let settings = load_settings(&args.settings)?;

    let database_url = prepare_database_url(&settings.database_url)?;
    let store = SqliteSessionStore::new(&database_url)
        .await
        .map_err(|error| {
            error!(%database_url, %error, "failed to open session database");
            error
        })?;
    let store: Arc<dyn SessionStore> = Arc::new(store);

    let identity: Arc<dyn IdentityProvider> = if settings.api_key.is_empty() {
        warn!("no api_key configured; sign-in and signup are unavailable");
        Arc::new(MissingIdentityProvider)
    } else {
        Arc::new(
            RestIdentityProvider::new(
                &settings.identity_url,
                &settings.token_url,
                settings.api_key.clone(),
            )
            .context("failed to configure identity provider")?,
        )
    };
    let executor: Arc<dyn CommandExecutor> = Arc::new(ScriptCommandExecutor::new(
        settings.backend_program.clone(),
        settings.backend_dir.clone(),
        settings.download_dir.clone(),
    ));

    let sessions = SessionManager::with_policy(identity, store, settings.verification_policy());
    let workspace = Arc::new(Workspace::new(sessions, ActionDispatcher::new(executor)));
    if let Some(session) = workspace.restore().await {
        info!(user_id = %session.user_id, "resuming previous session");
    }

    shell::run(workspace, BufReader::new(stdin()), stdout()).await
}
