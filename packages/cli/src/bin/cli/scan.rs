// ABOUTME: The scanner portal in the terminal
// ABOUTME: Acquires a token by URL, cache, or manual entry, then validates it

use std::sync::Arc;

use async_trait::async_trait;
use colored::*;
use tracing::info;

use labgate_cli::Config;
use labgate_client::ValidatorClient;
use labgate_core::{Identity, UserKind};
use labgate_detect::{CameraAccess, DetectError, DetectResult, VideoStream};
use labgate_scanner::{ScanError, ScannerFlow, SubmitOutcome, TokenSource};
use labgate_storage::{LocalStore, SessionCache};

/// A terminal session has no camera to offer; opening always fails so
/// the flow takes its manual-entry path.
struct NoCamera;

#[async_trait]
impl CameraAccess for NoCamera {
    async fn open(&self) -> DetectResult<Box<dyn VideoStream>> {
        Err(DetectError::PermissionDenied(
            "no camera device in a terminal session".to_string(),
        ))
    }
}

pub async fn handle_scan(
    config: Config,
    kind: UserKind,
    url: Option<String>,
    token: Option<String>,
) -> anyhow::Result<()> {
    let client = ValidatorClient::new(&config.api_base)?;
    let store = LocalStore::new(&config.data_dir);
    let mut flow = ScannerFlow::new(kind, client, store, Arc::new(SessionCache::new()));
    flow.hydrate().await;
    complete_identity(&mut flow)?;

    let entry = flow.enter_scan(url.as_deref());

    let outcome = if let Some(acquired) = entry {
        announce_source(acquired.source);
        flow.submit(&acquired.token, acquired.source).await
    } else if let Some(raw) = token {
        flow.submit_manual(&raw).await
    } else {
        // Probe capture capability; in a terminal this degrades to the
        // manual-entry path rather than dead-ending.
        let (tx, _rx) = tokio::sync::mpsc::channel(1);
        if let Err(e) = flow.start_capture(&NoCamera, None, None, tx).await {
            info!("Capture unavailable, falling back to manual entry: {e}");
        }
        let raw = inquire::Text::new("Reader token:").prompt()?;
        flow.submit_manual(&raw).await
    };

    match outcome {
        Ok(outcome) => render_outcome(outcome),
        Err(e @ (ScanError::IncompleteIdentity | ScanError::MissingToken)) => {
            println!("{} {}", "Datos incompletos:".yellow().bold(), e);
        }
        Err(e) => {
            flow.teardown().await;
            return Err(e.into());
        }
    }

    flow.teardown().await;
    Ok(())
}

fn complete_identity(flow: &mut ScannerFlow) -> anyhow::Result<()> {
    let current = flow.identity().clone();
    if current.is_complete() {
        return Ok(());
    }

    let name = prompt("Nombre", &current.name)?;
    let surname = prompt("Apellido", &current.surname)?;
    let email = prompt("Correo institucional", &current.email)?;
    flow.set_identity(Identity::new(name, surname, email));
    Ok(())
}

fn prompt(label: &str, default: &str) -> anyhow::Result<String> {
    let mut text = inquire::Text::new(label);
    if !default.is_empty() {
        text = text.with_default(default);
    }
    Ok(text.prompt()?)
}

fn announce_source(source: TokenSource) {
    match source {
        TokenSource::EntryUrl => println!("{}", "Token taken from the entry address".cyan()),
        TokenSource::SessionCache => {
            println!("{}", "Token recovered from the session cache".cyan())
        }
        TokenSource::Camera | TokenSource::Manual => {}
    }
}

fn render_outcome(outcome: SubmitOutcome) {
    match outcome {
        SubmitOutcome::Granted(result) => {
            println!(
                "{} {}",
                format!("Acceso {}", result.tipo.as_deref().unwrap_or("registrado"))
                    .green()
                    .bold(),
                result.message.as_deref().unwrap_or("")
            );
            if let Some(station) = result.station_id.as_deref() {
                println!("Estación: {station}");
            }
        }
        SubmitOutcome::Denied { reason, .. } => {
            println!("{} {}", "Acceso denegado:".red().bold(), reason);
        }
        SubmitOutcome::ContactFailure(message) => {
            println!("{} {}", "Error:".red().bold(), message);
        }
    }
}
