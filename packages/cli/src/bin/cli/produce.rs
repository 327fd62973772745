// ABOUTME: The producer portal in the terminal
// ABOUTME: Prints the scannable code and tracks its lifecycle until interrupted

use std::time::Duration;

use anyhow::{bail, Context};
use colored::*;

use labgate_cli::Config;
use labgate_core::{Identity, UserKind, EXPIRY_WINDOW_MS, RENEWAL_PERIOD_MS};
use labgate_producer::TokenProducer;
use labgate_storage::LocalStore;

#[allow(clippy::too_many_arguments)]
pub async fn handle_produce(
    config: Config,
    kind: UserKind,
    auto_renew: bool,
    saved: Option<usize>,
    name: Option<String>,
    surname: Option<String>,
    email: Option<String>,
) -> anyhow::Result<()> {
    let store = LocalStore::new(&config.data_dir);
    let producer = TokenProducer::new(kind, store);
    producer.set_auto_renewal(auto_renew);

    if let Some(index) = saved {
        let users = producer.saved_users().await;
        let Some(user) = users.get(index) else {
            bail!("No saved identity at index {index} ({} stored)", users.len());
        };
        let payload = producer.select_saved(user);
        println!(
            "{} {} {} <{}>",
            "Re-issued code for".green().bold(),
            payload.name,
            payload.surname,
            payload.email
        );
    } else {
        let identity = collect_identity(&producer, name, surname, email).await?;
        producer
            .generate(&identity)
            .await
            .context("could not generate the code")?;
        println!(
            "{} {} {} <{}>",
            "Generated code for".green().bold(),
            identity.name,
            identity.surname,
            identity.email
        );
    }

    print_code(&producer)?;

    if auto_renew {
        println!("{}", "Auto-renewal active; Ctrl-C to stop.".cyan());
        let mut ticker = tokio::time::interval(Duration::from_millis(RENEWAL_PERIOD_MS));
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    println!("{}", "Renewed:".cyan());
                    print_code(&producer)?;
                }
                _ = tokio::signal::ctrl_c() => {
                    producer.shutdown();
                    println!("\n{}", "Stopped.".yellow());
                    return Ok(());
                }
            }
        }
    }

    println!(
        "{}",
        format!("This code expires in {} seconds", EXPIRY_WINDOW_MS / 1000).yellow()
    );
    tokio::time::sleep(Duration::from_millis(EXPIRY_WINDOW_MS + 200)).await;
    println!("{}", "Code expired".red().bold());
    print_code(&producer)?;
    Ok(())
}

async fn collect_identity(
    producer: &TokenProducer,
    name: Option<String>,
    surname: Option<String>,
    email: Option<String>,
) -> anyhow::Result<Identity> {
    // Stored identity pre-fills the prompts the way the portal form
    // re-hydrates its fields.
    let stored = producer.saved_users().await.last().map(|p| p.identity());

    let name = match name {
        Some(v) => v,
        None => prompt("Nombre", stored.as_ref().map(|i| i.name.clone()))?,
    };
    let surname = match surname {
        Some(v) => v,
        None => prompt("Apellido", stored.as_ref().map(|i| i.surname.clone()))?,
    };
    let email = match email {
        Some(v) => v,
        None => prompt("Email institucional", stored.as_ref().map(|i| i.email.clone()))?,
    };

    Ok(Identity::new(name, surname, email))
}

fn prompt(label: &str, default: Option<String>) -> anyhow::Result<String> {
    let mut text = inquire::Text::new(label);
    if let Some(default) = default.as_deref() {
        text = text.with_default(default);
    }
    Ok(text.prompt()?)
}

fn print_code(producer: &TokenProducer) -> anyhow::Result<()> {
    let code = producer.current_code()?;
    println!("{code}");
    Ok(())
}
