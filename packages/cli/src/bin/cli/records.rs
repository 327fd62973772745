// ABOUTME: Attendance listings and exit marking around the client
// ABOUTME: Display plumbing; the access core makes no ordering assumptions here

use colored::*;
use comfy_table::{presets::UTF8_FULL, Table};

use labgate_cli::Config;
use labgate_client::{ClientError, ValidatorClient};
use labgate_core::Identity;

pub async fn handle_present(config: Config) -> anyhow::Result<()> {
    let client = ValidatorClient::new(&config.api_base)?;
    let students = client.present_students().await?;

    if students.is_empty() {
        println!("{}", "Nobody is inside right now.".yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Nombre", "Apellido", "Email", "Última entrada"]);
    for s in &students {
        table.add_row(vec![
            s.nombre.clone(),
            s.apellido.clone(),
            s.email.clone(),
            s.ultima_entrada.clone().unwrap_or_else(|| "--:--".into()),
        ]);
    }
    println!("{table}");
    println!("{} inside", students.len().to_string().green().bold());
    Ok(())
}

pub async fn handle_exit(
    config: Config,
    name: String,
    surname: String,
    email: String,
) -> anyhow::Result<()> {
    let client = ValidatorClient::new(&config.api_base)?;
    let identity = Identity::new(name, surname, email);

    match client.mark_exit(&identity).await {
        Ok(result) => {
            println!(
                "{} {}",
                "Salida registrada:".green().bold(),
                result.message.as_deref().unwrap_or("")
            );
            Ok(())
        }
        Err(ClientError::Denied { reason, .. }) => {
            println!("{} {}", "No se pudo marcar la salida:".red().bold(), reason);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn handle_hours(config: Config) -> anyhow::Result<()> {
    let client = ValidatorClient::new(&config.api_base)?;
    let rows = client.accumulated_hours().await?;

    if rows.is_empty() {
        println!("{}", "No accumulated hours recorded.".yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "Nombre",
        "Apellido",
        "Email",
        "Horas",
        "Días asistidos",
        "Días calendario",
    ]);
    for r in &rows {
        table.add_row(vec![
            r.nombre.clone(),
            r.apellido.clone(),
            r.email.clone(),
            format!("{:.1}", r.horas_totales),
            r.dias_asistidos.to_string(),
            r.dias_calendario.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}
