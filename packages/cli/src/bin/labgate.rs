use clap::{Parser, Subcommand};
use colored::*;
use std::process;

mod cli;

use labgate_cli::Config;

#[derive(Parser)]
#[command(name = "labgate")]
#[command(about = "Labgate - laboratory access control client")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum Role {
    Estudiante,
    Ayudante,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a scannable access code and keep it fresh
    Produce {
        /// Portal role the code is issued for
        #[arg(long, value_enum, default_value = "estudiante")]
        role: Role,
        /// Renew the code automatically instead of letting it expire
        #[arg(long)]
        auto_renew: bool,
        /// Re-issue a previously saved identity by its list index
        #[arg(long)]
        saved: Option<usize>,
        /// First name (prompted when omitted)
        #[arg(long)]
        name: Option<String>,
        /// Surname (prompted when omitted)
        #[arg(long)]
        surname: Option<String>,
        /// Institutional email (prompted when omitted)
        #[arg(long)]
        email: Option<String>,
    },
    /// Acquire a reader token and submit it for an access decision
    Scan {
        /// Portal role to submit as
        #[arg(long, value_enum, default_value = "estudiante")]
        role: Role,
        /// Entry address carrying a readerToken query parameter
        #[arg(long)]
        url: Option<String>,
        /// Raw token value, bypassing acquisition
        #[arg(long)]
        token: Option<String>,
    },
    /// List students currently inside the laboratory
    Present,
    /// Mark an exit for a student
    Exit {
        #[arg(long)]
        name: String,
        #[arg(long)]
        surname: String,
        #[arg(long)]
        email: String,
    },
    /// Show accumulated helper hours
    Hours,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    labgate_cli::init_tracing();

    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    };

    match handle_command(cli.command, config).await {
        Ok(_) => {}
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    }
}

async fn handle_command(command: Commands, config: Config) -> anyhow::Result<()> {
    match command {
        Commands::Produce {
            role,
            auto_renew,
            saved,
            name,
            surname,
            email,
        } => {
            cli::produce::handle_produce(
                config,
                role.into(),
                auto_renew,
                saved,
                name,
                surname,
                email,
            )
            .await
        }
        Commands::Scan { role, url, token } => {
            cli::scan::handle_scan(config, role.into(), url, token).await
        }
        Commands::Present => cli::records::handle_present(config).await,
        Commands::Exit {
            name,
            surname,
            email,
        } => cli::records::handle_exit(config, name, surname, email).await,
        Commands::Hours => cli::records::handle_hours(config).await,
    }
}

impl From<Role> for labgate_core::UserKind {
    fn from(role: Role) -> Self {
        match role {
            Role::Estudiante => labgate_core::UserKind::Estudiante,
            Role::Ayudante => labgate_core::UserKind::Ayudante,
        }
    }
}
