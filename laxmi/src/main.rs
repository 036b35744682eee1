use clap::{Parser, Subcommand};
use laxmi::commands::profile::{self, AppState};
use laxmi::core::profile_manager::ProfileManager;
use laxmi::utils::config::AppConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "laxmi", version, about = "Manage Laxmi profiles")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List existing profiles
    List,
    /// Create a profile and its database
    Create { name: String },
    /// Delete a profile and everything in it
    Delete { name: String },
    /// Open a profile, upgrading its database if needed
    Open { name: String },
    /// Show the last opened profile
    Last,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();

    let config = AppConfig::from_env()?;
    let manager = ProfileManager::from_config(&config)?;
    manager.ensure_root().await?;
    tracing::info!("Using data directory {}", manager.paths().root().display());

    let state = AppState::new(manager);

    match cli.command {
        Command::List => {
            for name in profile::list_profiles(&state).await.map_err(anyhow::Error::msg)? {
                println!("{}", name);
            }
        }
        Command::Create { name } => {
            profile::create_profile(&state, name.clone())
                .await
                .map_err(anyhow::Error::msg)?;
            println!("Created profile '{}'", name);
        }
        Command::Delete { name } => {
            profile::delete_profile(&state, name.clone())
                .await
                .map_err(anyhow::Error::msg)?;
            println!("Deleted profile '{}'", name);
        }
        Command::Open { name } => {
            let opened = profile::open_profile(&state, name)
                .await
                .map_err(anyhow::Error::msg)?;
            println!(
                "Opened profile '{}' (schema version {})",
                opened.name, opened.schema_version
            );
            profile::close_profile(&state)
                .await
                .map_err(anyhow::Error::msg)?;
        }
        Command::Last => match profile::last_opened_profile(&state).await.map_err(anyhow::Error::msg)? {
            Some(name) => println!("{}", name),
            None => println!("No profile has been opened yet"),
        },
    }

    Ok(())
}
