//! Catalog Console - command line admin client for a bilingual furniture catalog

use catalog_console::config::{Config, SourceConfig};
use catalog_console::console::{AdminSpec, Console, ConsoleError};
use catalog_console::init::run_interactive_init;
use catalog_console::types::Language;
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_CONFIG_PATH: &str = "catalog_console.toml";

/// Catalog Console - manage products and admin accounts from the terminal
#[derive(Parser, Debug)]
#[command(name = "catalog_console")]
#[command(author, version, about, long_about = None)]
#[command(long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (built ",
    env!("CATCON_BUILD_TIME"),
    ")"
))]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Send requests to this API root instead of the configured one
    #[arg(long, value_name = "URL", conflicts_with = "fixture")]
    api_url: Option<String>,

    /// Use the built-in fixture data source instead of the network
    #[arg(long)]
    fixture: bool,

    /// Keep session state in this directory
    #[arg(long, value_name = "DIR")]
    state_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a configuration file interactively
    Init,

    /// Show session, data source, and preference status
    Status,

    /// Log in and persist the session token
    Login {
        /// Username (prompted when omitted)
        #[arg(short, long)]
        username: Option<String>,

        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Log out and clear the persisted token
    Logout,

    /// Keep revalidating the session until interrupted
    Watch,

    /// Show or set the preferred catalog language
    Lang {
        #[command(subcommand)]
        action: LangAction,
    },

    /// Manage catalog products
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },

    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand, Debug)]
enum LangAction {
    /// Print the stored language
    Get,

    /// Store a new language (ru or kz)
    Set { lang: Language },
}

#[derive(Subcommand, Debug)]
enum ProductAction {
    /// List all products
    List {
        /// Render names and prices in this language
        #[arg(long)]
        lang: Option<Language>,

        /// Print the raw JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one product
    Get {
        id: String,

        #[arg(long)]
        lang: Option<Language>,

        #[arg(long)]
        json: bool,
    },

    /// Create a product from a JSON draft file
    Create {
        /// Path to the draft JSON
        #[arg(long, value_name = "FILE")]
        draft: PathBuf,

        /// Upload this file as the main image
        #[arg(long, value_name = "FILE")]
        main_image: Option<PathBuf>,

        /// Upload this file as an additional image (repeatable)
        #[arg(long = "add-image", value_name = "FILE")]
        add_image: Vec<PathBuf>,
    },

    /// Update a product from a JSON draft file
    Update {
        id: String,

        #[arg(long, value_name = "FILE")]
        draft: PathBuf,

        #[arg(long, value_name = "FILE")]
        main_image: Option<PathBuf>,

        #[arg(long = "add-image", value_name = "FILE")]
        add_image: Vec<PathBuf>,
    },

    /// Delete a product
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
enum AdminAction {
    /// List all admin accounts
    List {
        #[arg(long)]
        json: bool,
    },

    /// Show one admin account
    Get {
        id: String,

        #[arg(long)]
        json: bool,
    },

    /// Create an admin account
    Create {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: Option<String>,

        #[arg(short, long)]
        email: Option<String>,

        /// Upload this file as the profile image
        #[arg(long, value_name = "FILE", conflicts_with = "image_url")]
        image: Option<PathBuf>,

        /// Link an already-hosted profile image
        #[arg(long, value_name = "URL")]
        image_url: Option<String>,
    },

    /// Update an admin account
    Update {
        id: String,

        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: Option<String>,

        #[arg(short, long)]
        email: Option<String>,

        #[arg(long, value_name = "FILE", conflicts_with = "image_url")]
        image: Option<PathBuf>,

        #[arg(long, value_name = "URL")]
        image_url: Option<String>,
    },

    /// Delete an admin account
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // The wizard writes the config, so it runs before anything reads one.
    if matches!(cli.command, Command::Init) {
        run_interactive_init(DEFAULT_CONFIG_PATH)?;
        return Ok(());
    }

    // Load configuration from file if specified, otherwise use default loading
    let mut config = if let Some(ref path) = cli.config {
        Config::from_file(path)?
    } else {
        Config::load()
    };

    // CLI overrides
    if let Some(ref url) = cli.api_url {
        config.source = SourceConfig::Network {
            base_url: url.clone(),
        };
    }
    if cli.fixture {
        config.source = SourceConfig::Fixture;
    }
    if let Some(ref dir) = cli.state_dir {
        config.state_dir = dir.clone();
    }

    // Initialize tracing
    let log_level = if cli.verbose {
        "catalog_console=debug".to_string()
    } else {
        config.log_level.clone()
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting catalog console {} (built {})",
        env!("CARGO_PKG_VERSION"),
        env!("CATCON_BUILD_TIME")
    );
    match config.base_url() {
        Some(url) => info!("  Source: network {}", url),
        None => info!("  Source: built-in fixture"),
    }
    info!("  State dir: {}", config.state_dir.display());

    let console = Console::build(config).await?;
    run_command(&console, cli.command).await?;
    Ok(())
}

async fn run_command(console: &Console, command: Command) -> Result<(), ConsoleError> {
    match command {
        // Handled in main before the console is wired up.
        Command::Init => Ok(()),

        Command::Status => console.status().await,

        Command::Login { username, password } => {
            let username = match username {
                Some(u) => u,
                None => prompt_line("Username")?,
            };
            let password = match password {
                Some(p) => p,
                None => prompt_line("Password")?,
            };
            console.login(&username, &password).await
        }

        Command::Logout => console.logout().await,

        Command::Watch => console.watch(shutdown_signal()).await,

        Command::Lang { action } => match action {
            LangAction::Get => console.language().await,
            LangAction::Set { lang } => console.set_language(lang).await,
        },

        Command::Product { action } => match action {
            ProductAction::List { lang, json } => console.list_products(lang, json).await,
            ProductAction::Get { id, lang, json } => console.show_product(&id, lang, json).await,
            ProductAction::Create {
                draft,
                main_image,
                add_image,
            } => {
                console
                    .create_product(&draft, main_image.as_deref(), &add_image)
                    .await
            }
            ProductAction::Update {
                id,
                draft,
                main_image,
                add_image,
            } => {
                console
                    .update_product(&id, &draft, main_image.as_deref(), &add_image)
                    .await
            }
            ProductAction::Delete { id } => console.delete_product(&id).await,
        },

        Command::Admin { action } => match action {
            AdminAction::List { json } => console.list_admins(json).await,
            AdminAction::Get { id, json } => console.show_admin(&id, json).await,
            AdminAction::Create {
                username,
                password,
                email,
                image,
                image_url,
            } => {
                console
                    .create_admin(AdminSpec {
                        username,
                        password,
                        email,
                        image_file: image.as_deref(),
                        image_url,
                    })
                    .await
            }
            AdminAction::Update {
                id,
                username,
                password,
                email,
                image,
                image_url,
            } => {
                console
                    .update_admin(
                        &id,
                        AdminSpec {
                            username,
                            password,
                            email,
                            image_file: image.as_deref(),
                            image_url,
                        },
                    )
                    .await
            }
            AdminAction::Delete { id } => console.delete_admin(&id).await,
        },
    }
}

fn prompt_line(label: &str) -> io::Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Handle shutdown signals (SIGINT, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, stopping...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, stopping...");
        }
    }
}
