use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use stowage::auth::TokenGenerator;
use stowage::config::{FileConfig, ServerConfig};
use stowage::server::validation::{validate_group_name, validate_rule_name};
use stowage::server::{AppState, create_router};
use stowage::store::{SqliteStore, Store};
use stowage::types::{LimitSubject, Rule};

#[cfg(unix)]
fn set_restrictive_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Failed to set permissions on {}: {e}", path.display());
    }
}

#[derive(Parser)]
#[command(name = "stowage")]
#[command(about = "Per-user and per-organization storage quotas for a code forge", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value = "8080")]
        port: u16,

        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Config file to read instead of `<data-dir>/stowage.toml`
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Initialize the server (create database, config file and admin token)
    Init {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Skip interactive prompts
        #[arg(long)]
        non_interactive: bool,
    },
}

fn run_init(data_dir: String, non_interactive: bool) -> anyhow::Result<()> {
    let config = ServerConfig {
        data_dir: data_dir.into(),
        ..Default::default()
    };
    fs::create_dir_all(&config.data_dir)?;

    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;

    let token_file = config.admin_token_path();

    if store.has_admin_token()? {
        bail!(
            "Server already initialized. Admin token exists at: {}",
            token_file.display()
        );
    }

    let (token, raw_token) = TokenGenerator::new().issue(true, None, None)?;

    store.create_token(&token)?;
    fs::write(&token_file, &raw_token)?;

    #[cfg(unix)]
    set_restrictive_permissions(&token_file);

    println!();
    println!("========================================");
    println!("Admin token (save this, it won't be shown again):");
    println!();
    println!("  {raw_token}");
    println!();
    println!("Token also written to: {}", token_file.display());
    println!("========================================");
    println!();

    let mut file_config = FileConfig::load(&config.config_path())?;

    if !non_interactive {
        create_default_group_prompt(&store, &mut file_config)?;
    }

    let config_path = config.config_path();
    if !config_path.exists() || !non_interactive {
        fs::write(&config_path, file_config.to_toml()?)?;
        println!("Quota configuration written to: {}", config_path.display());
    }

    Ok(())
}

fn create_default_group_prompt(store: &SqliteStore, file_config: &mut FileConfig) -> anyhow::Result<()> {
    let create_group = inquire::Confirm::new("Would you like to create a default quota group?")
        .with_default(false)
        .prompt()?;

    if !create_group {
        return Ok(());
    }

    let name = inquire::Text::new("Group name:")
        .with_default("default")
        .with_validator(|input: &str| match validate_group_name(input) {
            Ok(()) => Ok(inquire::validator::Validation::Valid),
            Err(e) => Ok(inquire::validator::Validation::Invalid(e.message.into())),
        })
        .prompt()?;

    let limit = inquire::CustomType::<i64>::new("Total storage limit in bytes (-1 for unlimited):")
        .with_default(-1)
        .with_error_message("Please enter a whole number")
        .prompt()?;

    let rule = create_default_group(store, &name, limit)?;

    file_config.quota.enabled = true;
    if !file_config.quota.default_groups.contains(&name) {
        file_config.quota.default_groups.push(name.clone());
    }

    println!();
    println!("Created quota group '{name}' with rule '{}'", rule.name);
    println!("Quotas enabled with '{name}' as a default group");
    println!();

    Ok(())
}

/// Creates the group `name` holding a `{name}-total` rule over `size:all`.
/// Names and collisions are checked before anything is written.
fn create_default_group(store: &SqliteStore, name: &str, limit: i64) -> anyhow::Result<Rule> {
    validate_group_name(name).map_err(|e| anyhow!(e.message))?;
    let rule = Rule::new(format!("{name}-total"), limit, vec![LimitSubject::SizeAll])?;
    validate_rule_name(&rule.name).map_err(|e| anyhow!(e.message))?;

    if store.get_group(name)?.is_some() {
        bail!("Quota group '{name}' already exists");
    }
    if store.get_rule(&rule.name)?.is_some() {
        bail!("Quota rule '{}' already exists", rule.name);
    }

    store.create_rule(&rule)?;
    let linked = store
        .create_group(name)
        .and_then(|_| store.add_rule_to_group(name, &rule.name));
    if let Err(e) = linked {
        for cleanup in [store.delete_group(name), store.delete_rule(&rule.name)] {
            if let Err(cleanup) = cleanup {
                tracing::warn!("Failed to clean up after default group setup: {cleanup}");
            }
        }
        return Err(e.into());
    }

    Ok(rule)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("stowage=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init {
                data_dir,
                non_interactive,
            } => {
                run_init(data_dir, non_interactive)?;
            }
        },
        Commands::Serve {
            host,
            port,
            data_dir,
            config,
        } => {
            let config = ServerConfig {
                host,
                port,
                data_dir: data_dir.into(),
                config_file: config,
            };

            let token_file = config.admin_token_path();
            if !token_file.exists() {
                bail!(
                    "Server not initialized. Run 'stowage admin init' first to create the database and admin token."
                );
            }

            let store = SqliteStore::new(config.db_path())?;
            if !store.has_admin_token()? {
                bail!(
                    "Server not initialized. Run 'stowage admin init' first to create the database and admin token."
                );
            }

            let file_config = FileConfig::load(&config.config_path())?;
            info!(
                enabled = file_config.quota.enabled,
                default_groups = ?file_config.quota.default_groups,
                "Quota configuration loaded from {}",
                config.config_path().display()
            );

            let state = Arc::new(AppState::new(Arc::new(store), file_config.quota));

            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
