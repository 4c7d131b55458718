//! sessionkeep - sign in, sign out and watch the session from the terminal.
//!
//! Talks to the authentication service configured in
//! `~/.config/sessionkeep/config.json` (or the offline mock when none is set)
//! and persists the signed-in user between runs.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sessionkeep_core::{get_instance, AuthSessionManager, SessionConfig, SessionState};

/// Environment variables pre-filling the login prompt
const ENV_USERNAME: &str = "SESSIONKEEP_USERNAME";
const ENV_PASSWORD: &str = "SESSIONKEEP_PASSWORD";

#[derive(Parser)]
#[command(name = "sessionkeep")]
#[command(version)]
#[command(about = "Manage the signed-in session")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: ~/.config/sessionkeep/config.json)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show who is signed in
    Status,
    /// Sign in with a username and password
    Login {
        #[arg(long, short)]
        username: Option<String>,
    },
    /// Sign out and revoke the session token
    Logout,
    /// Print every session change until Ctrl-C
    Watch,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<SessionConfig> {
    match path {
        Some(path) => {
            let mut config = SessionConfig::load_from(path)?;
            config.apply_env();
            Ok(config)
        }
        None => SessionConfig::load(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?;
    let manager = get_instance(&config).await?;
    info!("sessionkeep starting");

    match cli.command.unwrap_or(Commands::Status) {
        Commands::Status => print_state(&manager.session().current()),
        Commands::Login { username } => login(&manager, username).await?,
        Commands::Logout => {
            manager.sign_out().await;
            println!("Signed out");
        }
        Commands::Watch => watch(&manager).await?,
    }

    Ok(())
}

fn print_state(state: &SessionState) {
    match state {
        SessionState::SignedIn(user) => println!("Signed in as {} ({})", user.label(), user.id),
        SessionState::SignedOut => println!("Signed out"),
    }
}

async fn login(manager: &AuthSessionManager, username: Option<String>) -> Result<()> {
    if let Some(user) = manager.current_user() {
        println!("Already signed in as {}", user.label());
        return Ok(());
    }

    let username = match username.or_else(|| std::env::var(ENV_USERNAME).ok()) {
        Some(username) if !username.is_empty() => username,
        _ => prompt_username()?,
    };
    let password = match std::env::var(ENV_PASSWORD) {
        Ok(password) if !password.is_empty() => password,
        _ => rpassword::prompt_password("Password: ")?,
    };

    eprintln!("Authenticating...");
    if let Err(e) = manager.sign_in_with_password(&username, &password).await {
        bail!("Login failed: {}", e);
    }
    print_state(&manager.session().current());
    Ok(())
}

fn prompt_username() -> Result<String> {
    print!("Username: ");
    io::stdout().flush()?;

    let mut username = String::new();
    io::stdin().read_line(&mut username)?;
    Ok(username.trim().to_string())
}

async fn watch(manager: &AuthSessionManager) -> Result<()> {
    let subscription = manager.session().subscribe(print_state);
    tokio::signal::ctrl_c().await?;
    subscription.unsubscribe();
    Ok(())
}
