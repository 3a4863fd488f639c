//! TodoTerm — terminal todolist client.
//!
//! Talks to a todolist REST API with captcha-gated authentication and keeps
//! an optimistic local cache of the collection: deletes and renames are
//! visible immediately and rolled back if the server rejects them.
//!
//! ```bash
//! # Log in (the server may demand a captcha after repeated failures)
//! todoterm login --email free@samuraijs.com --password free
//! todoterm login --email free@samuraijs.com --password free --captcha x9k2pf
//!
//! # Work with todolists
//! todoterm list
//! todoterm add "Groceries"
//! todoterm rename <id> "Weekend groceries"
//! todoterm rm <id>
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use todoterm::api::{ApiError, HttpApi, TodoApi};
use todoterm::auth::{
    AuthError, Credentials, FileTokenStore, LoginAttempt, LoginFlow, LoginState, SessionState,
};
use todoterm::cache::QueryCache;
use todoterm::config::{CliArgs, ClientConfig};
use todoterm::todolists::{TodolistError, TodolistManager};
use todoterm_proto::todolist::TodolistId;

/// CLI definition: global arguments plus one subcommand.
#[derive(Parser, Debug)]
#[command(version, about = "Terminal todolist client")]
struct Cli {
    #[command(flatten)]
    args: CliArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Log in to the API.
    Login {
        /// Account email address.
        #[arg(long)]
        email: String,
        /// Account password.
        #[arg(long)]
        password: String,
        /// Request a long-lived session.
        #[arg(long)]
        remember_me: bool,
        /// Captcha answer, required once the server has demanded one.
        #[arg(long)]
        captcha: Option<String>,
    },
    /// Log out and discard the stored token.
    Logout,
    /// Show the authenticated account.
    Whoami,
    /// List todolists.
    List,
    /// Create a todolist.
    Add {
        /// Title of the new todolist.
        title: String,
    },
    /// Delete a todolist (optimistic; rolled back on failure).
    Rm {
        /// Id of the todolist to delete.
        id: String,
    },
    /// Rename a todolist (optimistic; rolled back on failure).
    Rename {
        /// Id of the todolist to rename.
        id: String,
        /// The new title.
        title: String,
    },
}

/// Errors surfaced to the user by the CLI.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Todolist(#[from] TodolistError),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load and resolve configuration (CLI args > config file > env > defaults).
    let config = match ClientConfig::load(&cli.args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    init_logging(&cli.args.log_level);
    tracing::debug!(base_url = %config.base_url, "todoterm starting");

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize stderr logging (stdout is reserved for command output).
fn init_logging(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(command: Command, config: &ClientConfig) -> Result<(), CliError> {
    let tokens = Arc::new(FileTokenStore::new(config.token_dir()));
    let session = Arc::new(SessionState::new());
    let api = HttpApi::new(
        &config.base_url,
        config.api_key.clone(),
        Arc::clone(&tokens),
        config.request_timeout,
    )?;

    match command {
        Command::Login {
            email,
            password,
            remember_me,
            captcha,
        } => {
            let mut flow = LoginFlow::new(api, Arc::clone(&tokens), Arc::clone(&session));
            let attempt = LoginAttempt {
                credentials: Credentials {
                    email,
                    password,
                    remember_me,
                },
                captcha,
            };
            match flow.submit(attempt).await? {
                LoginState::Success => println!("Logged in."),
                LoginState::CaptchaRequired => {
                    if let Some(challenge) = flow.challenge() {
                        println!("Captcha required: {}", challenge.url);
                    }
                    println!("Re-run `todoterm login` with --captcha <text>.");
                }
                LoginState::Idle | LoginState::Submitting => {
                    println!("Login failed; check credentials and try again.");
                }
            }
        }
        Command::Logout => {
            let mut flow = LoginFlow::new(api, Arc::clone(&tokens), Arc::clone(&session));
            flow.logout().await?;
            println!("Logged out.");
        }
        Command::Whoami => {
            let response = api.me().await?;
            let authenticated = response.is_success();
            match response.data {
                Some(me) if authenticated => println!("{} ({})", me.login, me.email),
                _ => println!("Not logged in."),
            }
        }
        Command::List => {
            let manager = TodolistManager::new(api, Arc::new(QueryCache::new()));
            let todolists = manager.refresh().await?;
            if todolists.is_empty() {
                println!("No todolists.");
            }
            for todolist in todolists {
                println!("{}  {}  [{}]", todolist.id, todolist.title, todolist.filter);
            }
        }
        Command::Add { title } => {
            let manager = TodolistManager::new(api, Arc::new(QueryCache::new()));
            let created = manager.add(&title).await?;
            println!("Created {}  {}", created.id, created.title);
        }
        Command::Rm { id } => {
            let manager = TodolistManager::new(api, Arc::new(QueryCache::new()));
            manager.refresh().await?;
            manager.remove(&TodolistId::new(id)).await?;
            println!("Deleted.");
        }
        Command::Rename { id, title } => {
            let manager = TodolistManager::new(api, Arc::new(QueryCache::new()));
            manager.refresh().await?;
            manager.rename(&TodolistId::new(id), &title).await?;
            println!("Renamed.");
        }
    }

    Ok(())
}
