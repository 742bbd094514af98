use std::path::PathBuf;
use std::sync::Arc;

use admin_session::app::AdminApp;
use admin_session::config::{ApiMode, ClientConfig, ConfigError, normalize_base_url};
use admin_session::error::ErrorCode;
use admin_session::guard::{GuardDecision, guard_route};
use admin_session::mock::{MockBackend, server};
use admin_session::net::types::{ApiError, Fields, Resource, Role};
use admin_session::state::auth::LoginOutcome;
use admin_session::state::storage::FileStorage;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("login failed: {0}")]
    LoginRejected(String),
    #[error("not signed in; run `admin-cli login` first")]
    NotSignedIn,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("payload must be a JSON object")]
    NotAnObject,
    #[error("io failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "admin-cli", about = "Admin back-office session and content CLI")]
struct Cli {
    #[arg(long, env = "ADMIN_API_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "ADMIN_API_MODE", value_parser = parse_mode)]
    mode: Option<ApiMode>,

    #[arg(long, env = "ADMIN_STORAGE_PATH")]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and persist the session.
    Login {
        username: String,
        #[arg(long, env = "ADMIN_PASSWORD")]
        password: String,
    },
    /// Sign out and erase the persisted session.
    Logout,
    /// Show the restored session.
    Status,
    /// Show what the route guard decides for a location.
    Guard {
        location: String,
        #[arg(long, value_parser = parse_role)]
        role: Option<Role>,
    },
    /// Content CRUD.
    Records(RecordsCommand),
    /// Serve the in-memory mock API over HTTP.
    ServeMock {
        #[arg(long, default_value_t = 4000)]
        port: u16,
    },
}

#[derive(Args, Debug)]
struct RecordsCommand {
    #[command(subcommand)]
    command: RecordsSubcommand,
}

#[derive(Subcommand, Debug)]
enum RecordsSubcommand {
    List {
        #[arg(value_parser = parse_resource)]
        resource: Resource,
    },
    Get {
        #[arg(value_parser = parse_resource)]
        resource: Resource,
        id: String,
    },
    Create {
        #[arg(value_parser = parse_resource)]
        resource: Resource,
        #[arg(long)]
        data: String,
    },
    Update {
        #[arg(value_parser = parse_resource)]
        resource: Resource,
        id: String,
        #[arg(long)]
        data: String,
    },
    Delete {
        #[arg(value_parser = parse_resource)]
        resource: Resource,
        id: String,
    },
}

fn parse_mode(raw: &str) -> Result<ApiMode, String> {
    raw.parse::<ApiMode>().map_err(|e| e.to_string())
}

fn parse_role(raw: &str) -> Result<Role, String> {
    raw.parse()
}

fn parse_resource(raw: &str) -> Result<Resource, String> {
    raw.parse()
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.base_url = normalize_base_url(&base_url);
    }
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }
    if let Some(storage) = cli.storage {
        config.storage_path = storage;
    }

    let result = match cli.command {
        Command::ServeMock { port } => run_serve_mock(port).await,
        command => run_session_command(&config, command).await,
    };
    if let Err(e) = &result {
        if let CliError::Api(api) = e {
            tracing::error!(code = api.error_code(), retryable = api.retryable(), "{api}");
        }
    }
    result
}

async fn run_serve_mock(port: u16) -> Result<(), CliError> {
    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{port}")).await?;
    tracing::info!(%port, prefix = server::API_PREFIX, "mock admin API listening");
    server::serve(listener, Arc::new(MockBackend::seeded())).await?;
    Ok(())
}

async fn run_session_command(config: &ClientConfig, command: Command) -> Result<(), CliError> {
    let storage = Arc::new(FileStorage::new(&config.storage_path));
    let app = AdminApp::build(config, storage)?;
    app.start().await;

    let result = match command {
        Command::Login { username, password } => run_login(&app, &username, &password).await,
        Command::Logout => {
            app.auth.logout().await;
            println!("signed out");
            Ok(())
        }
        Command::Status => {
            print_status(&app);
            Ok(())
        }
        Command::Guard { location, role } => {
            print_guard(&app, &location, role.as_ref());
            Ok(())
        }
        Command::Records(records) => run_records(&app, records).await,
        Command::ServeMock { .. } => Ok(()),
    };

    if app.navigator.is_on_login() && matches!(result, Err(CliError::Api(ApiError::Unauthorized))) {
        eprintln!("session expired; redirected to {}", app.navigator.current());
    }
    result
}

async fn run_login(app: &AdminApp, username: &str, password: &str) -> Result<(), CliError> {
    match app.auth.login_with_outcome(username, password).await {
        LoginOutcome::Success(identity) => {
            let to = app.navigator.take_return_to().unwrap_or_else(|| "/admin".to_owned());
            app.navigator.navigate(to.clone());
            println!("signed in as {} ({}); continue at {to}", identity.username, identity.role);
            Ok(())
        }
        LoginOutcome::Rejected(message) => {
            Err(CliError::LoginRejected(message.unwrap_or_else(|| "invalid credentials".to_owned())))
        }
        LoginOutcome::Failed(e) => Err(e.into()),
    }
}

fn print_status(app: &AdminApp) {
    let snapshot = app.store.snapshot();
    match &snapshot.session {
        Some(session) => println!(
            "signed in: id={} username={} role={}",
            session.user_id(),
            session.username(),
            session.role()
        ),
        None => println!("signed out"),
    }
}

fn print_guard(app: &AdminApp, location: &str, role: Option<&Role>) {
    match guard_route(&app.store, &app.navigator, role, location) {
        GuardDecision::Loading => println!("loading"),
        GuardDecision::RedirectToLogin { .. } => println!("redirect {}", app.navigator.current()),
        GuardDecision::AccessDenied => println!("access denied"),
        GuardDecision::Render => println!("render {location}"),
    }
}

async fn run_records(app: &AdminApp, records: RecordsCommand) -> Result<(), CliError> {
    if !app.store.is_authenticated() {
        return Err(CliError::NotSignedIn);
    }
    let source = &app.records;
    match records.command {
        RecordsSubcommand::List { resource } => print_json(&source.list(resource).await?),
        RecordsSubcommand::Get { resource, id } => print_json(&source.get(resource, &id).await?),
        RecordsSubcommand::Create { resource, data } => {
            let fields = parse_fields(&data)?;
            print_json(&source.create(resource, fields).await?)
        }
        RecordsSubcommand::Update { resource, id, data } => {
            let fields = parse_fields(&data)?;
            print_json(&source.update(resource, &id, fields).await?)
        }
        RecordsSubcommand::Delete { resource, id } => {
            source.delete(resource, &id).await?;
            println!("deleted {resource} {id}");
            Ok(())
        }
    }
}

fn parse_fields(data: &str) -> Result<Fields, CliError> {
    match serde_json::from_str::<serde_json::Value>(data)? {
        serde_json::Value::Object(fields) => Ok(fields),
        _ => Err(CliError::NotAnObject),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
