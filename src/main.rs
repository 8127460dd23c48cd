use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;
use vsts_reconcile::config::Config;
use vsts_reconcile::resource::{Changes, Controller, Record, Refresh, Resource, SettleStrategy};
use vsts_reconcile::vsts::endpoints::{ServiceEndpoint, ServiceEndpointSpec};
use vsts_reconcile::vsts::http::Transport;
use vsts_reconcile::vsts::projects::{Project, ProjectSpec};
use vsts_reconcile::vsts::repositories::{Repository, RepositorySpec};

/// Reconcile VSTS projects, repositories and service endpoints
#[derive(Parser, Debug)]
#[command(name = "vsts-reconcile", version, about, long_about = None)]
struct Args {
    /// VSTS account name
    #[arg(long, env = "VSTS_ACCOUNT")]
    account: Option<String>,

    /// Personal access token
    #[arg(long, env = "VSTS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Base URL override (defaults to https://{account}.visualstudio.com/)
    #[arg(long)]
    base_url: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the resource described by a manifest and bind its id
    Create { manifest: PathBuf },
    /// Refresh an existing resource by id
    Read {
        manifest: PathBuf,
        #[arg(long)]
        id: String,
    },
    /// Push changed fields of a manifest to an existing resource
    Update {
        manifest: PathBuf,
        #[arg(long)]
        id: String,
        /// Changed fields, e.g. `--changed name`
        #[arg(long, value_delimiter = ',', required = true)]
        changed: Vec<String>,
    },
    /// Delete an existing resource by id
    Delete {
        manifest: PathBuf,
        #[arg(long)]
        id: String,
    },
    /// Bind an existing remote resource by id
    Import {
        manifest: PathBuf,
        #[arg(long)]
        id: String,
    },
}

impl Command {
    fn manifest(&self) -> &Path {
        match self {
            Command::Create { manifest }
            | Command::Read { manifest, .. }
            | Command::Update { manifest, .. }
            | Command::Delete { manifest, .. }
            | Command::Import { manifest, .. } => manifest,
        }
    }
}

/// Desired state file, tagged by resource kind
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Manifest {
    Project(ProjectSpec),
    Repository(RepositorySpec),
    ServiceEndpoint(ServiceEndpointSpec),
}

impl Manifest {
    fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse manifest {}", path.display()))
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("vsts_reconcile={}", tracing_level.as_str().to_lowercase())))
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("vsts-reconcile started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("vsts-reconcile").join("vsts-reconcile.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".vsts-reconcile").join("vsts-reconcile.log");
    }
    PathBuf::from("vsts-reconcile.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    // CLI > env > config file
    let mut config = Config::load()?;
    if let Some(account) = args.account.clone() {
        config.account = Some(account);
    }
    if let Some(token) = args.token.clone() {
        config.token = Some(token);
    }
    if let Some(base_url) = args.base_url.clone() {
        config.base_url = Some(base_url);
    }

    let credential = config.credential()?;
    let base_url = config.effective_base_url(&credential);
    let transport = Transport::with_base_url(credential, &base_url)
        .context("Failed to create HTTP client")?;
    let settle = config.settle_strategy();

    tracing::info!("Using account: {}", transport.account());

    match Manifest::load(args.command.manifest())? {
        Manifest::Project(spec) => run::<Project>(&transport, settle, spec, &args.command).await,
        Manifest::Repository(spec) => {
            run::<Repository>(&transport, settle, spec, &args.command).await
        }
        Manifest::ServiceEndpoint(spec) => {
            run::<ServiceEndpoint>(&transport, settle, spec, &args.command).await
        }
    }
}

async fn run<R>(
    transport: &Transport,
    settle: SettleStrategy,
    spec: R::Spec,
    command: &Command,
) -> Result<()>
where
    R: Resource,
    R::Field: FromStr<Err = String>,
{
    let controller = Controller::<R>::new(transport).with_settle(settle);

    let record = match command {
        Command::Create { .. } => {
            let mut record = Record::new(spec);
            controller.create(&mut record).await?;
            record
        }
        Command::Read { id, .. } => {
            let mut record = Record::bound(spec, id.as_str())?;
            if controller.read(&mut record).await? == Refresh::Gone {
                eprintln!("{} {} no longer exists", R::KIND, id);
            }
            record
        }
        Command::Update { id, changed, .. } => {
            let fields = changed
                .iter()
                .map(|field| field.parse::<R::Field>())
                .collect::<Result<Vec<_>, String>>()
                .map_err(anyhow::Error::msg)?;
            let mut changes = Changes::new(fields);
            let mut record = Record::bound(spec.clone(), id.as_str())?;
            controller.update(&mut record, spec, &mut changes).await?;
            record
        }
        Command::Delete { id, .. } => {
            let mut record = Record::bound(spec, id.as_str())?;
            controller.delete(&mut record).await?;
            record
        }
        Command::Import { id, .. } => {
            let mut record = Record::new(spec);
            controller.import(&mut record, id).await?;
            record
        }
    };

    let outcome = serde_json::json!({
        "id": record.id(),
        "state": record.state(),
        "observed": record.observed(),
    });
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(())
}
