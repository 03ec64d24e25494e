use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use ruleflow_config::WorkflowRequest;
use ruleflow_orchestrator::{WorkflowSaver, validate_request};
use ruleflow_store::{Entity, SqliteStore, Store};

/// Ruleflow - validate and save rule workflows
#[derive(Parser)]
#[command(name = "ruleflow")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.ruleflow)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Database URL (default: sqlite://<data-dir>/ruleflow.db)
  #[arg(long, global = true, env = "RULEFLOW_DATABASE_URL")]
  database_url: Option<String>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Check a workflow request without saving it
  Validate {
    /// Path to the request file (JSON), or `-` for stdin
    request_file: PathBuf,
  },

  /// Create a new rule from a workflow request
  Create {
    /// Path to the request file (JSON), or `-` for stdin
    request_file: PathBuf,

    /// User recorded as the rule's creator
    #[arg(long)]
    requester: Uuid,
  },

  /// Replace an existing rule's workflow
  Update {
    rule_id: Uuid,

    /// Path to the request file (JSON), or `-` for stdin
    request_file: PathBuf,
  },

  /// Print a saved workflow
  Show { rule_id: Uuid },

  /// Manage entities rules can target
  Entity {
    #[command(subcommand)]
    command: EntityCommand,
  },
}

#[derive(Subcommand)]
enum EntityCommand {
  /// Register an entity
  Add {
    entity_id: Uuid,
    entity_type_id: Uuid,
    name: String,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(io::stderr)
    .init();

  let Some(command) = cli.command else {
    println!("ruleflow - use --help to see available commands");
    return Ok(());
  };

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".ruleflow"),
  };

  let rt = tokio::runtime::Runtime::new()?;
  let success = rt.block_on(async { run(command, data_dir, cli.database_url).await })?;
  if !success {
    std::process::exit(1);
  }

  Ok(())
}

/// Execute one command. Returns `false` when a dry run found errors.
async fn run(command: Commands, data_dir: PathBuf, database_url: Option<String>) -> Result<bool> {
  let cancel = CancellationToken::new();
  let on_interrupt = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      on_interrupt.cancel();
    }
  });

  match command {
    Commands::Validate { request_file } => {
      let request = read_request(&request_file)?;
      let report = validate_request(&request);
      print_json(&report)?;
      return Ok(report.valid);
    }
    Commands::Create {
      request_file,
      requester,
    } => {
      let request = read_request(&request_file)?;
      let saver = WorkflowSaver::without_events(open_store(&data_dir, database_url).await?);
      let saved = saver
        .create_workflow(requester, &request, &cancel)
        .await
        .context("failed to create workflow")?;
      print_json(&saved)?;
    }
    Commands::Update {
      rule_id,
      request_file,
    } => {
      let request = read_request(&request_file)?;
      let saver = WorkflowSaver::without_events(open_store(&data_dir, database_url).await?);
      let saved = saver
        .save_workflow(rule_id, &request, &cancel)
        .await
        .context("failed to save workflow")?;
      print_json(&saved)?;
    }
    Commands::Show { rule_id } => {
      let saver = WorkflowSaver::without_events(open_store(&data_dir, database_url).await?);
      let saved = saver
        .load_workflow(rule_id)
        .await
        .with_context(|| format!("failed to load rule {rule_id}"))?;
      print_json(&saved)?;
    }
    Commands::Entity {
      command:
        EntityCommand::Add {
          entity_id,
          entity_type_id,
          name,
        },
    } => {
      let store = open_store(&data_dir, database_url).await?;
      let entity = Entity {
        entity_id,
        entity_type_id,
        name,
      };
      store
        .insert_entity(&entity)
        .await
        .context("failed to register entity")?;
      print_json(&entity)?;
    }
  }

  Ok(true)
}

async fn open_store(data_dir: &Path, database_url: Option<String>) -> Result<SqliteStore> {
  let url = match database_url {
    Some(url) => url,
    None => {
      tokio::fs::create_dir_all(data_dir)
        .await
        .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;
      format!("sqlite://{}", data_dir.join("ruleflow.db").display())
    }
  };

  let store = SqliteStore::connect(&url)
    .await
    .with_context(|| format!("failed to open database: {url}"))?;
  store.migrate().await.context("failed to run migrations")?;
  info!(database = %url, "store ready");

  Ok(store)
}

fn read_request(path: &Path) -> Result<WorkflowRequest> {
  let content = if path == Path::new("-") {
    let mut input = String::new();
    io::stdin()
      .read_to_string(&mut input)
      .context("failed to read request from stdin")?;
    input
  } else {
    std::fs::read_to_string(path)
      .with_context(|| format!("failed to read request file: {}", path.display()))?
  };

  serde_json::from_str(&content)
    .with_context(|| format!("failed to parse request: {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
