//! paramsync CLI
//!
//! Command-line interface for syncing SSM parameters with local config files.

use std::path::PathBuf;

use aws_config::{BehaviorVersion, Region};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use paramsync::alias::KmsAliasSource;
use paramsync::error::{Result, SyncError};
use paramsync::remote::SsmParameterStore;
use paramsync::sync::DEFAULT_FETCH_SIZE;
use paramsync::{Operation, SyncEngine, SyncOptions};

#[derive(Parser)]
#[command(name = "paramsync")]
#[command(about = "Sync SSM Parameter Store with local properties/JSON/YAML files")]
#[command(version)]
struct Cli {
    /// AWS profile name
    #[arg(short = 'p', long)]
    profile: Option<String>,

    /// AWS region
    #[arg(short = 'r', long)]
    region: Option<String>,

    /// Page size for remote listing calls (1-10)
    #[arg(short = 'b', long, default_value_t = DEFAULT_FETCH_SIZE,
          value_parser = clap::value_parser!(i32).range(1..=10))]
    batch_size: i32,

    /// Directory holding the local config files
    #[arg(short = 'C', long, env = "PARAMSYNC_CONF_DIR", default_value = ".")]
    conf_dir: String,

    /// Config filename relative to the conf directory (repeatable)
    #[arg(short = 'f', long = "filename")]
    filenames: Vec<String>,

    /// Remote parameter path prefix, like /ecs/dev/myapp (repeatable)
    #[arg(short = 's', long = "starts-with")]
    path_prefixes: Vec<String>,

    /// Encrypt every pushed parameter with this KMS key id or alias
    #[arg(short = 'k', long)]
    key_id_put_all: Option<String>,

    /// Pass the overwrite flag when pushing parameters
    #[arg(short = 'o', long, overrides_with = "no_overwrite_put")]
    overwrite_put: bool,
    #[arg(long, hide = true, overrides_with = "overwrite_put")]
    no_overwrite_put: bool,

    /// Wipe the target path before pushing
    #[arg(long, overrides_with = "no_clear_on_put")]
    clear_on_put: bool,
    #[arg(long, hide = true, overrides_with = "clear_on_put")]
    no_clear_on_put: bool,

    /// Store fetched secure values in local files (on by default)
    #[arg(long, overrides_with = "no_store_secure_string")]
    store_secure_string: bool,
    /// Leave secure values out of local files on get
    #[arg(long, overrides_with = "store_secure_string")]
    no_store_secure_string: bool,

    /// Push keys that carry a sidecar key id (on by default)
    #[arg(long, overrides_with = "no_put_secure_string")]
    put_secure_string: bool,
    /// Skip keys that carry a sidecar key id on put
    #[arg(long, overrides_with = "put_secure_string")]
    no_put_secure_string: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Fetch remote parameters into local files
    Get,
    /// Push local file contents to the remote store
    Put,
    /// Delete the remote parameters matching local file keys
    Delete,
    /// Delete all remote parameters under the path
    Clear,
}

impl Command {
    fn operation(self) -> Operation {
        match self {
            Command::Get => Operation::Get,
            Command::Put => Operation::Put,
            Command::Delete => Operation::Delete,
            Command::Clear => Operation::Clear,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    if cli.path_prefixes.is_empty() {
        return Err(SyncError::Config(
            "At least one -s/--starts-with path is required, like /ecs/dev/myapp".to_string(),
        ));
    }
    if cli.filenames.is_empty() {
        return Err(SyncError::Config(
            "At least one -f/--filename argument is required, like instance.properties"
                .to_string(),
        ));
    }

    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(profile) = &cli.profile {
        loader = loader.profile_name(profile);
    }
    if let Some(region) = &cli.region {
        loader = loader.region(Region::new(region.clone()));
    }
    let config = loader.load().await;

    let ssm = SsmParameterStore::new(aws_sdk_ssm::Client::new(&config));
    let kms = KmsAliasSource::new(aws_sdk_kms::Client::new(&config));

    // Expand ~ in path
    let conf_dir = PathBuf::from(shellexpand::tilde(&cli.conf_dir).to_string());

    let options = SyncOptions {
        conf_dir,
        filenames: cli.filenames.clone(),
        path_prefixes: cli.path_prefixes.clone(),
        fetch_size: cli.batch_size,
        overwrite_put: cli.overwrite_put && !cli.no_overwrite_put,
        key_id_put_all: cli.key_id_put_all.clone(),
        no_store_secure_string: cli.no_store_secure_string && !cli.store_secure_string,
        no_put_secure_string: cli.no_put_secure_string && !cli.put_secure_string,
        clear_on_put: cli.clear_on_put && !cli.no_clear_on_put,
    };

    let operation = cli.command.map(Command::operation).unwrap_or(Operation::Get);
    SyncEngine::new(ssm, kms, options).run(operation).await
}
