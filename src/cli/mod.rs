use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{ConfigLoader, CONFIG_ENV, DATA_ENV};
use crate::store::MemoryVault;

pub mod commands;

use self::commands::{
    AttachmentsArgs, EntriesArgs, FieldsArgs, GroupsArgs, HistoryArgs, Report, RestoreArgs,
    TrashArgs,
};

#[derive(Parser, Debug)]
#[command(
    name = "vaultview",
    version,
    about = "Inspect a password vault snapshot the way the vault UI shows it"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the config file location (takes precedence over VAULTVIEW_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over VAULTVIEW_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Vault snapshot to read (defaults to the configured snapshot path)
    #[arg(long)]
    pub vault: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the visible group tree
    Groups(GroupsArgs),
    /// List the entries of a group
    Entries(EntriesArgs),
    /// Show an entry's fields as the details pane lays them out
    Fields(FieldsArgs),
    /// Show previous values of one field
    History(HistoryArgs),
    /// Write a previous value back into a field
    Restore(RestoreArgs),
    /// List the attachments of an entry
    Attachments(AttachmentsArgs),
    /// Inspect or act on the trash group
    Trash(TrashArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var(CONFIG_ENV, path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var(DATA_ENV, path);
    }

    let loader = ConfigLoader::discover()?;
    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let config = loader.load_or_init()?;

    let vault_path = cli
        .vault
        .clone()
        .unwrap_or_else(|| config.vault.snapshot_path.clone());
    let mut vault = MemoryVault::load(&vault_path)?;

    let report = match cli.command {
        Commands::Groups(args) => Report::view(commands::groups(&vault, &config, &args)),
        Commands::Entries(args) => Report::view(commands::entries(&vault, &config, &args)),
        Commands::Fields(args) => Report::view(commands::fields(&vault, &config, &args)?),
        Commands::History(args) => Report::view(commands::history(&vault, &args)?),
        Commands::Attachments(args) => Report::view(commands::attachments(&vault, &args)?),
        Commands::Restore(args) => commands::restore(&mut vault, &args)?,
        Commands::Trash(args) => commands::trash(&mut vault, args)?,
    };

    print!("{}", report.text);
    if report.modified {
        vault
            .save(&vault_path)
            .with_context(|| format!("saving vault snapshot {}", vault_path.display()))?;
        tracing::info!(path = %vault_path.display(), "vault snapshot updated");
    }
    Ok(())
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        Ok(())
    })
    .map(|_| ())
}
