use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use ddlsync_catalog::AdapterRegistry;
use ddlsync_core::{ConfigManager, ProfileConfig};
use ddlsync_engine::{run_sync, SyncOptions};
use ddlsync_vcs::GitManager;

/// ddlsync - track warehouse DDL in a git repository
#[derive(Parser)]
#[command(name = "ddlsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.ddlsync.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract DDL and write it into the repository
    Sync {
        /// Profile to use (default: active profile)
        #[arg(short, long)]
        profile: Option<String>,

        /// Report what would happen without writing files or committing
        #[arg(long)]
        dry_run: bool,

        /// Stage and commit written files
        #[arg(long)]
        commit: bool,

        /// Commit message override
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Show profile and repository state
    Status {
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// Probe the warehouse connection
    TestConnection {
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// Initialize the git repository configured in the profile
    Init {
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// Manage connection profiles
    Profiles {
        #[command(subcommand)]
        command: ProfileCommands,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// List configured profiles
    List,

    /// Set the active profile
    Use { name: String },

    /// Delete a profile (the active profile cannot be deleted)
    Delete { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(ConfigManager::default_path);
    let mut config = ConfigManager::load(&config_path)?;

    match cli.command {
        Commands::Sync {
            profile,
            dry_run,
            commit,
            message,
        } => sync_command(&config, profile.as_deref(), dry_run, commit, message).await,
        Commands::Status { profile } => status_command(&config, profile.as_deref()),
        Commands::TestConnection { profile } => {
            test_connection_command(&config, profile.as_deref()).await
        }
        Commands::Init { profile } => init_command(&config, profile.as_deref()),
        Commands::Profiles { command } => profiles_command(&mut config, command),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "ddlsync=debug" } else { "ddlsync=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve a named or active profile
fn resolve_profile<'a>(
    config: &'a ConfigManager,
    name: Option<&str>,
) -> Result<(String, &'a ProfileConfig)> {
    match name {
        Some(name) => {
            let profile = config
                .get_profile(name)
                .ok_or_else(|| anyhow!("Profile '{}' does not exist", name))?;
            Ok((name.to_string(), profile))
        }
        None => {
            let name = config
                .get_active_profile()
                .ok_or_else(|| anyhow!("No active profile set. Use 'ddlsync profiles use <name>'."))?
                .to_string();
            let profile = config
                .get_active_profile_config()
                .ok_or_else(|| anyhow!("Active profile '{}' does not exist", name))?;
            Ok((name, profile))
        }
    }
}

async fn sync_command(
    config: &ConfigManager,
    profile_name: Option<&str>,
    dry_run: bool,
    commit: bool,
    message: Option<String>,
) -> Result<()> {
    let (name, profile) = resolve_profile(config, profile_name)?;
    let registry = AdapterRegistry::with_defaults();

    let options = SyncOptions {
        dry_run,
        commit: commit || profile.commit_on_sync,
        commit_message: message,
    };
    tracing::debug!(
        profile = %name,
        dry_run = options.dry_run,
        commit = options.commit,
        "resolved sync options"
    );

    if dry_run {
        eprintln!("{}", "Dry run: no files will be written.".yellow());
    }
    eprintln!("{} profile '{}'", "Syncing".cyan(), name);

    let outcome = run_sync(profile, &registry, &options).await?;

    for failure in &outcome.failures {
        eprintln!("  {} {}", "failed:".red(), failure);
    }
    for path in &outcome.written {
        eprintln!("  {} {}", "wrote:".green(), path.display());
    }
    if let Some(vcs_error) = &outcome.vcs_error {
        eprintln!("{} {}", "Commit failed:".red(), vcs_error);
    } else if outcome.committed {
        eprintln!("{}", "Committed written files.".green());
    }

    let summary = format!(
        "{} objects, {} successful, {} failed",
        outcome.total, outcome.successful, outcome.failed
    );
    if outcome.failed == 0 {
        println!("{}", summary.green().bold());
    } else {
        println!("{}", summary.yellow().bold());
    }

    Ok(())
}

fn status_command(config: &ConfigManager, profile_name: Option<&str>) -> Result<()> {
    let (name, profile) = resolve_profile(config, profile_name)?;

    println!("{} {}", "Profile:".bold(), name);
    println!("  platform: {}", profile.platform);
    println!("  database: {}", profile.database.as_deref().unwrap_or("-"));
    println!("  schema:   {}", profile.schema.as_deref().unwrap_or("-"));

    let Some(repo_path) = profile.repo_path.as_deref() else {
        println!("{}", "No repository path configured.".yellow());
        return Ok(());
    };

    let git = GitManager::new(repo_path);
    println!("{} {}", "Repository:".bold(), repo_path);
    if !git.is_repository() {
        println!("  {}", "not a git repository (run 'ddlsync init')".yellow());
        return Ok(());
    }

    let status = git.status()?;
    println!("  branch:    {}", status.branch.as_deref().unwrap_or("<detached>"));
    println!("  changed:   {}", status.changed.len());
    println!("  untracked: {}", status.untracked.len());
    if status.dirty {
        println!("  {}", "working tree is dirty".yellow());
    } else {
        println!("  {}", "working tree is clean".green());
    }

    Ok(())
}

async fn test_connection_command(config: &ConfigManager, profile_name: Option<&str>) -> Result<()> {
    let (name, profile) = resolve_profile(config, profile_name)?;
    let registry = AdapterRegistry::with_defaults();
    let mut adapter = registry.resolve(profile)?;

    eprintln!("{} '{}' ({})", "Testing connection for".cyan(), name, adapter.platform());
    tracing::debug!(profile = %name, platform = adapter.platform(), "probing connection");
    adapter.test_connection().await?;
    adapter.disconnect().await;

    println!("{}", "Connection OK".green().bold());
    Ok(())
}

fn init_command(config: &ConfigManager, profile_name: Option<&str>) -> Result<()> {
    let (_, profile) = resolve_profile(config, profile_name)?;
    let repo_path = profile
        .repo_path
        .as_deref()
        .ok_or_else(|| anyhow!("No repository path configured in profile"))?;

    let git = GitManager::new(repo_path);
    if git.is_repository() {
        println!("{} {}", "Already a git repository:".yellow(), repo_path);
        return Ok(());
    }

    git.init_repository()?;
    println!("{} {}", "Initialized repository at".green(), repo_path);
    Ok(())
}

fn profiles_command(config: &mut ConfigManager, command: ProfileCommands) -> Result<()> {
    match command {
        ProfileCommands::List => {
            let active = config.get_active_profile().map(str::to_string);
            let profiles = config.list_profiles();
            if profiles.is_empty() {
                println!("{}", "No profiles configured.".yellow());
                return Ok(());
            }
            for name in profiles {
                if Some(name) == active.as_deref() {
                    println!("{} {}", "*".green().bold(), name.bold());
                } else {
                    println!("  {}", name);
                }
            }
        }
        ProfileCommands::Use { name } => {
            config.set_active_profile(&name)?;
            println!("{} '{}'", "Active profile set to".green(), name);
        }
        ProfileCommands::Delete { name } => {
            config.delete_profile(&name)?;
            println!("{} '{}'", "Deleted profile".green(), name);
        }
    }
    Ok(())
}
