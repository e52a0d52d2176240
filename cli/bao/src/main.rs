//! bao CLI — build script packages and package repositories.

mod commands;
mod manifest;

use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use manifest::BaoManifest;

#[derive(Parser)]
#[command(name = "bao", version, about = "Build script packages and package repositories")]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new bao project
    Init {
        /// Project name
        name: String,
    },
    /// Build the repository described by bao.toml
    Build {
        /// Output directory (default: [repository] output in bao.toml)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Fail if two packages share a name
        #[arg(long)]
        deny_duplicates: bool,
    },
    /// Build a single package archive from a script
    Bundle {
        /// Main script
        script: PathBuf,
        /// Module to bundle (script file or package directory); repeatable
        #[arg(long = "module", short = 'm')]
        modules: Vec<PathBuf>,
        /// Archive path (default: <name>.zip)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Package name (default: from the script header, else the file stem)
        #[arg(long)]
        name: Option<String>,
    },
    /// Show the metadata and entries of a package archive
    Inspect {
        /// Package archive
        archive: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Remove the repository output directory
    Clean,
}

fn init_tracing(cli: &Cli) {
    let filter = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "warn,bao=info,bao_package=info,bao_repository=info",
            2 => "info,bao=debug,bao_package=debug,bao_repository=debug",
            _ => "trace",
        }
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Init { name } => commands::init::run(&name),

        Commands::Build {
            output,
            deny_duplicates,
        } => {
            let (manifest, project_dir) = load_manifest_required(&cwd)?;
            let output = output.map(|dir| cwd.join(dir));
            commands::build::run(&project_dir, &manifest, output.as_deref(), deny_duplicates)?;
            Ok(())
        }

        Commands::Bundle {
            script,
            modules,
            output,
            name,
        } => {
            let layout = match BaoManifest::find_and_load(&cwd)? {
                Some((manifest, _)) => manifest.module_layout(),
                None => Default::default(),
            };
            commands::bundle::run(
                &cwd,
                &script,
                &modules,
                output.as_deref(),
                name.as_deref(),
                &layout,
            )?;
            Ok(())
        }

        Commands::Inspect { archive, json } => commands::inspect::run(&cwd.join(archive), json),

        Commands::Clean => {
            let (manifest, project_dir) = load_manifest_required(&cwd)?;
            commands::clean::run(&project_dir, &manifest)
        }
    }
}

/// Load manifest, returning error if not found.
fn load_manifest_required(cwd: &Path) -> anyhow::Result<(BaoManifest, PathBuf)> {
    match BaoManifest::find_and_load(cwd)? {
        Some((manifest, dir)) => Ok((manifest, dir)),
        None => anyhow::bail!("no bao.toml found (run `bao init` first)"),
    }
}
