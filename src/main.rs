use anyhow::Result;
use clap::Parser;
use reldist::commands;
use reldist::config::{Config, DIST_ENV, MANIFEST_ENV, PLATFORM_ENV};
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

/// reldist - cross-platform release dispatcher
///
/// Runs or installs the prebuilt binary that matches this platform.
///
/// Examples:
///   reldist run -- new --kind Added     # Run the platform binary with arguments
///   reldist stage --dest .              # Install it under its canonical name
///   reldist prepare                     # Lay out goreleaser binaries for packaging
#[derive(Parser, Debug)]
#[command(author, version = env!("RELDIST_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Manifest JSON file (defaults to the built-in changie manifest)
    #[arg(long, env = MANIFEST_ENV, value_name = "PATH")]
    manifest: Option<PathBuf>,

    /// Platform key to act for, e.g. linux-x64 or win32-x64.exe (defaults to this machine)
    #[arg(long, env = PLATFORM_ENV, value_name = "KEY")]
    platform: Option<String>,

    /// Directory holding per-platform artifacts (defaults to dist/ next to this executable)
    #[arg(long = "dist", env = DIST_ENV, value_name = "DIR")]
    dist_dir: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print the platform key for this machine
    Key,

    /// Print the manifest in effect
    Manifest,

    /// Run the binary for this platform, forwarding arguments and exit code
    #[command(disable_help_flag = true)]
    Run(RunArgs),

    /// Copy the binary for this platform to its canonical name
    Stage(StageArgs),

    /// Copy goreleaser binaries into the dist layout
    Prepare(PrepareArgs),

    /// Check the dist directory against the manifest
    Verify,
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Arguments passed to the binary unchanged
    #[arg(
        value_name = "ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_parser = clap::value_parser!(OsString)
    )]
    pub args: Vec<OsString>,
}

#[derive(clap::Args, Debug)]
pub struct StageArgs {
    /// Directory with per-platform artifacts (defaults to the dist directory)
    #[arg(long, value_name = "DIR")]
    pub source: Option<PathBuf>,

    /// Directory to place the canonical executable in
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub dest: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct PrepareArgs {
    /// goreleaser artifacts descriptor
    #[arg(long, value_name = "FILE", default_value = "dist/artifacts.json")]
    pub artifacts: PathBuf,

    /// Output directory, emptied before copying
    #[arg(long, value_name = "DIR", default_value = "npm/dist")]
    pub out: PathBuf,

    /// Only copy platform keys matching these glob patterns
    #[arg(long = "filter", short = 'f', value_name = "GLOB")]
    pub filters: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = reldist::runtime::RealRuntime;
    let config = Config::new(&runtime, cli.manifest, cli.platform, cli.dist_dir)?;

    match cli.command {
        Commands::Key => commands::key(&config)?,
        Commands::Manifest => commands::manifest(&config)?,
        Commands::Run(args) => {
            let code = commands::run(&runtime, &config, &args.args).await?;
            std::process::exit(code);
        }
        Commands::Stage(args) => {
            commands::stage(&runtime, &config, args.source.as_deref(), &args.dest)?;
        }
        Commands::Prepare(args) => {
            commands::prepare(
                Arc::new(runtime),
                &config,
                &args.artifacts,
                &args.out,
                &args.filters,
            )
            .await?
        }
        Commands::Verify => commands::verify(&runtime, &config)?,
    }
    Ok(())
}
