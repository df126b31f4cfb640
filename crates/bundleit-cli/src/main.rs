//! bundleit CLI tool.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "bundleit")]
#[command(about = "Clone, build and publish app bundles", long_about = None)]
struct Cli {
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone, build, upload and register a bundle
    Run {
        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Resolve the configuration and print it with tokens redacted
    Validate {
        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Print the SHA-256 digest and upload path of a bundle file
    Hash {
        /// Path to the bundle
        path: PathBuf,
    },
    /// Print the version code for a major.minor.patch version
    VersionCode {
        /// Version string, e.g. 1.2.3
        version: String,
    },
}

/// Configuration file location and the values that override it.
#[derive(Args, Debug, Clone)]
pub struct SettingsArgs {
    /// Path to the JSON configuration file
    #[arg(long, env = "BUNDLEIT_CONFIG", default_value = "/config/config.json")]
    pub config: PathBuf,

    /// SSH private key for cloning (defaults to deploy_key next to the config file)
    #[arg(long)]
    pub deploy_key: Option<PathBuf>,

    /// Directory to clone the repository into
    #[arg(long, default_value = "repo")]
    pub checkout_dir: PathBuf,

    /// Project directory inside the repository
    #[arg(long, env = "PROJECT_PATH")]
    pub project_path: Option<String>,

    /// Repository URL
    #[arg(long, env = "REPO_URL")]
    pub repo_url: Option<String>,

    /// Commit, tag or branch to build
    #[arg(long, env = "BUILD_COMMIT")]
    pub build_commit: Option<String>,

    /// App name recorded with the bundle
    #[arg(long, env = "APP_NAME")]
    pub app_name: Option<String>,

    /// Lowest app version that may load the bundle
    #[arg(long, env = "MIN_APP_VERSION")]
    pub min_app_version: Option<String>,

    /// Highest app version that may load the bundle
    #[arg(long, env = "MAX_APP_VERSION")]
    pub max_app_version: Option<String>,

    /// Package manager used for install and build
    #[arg(long)]
    pub package_manager: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Commands::Run { settings } => {
            commands::run::run(&settings).await?;
        }
        Commands::Validate { settings } => {
            commands::validate(&settings)?;
        }
        Commands::Hash { path } => {
            commands::hash(&path).await?;
        }
        Commands::VersionCode { version } => {
            commands::version_code(&version)?;
        }
    }

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}
