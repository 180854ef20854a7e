use clap::{Parser, Subcommand};
use homeflow_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "homeflow-cli", version, about = "HomeFlow CLI")]
struct Cli {
    /// User the command acts for
    #[arg(long, global = true, default_value = "default-user", env = "HOMEFLOW_USER")]
    user: String,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend tasks for how you feel right now
    Recommend(commands::recommend::RecommendArgs),
    /// Pick one tiny task at random
    Tiny,
    /// Start a task and record your mood
    Start(commands::activity::StartArgs),
    /// Finish a started task
    Complete(commands::activity::CompleteArgs),
    /// Streak, weekly points and insights
    Progress {
        #[command(subcommand)]
        action: commands::progress::ProgressAction,
    },
    /// Task library and custom tasks
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Room priorities
    Room {
        #[command(subcommand)]
        action: commands::room::RoomAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    if let Commands::Config { action } = cli.command {
        return commands::config::run(action, config, cli.json);
    }

    let ctx = commands::Context::open(&config, cli.user, cli.json).await?;
    match cli.command {
        Commands::Recommend(args) => commands::recommend::run(&ctx, args).await,
        Commands::Tiny => commands::recommend::tiny(&ctx).await,
        Commands::Start(args) => commands::activity::start(&ctx, args).await,
        Commands::Complete(args) => commands::activity::complete(&ctx, args).await,
        Commands::Progress { action } => commands::progress::run(&ctx, action).await,
        Commands::Task { action } => commands::task::run(&ctx, action).await,
        Commands::Room { action } => commands::room::run(&ctx, action).await,
        // handled before the database is opened
        Commands::Config { .. } => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let (config, load_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    init_logging(&config);
    if let Some(e) = load_error {
        tracing::warn!(error = %e, "falling back to default config");
    }

    if let Err(e) = run(cli, config).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
