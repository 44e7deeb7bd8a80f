use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tiforge::config::RawConfig;
use tracing::{error, info};

mod cmd;
mod console;

#[derive(Parser, Debug)]
#[command(author, version, about = "Exhaustive TI montage search", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON file with search parameters. Explicit flags override its values.
    #[arg(global = true, long)]
    config: Option<PathBuf>,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Search(cmd::search::SearchArgs),
    Inspect(cmd::inspect::InspectArgs),
}

fn main() {
    // 1. Parse Raw Matches (to tell explicit flags apart from defaults)
    let matches = Cli::command().get_matches();
    // 2. Construct CLI struct (populated with defaults)
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    if cli.debug {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt::init();
    }

    info!("🚀 Initializing TI Forge...");

    // 3. Extract the CLI-provided config and the subcommand name its matches live under
    let (cli_config, subcommand) = match &cli.command {
        Commands::Search(args) => (&args.config, "search"),
        Commands::Inspect(args) => (&args.config, "inspect"),
    };

    // 4. Resolve parameters: JSON file as the base, explicit flags on top
    let config = match &cli.config {
        Some(path) => {
            info!("⚙️  Loading configuration from: {}", path.display());
            let mut file_config = RawConfig::load_from_file(path).unwrap_or_else(|e| {
                error!("❌ {}", e);
                process::exit(1);
            });
            if let Some(sub_matches) = matches.subcommand_matches(subcommand) {
                file_config.merge_from_cli(cli_config, sub_matches);
            }
            file_config
        }
        None => cli_config.clone(),
    };

    // 5. Execute
    let result = match cli.command {
        Commands::Search(args) => cmd::search::run(args, config),
        Commands::Inspect(args) => cmd::inspect::run(args, config),
    };

    if let Err(e) = result {
        error!("❌ FATAL: {}", e);
        process::exit(1);
    }
}
