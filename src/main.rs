use std::{process::ExitCode, time::Duration};

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use songsim::{Res, cli, config, error, types::RecommendationConstraints};

const TITLE: &str = "Spotify Song Similarity Finder";

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Print seed and request details before each fetch and enable debug logs
    #[clap(long, global = true)]
    debug: bool,

    /// Drop the market and popularity constraints from recommendation requests
    #[clap(long, global = true)]
    no_constraints: bool,

    /// Timeout in seconds for every request to Spotify
    #[clap(
        long,
        global = true,
        value_name = "SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: Option<u64>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API, replacing any cached token
    Auth,

    /// Delete the cached token
    Logout,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(Command::Completions(opt)) = &cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return ExitCode::SUCCESS;
    }

    init_logging(cli.debug);

    println!("{}", TITLE);
    println!("{}", "-".repeat(40));

    let code = match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    };

    println!("\nThank you for using {}!", TITLE);
    code
}

async fn run(cli: Cli) -> Res<()> {
    config::load_env().await?;

    let mut config = config::Config::from_env()?;
    if cli.debug {
        config.debug = true;
    }
    if cli.no_constraints {
        config.constraints = RecommendationConstraints::default();
    }
    if let Some(secs) = cli.timeout {
        config.http_timeout = Duration::from_secs(secs);
    }

    match cli.command {
        Some(Command::Auth) => cli::auth(&config).await?,
        Some(Command::Logout) => cli::logout(&config).await?,
        Some(Command::Completions(_)) => {}
        None => cli::run(&config).await?,
    }
    Ok(())
}

fn init_logging(debug: bool) {
    let default_filter = if debug {
        concat!(env!("CARGO_PKG_NAME"), "=debug")
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}
