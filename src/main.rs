use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use spotme::{
    cli, config, error,
    spotify::top::MAX_LIMIT,
    types::{TimeRange, TopQuery},
    warning,
};

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
    /// Spotify client id (overrides SPOTIFY_CLIENT_ID and the stored one)
    #[clap(long, global = true)]
    client_id: Option<String>,

    /// Print debug output
    #[clap(long, short, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authenticate with Spotify using PKCE
    Login,

    /// Show the current user's profile
    Me,

    /// Remove the stored client id and tokens
    Logout,

    /// Show your top artists or songs
    #[clap(subcommand)]
    Top(TopCommand),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Subcommand, Debug, Clone)]
pub enum TopCommand {
    /// Your most listened artists
    Artists(TopOption),

    /// Your most listened songs
    Songs(TopOption),
}

#[derive(Parser, Debug, Clone)]
pub struct TopOption {
    /// Number of entries per page
    #[clap(long, short, default_value_t = 20, value_parser = clap::value_parser!(u32).range(1..=MAX_LIMIT as i64))]
    limit: u32,

    /// Index of the first entry, as printed in the page links
    #[clap(long, short, default_value_t = 0)]
    offset: u32,

    /// Listening period the ranking covers
    #[clap(long, short, value_enum, default_value_t = TimeRange::Medium)]
    time_range: TimeRange,
}

impl From<TopOption> for TopQuery {
    fn from(opt: TopOption) -> Self {
        TopQuery {
            limit: opt.limit,
            offset: opt.offset,
            time_range: opt.time_range,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        warning!("Cannot load environment file. Err: {}", e);
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Login => cli::login(cli.client_id, cli.verbose).await,
        Command::Me => cli::me(cli.client_id, cli.verbose).await,
        Command::Logout => cli::logout(cli.verbose).await,
        Command::Top(TopCommand::Artists(opt)) => {
            cli::top_artists(cli.client_id, cli.verbose, opt.into()).await
        }
        Command::Top(TopCommand::Songs(opt)) => {
            cli::top_songs(cli.client_id, cli.verbose, opt.into()).await
        }
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("{}", e);
    }
}
