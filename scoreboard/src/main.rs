use clap::{Parser, Subcommand};
use log::{error, info};
use scoreboard::{ScoreStore, StoreConfig};
use serde_json::Value;
use shared::{Entry, Response, Submission, MAX_ENTRIES};
use std::path::PathBuf;
use tokio::time::{interval, Duration, MissedTickBehavior};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scoreboard file
    #[arg(short = 'f', long, env = "SCOREBOARD_FILE", default_value = "scores.json")]
    data_file: PathBuf,

    /// Number of entries the board keeps
    #[arg(short = 'c', long, env = "SCOREBOARD_CAPACITY", default_value_t = MAX_ENTRIES)]
    capacity: usize,

    /// Token that `reset` must present; reset is disabled when unset
    #[arg(long, env = "SCOREBOARD_ADMIN_TOKEN", hide_env_values = true)]
    admin_token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a score and print the resulting board
    Submit {
        /// Player name
        #[arg(short = 'n', long)]
        name: Option<String>,
        /// Score; anything that is not a number counts as 0
        #[arg(allow_hyphen_values = true)]
        score: Option<String>,
    },
    /// Print the board as JSON
    List,
    /// Print the board as a table
    Table {
        /// Re-read and reprint the board every SECS seconds
        #[arg(short = 'w', long, value_name = "SECS")]
        watch: Option<u64>,
    },
    /// Delete every entry (requires the admin token)
    Reset {
        #[arg(long)]
        token: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let config = StoreConfig::new(&args.data_file).with_capacity(args.capacity);

    match args.command {
        Command::Submit { name, score } => {
            let store = ScoreStore::open(config).await?;
            let entry = Submission {
                name,
                score: score.map(Value::String),
            }
            .into_entry();

            match store.submit_entry(entry).await {
                Ok(receipt) => {
                    let response = Response::Ok {
                        leaderboard: receipt.leaderboard,
                    };
                    println!("{}", serde_json::to_string_pretty(&response)?);
                }
                Err(e) => {
                    let response = Response::Error {
                        message: e.to_string(),
                    };
                    println!("{}", serde_json::to_string_pretty(&response)?);
                    return Err(e.into());
                }
            }
        }
        Command::List => {
            let store = ScoreStore::open(config).await?;
            println!("{}", serde_json::to_string_pretty(&store.snapshot().await)?);
        }
        Command::Table { watch: None } => {
            let store = ScoreStore::open(config).await?;
            print!("{}", render_table(&store.snapshot().await));
        }
        Command::Table {
            watch: Some(seconds),
        } => {
            tokio::select! {
                _ = watch_table(config, Duration::from_secs(seconds.max(1))) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Received Ctrl+C, stopping");
                }
            }
        }
        Command::Reset { token } => {
            authorize_reset(args.admin_token.as_deref(), &token)?;
            let store = ScoreStore::open(config).await?;
            store.purge().await?;
            println!("{}", serde_json::to_string_pretty(&Response::Ok { leaderboard: Vec::new() })?);
        }
    }

    Ok(())
}

/// Reset is only allowed with a configured admin token that matches
fn authorize_reset(expected: Option<&str>, given: &str) -> Result<(), &'static str> {
    match expected {
        Some(expected) if expected == given => Ok(()),
        Some(_) => Err("reset refused: wrong admin token"),
        None => Err("reset refused: no admin token configured"),
    }
}

/// Reprints the board on a fixed period
///
/// The file is re-read every tick so that submissions made by other
/// processes show up.
async fn watch_table(config: StoreConfig, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        match ScoreStore::open(config.clone()).await {
            Ok(store) => print!("{}", render_table(&store.snapshot().await)),
            Err(e) => error!("Could not read scoreboard: {}", e),
        }
    }
}

fn render_table(entries: &[Entry]) -> String {
    let name_width = entries
        .iter()
        .map(|e| e.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Name".len());

    let mut out = format!("{:>4}  {:<name_width$}  {:>10}\n", "Rank", "Name", "Score");
    for (i, entry) in entries.iter().enumerate() {
        out.push_str(&format!(
            "{:>4}  {:<name_width$}  {:>10}\n",
            i + 1,
            entry.name,
            entry.score
        ));
    }
    if entries.is_empty() {
        out.push_str("(no scores yet)\n");
    }
    out
}
