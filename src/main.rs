use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

mod aggregate;
mod bonus;
mod config;
mod db;
mod delta;
mod error;
mod files;
mod merge;
mod models;
mod pipeline;
mod rank;
mod report;

use config::{EmptyPolicy, Settings};
use db::PgSnapshotStore;
use models::LeaderboardType;

#[derive(Parser)]
#[command(name = "datathon-leaderboard")]
#[command(about = "Combine competition leaderboards into ranked datathon standings", long_about = None)]
struct Cli {
    /// Folder holding public/csv/, private/ and final/ inputs
    #[arg(long, global = true, env = "LEADERBOARD_DATA_DIR", default_value = config::ROOT_FOLDER_PATH)]
    data_dir: PathBuf,

    /// Snapshot collection name
    #[arg(long, global = true, env = "LEADERBOARD_COLLECTION", default_value = db::COLLECTION)]
    collection: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct RunArgs {
    #[arg(value_enum)]
    kind: LeaderboardType,
    /// Read competition exports from this folder instead of the data layout
    #[arg(long)]
    competitions: Option<PathBuf>,
    #[arg(long, default_value_t = rank::MAX_NUM_OF_TEAMS)]
    size: usize,
    #[arg(long, default_value_t = bonus::EVENT_BONUS_WEIGHT)]
    bonus_weight: f64,
    #[arg(long, value_enum, default_value_t = EmptyPolicy::Reject)]
    empty_policy: EmptyPolicy,
    /// Print the standings as JSON instead of a table
    #[arg(long)]
    json: bool,
}

impl RunArgs {
    fn settings(&self, data_dir: PathBuf) -> Settings {
        Settings {
            data_dir,
            competitions_dir: self.competitions.clone(),
            size: self.size,
            bonus_weight: self.bonus_weight,
            empty_policy: self.empty_policy,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Insert mock standings for every leaderboard type
    Seed {
        #[arg(default_value_t = rank::MAX_NUM_OF_TEAMS)]
        num_of_teams: usize,
    },
    /// Compute and display the current standings without saving them
    Show(RunArgs),
    /// Compute, display and append the current standings
    Publish(RunArgs),
    /// Display the most recent stored snapshot of a type
    Latest {
        #[arg(value_enum)]
        kind: LeaderboardType,
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to the leaderboard Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    let store = PgSnapshotStore::new(pool.clone(), cli.collection);

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed { num_of_teams } => {
            let snapshots = db::seed(&store, num_of_teams).await?;
            for snapshot in snapshots {
                println!(
                    "Added mock entry for {} leaderboard ({} teams).",
                    report::capitalize(snapshot.kind.as_str()),
                    snapshot.data.len()
                );
            }
        }
        Commands::Show(args) => {
            let settings = args.settings(cli.data_dir);
            let standings = pipeline::build_standings(&store, args.kind, &settings).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&standings)?);
            } else {
                println!("Latest standing for {} leaderboard", report::capitalize(args.kind.as_str()));
                print!("{}", report::render_table(args.kind, &standings));
            }
        }
        Commands::Publish(args) => {
            let settings = args.settings(cli.data_dir);
            let snapshot = pipeline::publish_standings(&store, args.kind, &settings).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print!("{}", report::render_snapshot(&snapshot));
            }
            eprintln!("Updated {} leaderboard.", report::capitalize(args.kind.as_str()));
        }
        Commands::Latest { kind, json } => match db::latest(&store, kind).await? {
            Some(snapshot) if json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
            Some(snapshot) => print!("{}", report::render_snapshot(&snapshot)),
            None => println!("No {kind} snapshots stored yet."),
        },
    }

    pool.close().await;
    Ok(())
}
