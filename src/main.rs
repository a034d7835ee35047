use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coupon_store::models::{Coupon, FilterClickCounter};
use coupon_store::{AppState, Config};

/// Inspect and edit the local coupon store
#[derive(Debug, Parser)]
#[command(name = "coupon-store", version)]
struct Cli {
    /// Database file (overrides DATABASE_PATH)
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Saved coupons
    #[command(subcommand)]
    Favorites(FavoritesCommand),
    /// Category filter click counters
    #[command(subcommand)]
    Filters(FiltersCommand),
    /// Drop all local data
    Reset,
}

#[derive(Debug, Subcommand)]
enum FavoritesCommand {
    List,
    Add {
        id: String,
        title: String,
        discount: String,
    },
    Remove {
        id: String,
    },
}

#[derive(Debug, Subcommand)]
enum FiltersCommand {
    Click { category: String },
    Top,
    Count { category: String },
    /// Raise a counter to `count`; lower values are refused
    Set { category: String, count: u64 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coupon_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    if let Some(path) = cli.database {
        config.database_path = path;
    }

    let state = AppState::open(config)?;

    match cli.command {
        Command::Favorites(FavoritesCommand::List) => {
            let mut favorites = state.favorites.observe().await?;
            let coupons = favorites.next().await.transpose()?.unwrap_or_default();
            println!("{}", serde_json::to_string_pretty(&coupons)?);
        }
        Command::Favorites(FavoritesCommand::Add {
            id,
            title,
            discount,
        }) => {
            state
                .favorites
                .add(&Coupon::placeholder(id, title, discount))
                .await?;
        }
        Command::Favorites(FavoritesCommand::Remove { id }) => {
            state.favorites.remove(&id).await?;
        }
        Command::Filters(FiltersCommand::Click { category }) => {
            state.filters.increment_filter_click(&category).await?;
            let count = state.filters.click_count(&category).await?.unwrap_or(0);
            println!("{category}: {count}");
        }
        Command::Filters(FiltersCommand::Top) => {
            let mut top = state
                .filters
                .observe_top(state.config.top_filter_limit)
                .await?;
            for category in top.next().await.transpose()?.unwrap_or_default() {
                println!("{category}");
            }
        }
        Command::Filters(FiltersCommand::Count { category }) => {
            match state.filters.click_count(&category).await? {
                Some(count) => println!("{category}: {count}"),
                None => println!("{category}: never clicked"),
            }
        }
        Command::Filters(FiltersCommand::Set { category, count }) => {
            state
                .store
                .upsert_filter_counter(FilterClickCounter::new(category, count))
                .await?;
        }
        Command::Reset => {
            state.store.clear().await?;
            tracing::info!("All favorites and click counters removed");
        }
    }

    Ok(())
}
