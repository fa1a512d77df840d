//! TrailMap - headless trail store and playback tool
//!
//! Main entry point for the command line interface.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use trailmap::geo::kmh_to_mps;
use trailmap::playback::{expected_duration, PlaybackEvent};
use trailmap::session::RunOutcome;
use trailmap::storage::config::{get_config_path, load_config, save_config, AppConfig};
use trailmap::trails::{TrailId, UserId};
use trailmap::{Database, PlaybackEngine, TrailSession};

/// TrailMap trail store and playback
#[derive(Parser, Debug)]
#[command(name = "trailmap")]
#[command(about = "Browse stored trails and replay them", long_about = None)]
struct Cli {
    /// Database file (defaults to the configured data directory)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all trails
    List {
        /// Only trails whose name or location matches
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one trail with its reviews
    Show { id: i64 },
    /// Replay a trail in real time
    Play {
        id: i64,
        /// Walking speed in km/h (defaults to the configured speed)
        #[arg(long)]
        speed_kmh: Option<f64>,
        /// Review to submit once the run is over, 1 to 5
        #[arg(long)]
        rating: Option<i64>,
        /// Review comment
        #[arg(long, default_value = "")]
        comment: String,
    },
    /// Review a trail without replaying it
    Review {
        id: i64,
        /// 1 to 5
        rating: i64,
        #[arg(default_value = "")]
        comment: String,
    },
    /// Print the schema version
    Version,
    /// Write the effective configuration to the config file
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting TrailMap v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let config = load_config().context("loading configuration")?;

    if let Command::InitConfig = cli.command {
        save_config(&config).context("saving configuration")?;
        println!("Configuration written to {}", get_config_path().display());
        return Ok(());
    }
    let path = cli
        .database
        .clone()
        .unwrap_or_else(|| config.database_path());

    // Migration failures stop here; nothing below runs on an unmigrated store
    let db = Database::open(&path, &config.storage)
        .with_context(|| format!("opening trail database {}", path.display()))?;

    match cli.command {
        Command::List { search } => list(&db, search.as_deref()),
        Command::Show { id } => show(&db, TrailId(id)),
        Command::Play {
            id,
            speed_kmh,
            rating,
            comment,
        } => play(&db, &config, TrailId(id), speed_kmh, rating, &comment).await,
        Command::Review {
            id,
            rating,
            comment,
        } => {
            let user = UserId(config.playback.user_id);
            let review = db.reviews()?.add_review(user, TrailId(id), rating, &comment)?;
            println!("Review {} saved", review);
            Ok(())
        }
        Command::Version => {
            println!("schema version {}", db.current_version()?);
            Ok(())
        }
        // Handled before the store is opened
        Command::InitConfig => Ok(()),
    }
}

fn list(db: &Database, search: Option<&str>) -> Result<()> {
    let store = db.trails()?;
    let trails = match search {
        Some(query) => store.search_trails(query)?,
        None => store.list_trails()?,
    };

    for trail in trails {
        println!(
            "{:>4}  {:<32} {:<13} {:>5.1} km  {}",
            trail.id, trail.name, trail.difficulty, trail.metrics.length, trail.location.city
        );
    }
    Ok(())
}

fn show(db: &Database, id: TrailId) -> Result<()> {
    let trail = db.trails()?.get_trail(id)?;
    let reviews = db.reviews()?;
    let users = db.users()?;

    println!("{} ({})", trail.name(), trail.summary.difficulty);
    if let Some(description) = &trail.summary.description {
        println!("{}", description);
    }
    println!(
        "{} points, {:.0} m measured, start {}, end {}",
        trail.path.len(),
        trail.path_length_meters(),
        trail.start_point,
        trail.end_point
    );
    match reviews.average_rating(id)? {
        Some(avg) => println!("average rating {:.1}", avg),
        None => println!("no reviews yet"),
    }
    for review in reviews.reviews_for_trail(id)? {
        let author = users.get_user(review.user_id)?;
        println!(
            "  [{}] {} ({})",
            review.rating,
            review.comment,
            author.full_name()
        );
    }
    Ok(())
}

async fn play(
    db: &Database,
    config: &AppConfig,
    id: TrailId,
    speed_kmh: Option<f64>,
    rating: Option<i64>,
    comment: &str,
) -> Result<()> {
    let speed = kmh_to_mps(speed_kmh.unwrap_or(config.playback.speed_kmh));
    let user = UserId(config.playback.user_id);
    let engine = PlaybackEngine::new();

    let mut session = TrailSession::start(db, &engine, user, id, speed)?;
    let eta = expected_duration(session.trail().path.points(), speed)?;
    println!(
        "Playing {} at {:.2} m/s, about {:.0}s",
        session.trail().name(),
        speed,
        eta.as_secs_f64()
    );

    let mut ticker = tokio::time::interval(std::time::Duration::from_millis(200));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for event in session.poll() {
                    if let PlaybackEvent::Position { index, position, elapsed, .. } = event {
                        println!("{:>7.1}s  point {:>3}  {}", elapsed.as_secs_f64(), index, position);
                    }
                }
                if session.outcome() != RunOutcome::InProgress {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("Ending trail early");
                session.end();
                break;
            }
        }
    }

    if session.record_completion(db)? {
        println!("Trail completed");
    }

    if let Some(rating) = rating {
        let review = session.submit_review(db, rating, comment)?;
        println!("Review {} saved", review);
    }

    Ok(())
}
