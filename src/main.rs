//! `bookrec` entrypoint: offline pipeline stages and the HTTP server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use bookrec::config::Config;
use bookrec::gateway::{HandlerState, create_router_with_state};
use bookrec::recommend::{RecommendRequest, Recommender};
use bookrec::scoring::{DevicePreference, select_device};
use bookrec::training::{TrainingConfig, prepare, prepare_wals, train_from_dirs};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[command(name = "bookrec")]
#[command(about = "Book recommendations from explicit ratings")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean the raw books/users/ratings CSV files
    Clean {
        /// Directory with the raw files (defaults to BOOKREC_DATA_DIR)
        #[arg(long, value_name = "DIR")]
        input: Option<PathBuf>,

        /// Directory for the *_clean.csv files (defaults to BOOKREC_DATA_DIR)
        #[arg(long, value_name = "DIR")]
        output: Option<PathBuf>,
    },
    /// Build the encoded training set, encoders and mask mapping
    Prepare {
        /// Shuffle seed (defaults to BOOKREC_SEED)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Export the explicit ratings as WALS sparse-matrix TFRecords
    PrepareWals,
    /// Fit the two-tower model on the prepared training set
    Train,
    /// Print the top-K books for one user
    Recommend {
        user_id: String,

        /// Number of books (defaults to BOOKREC_DEFAULT_K)
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Serve recommendations over HTTP (default)
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check());
    }

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Clean { input, output } => {
            let input = input.unwrap_or_else(|| config.data_dir.clone());
            let output = output.unwrap_or_else(|| config.data_dir.clone());
            let report = bookrec::cleaning::clean_dir(&input, &output)?;
            println!(
                "books {}/{}, users {}/{}, ratings {}/{} ({} without a book)",
                report.books.kept,
                report.books.read,
                report.users.kept,
                report.users.read,
                report.ratings.kept,
                report.ratings.read,
                report.ratings_without_book
            );
        }
        Commands::Prepare { seed } => {
            let seed = match seed {
                Some(seed) => seed,
                None => TrainingConfig::from_env()?.seed,
            };
            let prepared = prepare(&config.data_dir, &config.artifact_dir, seed)?;
            println!(
                "{} explicit ratings, {} users, {} books -> {}",
                prepared.rows.len(),
                prepared.user_encoder.cardinality(),
                prepared.item_encoder.cardinality(),
                prepared.train_set_path.display()
            );
        }
        Commands::PrepareWals => {
            let report = prepare_wals(&config.data_dir)?;
            println!(
                "{} explicit ratings, {} users, {} books -> {}, {}",
                report.ratings,
                report.n_users,
                report.n_items,
                report.users_for_item.display(),
                report.items_for_user.display()
            );
        }
        Commands::Train => {
            let training = TrainingConfig::from_env()?;
            let device = select_device(DevicePreference::from_env())?;
            let report = train_from_dirs(&config.data_dir, &config.artifact_dir, training, device)?;
            println!(
                "epochs run {}, best epoch {}, best validation MAE {:.4}",
                report.epochs_run, report.best_epoch, report.best_val_mae
            );
        }
        Commands::Recommend { user_id, k } => {
            let recommender = Recommender::from_dir(&config.artifact_dir)?;
            let request = RecommendRequest::new(user_id, k.unwrap_or(config.default_k));
            let recommendation = recommender.predict(&request)?;
            println!("{}", serde_json::to_string_pretty(&recommendation)?);
        }
        Commands::Serve => serve(config).await?,
    }

    Ok(())
}

async fn serve(config: Config) -> anyhow::Result<()> {
    config.validate_for_serving()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        artifact_dir = %config.artifact_dir.display(),
        "bookrec starting"
    );

    let recommender = Recommender::from_dir(&config.artifact_dir).with_context(|| {
        format!(
            "failed to load artifacts from {}",
            config.artifact_dir.display()
        )
    })?;

    let state = HandlerState::from_config(Arc::new(recommender), &config);
    let app = create_router_with_state(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("bookrec shutdown complete");
    Ok(())
}

fn run_health_check() -> i32 {
    let port = std::env::var("BOOKREC_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let url = format!("http://127.0.0.1:{}/healthz", port);

    let Ok(rt) = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    else {
        return 1;
    };

    rt.block_on(async {
        let Ok(client) = reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
        else {
            return 1;
        };

        match client.get(&url).send().await {
            Ok(res) if res.status().is_success() => 0,
            _ => 1,
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
