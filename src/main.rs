/*****************************************************************************************
 *
 *  LarkPoll – Long-Polling Config Update Microservice in Rust
 *  -----------------------------------------------------------
 *
 *  VERSION: per-key bounded history + hub wake-up for long-polling readers
 *
 *****************************************************************************************/

use std::path::PathBuf;

use axum::serve;
use tokio::net::TcpListener;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::FmtSubscriber;

use larkpoll::app;
use larkpoll::config::AppConfig;
use larkpoll::state::app::AppState;

#[tokio::main]
async fn main() {
    //
    // ────────────────────────────────────────────────────────
    //  Locate config.json (EXE folder or project root)
    // ────────────────────────────────────────────────────────
    //
    let exe_path = std::env::current_exe().expect("Cannot get executable path");
    let exe_dir = exe_path.parent().expect("Cannot get executable directory");

    let mut config_path: PathBuf = exe_dir.join("config.json");

    if !config_path.exists() {
        let fallback = exe_dir.join("..").join("config.json");
        if fallback.exists() {
            config_path = fallback;
        } else {
            panic!(
                "config.json not found in:\n  {}\n  {}\nCopy config.json to one of these paths.",
                exe_dir.join("config.json").display(),
                fallback.display()
            );
        }
    }

    //
    // ────────────────────────────────────────────────────────
    //  Load configuration
    // ────────────────────────────────────────────────────────
    //
    let cfg = AppConfig::load_from_file(config_path.to_str().unwrap());

    //
    // ────────────────────────────────────────────────────────
    //  Configure logging
    // ────────────────────────────────────────────────────────
    //
    let level = match cfg.log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info"  => LevelFilter::INFO,
        "warn"  => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    tracing::info!("Starting LarkPoll…");
    tracing::info!("Loaded configuration from {}: {:?}", config_path.display(), cfg);

    //
    // ────────────────────────────────────────────────────────
    //  Create shared state (history store + wake-up hub)
    // ────────────────────────────────────────────────────────
    //
    let state = AppState::new(&cfg);

    //
    // ────────────────────────────────────────────────────────
    //  Build Axum app (updates + system routes)
    // ────────────────────────────────────────────────────────
    //
    let app = app::build_app(state.clone(), cfg.clone());

    //
    // ────────────────────────────────────────────────────────
    //  Bind server and start listening
    // ────────────────────────────────────────────────────────
    //
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    tracing::info!("Listening on http://{}", addr);

    serve(listener, app)
        .with_graceful_shutdown(shutdown(state))
        .await
        .expect("Server error");
}

//
// ─────────────────────────────────────────────────────────────
//  Graceful shutdown handler
// ─────────────────────────────────────────────────────────────
//
async fn shutdown(state: AppState) {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");

    tracing::warn!("CTRL+C received — releasing parked long-polls…");
    state.shutdown.cancel();
    tracing::info!("Waiters released. Goodbye.");
}
