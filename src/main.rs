//! Cooldown Board - named cooldown timers kept in sync through a shared state endpoint
//!
//! `serve` runs the state endpoint; `client` runs a board that reads button
//! presses from stdin.

use std::sync::Arc;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    net::TcpListener,
    sync::mpsc,
};
use tracing::{info, warn};

use cooldown_board::{
    api::create_router,
    clock::{Clock, SystemClock},
    config::{ClientArgs, Command, Config, ServeArgs},
    dispatch::{Dispatcher, Flow, UiEvent},
    render::TerminalSurface,
    state::AppRuntime,
    store::StateStore,
    sync::{boot, SyncClient},
    tasks::{flush_on_exit, poll_task, push_task},
    theme::ThemeStore,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("cooldown_board={},tower_http=info", config.log_level()))
        .with_writer(std::io::stderr)
        .init();

    info!("Starting cooldown-board v{}", env!("CARGO_PKG_VERSION"));

    match config.command {
        Command::Serve(args) => serve(args).await,
        Command::Client(args) => client(args).await,
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    info!("Configuration: host={}, port={}, state_file={:?}",
          args.host, args.port, args.state_file);

    let store = Arc::new(match args.state_file.clone() {
        Some(path) => StateStore::open(path).await,
        None => StateStore::in_memory(),
    });

    let app = create_router(Arc::clone(&store));

    let addr = args.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /api/state - Fetch the shared timer state");
    info!("  POST /api/state - Replace the shared timer state");
    info!("  GET  /status    - Summary of the stored state");
    info!("  GET  /health    - Health check");

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    // Nobody is watching the timers once the server is gone.
    if let Err(e) = store.pause_running(SystemClock.now_ms()).await {
        tracing::error!("Failed to save paused state: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}

async fn client(args: ClientArgs) -> anyhow::Result<()> {
    let timers = args.build_timers().map_err(anyhow::Error::msg)?;
    info!("Configuration: server={}, timers={}, poll={:?}, tick={:?}",
          args.server, timers.len(), args.poll_interval(), args.tick_interval());

    let sync = SyncClient::new(&args.server).with_beacon_timeout(args.beacon_timeout());
    let (save_tx, save_rx) = mpsc::unbounded_channel();
    let runtime = AppRuntime::shared(
        timers,
        Arc::new(SystemClock),
        Box::new(TerminalSurface::stdout()),
        save_tx,
        args.tick_interval(),
    );

    boot(&runtime, &sync).await?;

    let pusher = tokio::spawn(push_task(sync.clone(), save_rx));
    let poller = tokio::spawn(poll_task(Arc::clone(&runtime), sync.clone(), args.poll_interval()));

    let mut dispatcher = Dispatcher::new(Arc::clone(&runtime), ThemeStore::load(&args.prefs))?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    info!("Commands: <timer name> | press <name> | pause | reset-all | theme | quit");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Failed to read input: {}", e);
                        break;
                    }
                };
                let Some(event) = UiEvent::parse(&line) else {
                    continue;
                };
                match dispatcher.dispatch(&event) {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Exit) => break,
                    Err(e) => warn!("{}", e),
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    poller.abort();
    info!("Flushing paused state on exit");
    flush_on_exit(&runtime, &sync, pusher).await?;

    info!("Board closed");
    Ok(())
}
