use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use pairnote::payload::WidgetPayload;
use pairnote::push::FcmClient;
use pairnote::style::SenderPalette;
use pairnote::subscription::NoteBus;
use pairnote::widget::{WidgetBridge, WidgetView};
use pairnote::{config, db, fanout, pairing, payload};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| format!("sqlite://{}/pairnote.db", cfg.app.data_dir));

    let pool = db::init_pool(&database_url).await?;
    db::run_migrations(&pool).await?;

    let bus = Arc::new(NoteBus::new());
    let bridge = Arc::new(WidgetBridge::new(&cfg.app.data_dir));

    // Fan-out worker (single-threaded poll over the change outbox)
    let push_client = FcmClient::new(cfg.push.project_id.clone(), cfg.push.token.clone());
    let worker_pool = pool.clone();
    let worker_bus = bus.clone();
    let poll_sleep = Duration::from_millis(cfg.app.poll_interval_ms);
    tokio::spawn(async move {
        loop {
            match fanout::process_next_event(&worker_pool, &push_client, &worker_bus).await {
                Ok(processed) => {
                    if !processed {
                        tokio::time::sleep(poll_sleep).await;
                    }
                }
                Err(err) => {
                    error!(?err, "fan-out worker error");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    });

    // Device-side listeners only make sense once the user has paired.
    let state = pairing::load(Path::new(&cfg.app.data_dir));
    let listener_tasks = match state {
        Some(state) => {
            info!(code = %state.couple_code, name = %state.display_name, "paired");

            // Live-note listener: every change lands on the widget.
            let mut live = bus.subscribe(&state.couple_code);
            let live_bridge = bridge.clone();
            let live_task = tokio::spawn(async move {
                while let Some(event) = live.next().await {
                    let payload = WidgetPayload::from_snapshot(&event.note);
                    live_bridge.set(&payload.to_json());
                }
            });

            // History listener: refresh the memory-lane view on each change.
            let mut hist = bus.subscribe(&state.couple_code);
            let hist_pool = pool.clone();
            let code = state.couple_code.clone();
            let history_limit = cfg.app.history_limit;
            let hist_task = tokio::spawn(async move {
                let mut palette = SenderPalette::new();
                while hist.next().await.is_some() {
                    match db::display_history(&hist_pool, &code, history_limit).await {
                        Ok(entries) => {
                            for entry in &entries {
                                let sender = entry.sender.as_deref().unwrap_or("");
                                info!(
                                    color = palette.color_for(sender),
                                    time = %payload::clock_time(Some(entry.created_at)),
                                    "{} {}",
                                    sender,
                                    entry.text.as_deref().unwrap_or(""),
                                );
                            }
                        }
                        Err(err) => warn!(?err, "failed to load history"),
                    }
                }
            });

            // Widget host: redraw whenever the bridge stores a new payload.
            let mut redraw = bridge.redraw_signal();
            let host_bridge = bridge.clone();
            let host_task = tokio::spawn(async move {
                let mut view = WidgetView::initial();
                while redraw.changed().await.is_ok() {
                    view = WidgetView::from_stored(&host_bridge.get(), &view);
                    info!("widget redraw\n{view}");
                }
            });

            vec![live_task, hist_task, host_task]
        }
        None => {
            info!("no pairing configured; run the `pair` utility to set up");
            Vec::new()
        }
    };

    info!("pairnote relay running");
    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    for task in listener_tasks {
        task.abort();
    }

    Ok(())
}
