use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pairnote::widget::{WidgetBridge, WidgetView};
use pairnote::{config, inbox};

/// Replay a push data payload through the background handler, as if the
/// note arrived while the app was closed, then print the redrawn widget.
#[derive(Parser, Debug)]
#[command(about = "Feed a push data payload to the background handler")]
struct Args {
    /// Path to YAML config
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// JSON object with the flat push data keys
    #[arg(long)]
    data: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let data: BTreeMap<String, String> =
        serde_json::from_str(&args.data).context("data must be a flat JSON object of strings")?;

    let bridge = WidgetBridge::new(&cfg.app.data_dir);
    inbox::handle_push_message(&data, &bridge);

    let view = WidgetView::from_stored(&bridge.get(), &WidgetView::initial());
    println!("{view}");
    Ok(())
}
