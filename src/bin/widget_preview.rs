use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use pairnote::config;
use pairnote::widget::{WidgetBridge, WidgetView};

/// Print the widget exactly as the host would draw it from stored state.
#[derive(Parser, Debug)]
#[command(about = "Render the persisted widget state")]
struct Args {
    /// Path to YAML config
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;

    let bridge = WidgetBridge::new(&cfg.app.data_dir);
    let view = WidgetView::from_stored(&bridge.get(), &WidgetView::initial());
    println!("{view}");
    Ok(())
}
