use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Parser;
use pairnote::compose::{self, NoteInput};
use pairnote::{config, db, pairing, style};

#[derive(Parser, Debug)]
#[command(about = "Send a note or sticker to your partner")]
struct Args {
    /// Path to YAML config
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Note text (text mode)
    #[arg(long, conflicts_with = "sticker")]
    text: Option<String>,

    /// Sticker id (sticker mode), e.g. sticker_heart
    #[arg(long)]
    sticker: Option<String>,

    /// Theme id to switch the widget background
    #[arg(long)]
    theme: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let Some(state) = pairing::load(Path::new(&cfg.app.data_dir)) else {
        bail!("not paired yet; run the `pair` utility first");
    };

    let input = match (&args.text, &args.sticker) {
        (Some(text), None) => NoteInput::Text(text.clone()),
        (None, Some(sticker)) => {
            if style::sticker_asset(sticker).is_none() {
                let known: Vec<&str> = style::STICKERS.iter().map(|s| s.id).collect();
                bail!("unknown sticker {sticker}; pick one of: {}", known.join(", "));
            }
            NoteInput::Sticker(sticker.clone())
        }
        _ => bail!("pass either --text or --sticker"),
    };

    if let Some(theme) = &args.theme {
        if !style::THEMES.iter().any(|t| t.id == theme.as_str()) {
            let known: Vec<&str> = style::THEMES.iter().map(|t| t.id).collect();
            bail!("unknown theme {theme}; pick one of: {}", known.join(", "));
        }
    }

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| format!("sqlite://{}/pairnote.db", cfg.app.data_dir));
    let pool = db::init_pool(&database_url).await?;
    db::run_migrations(&pool).await?;

    match compose::send_note(&pool, &state, &input, args.theme.as_deref()).await {
        Ok(()) => {
            println!("Sent!");
            Ok(())
        }
        Err(err) => {
            eprintln!("Failed to send note");
            Err(err)
        }
    }
}
