use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use pairnote::pairing::PairingState;
use pairnote::{compose, config, db, pairing};

#[derive(Parser, Debug)]
#[command(about = "Create or join a shared-note pairing")]
struct Args {
    /// Path to YAML config
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Display name used to sign your notes
    #[arg(long)]
    name: String,

    /// Push token to register for this device, if any
    #[arg(long)]
    push_token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a fresh couple code
    Create,
    /// Join a partner's existing code
    Join { code: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| format!("sqlite://{}/pairnote.db", cfg.app.data_dir));
    let pool = db::init_pool(&database_url).await?;
    db::run_migrations(&pool).await?;

    let code = match &args.command {
        Command::Create => {
            let code = compose::create_pair(&pool).await?;
            println!("Your couple code is: {code}");
            println!("Share this with your partner!");
            code
        }
        Command::Join { code } => {
            let code = compose::join_pair(&pool, code).await?;
            println!("Connected! You are now linked.");
            code
        }
    };

    let state = PairingState {
        couple_code: code.clone(),
        display_name: args.name.clone(),
    };
    pairing::save(Path::new(&cfg.app.data_dir), &state)?;

    if let Some(token) = &args.push_token {
        db::set_token(&pool, &code, &args.name, token).await?;
        println!("Push token saved.");
    }

    Ok(())
}
