use std::sync::Arc;

use clap::Parser;
use tracing::info;

use etb_core::config::Config;
use etb_core::i18n::Localizer;
use etb_db::{PgExpenseStore, RedisDialogStore};

/// Telegram expense tracker bot.
#[derive(Parser, Debug)]
#[command(name = "etb", version)]
struct Cli {
    /// Create the database tables if they do not exist, then start.
    #[arg(long)]
    init_db: bool,

    /// Drop and recreate the database tables, then start. Destroys all data.
    #[arg(long, conflicts_with = "init_db")]
    reset_db: bool,
}

#[tokio::main]
async fn main() -> Result<(), etb_core::Error> {
    let cli = Cli::parse();

    etb_core::logging::init("etb");

    let cfg = Arc::new(Config::load()?);
    let l10n = Arc::new(Localizer::new(&cfg.default_locale)?);

    let store = PgExpenseStore::connect(&cfg.database_url()).await?;
    if cli.reset_db {
        store.reset_schema().await?;
    } else if cli.init_db {
        store.init_schema().await?;
    }

    let dialogs = RedisDialogStore::connect(&cfg.redis_url())?;

    info!("starting long polling");
    etb_telegram::run_polling(cfg, l10n, Arc::new(store), Arc::new(dialogs))
        .await
        .map_err(|e| etb_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
