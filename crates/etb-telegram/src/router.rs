use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::{info, warn};

use etb_core::config::Config;
use etb_core::i18n::Localizer;
use etb_core::ports::{DialogStore, ExpenseStore};

use crate::handlers;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub l10n: Arc<Localizer>,
    pub store: Arc<dyn ExpenseStore>,
    pub dialogs: Arc<dyn DialogStore>,
}

pub async fn run_polling(
    cfg: Arc<Config>,
    l10n: Arc<Localizer>,
    store: Arc<dyn ExpenseStore>,
    dialogs: Arc<dyn DialogStore>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.api_token.clone());

    if let Ok(me) = bot.get_me().await {
        info!(username = me.username(), "bot started");
    }

    // A restart may have changed the dialog state layout; stale states from
    // the previous process must not survive it.
    if let Err(e) = dialogs.clear_all().await {
        warn!(error = %e, "failed to clear stored dialog states");
    }

    let state = Arc::new(AppState {
        cfg,
        l10n,
        store,
        dialogs,
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
