//! `/start` and main-menu routing.

use etb_core::dialog::DialogState;
use etb_core::Result;

use crate::keyboards;

use super::{expense, registration, settings, statistics, Ctx};

/// `/start`: registered users get the menu, new users enter registration.
pub async fn handle_start(ctx: &Ctx) -> Result<()> {
    match ctx.state.store.user_config(ctx.user_id).await {
        Ok(_) => ctx.back_to_menu().await,
        Err(e) if e.is_not_found() => {
            ctx.set_state(&DialogState::RegisterLanguage).await?;
            ctx.send("REGISTRATION_REQUIRED").await;
            registration::ask_language(ctx).await;
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// A main-menu button press while no flow is active.
pub async fn on_menu_choice(ctx: &Ctx, text: &str) -> Result<()> {
    if ctx.is_button(text, "ADD_EXPENSE_BUTTON") {
        return expense::begin(ctx).await;
    }
    if ctx.is_button(text, "SHOW_EXPENSES_BUTTON") {
        return statistics::begin(ctx).await;
    }
    if ctx.is_button(text, "SETTINGS_MENU_BUTTON") {
        return settings::begin(ctx).await;
    }

    // Unregistered users have no menu yet; anything they type leads into
    // registration.
    if let Err(e) = ctx.state.store.user_config(ctx.user_id).await {
        if e.is_not_found() {
            return handle_start(ctx).await;
        }
        return Err(e);
    }

    ctx.send_kb(
        "COMMAND_NOT_RECOGNIZED",
        keyboards::main_menu(&ctx.state.l10n, &ctx.locale),
    )
    .await;
    Ok(())
}
