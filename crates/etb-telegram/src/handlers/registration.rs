//! First-contact registration: language, currency, initial categories.

use fluent_bundle::FluentArgs;

use etb_core::dialog::{parse_category_name, parse_currency, DialogState};
use etb_core::domain::NewUser;
use etb_core::{Error, Result};

use crate::callback_data::CallbackData;
use crate::keyboards;

use super::Ctx;

pub async fn ask_language(ctx: &Ctx) {
    ctx.send_kb(
        "GET_LANGUAGE_MESSAGE",
        keyboards::languages(&ctx.state.l10n, &ctx.locale),
    )
    .await;
}

/// Language picked on the inline keyboard. The rest of the registration runs
/// in that language.
pub async fn on_language(ctx: &Ctx, data: CallbackData) -> Result<()> {
    let CallbackData::Language(code) = data else {
        return Ok(());
    };
    if !ctx.state.l10n.is_supported(&code) {
        return Ok(());
    }

    let ctx = ctx.with_locale(&code);
    ctx.set_state(&DialogState::RegisterCurrency { language: code })
        .await?;
    ctx.send_kb(
        "GET_CURRENCY_MESSAGE",
        keyboards::abort_menu(&ctx.state.l10n, &ctx.locale),
    )
    .await;
    Ok(())
}

pub async fn on_currency(ctx: &Ctx, language: &str, text: &str) -> Result<()> {
    let Some(currency) = parse_currency(text) else {
        ctx.send("ERROR_CURRENCY").await;
        return Ok(());
    };

    ctx.set_state(&DialogState::RegisterCategories {
        language: language.to_string(),
        currency,
        categories: Vec::new(),
    })
    .await?;
    ctx.send_kb(
        "GET_CATEGORIES_MESSAGE",
        keyboards::finish_menu(&ctx.state.l10n, &ctx.locale, "REGISTRATION_CATEGORY_END_BUTTON"),
    )
    .await;
    Ok(())
}

pub async fn on_category(
    ctx: &Ctx,
    currency: String,
    mut categories: Vec<String>,
    text: &str,
) -> Result<()> {
    if ctx.is_button(text, "REGISTRATION_CATEGORY_END_BUTTON") {
        if categories.is_empty() {
            ctx.send("ERROR_NO_CATEGORIES_SELECTED").await;
            return Ok(());
        }
        return finish(ctx, currency, categories).await;
    }

    let Some(name) = parse_category_name(text) else {
        ctx.send("ERROR_CATEGORIES").await;
        return Ok(());
    };
    if !categories.contains(&name) {
        categories.push(name);
    }
    ctx.set_state(&DialogState::RegisterCategories {
        language: ctx.locale.clone(),
        currency,
        categories,
    })
    .await?;
    ctx.send("GET_NEXT_CATEGORY_MESSAGE").await;
    Ok(())
}

/// Create the user, their config and their categories in one go.
async fn finish(ctx: &Ctx, currency: String, categories: Vec<String>) -> Result<()> {
    let user = NewUser {
        tg_id: ctx.user_id,
        language: ctx.locale.clone(),
        currency: currency.clone(),
        categories: categories.clone(),
    };

    match ctx.state.store.register_user(user).await {
        Ok(()) => {}
        Err(Error::Duplicate(_)) => {
            // Raced with another registration for the same account.
            ctx.fail("ERROR_REGISTRATION").await;
            return Ok(());
        }
        Err(e) => return Err(e),
    }

    ctx.state.dialogs.clear(ctx.chat_id()).await?;

    let mut args = FluentArgs::new();
    args.set(
        "language",
        ctx.msg(&etb_core::i18n::language_name_key(&ctx.locale)),
    );
    args.set("currency", currency);
    args.set("categories", categories.join(", "));
    ctx.send_text_kb(
        ctx.msg_args("REGISTRATION_SUCCESS", &args),
        keyboards::main_menu(&ctx.state.l10n, &ctx.locale),
    )
    .await;
    Ok(())
}
