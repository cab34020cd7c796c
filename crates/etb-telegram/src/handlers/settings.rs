//! Settings: category management, currency change, language change.

use fluent_bundle::FluentArgs;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use tracing::warn;

use etb_core::dialog::{parse_category_name, parse_currency, DialogState};
use etb_core::i18n::Localizer;
use etb_core::{Error, Result};

use crate::callback_data::CallbackData;
use crate::keyboards;

use super::Ctx;

pub async fn begin(ctx: &Ctx) -> Result<()> {
    ctx.set_state(&DialogState::SettingsMenu).await?;
    ctx.send_kb(
        "CHOOSE_SETTINGS_MENU_ITEM",
        keyboards::settings_menu(&ctx.state.l10n, &ctx.locale),
    )
    .await;
    Ok(())
}

pub async fn on_menu_choice(ctx: &Ctx, text: &str) -> Result<()> {
    if ctx.is_button(text, "CATEGORIES_SETTINGS_MENU_BUTTON") {
        ctx.set_state(&DialogState::CategoriesMenu).await?;
        ctx.send_kb(
            "CHOOSE_CATEGORY_SETTINGS_MENU_ITEM",
            keyboards::categories_menu(&ctx.state.l10n, &ctx.locale),
        )
        .await;
        return Ok(());
    }

    if ctx.is_button(text, "CHANGE_CURRENCY_MENU_BUTTON") {
        // Show which currencies already appear in the history; switching to
        // one of them keeps the statistics in a single bucket.
        let currencies = ctx.state.store.currencies_used(ctx.user_id).await?;
        let mut args = FluentArgs::new();
        args.set(
            "currencies",
            currencies_text(&ctx.state.l10n, &ctx.locale, &currencies),
        );

        ctx.set_state(&DialogState::CurrencyInput).await?;
        ctx.send_text_kb(
            ctx.msg_args("INPUT_CURRENCY_MESSAGE", &args),
            keyboards::abort_menu(&ctx.state.l10n, &ctx.locale),
        )
        .await;
        return Ok(());
    }

    if ctx.is_button(text, "CHANGE_LANGUAGE_MENU_BUTTON") {
        ctx.set_state(&DialogState::LanguageSelect).await?;
        ask_language(ctx).await;
        return Ok(());
    }

    ctx.send_kb(
        "COMMAND_NOT_RECOGNIZED",
        keyboards::settings_menu(&ctx.state.l10n, &ctx.locale),
    )
    .await;
    Ok(())
}

/// The list shown in the change-currency prompt; with no recorded expenses
/// there is nothing to list and the user is told so instead.
fn currencies_text(l10n: &Localizer, locale: &str, currencies: &[String]) -> String {
    if currencies.is_empty() {
        l10n.msg(locale, "ERROR_NO_CURRENCIES")
    } else {
        currencies.join(", ")
    }
}

pub async fn on_categories_choice(ctx: &Ctx, text: &str) -> Result<()> {
    if ctx.is_button(text, "ADD_CATEGORY_BUTTON") {
        ctx.set_state(&DialogState::AddCategories {
            categories: Vec::new(),
        })
        .await?;
        ctx.send_kb(
            "INPUT_CATEGORIES_MESSAGE",
            keyboards::finish_menu(&ctx.state.l10n, &ctx.locale, "CATEGORY_END_BUTTON"),
        )
        .await;
        return Ok(());
    }

    if ctx.is_button(text, "REMOVE_CATEGORY_BUTTON") {
        let categories = ctx.state.store.categories(ctx.user_id).await?;
        if categories.is_empty() {
            ctx.fail("ERROR_NO_CATEGORIES").await;
            return Ok(());
        }
        ctx.set_state(&DialogState::RemoveCategory {
            page: 0,
            last_page: keyboards::last_page(categories.len()),
        })
        .await?;
        ctx.send_text_kb(
            ctx.msg("CHOOSE_CATEGORY_TO_REMOVE"),
            keyboards::pick_category(&ctx.state.l10n, &ctx.locale, &categories, 0),
        )
        .await;
        return Ok(());
    }

    ctx.send_kb(
        "COMMAND_NOT_RECOGNIZED",
        keyboards::categories_menu(&ctx.state.l10n, &ctx.locale),
    )
    .await;
    Ok(())
}

pub async fn on_new_category(ctx: &Ctx, mut categories: Vec<String>, text: &str) -> Result<()> {
    if ctx.is_button(text, "CATEGORY_END_BUTTON") {
        if categories.is_empty() {
            ctx.send("ERROR_NO_CATEGORIES_SELECTED").await;
            return Ok(());
        }
        if let Err(e) = ctx.state.store.add_categories(ctx.user_id, &categories).await {
            warn!(chat_id = ctx.chat.0, error = %e, "failed to add categories");
            ctx.fail("ERROR_CATEGORY_NOT_ADDED").await;
            return Ok(());
        }
        ctx.state.dialogs.clear(ctx.chat_id()).await?;
        ctx.send_kb(
            "CATEGORIES_ADDED_MESSAGE",
            keyboards::main_menu(&ctx.state.l10n, &ctx.locale),
        )
        .await;
        return Ok(());
    }

    let Some(name) = parse_category_name(text) else {
        ctx.send("ERROR_CATEGORIES").await;
        return Ok(());
    };
    if !categories.contains(&name) {
        categories.push(name);
    }
    ctx.set_state(&DialogState::AddCategories { categories })
        .await?;
    ctx.send("INPUT_NEXT_CATEGORY_MESSAGE").await;
    Ok(())
}

pub async fn on_remove_category(
    ctx: &Ctx,
    message_id: MessageId,
    page: usize,
    last_page: usize,
    data: CallbackData,
) -> Result<()> {
    match data {
        CallbackData::Category(category_id) => {
            match ctx
                .state
                .store
                .remove_category(ctx.user_id, category_id)
                .await
            {
                Ok(()) => {}
                Err(Error::CategoryNotFound(_)) => {
                    ctx.fail("ERROR_CATEGORY_NOT_REMOVED").await;
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
            ctx.state.dialogs.clear(ctx.chat_id()).await?;
            ctx.send_kb(
                "CATEGORY_REMOVED",
                keyboards::main_menu(&ctx.state.l10n, &ctx.locale),
            )
            .await;
            Ok(())
        }
        CallbackData::NextPage | CallbackData::PrevPage => {
            let categories = ctx.state.store.categories(ctx.user_id).await?;
            let page = keyboards::turned_page(
                page,
                last_page,
                matches!(data, CallbackData::NextPage),
            );
            ctx.set_state(&DialogState::RemoveCategory { page, last_page })
                .await?;
            let _ = ctx
                .bot
                .edit_message_reply_markup(ctx.chat, message_id)
                .reply_markup(keyboards::pick_category(
                    &ctx.state.l10n,
                    &ctx.locale,
                    &categories,
                    page,
                ))
                .await;
            Ok(())
        }
        _ => Ok(()),
    }
}

pub async fn on_currency_input(ctx: &Ctx, text: &str) -> Result<()> {
    let Some(currency) = parse_currency(text) else {
        ctx.send("ERROR_CURRENCY").await;
        return Ok(());
    };

    let mut args = FluentArgs::new();
    args.set("currency", currency.as_str());
    ctx.set_state(&DialogState::CurrencyConfirm {
        currency: currency.clone(),
    })
        .await?;
    ctx.send_text_kb(
        ctx.msg_args("CONFIRM_CURRENCY_CHANGE", &args),
        keyboards::confirm_cancel(
            &ctx.state.l10n,
            &ctx.locale,
            "CONFIRM_CHANGE_CURRENCY_BUTTON",
            "CANCEL_CHANGE_CURRENCY_BUTTON",
        ),
    )
    .await;
    Ok(())
}

pub async fn on_currency_confirm(ctx: &Ctx, currency: String, data: CallbackData) -> Result<()> {
    match data {
        CallbackData::Confirm => {
            ctx.state.store.set_currency(ctx.user_id, &currency).await?;
            ctx.state.dialogs.clear(ctx.chat_id()).await?;
            ctx.send_kb(
                "CURRENCY_CHANGED",
                keyboards::main_menu(&ctx.state.l10n, &ctx.locale),
            )
            .await;
            Ok(())
        }
        CallbackData::Cancel => {
            ctx.state.dialogs.clear(ctx.chat_id()).await?;
            ctx.send_kb(
                "CANCELLED_CHANGE_CURRENCY",
                keyboards::main_menu(&ctx.state.l10n, &ctx.locale),
            )
            .await;
            Ok(())
        }
        _ => Ok(()),
    }
}

pub async fn ask_language(ctx: &Ctx) {
    ctx.send_kb(
        "CHOOSE_LANGUAGE_MESSAGE",
        keyboards::languages(&ctx.state.l10n, &ctx.locale),
    )
    .await;
}

/// New interface language; confirmation is sent in it.
pub async fn on_language(ctx: &Ctx, data: CallbackData) -> Result<()> {
    let CallbackData::Language(code) = data else {
        return Ok(());
    };
    if !ctx.state.l10n.is_supported(&code) {
        return Ok(());
    }

    ctx.state.store.set_language(ctx.user_id, &code).await?;
    let ctx = ctx.with_locale(&code);
    ctx.state.dialogs.clear(ctx.chat_id()).await?;
    ctx.send_kb(
        "LANGUAGE_CHANGED",
        keyboards::main_menu(&ctx.state.l10n, &ctx.locale),
    )
    .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_prompt_lists_used_currencies() {
        let l10n = Localizer::new("en").unwrap();
        let currencies = vec!["EUR".to_string(), "USD".to_string()];
        assert_eq!(currencies_text(&l10n, "en", &currencies), "EUR, USD");
    }

    #[test]
    fn currency_prompt_reports_empty_history() {
        let l10n = Localizer::new("en").unwrap();
        assert_eq!(
            currencies_text(&l10n, "en", &[]),
            l10n.msg("en", "ERROR_NO_CURRENCIES")
        );
        assert!(!currencies_text(&l10n, "en", &[]).starts_with("MISSING:"));
    }
}
