//! The add-expense flow: amount, name, category, confirmation.

use chrono::Local;
use fluent_bundle::FluentArgs;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use tracing::warn;

use etb_core::dialog::{parse_amount, DialogState};
use etb_core::domain::NewExpense;
use etb_core::Result;

use crate::callback_data::CallbackData;
use crate::keyboards;

use super::Ctx;

pub async fn begin(ctx: &Ctx) -> Result<()> {
    let config = match ctx.state.store.user_config(ctx.user_id).await {
        Ok(config) => config,
        Err(e) if e.is_not_found() => {
            ctx.fail("ERROR_USER_CURRENCY").await;
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let mut args = FluentArgs::new();
    args.set("currency", config.currency.as_str());
    ctx.set_state(&DialogState::ExpenseAmount {
        currency: config.currency.clone(),
    })
    .await?;
    ctx.send_text_kb(
        ctx.msg_args("INPUT_AMOUNT_MESSAGE", &args),
        keyboards::abort_menu(&ctx.state.l10n, &ctx.locale),
    )
    .await;
    Ok(())
}

pub async fn on_amount(ctx: &Ctx, currency: String, text: &str) -> Result<()> {
    let Some(amount) = parse_amount(text) else {
        ctx.send("ERROR_AMOUNT_NOT_VALID").await;
        return Ok(());
    };

    ctx.set_state(&DialogState::ExpenseName { currency, amount })
        .await?;
    ctx.send("INPUT_EXPENSE_NAME").await;
    Ok(())
}

pub async fn on_name(ctx: &Ctx, currency: String, amount: f64, text: &str) -> Result<()> {
    let name = text.trim();
    if name.is_empty() || name.chars().count() > 128 {
        ctx.send("ERROR_EXPENSE_NAME").await;
        return Ok(());
    }

    let categories = ctx.state.store.categories(ctx.user_id).await?;
    if categories.is_empty() {
        ctx.fail("ERROR_NO_CATEGORIES").await;
        return Ok(());
    }

    ctx.set_state(&DialogState::ExpenseCategory {
        currency,
        amount,
        name: name.to_string(),
        page: 0,
    })
    .await?;
    ctx.send_text_kb(
        ctx.msg("CHOOSE_CATEGORY"),
        keyboards::pick_category(&ctx.state.l10n, &ctx.locale, &categories, 0),
    )
    .await;
    Ok(())
}

pub async fn on_category(
    ctx: &Ctx,
    message_id: MessageId,
    currency: String,
    amount: f64,
    name: String,
    page: usize,
    data: CallbackData,
) -> Result<()> {
    match data {
        CallbackData::Category(category_id) => {
            let categories = ctx.state.store.categories(ctx.user_id).await?;
            let Some(category) = categories.iter().find(|c| c.id == category_id) else {
                // The button outlived its category; redraw and let the user
                // pick again.
                let _ = ctx
                    .bot
                    .edit_message_reply_markup(ctx.chat, message_id)
                    .reply_markup(keyboards::pick_category(
                        &ctx.state.l10n,
                        &ctx.locale,
                        &categories,
                        0,
                    ))
                    .await;
                return Ok(());
            };

            let mut args = FluentArgs::new();
            args.set("name", name.as_str());
            args.set("amount", crate::render::format_amount(amount));
            args.set("currency", currency.as_str());
            args.set("category_name", category.name.as_str());

            ctx.set_state(&DialogState::ExpenseConfirm {
                currency: currency.clone(),
                amount,
                name: name.clone(),
                category_id,
                category_name: category.name.clone(),
            })
            .await?;
            ctx.send_text_kb(
                ctx.msg_args("CONFIRM_EXPENSE", &args),
                keyboards::confirm_cancel(
                    &ctx.state.l10n,
                    &ctx.locale,
                    "CONFIRM_EXPENSE_BUTTON",
                    "CANCEL_EXPENSE_BUTTON",
                ),
            )
            .await;
            Ok(())
        }
        CallbackData::NextPage | CallbackData::PrevPage => {
            let categories = ctx.state.store.categories(ctx.user_id).await?;
            let last = keyboards::last_page(categories.len());
            let page =
                keyboards::turned_page(page, last, matches!(data, CallbackData::NextPage));
            ctx.set_state(&DialogState::ExpenseCategory {
                currency,
                amount,
                name,
                page,
            })
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

#[allow(clippy::too_many_arguments)]
pub async fn on_confirm(
    ctx: &Ctx,
    currency: String,
    amount: f64,
    name: String,
    category_id: i32,
    _category_name: String,
    data: CallbackData,
) -> Result<()> {
    match data {
        CallbackData::Confirm => {
            let expense = NewExpense {
                name,
                currency,
                amount,
                date: Local::now().date_naive(),
                user_tg_id: ctx.user_id,
                category_id,
            };
            if let Err(e) = ctx.state.store.add_expense(expense).await {
                warn!(chat_id = ctx.chat.0, error = %e, "failed to store expense");
                ctx.fail("ERROR_EXPENSE_NOT_ADDED").await;
                return Ok(());
            }
            ctx.state.dialogs.clear(ctx.chat_id()).await?;
            ctx.send_kb(
                "EXPENSE_ADDED",
                keyboards::main_menu(&ctx.state.l10n, &ctx.locale),
            )
            .await;
            Ok(())
        }
        CallbackData::Cancel => {
            ctx.state.dialogs.clear(ctx.chat_id()).await?;
            ctx.send_kb(
                "CANCELLED_EXPENSE",
                keyboards::main_menu(&ctx.state.l10n, &ctx.locale),
            )
            .await;
            Ok(())
        }
        _ => Ok(()),
    }
}
