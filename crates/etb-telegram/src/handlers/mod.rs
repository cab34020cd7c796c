//! Telegram update handlers.
//!
//! `handle_message` and `handle_callback` load the chat's dialog state and
//! route the update to the flow that owns it. Every send is best-effort: a
//! failed delivery must never take the dispatcher down.
//!
//! When a flow hits a storage error it is abandoned: the dialog state is
//! cleared and the user lands back on the main menu with an error message,
//! so nobody gets stuck in a broken dialog.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{ChatId as TgChatId, MessageId, ReplyMarkup};
use tracing::warn;

use etb_core::dialog::DialogState;
use etb_core::domain::ChatId;
use etb_core::Result;

use crate::keyboards;
use crate::router::AppState;

mod expense;
mod registration;
mod settings;
mod start;
mod statistics;

/// Per-update context: who is talking, in which chat, in which language.
#[derive(Clone)]
pub(crate) struct Ctx {
    pub bot: Bot,
    pub state: Arc<AppState>,
    pub chat: TgChatId,
    pub user_id: i64,
    pub locale: String,
}

impl Ctx {
    async fn new(bot: Bot, state: Arc<AppState>, chat: TgChatId, user_id: i64) -> Self {
        let locale = match state.store.user_config(user_id).await {
            Ok(config) => config.language,
            Err(_) => state.cfg.default_locale.clone(),
        };
        Self {
            bot,
            state,
            chat,
            user_id,
            locale,
        }
    }

    /// Same context with another locale, for flows that carry the language
    /// in the dialog state instead of the user config.
    pub fn with_locale(&self, locale: &str) -> Self {
        let mut ctx = self.clone();
        ctx.locale = locale.to_string();
        ctx
    }

    pub fn chat_id(&self) -> ChatId {
        ChatId(self.chat.0)
    }

    pub fn msg(&self, key: &str) -> String {
        self.state.l10n.msg(&self.locale, key)
    }

    pub fn msg_args(&self, key: &str, args: &fluent_bundle::FluentArgs) -> String {
        self.state.l10n.msg_args(&self.locale, key, args)
    }

    /// Whether `text` is the localized button with this catalog key.
    pub fn is_button(&self, text: &str, key: &str) -> bool {
        text == self.msg(key)
    }

    pub async fn send(&self, key: &str) {
        let _ = self.bot.send_message(self.chat, self.msg(key)).await;
    }

    pub async fn send_kb(&self, key: &str, markup: impl Into<ReplyMarkup>) {
        let _ = self
            .bot
            .send_message(self.chat, self.msg(key))
            .reply_markup(markup)
            .await;
    }

    pub async fn send_text_kb(&self, text: String, markup: impl Into<ReplyMarkup>) {
        let _ = self
            .bot
            .send_message(self.chat, text)
            .reply_markup(markup)
            .await;
    }

    pub async fn set_state(&self, dialog: &DialogState) -> Result<()> {
        self.state.dialogs.save(self.chat_id(), dialog).await
    }

    pub async fn load_state(&self) -> Result<DialogState> {
        self.state.dialogs.load(self.chat_id()).await
    }

    /// Drop the dialog and show the main menu.
    pub async fn back_to_menu(&self) -> Result<()> {
        self.state.dialogs.clear(self.chat_id()).await?;
        self.send_kb(
            "START_MESSAGE",
            keyboards::main_menu(&self.state.l10n, &self.locale),
        )
        .await;
        Ok(())
    }

    /// Abandon the current flow: clear the dialog (best-effort) and tell the
    /// user what went wrong, landing them on the main menu.
    pub async fn fail(&self, key: &str) {
        if let Err(e) = self.state.dialogs.clear(self.chat_id()).await {
            warn!(chat_id = self.chat.0, error = %e, "failed to clear dialog state");
        }
        self.send_kb(key, keyboards::main_menu(&self.state.l10n, &self.locale))
            .await;
    }
}

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        // Channel posts and service messages carry no sender to attribute
        // anything to.
        let _ = bot
            .send_message(
                msg.chat.id,
                state.l10n.msg(&state.cfg.default_locale, "ERROR_USER_INFO"),
            )
            .await;
        return Ok(());
    };
    let ctx = Ctx::new(bot, state, msg.chat.id, user.id.0 as i64).await;

    let Some(text) = msg.text() else {
        // Stickers, photos and the like have no place in any flow.
        ctx.fail("COMMAND_NOT_RECOGNIZED").await;
        return Ok(());
    };

    if let Err(e) = dispatch_message(&ctx, text).await {
        warn!(chat_id = ctx.chat.0, error = %e, "message handler failed");
        ctx.fail("ERROR_UNKNOWN").await;
    }
    Ok(())
}

async fn dispatch_message(ctx: &Ctx, text: &str) -> Result<()> {
    if text == "/start" {
        return start::handle_start(ctx).await;
    }
    if ctx.is_button(text, "MAIN_MENU_BUTTON") {
        return ctx.back_to_menu().await;
    }

    match ctx.load_state().await? {
        DialogState::Idle => start::on_menu_choice(ctx, text).await,

        DialogState::RegisterLanguage => {
            // Language is picked on the inline keyboard; typing gets a nudge.
            registration::ask_language(ctx).await;
            Ok(())
        }
        DialogState::RegisterCurrency { language } => {
            registration::on_currency(&ctx.with_locale(&language), &language, text).await
        }
        DialogState::RegisterCategories {
            language,
            currency,
            categories,
        } => {
            registration::on_category(&ctx.with_locale(&language), currency, categories, text)
                .await
        }

        DialogState::ExpenseAmount { currency } => expense::on_amount(ctx, currency, text).await,
        DialogState::ExpenseName { currency, amount } => {
            expense::on_name(ctx, currency, amount, text).await
        }
        DialogState::ExpenseCategory { .. } => {
            ctx.send("CHOOSE_CATEGORY").await;
            Ok(())
        }
        DialogState::ExpenseConfirm { .. } => {
            ctx.send("CONFIRM_EXPENSE_BUTTON").await;
            Ok(())
        }

        DialogState::StatsMenu => statistics::on_menu_choice(ctx, text).await,
        DialogState::StatsPeriod => {
            ctx.send("CHOOSE_EXPENSE_CUSTOM_STATISTICS_PERIOD").await;
            Ok(())
        }
        DialogState::StatsStartDate => statistics::on_start_date(ctx, text).await,
        DialogState::StatsEndDate { start } => statistics::on_end_date(ctx, start, text).await,
        DialogState::StatsCategories { .. } | DialogState::StatsPaging { .. } => {
            // Button-driven steps; free text falls back to the main menu.
            ctx.fail("COMMAND_NOT_RECOGNIZED").await;
            Ok(())
        }

        DialogState::SettingsMenu => settings::on_menu_choice(ctx, text).await,
        DialogState::CategoriesMenu => settings::on_categories_choice(ctx, text).await,
        DialogState::AddCategories { categories } => {
            settings::on_new_category(ctx, categories, text).await
        }
        DialogState::RemoveCategory { .. } => {
            ctx.send("CHOOSE_CATEGORY_TO_REMOVE").await;
            Ok(())
        }
        DialogState::CurrencyInput => settings::on_currency_input(ctx, text).await,
        DialogState::CurrencyConfirm { .. } => {
            ctx.send("CONFIRM_CHANGE_CURRENCY_BUTTON").await;
            Ok(())
        }
        DialogState::LanguageSelect => {
            settings::ask_language(ctx).await;
            Ok(())
        }
    }
}

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    // Answer first so the button stops spinning whatever happens next.
    let _ = bot.answer_callback_query(q.id.clone()).await;

    let Some(message) = q.message.as_ref() else {
        return Ok(());
    };
    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };

    let ctx = Ctx::new(bot, state, message.chat.id, q.from.id.0 as i64).await;
    if let Err(e) = dispatch_callback(&ctx, message.id, data).await {
        warn!(chat_id = ctx.chat.0, error = %e, "callback handler failed");
        ctx.fail("ERROR_UNKNOWN").await;
    }
    Ok(())
}

async fn dispatch_callback(ctx: &Ctx, message_id: MessageId, data: &str) -> Result<()> {
    use crate::callback_data::CallbackData;

    let Some(data) = CallbackData::decode(data) else {
        return Ok(());
    };

    match ctx.load_state().await? {
        DialogState::RegisterLanguage => registration::on_language(ctx, data).await,
        DialogState::ExpenseCategory {
            currency,
            amount,
            name,
            page,
        } => expense::on_category(ctx, message_id, currency, amount, name, page, data).await,
        DialogState::ExpenseConfirm {
            currency,
            amount,
            name,
            category_id,
            category_name,
        } => {
            expense::on_confirm(ctx, currency, amount, name, category_id, category_name, data)
                .await
        }
        DialogState::StatsPeriod => statistics::on_period(ctx, data).await,
        DialogState::StatsCategories { choice, selection } => {
            statistics::on_category_select(ctx, message_id, choice, selection, data).await
        }
        DialogState::StatsPaging { pages, page } => {
            statistics::on_page_turn(ctx, message_id, pages, page, data).await
        }
        DialogState::RemoveCategory { page, last_page } => {
            settings::on_remove_category(ctx, message_id, page, last_page, data).await
        }
        DialogState::CurrencyConfirm { currency } => {
            settings::on_currency_confirm(ctx, currency, data).await
        }
        DialogState::LanguageSelect => settings::on_language(ctx, data).await,
        // A button from a finished flow; nothing to do.
        _ => Ok(()),
    }
}
