//! Statistics flow: period, categories, paginated report.

use std::collections::BTreeMap;

use chrono::Local;
use teloxide::prelude::*;
use teloxide::types::MessageId;

use etb_core::dialog::{
    parse_date, CategorySelection, DialogState, PeriodChoice,
};
use etb_core::domain::ALL_CATEGORIES_ID;
use etb_core::stats::{aggregate_by_categories, all_empty, is_custom_period_valid, Period};
use etb_core::Result;

use crate::callback_data::{CallbackData, PeriodKey};
use crate::keyboards;
use crate::render;

use super::Ctx;

pub async fn begin(ctx: &Ctx) -> Result<()> {
    ctx.set_state(&DialogState::StatsMenu).await?;
    ctx.send_kb(
        "CHOOSE_STATISTICS_METHOD",
        keyboards::statistics_menu(&ctx.state.l10n, &ctx.locale),
    )
    .await;
    Ok(())
}

pub async fn on_menu_choice(ctx: &Ctx, text: &str) -> Result<()> {
    if ctx.is_button(text, "SHOW_MONTH_EXPENSES_STATISTICS_BUTTON") {
        // Same category selection as the custom flow, period already fixed.
        return ask_categories(
            ctx,
            PeriodChoice::Fixed {
                period: Period::Month,
            },
        )
        .await;
    }

    if ctx.is_button(text, "SHOW_CUSTOM_EXPENSES_STATISTICS_BUTTON") {
        ctx.set_state(&DialogState::StatsPeriod).await?;
        ctx.send_text_kb(
            ctx.msg("CHOOSE_EXPENSE_CUSTOM_STATISTICS_PERIOD"),
            keyboards::periods(&ctx.state.l10n, &ctx.locale),
        )
        .await;
        return Ok(());
    }

    ctx.send_kb(
        "COMMAND_NOT_RECOGNIZED",
        keyboards::statistics_menu(&ctx.state.l10n, &ctx.locale),
    )
    .await;
    Ok(())
}

pub async fn on_period(ctx: &Ctx, data: CallbackData) -> Result<()> {
    match data {
        CallbackData::Period(PeriodKey::Fixed(period)) => {
            ask_categories(ctx, PeriodChoice::Fixed { period }).await
        }
        CallbackData::Period(PeriodKey::Custom) => {
            ctx.set_state(&DialogState::StatsStartDate).await?;
            ctx.send_kb(
                "INPUT_CUSTOM_PERIOD_START_DATE",
                keyboards::abort_menu(&ctx.state.l10n, &ctx.locale),
            )
            .await;
            Ok(())
        }
        _ => Ok(()),
    }
}

pub async fn on_start_date(ctx: &Ctx, text: &str) -> Result<()> {
    let Some(start) = parse_date(text) else {
        ctx.send("ERROR_DATE_NOT_VALID").await;
        return Ok(());
    };
    ctx.set_state(&DialogState::StatsEndDate { start }).await?;
    ctx.send("INPUT_CUSTOM_PERIOD_END_DATE").await;
    Ok(())
}

pub async fn on_end_date(ctx: &Ctx, start: chrono::NaiveDate, text: &str) -> Result<()> {
    let Some(end) = parse_date(text) else {
        ctx.send("ERROR_DATE_NOT_VALID").await;
        return Ok(());
    };
    if !is_custom_period_valid(start, end) {
        ctx.send("ERROR_DATE_NOT_VALID").await;
        return Ok(());
    }
    ask_categories(ctx, PeriodChoice::Custom { start, end }).await
}

async fn ask_categories(ctx: &Ctx, choice: PeriodChoice) -> Result<()> {
    let categories = ctx.state.store.categories(ctx.user_id).await?;
    if categories.is_empty() {
        ctx.fail("ERROR_NO_CATEGORIES").await;
        return Ok(());
    }

    let selection = CategorySelection {
        categories: BTreeMap::new(),
        page: 0,
        last_page: keyboards::last_page(categories.len()),
    };
    let keyboard = keyboards::select_categories(
        &ctx.state.l10n,
        &ctx.locale,
        &categories,
        0,
        &selection.categories,
    );
    ctx.set_state(&DialogState::StatsCategories { choice, selection })
        .await?;
    ctx.send_text_kb(
        ctx.msg("CHOOSE_EXPENSE_CUSTOM_STATISTICS_CATEGORIES"),
        keyboard,
    )
    .await;
    Ok(())
}

pub async fn on_category_select(
    ctx: &Ctx,
    message_id: MessageId,
    choice: PeriodChoice,
    mut selection: CategorySelection,
    data: CallbackData,
) -> Result<()> {
    match data {
        CallbackData::Category(id) => {
            if selection.categories.remove(&id).is_none() {
                if id == ALL_CATEGORIES_ID {
                    selection
                        .categories
                        .insert(id, ctx.msg("ALL_CATEGORIES_BUTTON"));
                } else {
                    let categories = ctx.state.store.categories(ctx.user_id).await?;
                    let Some(category) = categories.iter().find(|c| c.id == id) else {
                        return Ok(());
                    };
                    selection.categories.insert(id, category.name.clone());
                }
            }
            redraw(ctx, message_id, choice, selection).await
        }
        CallbackData::NextPage | CallbackData::PrevPage => {
            selection.page = keyboards::turned_page(
                selection.page,
                selection.last_page,
                matches!(data, CallbackData::NextPage),
            );
            redraw(ctx, message_id, choice, selection).await
        }
        CallbackData::Done => {
            if selection.categories.is_empty() {
                ctx.send("ERROR_NO_CATEGORIES_SELECTED").await;
                return Ok(());
            }
            let wait_key = match choice {
                PeriodChoice::Fixed {
                    period: Period::Month,
                } => "WAIT_FOR_MONTH_STATISTICS",
                _ => "WAIT_FOR_CUSTOM_STATISTICS",
            };
            ctx.send_kb(
                wait_key,
                keyboards::main_menu(&ctx.state.l10n, &ctx.locale),
            )
            .await;
            run_report(ctx, choice, selection.categories).await
        }
        _ => Ok(()),
    }
}

async fn redraw(
    ctx: &Ctx,
    message_id: MessageId,
    choice: PeriodChoice,
    selection: CategorySelection,
) -> Result<()> {
    let categories = ctx.state.store.categories(ctx.user_id).await?;
    let keyboard = keyboards::select_categories(
        &ctx.state.l10n,
        &ctx.locale,
        &categories,
        selection.page,
        &selection.categories,
    );
    ctx.set_state(&DialogState::StatsCategories { choice, selection })
        .await?;
    let _ = ctx
        .bot
        .edit_message_reply_markup(ctx.chat, message_id)
        .reply_markup(keyboard)
        .await;
    Ok(())
}

/// Aggregate, render one page per selected category and show the first one.
async fn run_report(
    ctx: &Ctx,
    choice: PeriodChoice,
    selected: BTreeMap<i32, String>,
) -> Result<()> {
    let (start, end) = match choice {
        PeriodChoice::Fixed { period } => period.bounds(Local::now().date_naive()),
        PeriodChoice::Custom { start, end } => (start, end),
    };

    let expenses = match ctx.state.store.expenses(ctx.user_id).await {
        Ok(expenses) => expenses,
        Err(e) if e.is_not_found() => {
            ctx.fail("ERROR_NO_STATISTICS").await;
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let totals = aggregate_by_categories(&expenses, &selected, start, end);
    if all_empty(&totals) {
        ctx.fail("ERROR_NO_STATISTICS").await;
        return Ok(());
    }

    let pages = render::statistics_pages(&ctx.state.l10n, &ctx.locale, &totals);
    if pages.len() == 1 {
        ctx.state.dialogs.clear(ctx.chat_id()).await?;
        ctx.send_text_kb(
            pages.into_iter().next().unwrap_or_default(),
            keyboards::main_menu(&ctx.state.l10n, &ctx.locale),
        )
        .await;
        return Ok(());
    }

    let first = pages[0].clone();
    ctx.set_state(&DialogState::StatsPaging { pages, page: 0 })
        .await?;
    ctx.send_text_kb(
        first,
        keyboards::statistics_navigation(&ctx.state.l10n, &ctx.locale),
    )
    .await;
    Ok(())
}

pub async fn on_page_turn(
    ctx: &Ctx,
    message_id: MessageId,
    pages: Vec<String>,
    page: usize,
    data: CallbackData,
) -> Result<()> {
    let forward = match data {
        CallbackData::NextPage => true,
        CallbackData::PrevPage => false,
        _ => return Ok(()),
    };
    if pages.is_empty() {
        return Ok(());
    }

    let page = keyboards::turned_page(page, pages.len() - 1, forward);
    let text = pages[page].clone();
    ctx.set_state(&DialogState::StatsPaging { pages, page })
        .await?;
    let _ = ctx
        .bot
        .edit_message_text(ctx.chat, message_id, text)
        .reply_markup(keyboards::statistics_navigation(
            &ctx.state.l10n,
            &ctx.locale,
        ))
        .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use teloxide::types::ChatId as TgChatId;

    use etb_core::config::Config;
    use etb_core::domain::{Category, ChatId, Expense, NewExpense, NewUser, UserConfig};
    use etb_core::i18n::Localizer;
    use etb_core::ports::{DialogStore, ExpenseStore};
    use etb_core::Error;

    use crate::router::AppState;

    use super::*;

    struct FixedStore {
        categories: Vec<Category>,
    }

    #[async_trait]
    impl ExpenseStore for FixedStore {
        async fn register_user(&self, _user: NewUser) -> Result<()> {
            Ok(())
        }

        async fn user_config(&self, tg_id: i64) -> Result<UserConfig> {
            Ok(UserConfig {
                tg_id,
                language: "en".to_string(),
                currency: "EUR".to_string(),
            })
        }

        async fn set_language(&self, _tg_id: i64, _language: &str) -> Result<()> {
            Ok(())
        }

        async fn set_currency(&self, _tg_id: i64, _currency: &str) -> Result<()> {
            Ok(())
        }

        async fn add_categories(&self, _tg_id: i64, _names: &[String]) -> Result<()> {
            Ok(())
        }

        async fn categories(&self, _tg_id: i64) -> Result<Vec<Category>> {
            Ok(self.categories.clone())
        }

        async fn remove_category(&self, _tg_id: i64, _category_id: i32) -> Result<()> {
            Ok(())
        }

        async fn add_expense(&self, _expense: NewExpense) -> Result<()> {
            Ok(())
        }

        async fn expenses(&self, tg_id: i64) -> Result<Vec<Expense>> {
            Err(Error::NoExpenses(tg_id))
        }

        async fn currencies_used(&self, _tg_id: i64) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct MemoryDialogs(Mutex<DialogState>);

    impl MemoryDialogs {
        fn current(&self) -> DialogState {
            self.0.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DialogStore for MemoryDialogs {
        async fn load(&self, _chat_id: ChatId) -> Result<DialogState> {
            Ok(self.current())
        }

        async fn save(&self, _chat_id: ChatId, state: &DialogState) -> Result<()> {
            *self.0.lock().unwrap() = state.clone();
            Ok(())
        }

        async fn clear(&self, _chat_id: ChatId) -> Result<()> {
            *self.0.lock().unwrap() = DialogState::Idle;
            Ok(())
        }

        async fn clear_all(&self) -> Result<()> {
            Ok(())
        }
    }

    fn test_config() -> Config {
        Config {
            api_token: "0:TEST".into(),
            redis_host: "127.0.0.1".into(),
            redis_port: 6379,
            redis_db: 0,
            pgsql_host: "127.0.0.1".into(),
            pgsql_port: 5432,
            pgsql_db: "expenses".into(),
            pgsql_user: "bot".into(),
            pgsql_password: "secret".into(),
            default_locale: "en".into(),
        }
    }

    fn test_ctx(dialogs: Arc<MemoryDialogs>) -> Ctx {
        let state = Arc::new(AppState {
            cfg: Arc::new(test_config()),
            l10n: Arc::new(Localizer::new("en").unwrap()),
            store: Arc::new(FixedStore {
                categories: vec![
                    Category {
                        id: 1,
                        name: "Food".into(),
                    },
                    Category {
                        id: 2,
                        name: "Transport".into(),
                    },
                ],
            }),
            dialogs,
        });
        Ctx {
            bot: Bot::new("0:TEST"),
            state,
            chat: TgChatId(1),
            user_id: 7,
            locale: "en".into(),
        }
    }

    #[tokio::test]
    async fn month_button_opens_category_selection() {
        let dialogs = Arc::new(MemoryDialogs::default());
        let ctx = test_ctx(dialogs.clone());
        let month = ctx.msg("SHOW_MONTH_EXPENSES_STATISTICS_BUTTON");

        on_menu_choice(&ctx, &month).await.unwrap();

        match dialogs.current() {
            DialogState::StatsCategories { choice, selection } => {
                assert_eq!(
                    choice,
                    PeriodChoice::Fixed {
                        period: Period::Month
                    }
                );
                assert!(selection.categories.is_empty());
                assert_eq!(selection.page, 0);
            }
            other => panic!("expected category selection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn custom_button_asks_for_period() {
        let dialogs = Arc::new(MemoryDialogs::default());
        let ctx = test_ctx(dialogs.clone());
        let custom = ctx.msg("SHOW_CUSTOM_EXPENSES_STATISTICS_BUTTON");

        on_menu_choice(&ctx, &custom).await.unwrap();

        assert_eq!(dialogs.current(), DialogState::StatsPeriod);
    }
}
