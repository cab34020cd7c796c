use async_trait::async_trait;

use crate::{
    dialog::DialogState,
    domain::{Category, ChatId, Expense, NewExpense, NewUser, UserConfig},
    Result,
};

/// Persistence port for long-lived expense data.
///
/// PostgreSQL is the first implementation; the trait mirrors the operations
/// the dialog handlers need, not the underlying tables.
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    /// Register a user with preferences and initial categories in one
    /// transaction. Fails with `Error::Duplicate` if the user already exists.
    async fn register_user(&self, user: NewUser) -> Result<()>;

    /// Preferences for a registered user, or `UserConfigNotFound`.
    async fn user_config(&self, tg_id: i64) -> Result<UserConfig>;

    async fn set_language(&self, tg_id: i64, language: &str) -> Result<()>;
    async fn set_currency(&self, tg_id: i64, currency: &str) -> Result<()>;

    async fn add_categories(&self, tg_id: i64, names: &[String]) -> Result<()>;
    /// The user's categories, oldest first. Empty when none were added yet.
    async fn categories(&self, tg_id: i64) -> Result<Vec<Category>>;
    /// Removes one category, or `CategoryNotFound` if it is not the user's.
    async fn remove_category(&self, tg_id: i64, category_id: i32) -> Result<()>;

    async fn add_expense(&self, expense: NewExpense) -> Result<()>;
    /// Every expense of the user, or `NoExpenses`.
    async fn expenses(&self, tg_id: i64) -> Result<Vec<Expense>>;
    /// Distinct currencies appearing in the user's expenses.
    async fn currencies_used(&self, tg_id: i64) -> Result<Vec<String>>;
}

/// Port for per-chat dialog state, keyed by chat id.
///
/// Redis is the first implementation. State is wiped wholesale on startup so
/// a redeploy never leaves users stranded mid-dialog with stale data.
#[async_trait]
pub trait DialogStore: Send + Sync {
    async fn load(&self, chat_id: ChatId) -> Result<DialogState>;
    async fn save(&self, chat_id: ChatId, state: &DialogState) -> Result<()>;
    async fn clear(&self, chat_id: ChatId) -> Result<()>;
    async fn clear_all(&self) -> Result<()>;
}
