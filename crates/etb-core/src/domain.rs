use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Telegram chat id (numeric). Private chats share the value with the user id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub i64);

/// Sentinel category id meaning "every category" in statistics selection.
pub const ALL_CATEGORIES_ID: i32 = -1;

/// Per-user preferences, one row per registered user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserConfig {
    pub tg_id: i64,
    pub language: String,
    pub currency: String,
}

/// A user-defined expense category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Category {
    pub id: i32,
    pub name: String,
}

/// A single recorded expense.
#[derive(Clone, Debug, PartialEq)]
pub struct Expense {
    pub id: i32,
    pub name: String,
    pub currency: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub user_tg_id: i64,
    pub category_id: i32,
}

/// Everything needed to register a user atomically: the id, the preferences
/// picked during the registration dialog, and the initial category names.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub tg_id: i64,
    pub language: String,
    pub currency: String,
    pub categories: Vec<String>,
}

/// A new expense as collected by the add-expense dialog.
#[derive(Clone, Debug)]
pub struct NewExpense {
    pub name: String,
    pub currency: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub user_tg_id: i64,
    pub category_id: i32,
}
