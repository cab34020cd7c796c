//! Conversation state machine.
//!
//! One `DialogState` value per chat, persisted in Redis between updates. Each
//! multi-step flow carries the data it has collected so far, so an aborted
//! flow never leaks half-entered values into the next one.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{DATE_INPUT_FORMAT, MAX_EXPENSE_AMOUNT};
use crate::stats::Period;

/// Which period the statistics flow will aggregate over.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PeriodChoice {
    Fixed { period: Period },
    Custom { start: NaiveDate, end: NaiveDate },
}

/// Category selection collected during a statistics flow, plus keyboard
/// pagination bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySelection {
    /// Selected category ids mapped to their display names; may contain the
    /// `ALL_CATEGORIES_ID` sentinel.
    pub categories: BTreeMap<i32, String>,
    pub page: usize,
    pub last_page: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DialogState {
    /// Main menu; no flow in progress.
    #[default]
    Idle,

    // Registration.
    RegisterLanguage,
    RegisterCurrency {
        language: String,
    },
    RegisterCategories {
        language: String,
        currency: String,
        categories: Vec<String>,
    },

    // Add expense.
    ExpenseAmount {
        currency: String,
    },
    ExpenseName {
        currency: String,
        amount: f64,
    },
    ExpenseCategory {
        currency: String,
        amount: f64,
        name: String,
        page: usize,
    },
    ExpenseConfirm {
        currency: String,
        amount: f64,
        name: String,
        category_id: i32,
        category_name: String,
    },

    // Statistics.
    StatsMenu,
    StatsPeriod,
    StatsStartDate,
    StatsEndDate {
        start: NaiveDate,
    },
    StatsCategories {
        choice: PeriodChoice,
        selection: CategorySelection,
    },
    StatsPaging {
        pages: Vec<String>,
        page: usize,
    },

    // Settings.
    SettingsMenu,
    CategoriesMenu,
    AddCategories {
        categories: Vec<String>,
    },
    RemoveCategory {
        page: usize,
        last_page: usize,
    },
    CurrencyInput,
    CurrencyConfirm {
        currency: String,
    },
    LanguageSelect,
}

/// Parse a user-typed amount. Accepts positive finite numbers up to
/// `MAX_EXPENSE_AMOUNT`, dot as the only decimal separator; rejects
/// everything else, commas included.
pub fn parse_amount(text: &str) -> Option<f64> {
    let amount = text.trim().parse::<f64>().ok()?;
    if amount.is_finite() && amount > 0.0 && amount <= MAX_EXPENSE_AMOUNT {
        Some(amount)
    } else {
        None
    }
}

/// Parse a user-typed date in `DD.MM.YYYY` form.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_INPUT_FORMAT).ok()
}

/// Parse a user-typed currency code. Letters only, stored uppercased so "eur"
/// and "EUR" land in the same statistics bucket.
pub fn parse_currency(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.chars().count() > 10 {
        return None;
    }
    if !trimmed.chars().all(char::is_alphabetic) {
        return None;
    }
    Some(trimmed.to_uppercase())
}

/// Parse a user-typed category name: anything non-empty that fits the column.
pub fn parse_category_name(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.chars().count() > 64 {
        return None;
    }
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_idle() {
        assert_eq!(DialogState::default(), DialogState::Idle);
    }

    #[test]
    fn state_round_trips_through_json() {
        let state = DialogState::ExpenseConfirm {
            currency: "EUR".into(),
            amount: 12.5,
            name: "coffee".into(),
            category_id: 3,
            category_name: "Food".into(),
        };
        let json = serde_json::to_string(&state).unwrap();
        let back: DialogState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn stats_selection_round_trips() {
        let mut selection = CategorySelection::default();
        selection.categories.insert(-1, "all_categories".into());
        selection.categories.insert(7, "Transport".into());
        let state = DialogState::StatsCategories {
            choice: PeriodChoice::Fixed {
                period: Period::Month,
            },
            selection,
        };
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(serde_json::from_str::<DialogState>(&json).unwrap(), state);
    }

    #[test]
    fn amount_accepts_positive_in_range() {
        assert_eq!(parse_amount("15"), Some(15.0));
        assert_eq!(parse_amount("15.75"), Some(15.75));
        assert_eq!(parse_amount(" 1000000 "), Some(1_000_000.0));
    }

    #[test]
    fn amount_rejects_invalid_input() {
        assert_eq!(parse_amount("0"), None);
        assert_eq!(parse_amount("-3"), None);
        assert_eq!(parse_amount("1000001"), None);
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount("inf"), None);
        assert_eq!(parse_amount("ten"), None);
        assert_eq!(parse_amount("15,75"), None);
        assert_eq!(parse_amount("1,000"), None);
    }

    #[test]
    fn currency_is_letters_only_and_uppercased() {
        assert_eq!(parse_currency(" eur "), Some("EUR".to_string()));
        assert_eq!(parse_currency("USD"), Some("USD".to_string()));
        assert_eq!(parse_currency("руб"), Some("РУБ".to_string()));
        assert_eq!(parse_currency(""), None);
        assert_eq!(parse_currency("US D"), None);
        assert_eq!(parse_currency("U2"), None);
        assert_eq!(parse_currency("ABCDEFGHIJK"), None);
    }

    #[test]
    fn category_name_must_fit() {
        assert_eq!(
            parse_category_name("  Groceries "),
            Some("Groceries".to_string())
        );
        assert_eq!(parse_category_name("   "), None);
        assert_eq!(parse_category_name(&"x".repeat(65)), None);
    }

    #[test]
    fn date_uses_day_month_year() {
        assert_eq!(
            parse_date("09.03.2025"),
            NaiveDate::from_ymd_opt(2025, 3, 9)
        );
        assert_eq!(parse_date("2025-03-09"), None);
        assert_eq!(parse_date("31.02.2025"), None);
    }
}
