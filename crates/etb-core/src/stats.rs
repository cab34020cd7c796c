//! Statistics aggregation over recorded expenses.
//!
//! The handlers collect a period and a set of category ids; this module turns
//! the user's expense history into per-category, per-currency totals. Text
//! rendering stays in the Telegram adapter so the output can be localized.

use std::collections::BTreeMap;

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::{Expense, ALL_CATEGORIES_ID};

/// Fixed aggregation periods, all ending today.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
    All,
}

impl Period {
    /// Inclusive start of the period, relative to `today`. Month and year go
    /// back by calendar units, not fixed day counts.
    pub fn start_date(self, today: NaiveDate) -> NaiveDate {
        match self {
            Period::Day => today.checked_sub_days(Days::new(1)).unwrap_or(NaiveDate::MIN),
            Period::Week => today.checked_sub_days(Days::new(7)).unwrap_or(NaiveDate::MIN),
            Period::Month => today
                .checked_sub_months(Months::new(1))
                .unwrap_or(NaiveDate::MIN),
            Period::Year => today
                .checked_sub_months(Months::new(12))
                .unwrap_or(NaiveDate::MIN),
            Period::All => NaiveDate::MIN,
        }
    }

    pub fn bounds(self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        (self.start_date(today), today)
    }
}

/// A custom period is valid when both ends exist and do not cross.
pub fn is_custom_period_valid(start: NaiveDate, end: NaiveDate) -> bool {
    start <= end
}

/// Aggregated totals for one selected category.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryTotals {
    pub category_id: i32,
    pub category_name: String,
    /// Sum per currency; a user may record expenses in several currencies and
    /// those must never be added together.
    pub totals: BTreeMap<String, f64>,
}

impl CategoryTotals {
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

/// Filter `expenses` to `start ..= end` and sum them per selected category and
/// currency. The `ALL_CATEGORIES_ID` sentinel collects every expense in range
/// regardless of its category. Categories selected but without matching
/// expenses still yield an (empty) entry so the UI can render a "nothing
/// here" page for them.
pub fn aggregate_by_categories(
    expenses: &[Expense],
    selected: &BTreeMap<i32, String>,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<CategoryTotals> {
    let mut out: Vec<CategoryTotals> = selected
        .iter()
        .map(|(&id, name)| CategoryTotals {
            category_id: id,
            category_name: name.clone(),
            totals: BTreeMap::new(),
        })
        .collect();

    for expense in expenses {
        if expense.date < start || expense.date > end {
            continue;
        }
        for bucket in &mut out {
            if bucket.category_id == expense.category_id
                || bucket.category_id == ALL_CATEGORIES_ID
            {
                *bucket.totals.entry(expense.currency.clone()).or_insert(0.0) += expense.amount;
            }
        }
    }

    out
}

/// True when nothing at all matched the period, in which case the statistics
/// flow reports an error instead of a stack of empty pages.
pub fn all_empty(totals: &[CategoryTotals]) -> bool {
    totals.iter().all(CategoryTotals::is_empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn expense(id: i32, category_id: i32, currency: &str, amount: f64, on: NaiveDate) -> Expense {
        Expense {
            id,
            name: format!("expense-{id}"),
            currency: currency.to_string(),
            amount,
            date: on,
            user_tg_id: 42,
            category_id,
        }
    }

    #[test]
    fn period_start_dates() {
        let today = date(2025, 3, 31);
        assert_eq!(Period::Day.start_date(today), date(2025, 3, 30));
        assert_eq!(Period::Week.start_date(today), date(2025, 3, 24));
        // Calendar month back from Mar 31 clamps to Feb 28.
        assert_eq!(Period::Month.start_date(today), date(2025, 2, 28));
        assert_eq!(Period::Year.start_date(today), date(2024, 3, 31));
        assert_eq!(Period::All.start_date(today), NaiveDate::MIN);
    }

    #[test]
    fn custom_period_validation() {
        assert!(is_custom_period_valid(date(2025, 1, 1), date(2025, 1, 1)));
        assert!(is_custom_period_valid(date(2025, 1, 1), date(2025, 2, 1)));
        assert!(!is_custom_period_valid(date(2025, 2, 2), date(2025, 2, 1)));
    }

    #[test]
    fn aggregates_per_category_and_currency() {
        let expenses = vec![
            expense(1, 1, "EUR", 10.0, date(2025, 3, 10)),
            expense(2, 1, "EUR", 2.5, date(2025, 3, 12)),
            expense(3, 1, "USD", 4.0, date(2025, 3, 12)),
            expense(4, 2, "EUR", 99.0, date(2025, 3, 15)),
        ];
        let mut selected = BTreeMap::new();
        selected.insert(1, "Food".to_string());

        let totals =
            aggregate_by_categories(&expenses, &selected, date(2025, 3, 1), date(2025, 3, 31));
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].category_name, "Food");
        assert_eq!(totals[0].totals.get("EUR"), Some(&12.5));
        assert_eq!(totals[0].totals.get("USD"), Some(&4.0));
    }

    #[test]
    fn date_range_is_inclusive() {
        let expenses = vec![
            expense(1, 1, "EUR", 1.0, date(2025, 3, 1)),
            expense(2, 1, "EUR", 2.0, date(2025, 3, 31)),
            expense(3, 1, "EUR", 4.0, date(2025, 4, 1)),
        ];
        let mut selected = BTreeMap::new();
        selected.insert(1, "Food".to_string());

        let totals =
            aggregate_by_categories(&expenses, &selected, date(2025, 3, 1), date(2025, 3, 31));
        assert_eq!(totals[0].totals.get("EUR"), Some(&3.0));
    }

    #[test]
    fn all_categories_sentinel_collects_everything() {
        let expenses = vec![
            expense(1, 1, "EUR", 10.0, date(2025, 3, 10)),
            expense(2, 2, "EUR", 5.0, date(2025, 3, 11)),
        ];
        let mut selected = BTreeMap::new();
        selected.insert(ALL_CATEGORIES_ID, "all_categories".to_string());
        selected.insert(2, "Transport".to_string());

        let totals =
            aggregate_by_categories(&expenses, &selected, date(2025, 3, 1), date(2025, 3, 31));
        let all = totals
            .iter()
            .find(|t| t.category_id == ALL_CATEGORIES_ID)
            .unwrap();
        assert_eq!(all.totals.get("EUR"), Some(&15.0));
        let transport = totals.iter().find(|t| t.category_id == 2).unwrap();
        assert_eq!(transport.totals.get("EUR"), Some(&5.0));
    }

    #[test]
    fn selected_category_without_expenses_yields_empty_bucket() {
        let expenses = vec![expense(1, 1, "EUR", 10.0, date(2025, 3, 10))];
        let mut selected = BTreeMap::new();
        selected.insert(9, "Travel".to_string());

        let totals =
            aggregate_by_categories(&expenses, &selected, date(2025, 3, 1), date(2025, 3, 31));
        assert_eq!(totals.len(), 1);
        assert!(totals[0].is_empty());
        assert!(all_empty(&totals));
    }
}
