//! Reply and inline keyboards.
//!
//! Category keyboards are paginated: `CATEGORIES_PER_PAGE` buttons laid out
//! `CATEGORIES_PER_ROW` per row, with a navigation row when there is more
//! than one page. Navigation wraps around.

use std::collections::BTreeMap;
use std::ops::Range;

use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
};

use etb_core::config::{CATEGORIES_PER_PAGE, CATEGORIES_PER_ROW};
use etb_core::domain::{Category, ALL_CATEGORIES_ID};
use etb_core::i18n::{language_name_key, Localizer, SUPPORTED_LOCALES};
use etb_core::stats::Period;

use crate::callback_data::{CallbackData, PeriodKey};

/// Zero-based index of the last page for `len` items.
pub fn last_page(len: usize) -> usize {
    if len == 0 {
        0
    } else {
        (len - 1) / CATEGORIES_PER_PAGE
    }
}

/// Item range shown on `page`. Pages past the end come back empty.
pub fn page_slice(len: usize, page: usize) -> Range<usize> {
    let start = (page * CATEGORIES_PER_PAGE).min(len);
    let end = (start + CATEGORIES_PER_PAGE).min(len);
    start..end
}

/// Page reached by moving one step from `page`, wrapping at the ends.
pub fn turned_page(page: usize, last: usize, forward: bool) -> usize {
    if forward {
        if page >= last {
            0
        } else {
            page + 1
        }
    } else if page == 0 {
        last
    } else {
        page - 1
    }
}

fn reply_rows(l10n: &Localizer, locale: &str, keys: &[&str]) -> KeyboardMarkup {
    let rows: Vec<Vec<KeyboardButton>> = keys
        .iter()
        .map(|key| vec![KeyboardButton::new(l10n.msg(locale, key))])
        .collect();
    KeyboardMarkup::new(rows).resize_keyboard(true)
}

pub fn main_menu(l10n: &Localizer, locale: &str) -> KeyboardMarkup {
    reply_rows(
        l10n,
        locale,
        &[
            "ADD_EXPENSE_BUTTON",
            "SHOW_EXPENSES_BUTTON",
            "SETTINGS_MENU_BUTTON",
        ],
    )
}

pub fn statistics_menu(l10n: &Localizer, locale: &str) -> KeyboardMarkup {
    reply_rows(
        l10n,
        locale,
        &[
            "SHOW_MONTH_EXPENSES_STATISTICS_BUTTON",
            "SHOW_CUSTOM_EXPENSES_STATISTICS_BUTTON",
            "MAIN_MENU_BUTTON",
        ],
    )
}

pub fn settings_menu(l10n: &Localizer, locale: &str) -> KeyboardMarkup {
    reply_rows(
        l10n,
        locale,
        &[
            "CATEGORIES_SETTINGS_MENU_BUTTON",
            "CHANGE_CURRENCY_MENU_BUTTON",
            "CHANGE_LANGUAGE_MENU_BUTTON",
            "MAIN_MENU_BUTTON",
        ],
    )
}

pub fn categories_menu(l10n: &Localizer, locale: &str) -> KeyboardMarkup {
    reply_rows(
        l10n,
        locale,
        &[
            "ADD_CATEGORY_BUTTON",
            "REMOVE_CATEGORY_BUTTON",
            "MAIN_MENU_BUTTON",
        ],
    )
}

/// Single "back to the main menu" button, for free-text input steps.
pub fn abort_menu(l10n: &Localizer, locale: &str) -> KeyboardMarkup {
    reply_rows(l10n, locale, &["MAIN_MENU_BUTTON"])
}

/// Free-text input plus a localized "I'm done" button.
pub fn finish_menu(l10n: &Localizer, locale: &str, finish_key: &str) -> KeyboardMarkup {
    reply_rows(l10n, locale, &[finish_key, "MAIN_MENU_BUTTON"])
}

pub fn languages(l10n: &Localizer, locale: &str) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = SUPPORTED_LOCALES
        .iter()
        .map(|code| {
            vec![InlineKeyboardButton::callback(
                l10n.msg(locale, &language_name_key(code)),
                CallbackData::Language(code.to_string()).encode(),
            )]
        })
        .collect();
    InlineKeyboardMarkup::new(rows)
}

pub fn periods(l10n: &Localizer, locale: &str) -> InlineKeyboardMarkup {
    let button = |key: &str, period: PeriodKey| {
        InlineKeyboardButton::callback(
            l10n.msg(locale, key),
            CallbackData::Period(period).encode(),
        )
    };
    InlineKeyboardMarkup::new(vec![
        vec![
            button("DAY_PERIOD_BUTTON", PeriodKey::Fixed(Period::Day)),
            button("WEEK_PERIOD_BUTTON", PeriodKey::Fixed(Period::Week)),
        ],
        vec![
            button("MONTH_PERIOD_BUTTON", PeriodKey::Fixed(Period::Month)),
            button("YEAR_PERIOD_BUTTON", PeriodKey::Fixed(Period::Year)),
        ],
        vec![
            button("ALL_PERIOD_BUTTON", PeriodKey::Fixed(Period::All)),
            button("CUSTOM_PERIOD_BUTTON", PeriodKey::Custom),
        ],
    ])
}

pub fn confirm_cancel(
    l10n: &Localizer,
    locale: &str,
    confirm_key: &str,
    cancel_key: &str,
) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback(
            l10n.msg(locale, confirm_key),
            CallbackData::Confirm.encode(),
        ),
        InlineKeyboardButton::callback(l10n.msg(locale, cancel_key), CallbackData::Cancel.encode()),
    ]])
}

fn navigation_row(l10n: &Localizer, locale: &str) -> Vec<InlineKeyboardButton> {
    vec![
        InlineKeyboardButton::callback(
            l10n.msg(locale, "PREV_PAGE_BUTTON"),
            CallbackData::PrevPage.encode(),
        ),
        InlineKeyboardButton::callback(
            l10n.msg(locale, "NEXT_PAGE_BUTTON"),
            CallbackData::NextPage.encode(),
        ),
    ]
}

fn category_grid(
    categories: &[Category],
    page: usize,
    selected: Option<&BTreeMap<i32, String>>,
) -> Vec<Vec<InlineKeyboardButton>> {
    let range = page_slice(categories.len(), page);
    let mut rows = Vec::new();
    for chunk in categories[range].chunks(CATEGORIES_PER_ROW) {
        let row = chunk
            .iter()
            .map(|category| {
                let picked = selected
                    .map(|sel| sel.contains_key(&category.id))
                    .unwrap_or(false);
                let label = if picked {
                    format!("✅ {}", category.name)
                } else {
                    category.name.clone()
                };
                InlineKeyboardButton::callback(label, CallbackData::Category(category.id).encode())
            })
            .collect();
        rows.push(row);
    }
    rows
}

/// Pick-one category keyboard (expense category, category removal).
pub fn pick_category(
    l10n: &Localizer,
    locale: &str,
    categories: &[Category],
    page: usize,
) -> InlineKeyboardMarkup {
    let mut rows = category_grid(categories, page, None);
    if last_page(categories.len()) > 0 {
        rows.push(navigation_row(l10n, locale));
    }
    InlineKeyboardMarkup::new(rows)
}

/// Multi-select category keyboard for statistics, with an "all categories"
/// toggle on top and a finish button at the bottom.
pub fn select_categories(
    l10n: &Localizer,
    locale: &str,
    categories: &[Category],
    page: usize,
    selected: &BTreeMap<i32, String>,
) -> InlineKeyboardMarkup {
    let all_label = if selected.contains_key(&ALL_CATEGORIES_ID) {
        format!("✅ {}", l10n.msg(locale, "ALL_CATEGORIES_BUTTON"))
    } else {
        l10n.msg(locale, "ALL_CATEGORIES_BUTTON")
    };
    let mut rows = vec![vec![InlineKeyboardButton::callback(
        all_label,
        CallbackData::Category(ALL_CATEGORIES_ID).encode(),
    )]];
    rows.extend(category_grid(categories, page, Some(selected)));
    if last_page(categories.len()) > 0 {
        rows.push(navigation_row(l10n, locale));
    }
    rows.push(vec![InlineKeyboardButton::callback(
        l10n.msg(locale, "END_CATEGORIES_SELECT_BUTTON"),
        CallbackData::Done.encode(),
    )]);
    InlineKeyboardMarkup::new(rows)
}

/// Prev/next keyboard under a statistics page.
pub fn statistics_navigation(l10n: &Localizer, locale: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![navigation_row(l10n, locale)])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories(n: usize) -> Vec<Category> {
        (0..n)
            .map(|i| Category {
                id: i as i32 + 1,
                name: format!("cat-{i}"),
            })
            .collect()
    }

    fn l10n() -> Localizer {
        Localizer::new("en").unwrap()
    }

    #[test]
    fn paging_math() {
        assert_eq!(last_page(0), 0);
        assert_eq!(last_page(6), 0);
        assert_eq!(last_page(7), 1);
        assert_eq!(last_page(13), 2);
        assert_eq!(page_slice(13, 0), 0..6);
        assert_eq!(page_slice(13, 2), 12..13);
        assert_eq!(page_slice(13, 5), 13..13);
    }

    #[test]
    fn page_turning_wraps() {
        assert_eq!(turned_page(0, 2, true), 1);
        assert_eq!(turned_page(2, 2, true), 0);
        assert_eq!(turned_page(0, 2, false), 2);
        assert_eq!(turned_page(1, 2, false), 0);
    }

    #[test]
    fn pick_keyboard_has_two_buttons_per_row() {
        let kb = pick_category(&l10n(), "en", &categories(5), 0);
        // 5 categories on one page: 2 + 2 + 1, no navigation.
        let rows = &kb.inline_keyboard;
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[2].len(), 1);
    }

    #[test]
    fn pick_keyboard_paginates_with_navigation() {
        let kb = pick_category(&l10n(), "en", &categories(8), 1);
        // Second page: 2 leftover categories plus the navigation row.
        let rows = &kb.inline_keyboard;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[1].len(), 2);
        assert_eq!(
            CallbackData::decode(callback_payload(&rows[1][1])),
            Some(CallbackData::NextPage)
        );
    }

    #[test]
    fn select_keyboard_marks_selection() {
        let mut selected = BTreeMap::new();
        selected.insert(ALL_CATEGORIES_ID, "all".to_string());
        selected.insert(2, "cat-1".to_string());
        let kb = select_categories(&l10n(), "en", &categories(3), 0, &selected);
        let rows = &kb.inline_keyboard;
        // All-categories toggle, two grid rows, finish row.
        assert_eq!(rows.len(), 4);
        assert!(button_text(&rows[0][0]).starts_with("✅"));
        assert!(button_text(&rows[1][1]).starts_with("✅"));
        assert!(!button_text(&rows[1][0]).starts_with("✅"));
        assert_eq!(
            CallbackData::decode(callback_payload(&rows[3][0])),
            Some(CallbackData::Done)
        );
    }

    fn button_text(button: &InlineKeyboardButton) -> &str {
        &button.text
    }

    fn callback_payload(button: &InlineKeyboardButton) -> &str {
        match &button.kind {
            teloxide::types::InlineKeyboardButtonKind::CallbackData(data) => data,
            other => panic!("unexpected button kind: {other:?}"),
        }
    }
}
