//! Text rendering for statistics pages.

use fluent_bundle::FluentArgs;

use etb_core::i18n::Localizer;
use etb_core::stats::CategoryTotals;

/// Format an amount the way it is shown in chat: two decimals at most,
/// trailing zeros dropped.
pub fn format_amount(amount: f64) -> String {
    let rendered = format!("{amount:.2}");
    rendered
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// One chat message per selected category. A category without matching
/// expenses still gets a page saying so, so the page count always matches
/// the selection.
pub fn statistics_pages(
    l10n: &Localizer,
    locale: &str,
    totals: &[CategoryTotals],
) -> Vec<String> {
    totals
        .iter()
        .map(|bucket| {
            if bucket.is_empty() {
                let mut args = FluentArgs::new();
                args.set("category_name", bucket.category_name.as_str());
                return l10n.msg_args(locale, "ERROR_NO_EXPENSES_PAGE_MESSAGE", &args);
            }

            let sums: Vec<String> = bucket
                .totals
                .iter()
                .map(|(currency, amount)| {
                    let mut args = FluentArgs::new();
                    args.set("amount", format_amount(*amount));
                    args.set("currency", currency.as_str());
                    l10n.msg_args(locale, "CUSTOM_STATISTICS_CURRENCY_SUM", &args)
                })
                .collect();

            let mut args = FluentArgs::new();
            args.set("category_name", bucket.category_name.as_str());
            args.set("total_expenses", sums.join("\n"));
            l10n.msg_args(locale, "CUSTOM_STATISTICS_PAGE", &args)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn l10n() -> Localizer {
        Localizer::new("en").unwrap()
    }

    #[test]
    fn amounts_drop_trailing_zeros() {
        assert_eq!(format_amount(12.0), "12");
        assert_eq!(format_amount(12.5), "12.5");
        assert_eq!(format_amount(12.505), "12.51");
        assert_eq!(format_amount(0.1 + 0.2), "0.3");
    }

    #[test]
    fn page_lists_every_currency() {
        let mut totals = BTreeMap::new();
        totals.insert("EUR".to_string(), 12.5);
        totals.insert("USD".to_string(), 3.0);
        let bucket = CategoryTotals {
            category_id: 1,
            category_name: "Food".to_string(),
            totals,
        };

        let pages = statistics_pages(&l10n(), "en", &[bucket]);
        assert_eq!(pages.len(), 1);
        assert!(pages[0].contains("Food"));
        assert!(pages[0].contains("12.5 EUR"));
        assert!(pages[0].contains("3 USD"));
    }

    #[test]
    fn empty_bucket_renders_a_page_too() {
        let bucket = CategoryTotals {
            category_id: 9,
            category_name: "Travel".to_string(),
            totals: BTreeMap::new(),
        };
        let pages = statistics_pages(&l10n(), "en", &[bucket]);
        assert_eq!(pages.len(), 1);
        assert!(pages[0].contains("Travel"));
        assert!(pages[0].contains("No expenses"));
    }
}
