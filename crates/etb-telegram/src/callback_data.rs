//! Compact codec for inline-button callback data.
//!
//! Telegram caps callback data at 64 bytes, so buttons carry ids and tags
//! only; display names are looked up again when the button fires.

use etb_core::stats::Period;

/// Period chosen on the statistics period keyboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeriodKey {
    Fixed(Period),
    Custom,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CallbackData {
    /// A category button; carries the category id (may be the "all
    /// categories" sentinel).
    Category(i32),
    /// A language button; carries the locale code.
    Language(String),
    Period(PeriodKey),
    Confirm,
    Cancel,
    /// Finish a multi-select.
    Done,
    NextPage,
    PrevPage,
}

impl CallbackData {
    pub fn encode(&self) -> String {
        match self {
            CallbackData::Category(id) => format!("cat:{id}"),
            CallbackData::Language(code) => format!("lang:{code}"),
            CallbackData::Period(key) => {
                let tag = match key {
                    PeriodKey::Fixed(Period::Day) => "day",
                    PeriodKey::Fixed(Period::Week) => "week",
                    PeriodKey::Fixed(Period::Month) => "month",
                    PeriodKey::Fixed(Period::Year) => "year",
                    PeriodKey::Fixed(Period::All) => "all",
                    PeriodKey::Custom => "custom",
                };
                format!("period:{tag}")
            }
            CallbackData::Confirm => "confirm".to_string(),
            CallbackData::Cancel => "cancel".to_string(),
            CallbackData::Done => "done".to_string(),
            CallbackData::NextPage => "nav:next".to_string(),
            CallbackData::PrevPage => "nav:prev".to_string(),
        }
    }

    pub fn decode(data: &str) -> Option<Self> {
        if let Some(rest) = data.strip_prefix("cat:") {
            return rest.parse().ok().map(CallbackData::Category);
        }
        if let Some(rest) = data.strip_prefix("lang:") {
            if rest.is_empty() {
                return None;
            }
            return Some(CallbackData::Language(rest.to_string()));
        }
        if let Some(rest) = data.strip_prefix("period:") {
            let key = match rest {
                "day" => PeriodKey::Fixed(Period::Day),
                "week" => PeriodKey::Fixed(Period::Week),
                "month" => PeriodKey::Fixed(Period::Month),
                "year" => PeriodKey::Fixed(Period::Year),
                "all" => PeriodKey::Fixed(Period::All),
                "custom" => PeriodKey::Custom,
                _ => return None,
            };
            return Some(CallbackData::Period(key));
        }
        match data {
            "confirm" => Some(CallbackData::Confirm),
            "cancel" => Some(CallbackData::Cancel),
            "done" => Some(CallbackData::Done),
            "nav:next" => Some(CallbackData::NextPage),
            "nav:prev" => Some(CallbackData::PrevPage),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let cases = [
            CallbackData::Category(7),
            CallbackData::Category(-1),
            CallbackData::Language("ru".into()),
            CallbackData::Period(PeriodKey::Fixed(Period::Week)),
            CallbackData::Period(PeriodKey::Custom),
            CallbackData::Confirm,
            CallbackData::Cancel,
            CallbackData::Done,
            CallbackData::NextPage,
            CallbackData::PrevPage,
        ];
        for case in cases {
            let encoded = case.encode();
            assert!(encoded.len() <= 64, "too long: {encoded}");
            assert_eq!(CallbackData::decode(&encoded), Some(case));
        }
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(CallbackData::decode(""), None);
        assert_eq!(CallbackData::decode("cat:abc"), None);
        assert_eq!(CallbackData::decode("lang:"), None);
        assert_eq!(CallbackData::decode("period:fortnight"), None);
        assert_eq!(CallbackData::decode("nav:up"), None);
        assert_eq!(CallbackData::decode("askuser:1:2"), None);
    }
}
