//! Fluent-based localization.
//!
//! Catalogs are compiled into the binary, one `.ftl` file per locale. Lookups
//! never fail: a missing key renders as `MISSING: <key>` so a translation gap
//! shows up in chat instead of killing the dialog.

use std::collections::HashMap;

use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource};
use tracing::warn;
use unic_langid::LanguageIdentifier;

use crate::{Error, Result};

const EN_FTL: &str = include_str!("../locales/en.ftl");
const RU_FTL: &str = include_str!("../locales/ru.ftl");

/// Locales shipped with the bot, in keyboard display order.
pub const SUPPORTED_LOCALES: [&str; 2] = ["en", "ru"];

/// Catalog key for the display name of a supported locale.
pub fn language_name_key(locale: &str) -> String {
    format!("LANGUAGE_NAME_{}", locale.to_uppercase())
}

pub struct Localizer {
    bundles: HashMap<LanguageIdentifier, FluentBundle<FluentResource>>,
    default_locale: LanguageIdentifier,
}

impl Localizer {
    /// Build bundles for all shipped catalogs. `default_locale` is used
    /// whenever a requested locale is unknown.
    pub fn new(default_locale: &str) -> Result<Self> {
        let mut bundles = HashMap::new();
        for (locale_str, source) in [("en", EN_FTL), ("ru", RU_FTL)] {
            let locale: LanguageIdentifier = locale_str
                .parse()
                .map_err(|_| Error::Config(format!("invalid locale id: {locale_str}")))?;
            let resource = FluentResource::try_new(source.to_string())
                .map_err(|_| Error::Config(format!("malformed catalog for {locale_str}")))?;
            let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);
            bundle.set_use_isolating(false);
            bundle
                .add_resource(resource)
                .map_err(|_| Error::Config(format!("duplicate messages in {locale_str}")))?;
            bundles.insert(locale, bundle);
        }

        let default_locale: LanguageIdentifier = default_locale
            .parse()
            .map_err(|_| Error::Config(format!("invalid default locale: {default_locale}")))?;
        if !bundles.contains_key(&default_locale) {
            return Err(Error::Config(format!(
                "default locale {default_locale} has no catalog"
            )));
        }

        Ok(Self {
            bundles,
            default_locale,
        })
    }

    pub fn is_supported(&self, locale: &str) -> bool {
        locale
            .parse::<LanguageIdentifier>()
            .map(|id| self.bundles.contains_key(&id))
            .unwrap_or(false)
    }

    /// Translate `key` without arguments.
    pub fn msg(&self, locale: &str, key: &str) -> String {
        self.format(locale, key, None)
    }

    /// Translate `key` with named arguments.
    pub fn msg_args(&self, locale: &str, key: &str, args: &FluentArgs) -> String {
        self.format(locale, key, Some(args))
    }

    fn format(&self, locale: &str, key: &str, args: Option<&FluentArgs>) -> String {
        let bundle = self.bundle_for(locale);
        let Some(pattern) = bundle.get_message(key).and_then(|msg| msg.value()) else {
            warn!(%locale, %key, "message key missing from catalog");
            return format!("MISSING: {key}");
        };
        let mut errors = vec![];
        let value = bundle.format_pattern(pattern, args, &mut errors).to_string();
        if !errors.is_empty() {
            warn!(%locale, %key, ?errors, "message formatted with errors");
        }
        value
    }

    fn bundle_for(&self, locale: &str) -> &FluentBundle<FluentResource> {
        locale
            .parse::<LanguageIdentifier>()
            .ok()
            .and_then(|id| self.bundles.get(&id))
            .unwrap_or_else(|| &self.bundles[&self.default_locale])
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use super::*;

    fn localizer() -> Localizer {
        Localizer::new("ru").unwrap()
    }

    /// Message keys of a catalog, each with the named placeholders its
    /// template references.
    fn catalog_messages(source: &str) -> BTreeMap<String, BTreeSet<String>> {
        let mut out = BTreeMap::new();
        let mut current: Option<String> = None;
        for line in source.lines() {
            let is_entry = line
                .chars()
                .next()
                .map(|c| c.is_ascii_alphabetic())
                .unwrap_or(false);
            if is_entry {
                if let Some((key, _)) = line.split_once('=') {
                    let key = key.trim().to_string();
                    out.insert(key.clone(), BTreeSet::new());
                    current = Some(key);
                }
            }
            if let Some(key) = &current {
                let placeholders: &mut BTreeSet<String> = out.get_mut(key).unwrap();
                let mut rest = line;
                while let Some(pos) = rest.find('$') {
                    rest = &rest[pos + 1..];
                    let name: String = rest
                        .chars()
                        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
                        .collect();
                    if !name.is_empty() {
                        placeholders.insert(name);
                    }
                }
            }
        }
        out
    }

    #[test]
    fn catalogs_define_the_same_keys_and_placeholders() {
        let en = catalog_messages(EN_FTL);
        let ru = catalog_messages(RU_FTL);

        let en_keys: BTreeSet<_> = en.keys().collect();
        let ru_keys: BTreeSet<_> = ru.keys().collect();
        let only_en: Vec<_> = en_keys.difference(&ru_keys).collect();
        let only_ru: Vec<_> = ru_keys.difference(&en_keys).collect();
        assert!(
            only_en.is_empty() && only_ru.is_empty(),
            "key mismatch: en-only {only_en:?}, ru-only {only_ru:?}"
        );

        for (key, en_placeholders) in &en {
            assert_eq!(
                en_placeholders, &ru[key],
                "placeholder mismatch for {key}"
            );
        }
    }

    #[test]
    fn known_key_resolves_per_locale() {
        let l10n = localizer();
        assert_eq!(l10n.msg("en", "EXPENSE_ADDED"), "Expense added.");
        assert_eq!(l10n.msg("ru", "EXPENSE_ADDED"), "Расход добавлен.");
    }

    #[test]
    fn missing_key_is_flagged_not_fatal() {
        let l10n = localizer();
        assert_eq!(l10n.msg("en", "NO_SUCH_KEY"), "MISSING: NO_SUCH_KEY");
    }

    #[test]
    fn unknown_locale_falls_back_to_default() {
        let l10n = localizer();
        assert_eq!(l10n.msg("fr", "EXPENSE_ADDED"), "Расход добавлен.");
        assert_eq!(l10n.msg("not a locale!", "EXPENSE_ADDED"), "Расход добавлен.");
    }

    #[test]
    fn arguments_are_substituted() {
        let l10n = localizer();
        let mut args = FluentArgs::new();
        args.set("currency", "EUR");
        assert_eq!(
            l10n.msg_args("en", "INPUT_AMOUNT_MESSAGE", &args),
            "Enter the amount in EUR:"
        );
    }

    #[test]
    fn supported_locales_are_loaded() {
        let l10n = localizer();
        for locale in SUPPORTED_LOCALES {
            assert!(l10n.is_supported(locale));
        }
        assert!(!l10n.is_supported("de"));
    }

    #[test]
    fn language_name_keys_exist() {
        let l10n = localizer();
        for locale in SUPPORTED_LOCALES {
            let name = l10n.msg("en", &language_name_key(locale));
            assert!(!name.starts_with("MISSING"), "no display name for {locale}");
        }
    }

    #[test]
    fn unknown_default_locale_is_rejected() {
        assert!(Localizer::new("xx").is_err());
    }
}
