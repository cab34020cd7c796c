/// Core error type for the bot.
///
/// Adapter crates map their specific errors into this type so the handler
/// layer can decide uniformly which localized message to show and whether the
/// dialog has to be reset.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("user config for {0} not found")]
    UserConfigNotFound(i64),

    #[error("category {0} not found")]
    CategoryNotFound(i32),

    #[error("no expenses recorded for user {0}")]
    NoExpenses(i64),

    #[error("duplicate: {0}")]
    Duplicate(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    /// True for the "row does not exist" family, which handlers usually turn
    /// into a localized hint rather than a generic failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::UserConfigNotFound(_) | Error::CategoryNotFound(_) | Error::NoExpenses(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_classification() {
        assert!(Error::UserConfigNotFound(1).is_not_found());
        assert!(Error::NoExpenses(1).is_not_found());
        assert!(!Error::Duplicate("users".into()).is_not_found());
        assert!(!Error::Storage("pool timeout".into()).is_not_found());
    }
}
