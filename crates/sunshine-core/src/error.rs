//! Centralized error types for the Sunshine application.
//!
//! Library crates keep their own narrow error enums; everything that reaches
//! the binary is converted into [`AppError`], which carries a UI-safe message
//! alongside the full context for logs.

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a message suitable for a status line.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Wearable sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Recover a typed error from an `anyhow` chain, falling back to `Other`.
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        let err = match err.downcast::<ConfigError>() {
            Ok(e) => return AppError::Config(e),
            Err(err) => err,
        };
        let err = match err.downcast::<DatabaseError>() {
            Ok(e) => return AppError::Database(e),
            Err(err) => err,
        };
        let err = match err.downcast::<SyncError>() {
            Ok(e) => return AppError::Sync(e),
            Err(err) => err,
        };
        match err.downcast::<std::io::Error>() {
            Ok(e) => AppError::Io(e),
            Err(err) => AppError::Other(err),
        }
    }

    /// Returns a user-friendly message suitable for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Database(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Sync(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

/// Local forecast store errors (SQLite).
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Data corruption detected: {0}")]
    Corruption(String),
}

impl DatabaseError {
    pub fn user_message(&self) -> &'static str {
        match self {
            DatabaseError::ConnectionFailed(_) => {
                "Unable to access local forecast data. Try restarting the app."
            }
            DatabaseError::QueryFailed(_) => "A forecast lookup failed. Please try again.",
            DatabaseError::Corruption(_) => {
                "Local forecast data may be corrupted. Consider clearing app data."
            }
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
        }
    }
}

/// Errors on the phone-to-wearable data channel.
///
/// None of these are fatal; the wearable simply keeps showing older data.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Malformed data item: {0}")]
    MalformedItem(String),

    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("Data channel closed")]
    ChannelClosed,
}

impl SyncError {
    pub fn user_message(&self) -> &'static str {
        match self {
            SyncError::MalformedItem(_) => "Received unreadable weather data from the phone.",
            SyncError::DeliveryFailed(_) => "Couldn't reach the watch. It will update next sync.",
            SyncError::ChannelClosed => "Watch connection closed.",
        }
    }
}

/// Extension trait for converting rusqlite errors to our error types.
pub trait RusqliteErrorExt {
    fn into_database_error(self) -> DatabaseError;
}

impl RusqliteErrorExt for rusqlite::Error {
    fn into_database_error(self) -> DatabaseError {
        match &self {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("corrupt") => {
                DatabaseError::Corruption(self.to_string())
            }
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::CannotOpen =>
            {
                DatabaseError::ConnectionFailed(self.to_string())
            }
            _ => DatabaseError::QueryFailed(self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_are_non_empty() {
        let errors = vec![
            AppError::Database(DatabaseError::QueryFailed("test".into())),
            AppError::Config(ConfigError::Invalid("test".into())),
            AppError::Sync(SyncError::ChannelClosed),
            AppError::Sync(SyncError::DeliveryFailed("offline".into())),
            AppError::Other(anyhow::anyhow!("boom")),
        ];

        for err in errors {
            assert!(!err.user_message().is_empty(), "empty message for {:?}", err);
        }
    }

    #[test]
    fn test_app_error_conversion() {
        let sync_err = SyncError::ChannelClosed;
        let app_err: AppError = sync_err.into();
        assert!(matches!(app_err, AppError::Sync(SyncError::ChannelClosed)));
    }

    #[test]
    fn test_user_message_propagation() {
        let app_err = AppError::Sync(SyncError::DeliveryFailed("no node".into()));
        assert_eq!(
            app_err.user_message(),
            "Couldn't reach the watch. It will update next sync."
        );
    }

    #[test]
    fn test_from_anyhow_recovers_config_error() {
        let err = anyhow::Error::from(ConfigError::Invalid("sync.data_path".into()));
        let app = AppError::from_anyhow(err);
        assert!(matches!(app, AppError::Config(ConfigError::Invalid(_))));
        assert_eq!(app.user_message(), "Invalid configuration. Check your settings.");
    }

    #[test]
    fn test_from_anyhow_falls_back_to_other() {
        let app = AppError::from_anyhow(anyhow::anyhow!("boom"));
        assert!(matches!(app, AppError::Other(_)));
    }

    #[test]
    fn test_rusqlite_query_error_maps_to_query_failed() {
        let err = rusqlite::Error::QueryReturnedNoRows.into_database_error();
        assert!(matches!(err, DatabaseError::QueryFailed(_)));
    }
}
