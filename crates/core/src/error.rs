//! Error types for the slotform domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all slotform operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Form pipeline errors ---
    #[error("Form error: {0}")]
    Form(#[from] FormError),

    // --- Codec errors ---
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    // --- History errors ---
    #[error("History error: {0}")]
    History(#[from] HistoryError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Errors raised while matching, suggesting, or validating a form.
///
/// `WrongInput` and `Validation` carry a `cause` naming the presentation
/// template that should explain the failure to the end user, plus arbitrary
/// context parameters for that template.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("wrong input ({cause})")]
    WrongInput {
        cause: String,
        params: serde_json::Map<String, serde_json::Value>,
    },

    #[error("invalid combination ({cause})")]
    Validation {
        cause: String,
        params: serde_json::Map<String, serde_json::Value>,
    },

    #[error("field '{field}': expected single matched value")]
    MultiValuedMatch { field: String },

    #[error("form '{form}' has no form-level validator")]
    MissingValidator { form: String },

    #[error("unknown form type: {0}")]
    UnknownForm(String),

    #[error("unknown field: {0}")]
    UnknownField(String),
}

impl FormError {
    /// A user-input failure pointing at the rendering template `cause`.
    pub fn wrong_input(cause: impl Into<String>) -> Self {
        FormError::WrongInput {
            cause: cause.into(),
            params: serde_json::Map::new(),
        }
    }

    /// An invalid-combination failure pointing at the rendering template `cause`.
    pub fn validation(cause: impl Into<String>) -> Self {
        FormError::Validation {
            cause: cause.into(),
            params: serde_json::Map::new(),
        }
    }

    /// Attach a context parameter for the presentation template.
    ///
    /// No effect on variants that carry no params.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        if let FormError::WrongInput { params, .. } | FormError::Validation { params, .. } =
            &mut self
        {
            params.insert(key.into(), value.into());
        }
        self
    }

    /// The template tag explaining this failure, when one exists.
    pub fn cause(&self) -> Option<&str> {
        match self {
            FormError::WrongInput { cause, .. } | FormError::Validation { cause, .. } => {
                Some(cause)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unparseable {kind} value '{raw}'")]
    InvalidTemporal { kind: &'static str, raw: String },

    #[error("unknown entity reference {kind}({id})")]
    UnknownEntity { kind: String, id: String },

    #[error("unsupported value: {0}")]
    Unsupported(String),
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("cannot modify read-only history")]
    ReadOnly,

    #[error("persistence failed: {0}")]
    Persistence(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_input_carries_cause_and_params() {
        let err = FormError::wrong_input("ask_master").param("master", "John");
        assert_eq!(err.cause(), Some("ask_master"));
        match &err {
            FormError::WrongInput { params, .. } => {
                assert_eq!(params.get("master"), Some(&serde_json::json!("John")));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
        assert!(err.to_string().contains("ask_master"));
    }

    #[test]
    fn multi_valued_match_displays_the_field_name() {
        let inner = FormError::MultiValuedMatch {
            field: "lastname".into(),
        };
        // The field name is plain display context, not a nested error cause.
        assert!(std::error::Error::source(&inner).is_none());
        let err = Error::Form(inner);
        assert!(err.to_string().contains("lastname"));
        assert!(err.to_string().contains("single matched value"));
    }

    #[test]
    fn read_only_history_displays_correctly() {
        let err = Error::History(HistoryError::ReadOnly);
        assert!(err.to_string().contains("read-only"));
    }
}
