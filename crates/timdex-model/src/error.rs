use thiserror::Error;

/// A record invariant that failed during construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'{field}' cannot be an empty list, received: '{value}'.")]
    EmptyList { field: String, value: String },

    #[error("'{field}' is required and cannot be blank, received: '{value}'.")]
    BlankRequired { field: String, value: String },

    #[error("{field} may have a 'gt' or 'gte' value, but not both; received {value}")]
    ConflictingLowerBound { field: String, value: String },

    #[error("{field} may have a 'lt' or 'lte' value, but not both; received {value}")]
    ConflictingUpperBound { field: String, value: String },

    #[error("'{field}' has an invalid value, received: '{value}': {message}")]
    InvalidType {
        field: String,
        value: String,
        message: String,
    },

    #[error("'{field}' is not a recognized record field")]
    UnknownField { field: String },
}

pub type Result<T> = std::result::Result<T, ValidationError>;
