use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The server host cannot be empty.
    #[error("`host` cannot be empty")]
    EmptyHost,
    /// A URL format must contain the server host placeholder.
    #[error("`{field}` must contain the `{{server_host}}` placeholder")]
    MissingHostPlaceholder { field: String },
    /// A field holds a value outside of its accepted range.
    #[error("Invalid value for `{field}`: {constraint}")]
    InvalidFieldValue { field: String, constraint: String },
}
