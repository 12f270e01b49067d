use crate::validation::error::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Form misconfigured: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a missing form looked up by slug or id.
    pub fn form_not_found(key: impl ToString) -> Self {
        Self::NotFound {
            entity: "Form",
            key: key.to_string(),
        }
    }
}
