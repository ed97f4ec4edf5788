use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Could not fetch {location}: {reason}")]
    Fetch { location: String, reason: String },

    #[error("{location} is not valid JSON: {source}")]
    Parse {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{file} does not have the expected shape: {reason}")]
    DataShape { file: String, reason: String },

    #[error("User identifier must not be empty")]
    EmptyUserId,

    #[error("Catalog load was superseded by a newer one")]
    Superseded,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl CatalogError {
    pub fn fetch(location: impl Into<String>, reason: impl ToString) -> Self {
        CatalogError::Fetch {
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    pub fn shape(file: impl Into<String>, reason: impl ToString) -> Self {
        CatalogError::DataShape {
            file: file.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<toml::de::Error> for CatalogError {
    fn from(e: toml::de::Error) -> Self {
        CatalogError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
