use thiserror::Error;

#[derive(Error, Debug)]
pub enum TacticsError {
    #[error("Squad lookup failed: {0}")]
    SquadLookup(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TacticsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = TacticsError::SquadLookup("index offline".into());
        assert_eq!(err.to_string(), "Squad lookup failed: index offline");
        let err = TacticsError::InvalidConfig("low >= high".into());
        assert_eq!(err.to_string(), "Invalid config: low >= high");
    }
}
