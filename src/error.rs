pub type AspectraResult<T> = Result<T, AspectraError>;

#[derive(thiserror::Error, Debug)]
pub enum AspectraError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AspectraError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            AspectraError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            AspectraError::render("x")
                .to_string()
                .contains("render error:")
        );
        assert!(
            AspectraError::encode("x")
                .to_string()
                .contains("encode error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = AspectraError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
