use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    Network,
    Backend,
    Invalid,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::NotFound => "not found",
            ErrorKind::Network => "network",
            ErrorKind::Backend => "backend",
            ErrorKind::Invalid => "invalid",
        }
    }
}

/// Error returned by every [`crate::LoreBackend`] operation.
#[derive(Debug)]
pub struct PersistenceError {
    pub kind: ErrorKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl PersistenceError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Backends report missing admin rights either with a status code or
    /// with an error message mentioning "Unauthorized"; both count.
    pub fn is_unauthorized(&self) -> bool {
        self.kind == ErrorKind::Unauthorized || self.message.contains("Unauthorized")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_is_detected_from_message() {
        let e = PersistenceError::new(ErrorKind::Backend, "Unauthorized: not an admin");
        assert!(e.is_unauthorized());
        assert!(!PersistenceError::new(ErrorKind::Backend, "timeout").is_unauthorized());
        assert!(PersistenceError::unauthorized("denied").is_unauthorized());
    }

    #[test]
    fn source_is_exposed() {
        use std::error::Error;
        let io = std::io::Error::other("boom");
        let e = PersistenceError::with_source(ErrorKind::Network, "request failed", io);
        assert_eq!(e.to_string(), "request failed");
        assert!(e.source().is_some());
    }
}
