use thiserror::Error;

/// Failure reported by the remote bill store.
///
/// The display text is what the bills page shows under its "Erreur" heading,
/// so status failures always read `Erreur <status>`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0}")]
    Network(String),
    #[error("{message}")]
    Client { status: u16, message: String },
    #[error("{message}")]
    Server { status: u16, message: String },
}

impl StoreError {
    pub fn from_status(status: u16) -> Self {
        Self::with_message(status, format!("Erreur {status}"))
    }

    pub fn with_message(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status >= 500 {
            Self::Server { status, message }
        } else {
            Self::Client { status, message }
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Network(_) => None,
            StoreError::Client { status, .. } | StoreError::Server { status, .. } => Some(*status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_split_into_client_and_server_failures() {
        assert!(matches!(
            StoreError::from_status(404),
            StoreError::Client { status: 404, .. }
        ));
        assert!(matches!(
            StoreError::from_status(500),
            StoreError::Server { status: 500, .. }
        ));
        assert!(matches!(
            StoreError::from_status(503),
            StoreError::Server { status: 503, .. }
        ));
    }

    #[test]
    fn display_keeps_the_status_phrase() {
        assert_eq!(StoreError::from_status(404).to_string(), "Erreur 404");
        assert_eq!(StoreError::from_status(500).to_string(), "Erreur 500");
        assert_eq!(
            StoreError::network("connection refused").to_string(),
            "connection refused"
        );
        assert_eq!(StoreError::network("offline").status(), None);
    }
}
