use secrecy::{ExposeSecret, SecretString};

/// Path of the controller's action-dispatch endpoint, relative to the base URL.
///
/// Every call (login included) goes to this single endpoint; the operation is
/// selected by the `action` field.
pub const API_PATH: &str = "v1/api";

/// Action name of the session login call.
pub const LOGIN_ACTION: &str = "login";

/// An authenticated controller session.
///
/// Wraps the `CID` token returned by login. Established once, attached to
/// every request, never mutated: a new login produces a new `Session`.
#[derive(Clone)]
pub struct Session {
    cid: SecretString,
}

impl Session {
    pub fn new(cid: impl Into<String>) -> Self {
        Self {
            cid: SecretString::from(cid.into()),
        }
    }

    /// The raw `CID` value for the wire.
    pub(crate) fn cid(&self) -> &str {
        self.cid.expose_secret()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("cid", &"[REDACTED]").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_cid() {
        let session = Session::new("abc123");
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("abc123"));
        assert_eq!(session.cid(), "abc123");
    }
}
