use base64::{Engine, engine::general_purpose::STANDARD};
pub use model::http::auth::HttpAuthenticator;

/// Sends no credentials.
#[derive(Debug, Clone, Default)]
pub struct NoneAuthenticator;

impl HttpAuthenticator for NoneAuthenticator {
    fn authorization_header(&self) -> Option<String> {
        None
    }
}

/// HTTP basic authentication.
#[derive(Clone)]
pub struct BasicAuthenticator {
    header: String,
}

impl BasicAuthenticator {
    pub fn new(user: &str, password: &str) -> Self {
        let encoded = STANDARD.encode(format!("{user}:{password}"));
        BasicAuthenticator {
            header: format!("Basic {encoded}"),
        }
    }
}

impl std::fmt::Debug for BasicAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthenticator").finish_non_exhaustive()
    }
}

impl HttpAuthenticator for BasicAuthenticator {
    fn authorization_header(&self) -> Option<String> {
        Some(self.header.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_returns_no_header() {
        assert_eq!(NoneAuthenticator.authorization_header(), None);
    }

    #[test]
    fn basic_encodes_credentials() {
        let auth = BasicAuthenticator::new("Aladdin", "open sesame");
        assert_eq!(
            auth.authorization_header().as_deref(),
            Some("Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==")
        );
        assert!(!format!("{auth:?}").contains("QWxh"));
    }
}
