/// Supplies the value of the `Authorization` header for outgoing requests.
pub trait HttpAuthenticator: Send + Sync {
    fn authorization_header(&self) -> Option<String>;
}
