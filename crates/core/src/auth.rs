use serde::{Deserialize, Serialize};

/// Authenticated user information supplied by the external identity provider.
///
/// Ventra never issues or validates credentials. A fronting proxy
/// authenticates the request and forwards a stable subject identifier
/// together with profile data; company scope is resolved separately
/// from the request path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    subject: String,
    display_name: String,
    email: String,
}

impl UserIdentity {
    /// Creates a user identity from provider claims.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        display_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            display_name: display_name.into(),
            email: email.into(),
        }
    }

    /// Returns the stable subject claim from the identity provider.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the email address used for invite matching.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }
}
