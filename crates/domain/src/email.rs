use serde::{Deserialize, Serialize};
use ventra_core::{AppError, AppResult};

/// A canonicalised email address: trimmed, lowercased, and checked for
/// a plausible `local@domain` shape. Invite matching compares these
/// values, so both sides must normalise the same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a canonical email address.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let canonical = value.into().trim().to_lowercase();

        let Some((local, domain)) = canonical.split_once('@') else {
            return Err(AppError::Validation(format!(
                "'{canonical}' is not a valid email address"
            )));
        };

        if local.is_empty() || domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(format!(
                "'{canonical}' is not a valid email address"
            )));
        }

        Ok(Self(canonical))
    }

    /// Returns the canonical string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}
