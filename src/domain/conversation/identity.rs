//! Normalized end-user address used as the conversation key.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{ClientId, ValidationError};

const MIN_DIGITS: usize = 8;
const MAX_DIGITS: usize = 15;

/// A normalized phone-like identity, e.g. `+551199999999`.
///
/// Transport prefixes (`whatsapp:`, `sms:`) and separators are stripped on
/// construction, so two deliveries from the same user always map to the
/// same conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Normalizes a raw transport address.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyField` for blank input and
    /// `ValidationError::InvalidFormat` when the remainder is not an
    /// optional `+` followed by 8 to 15 digits.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("identity"));
        }

        let without_scheme = strip_scheme(trimmed);

        let compact: String = without_scheme
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
            .collect();

        let digits = compact.strip_prefix('+').unwrap_or(&compact);
        let well_formed = (MIN_DIGITS..=MAX_DIGITS).contains(&digits.len())
            && digits.chars().all(|c| c.is_ascii_digit());

        if !well_formed {
            return Err(ValidationError::invalid_format(
                "identity",
                format!(
                    "expected an optional '+' followed by {}-{} digits",
                    MIN_DIGITS, MAX_DIGITS
                ),
            ));
        }

        Ok(Self(compact))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The clinic client this identity belongs to.
    pub fn client_id(&self) -> ClientId {
        ClientId::from_identity(&self.0)
    }
}

/// Strips a leading `<letters>:` scheme such as `whatsapp:`.
fn strip_scheme(s: &str) -> &str {
    match s.split_once(':') {
        Some((scheme, rest))
            if !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphabetic()) =>
        {
            rest.trim_start()
        }
        _ => s,
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Identity {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Identity::parse(&value)
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_whatsapp_prefix() {
        let id = Identity::parse("whatsapp:+551199999999").unwrap();
        assert_eq!(id.as_str(), "+551199999999");
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let id = Identity::parse("WhatsApp:+551199999999").unwrap();
        assert_eq!(id.as_str(), "+551199999999");
    }

    #[test]
    fn plain_number_is_kept() {
        let id = Identity::parse("  +551199999999 ").unwrap();
        assert_eq!(id.as_str(), "+551199999999");
    }

    #[test]
    fn separators_are_removed() {
        let id = Identity::parse("sms:+55 (11) 9999-9999").unwrap();
        assert_eq!(id.as_str(), "+551199999999");
    }

    #[test]
    fn same_user_from_different_transports_is_same_identity() {
        let a = Identity::parse("whatsapp:+551199999999").unwrap();
        let b = Identity::parse("+55 11 9999 9999").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn number_without_plus_is_accepted() {
        assert_eq!(Identity::parse("551199999999").unwrap().as_str(), "551199999999");
    }

    #[test]
    fn rejects_blank() {
        assert_eq!(
            Identity::parse("   "),
            Err(ValidationError::empty_field("identity"))
        );
    }

    #[test]
    fn rejects_letters_in_number() {
        let err = Identity::parse("whatsapp:+55abc99999999").unwrap_err();
        assert_eq!(err.field(), "identity");
    }

    #[test]
    fn rejects_too_short_and_too_long() {
        assert!(Identity::parse("+1234567").is_err());
        assert!(Identity::parse("+1234567890123456").is_err());
    }

    #[test]
    fn serde_round_trip_normalizes() {
        let id: Identity = serde_json::from_str("\"whatsapp:+551199999999\"").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"+551199999999\"");
    }

    #[test]
    fn client_id_matches_identity() {
        let id = Identity::parse("+551199999999").unwrap();
        assert_eq!(id.client_id().as_str(), "+551199999999");
    }
}
