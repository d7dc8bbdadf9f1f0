//! E-mail address type with campus-domain checks.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing or checking an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input string is empty.
    #[error("email cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input does not contain an @ symbol.
    #[error("email must contain an @ symbol")]
    MissingAtSymbol,
    /// The local part (before @) is empty.
    #[error("email local part cannot be empty")]
    EmptyLocalPart,
    /// The domain part (after @) is empty.
    #[error("email domain cannot be empty")]
    EmptyDomain,
    /// The address is outside the permitted campus domain.
    #[error("Only @{domain} emails are allowed")]
    DisallowedDomain {
        /// The domain that was required.
        domain: String,
    },
}

/// An e-mail address.
///
/// Parsing only checks structure (`local@domain`, at most 254 characters).
/// Student sign-in additionally restricts addresses to the campus domain
/// through [`Email::require_domain`].
///
/// ## Examples
///
/// ```
/// use laundrio_core::Email;
///
/// let email = Email::parse("21bcs042@iiitdwd.ac.in").unwrap();
/// assert!(email.require_domain("iiitdwd.ac.in").is_ok());
/// assert!(email.require_domain("gmail.com").is_err());
///
/// assert!(Email::parse("no-at-symbol").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 254 characters,
    /// has no @ symbol, or has an empty local part or domain.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let (local, domain) = s.split_once('@').ok_or(EmailError::MissingAtSymbol)?;
        if local.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }
        if domain.is_empty() {
            return Err(EmailError::EmptyDomain);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the local part of the email (before the @).
    #[must_use]
    pub fn local_part(&self) -> &str {
        self.0.split_once('@').map_or("", |(local, _)| local)
    }

    /// Returns the domain part of the email (after the @).
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split_once('@').map_or("", |(_, domain)| domain)
    }

    /// Whether the address belongs to `domain` (case-insensitive).
    #[must_use]
    pub fn is_in_domain(&self, domain: &str) -> bool {
        let domain = domain.trim_start_matches('@');
        self.domain().eq_ignore_ascii_case(domain)
    }

    /// Check that the address belongs to `domain`.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError::DisallowedDomain`] otherwise.
    pub fn require_domain(&self, domain: &str) -> Result<(), EmailError> {
        if self.is_in_domain(domain) {
            Ok(())
        } else {
            Err(EmailError::DisallowedDomain {
                domain: domain.trim_start_matches('@').to_owned(),
            })
        }
    }

    /// Student ID the backend assigns to a first-time campus sign-in:
    /// the upper-cased local part.
    #[must_use]
    pub fn derived_student_id(&self) -> String {
        self.local_part().to_uppercase()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(Email::parse(""), Err(EmailError::Empty));
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
        assert_eq!(Email::parse("nobody"), Err(EmailError::MissingAtSymbol));
        assert_eq!(Email::parse("@iiitdwd.ac.in"), Err(EmailError::EmptyLocalPart));
        assert_eq!(Email::parse("worker@"), Err(EmailError::EmptyDomain));

        let long = format!("{}@iiitdwd.ac.in", "a".repeat(250));
        assert!(matches!(Email::parse(&long), Err(EmailError::TooLong { .. })));
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let email = Email::parse("  staff@laundry.example  ").unwrap();
        assert_eq!(email.as_str(), "staff@laundry.example");
    }

    #[test]
    fn test_parts() {
        let email = Email::parse("21bcs042@iiitdwd.ac.in").unwrap();
        assert_eq!(email.local_part(), "21bcs042");
        assert_eq!(email.domain(), "iiitdwd.ac.in");
    }

    #[test]
    fn test_domain_check_is_case_insensitive() {
        let email = Email::parse("21bcs042@IIITDWD.ac.in").unwrap();
        assert!(email.is_in_domain("iiitdwd.ac.in"));
        assert!(email.is_in_domain("@iiitdwd.ac.in"));
        assert!(!email.is_in_domain("ac.in"));
    }

    #[test]
    fn test_require_domain_message() {
        let email = Email::parse("someone@gmail.com").unwrap();
        let err = email.require_domain("iiitdwd.ac.in").unwrap_err();
        assert_eq!(err.to_string(), "Only @iiitdwd.ac.in emails are allowed");
    }

    #[test]
    fn test_derived_student_id() {
        let email = Email::parse("21bcs042@iiitdwd.ac.in").unwrap();
        assert_eq!(email.derived_student_id(), "21BCS042");
    }
}
