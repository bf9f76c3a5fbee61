//! Contact domain model and field validation.
//!
//! # Responsibility
//! - Define the canonical contact record and its address projection.
//! - Enforce field-level constraints before any persistence call.
//!
//! # Invariants
//! - `id` is `None` until the store assigns one, and never changes afterward.
//! - `name` is never blank for a persisted contact.
//! - Length limits count characters, not bytes.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned contact identifier.
pub type ContactId = i64;

pub const NAME_MAX_CHARS: usize = 100;
pub const PHONE_MAX_CHARS: usize = 25;
pub const EMAIL_MAX_CHARS: usize = 100;
pub const ADDRESS_LINE_MAX_CHARS: usize = 50;
pub const POSTAL_CODE_MAX_CHARS: usize = 20;
pub const NOTE_MAX_CHARS: usize = 4000;

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9. ()-]{7,25}$").expect("valid phone regex"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@([A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*|\[[0-9.:A-Fa-f]+\])$",
    )
    .expect("valid email regex")
});

/// Contact field names as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactField {
    Name,
    Phone,
    Email,
    Address1,
    Address2,
    Address3,
    PostalCode,
    Note,
}

impl ContactField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Phone => "phone",
            Self::Email => "email",
            Self::Address1 => "address1",
            Self::Address2 => "address2",
            Self::Address3 => "address3",
            Self::PostalCode => "postalCode",
            Self::Note => "note",
        }
    }
}

impl Display for ContactField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single constraint violation found on a contact or address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactValidationError {
    /// The request carried no contact at all.
    MissingContact,
    /// `name` is empty or whitespace only.
    BlankName,
    /// A field exceeds its maximum character count.
    TooLong {
        field: ContactField,
        max: usize,
        actual: usize,
    },
    /// `phone` does not match `^\+?[0-9. ()-]{7,25}$`.
    InvalidPhone(String),
    /// `email` is not a syntactically valid address.
    InvalidEmail(String),
}

impl Display for ContactValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingContact => write!(f, "contact cannot be null"),
            Self::BlankName => write!(f, "name cannot be blank"),
            Self::TooLong { field, max, actual } => write!(
                f,
                "{field} must be at most {max} characters, got {actual}"
            ),
            Self::InvalidPhone(value) => write!(f, "phone number `{value}` is not valid"),
            Self::InvalidEmail(value) => write!(f, "email address `{value}` is not valid"),
        }
    }
}

impl Error for ContactValidationError {}

/// Address projection of a contact, used by partial address updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "Address", rename_all = "camelCase")]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address3: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

impl Address {
    /// Returns every length violation of the four address fields.
    ///
    /// Address updates do not call this; it exists for callers that want to
    /// check an address before storing it.
    pub fn violations(&self) -> Vec<ContactValidationError> {
        let mut violations = Vec::new();
        check_address_fields(
            &mut violations,
            self.address1.as_deref(),
            self.address2.as_deref(),
            self.address3.as_deref(),
            self.postal_code.as_deref(),
        );
        violations
    }

    /// Returns the first violation, if any.
    pub fn validate(&self) -> Result<(), ContactValidationError> {
        first_violation(self.violations())
    }
}

/// Canonical contact record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "Contact", rename_all = "camelCase")]
pub struct Contact {
    /// Assigned by the store on creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ContactId>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address3: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Contact {
    /// Creates an unsaved contact with only a name set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Copies the address lines and postal code onto this contact.
    pub fn with_address(mut self, address: Address) -> Self {
        self.apply_address(address);
        self
    }

    /// Returns the address projection of this contact.
    pub fn address(&self) -> Address {
        Address {
            address1: self.address1.clone(),
            address2: self.address2.clone(),
            address3: self.address3.clone(),
            postal_code: self.postal_code.clone(),
        }
    }

    /// Overwrites exactly the four address fields.
    pub fn apply_address(&mut self, address: Address) {
        self.address1 = address.address1;
        self.address2 = address.address2;
        self.address3 = address.address3;
        self.postal_code = address.postal_code;
    }

    /// Returns every constraint violation, in wire field order.
    pub fn violations(&self) -> Vec<ContactValidationError> {
        let mut violations = Vec::new();

        if self.name.trim().is_empty() {
            violations.push(ContactValidationError::BlankName);
        }
        check_length(&mut violations, ContactField::Name, Some(&self.name), NAME_MAX_CHARS);

        if let Some(phone) = self.phone.as_deref() {
            if !PHONE_RE.is_match(phone) {
                violations.push(ContactValidationError::InvalidPhone(phone.to_string()));
            }
        }
        check_length(
            &mut violations,
            ContactField::Phone,
            self.phone.as_deref(),
            PHONE_MAX_CHARS,
        );

        if let Some(email) = self.email.as_deref() {
            if !email.is_empty() && !is_valid_email(email) {
                violations.push(ContactValidationError::InvalidEmail(email.to_string()));
            }
        }
        check_length(
            &mut violations,
            ContactField::Email,
            self.email.as_deref(),
            EMAIL_MAX_CHARS,
        );

        check_address_fields(
            &mut violations,
            self.address1.as_deref(),
            self.address2.as_deref(),
            self.address3.as_deref(),
            self.postal_code.as_deref(),
        );
        check_length(
            &mut violations,
            ContactField::Note,
            self.note.as_deref(),
            NOTE_MAX_CHARS,
        );

        violations
    }

    /// Returns the first constraint violation, if any.
    pub fn validate(&self) -> Result<(), ContactValidationError> {
        first_violation(self.violations())
    }
}

/// Checks email syntax: dot-atom local part, `@`, then a hostname or an
/// address literal. The local part is capped at 64 characters.
pub fn is_valid_email(value: &str) -> bool {
    let Some((local, _)) = value.rsplit_once('@') else {
        return false;
    };
    local.chars().count() <= 64 && EMAIL_RE.is_match(value)
}

fn check_address_fields(
    violations: &mut Vec<ContactValidationError>,
    address1: Option<&str>,
    address2: Option<&str>,
    address3: Option<&str>,
    postal_code: Option<&str>,
) {
    check_length(violations, ContactField::Address1, address1, ADDRESS_LINE_MAX_CHARS);
    check_length(violations, ContactField::Address2, address2, ADDRESS_LINE_MAX_CHARS);
    check_length(violations, ContactField::Address3, address3, ADDRESS_LINE_MAX_CHARS);
    check_length(violations, ContactField::PostalCode, postal_code, POSTAL_CODE_MAX_CHARS);
}

fn check_length(
    violations: &mut Vec<ContactValidationError>,
    field: ContactField,
    value: Option<&str>,
    max: usize,
) {
    if let Some(value) = value {
        let actual = value.chars().count();
        if actual > max {
            violations.push(ContactValidationError::TooLong { field, max, actual });
        }
    }
}

fn first_violation(violations: Vec<ContactValidationError>) -> Result<(), ContactValidationError> {
    match violations.into_iter().next() {
        Some(violation) => Err(violation),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::{is_valid_email, Contact, ContactField, ContactValidationError};

    #[test]
    fn email_syntax_accepts_common_shapes() {
        assert!(is_valid_email("jessica@ngilang.com"));
        assert!(is_valid_email("first.last+tag@mail.example.org"));
        assert!(is_valid_email("root@localhost"));
    }

    #[test]
    fn email_syntax_rejects_malformed_values() {
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a..b@example.com"));
        assert!(!is_valid_email("a@-example.com"));
        assert!(!is_valid_email("a b@example.com"));
    }

    #[test]
    fn length_is_counted_in_characters() {
        let contact = Contact::new("é".repeat(100));
        assert!(contact.validate().is_ok());

        let too_long = Contact::new("é".repeat(101));
        assert_eq!(
            too_long.validate(),
            Err(ContactValidationError::TooLong {
                field: ContactField::Name,
                max: 100,
                actual: 101,
            })
        );
    }
}
