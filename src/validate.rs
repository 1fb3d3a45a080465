//! Input rules for signup and listing payloads.
//!
//! Every client-supplied string passes through a [`TextRule`] before it is
//! stored: trimmed, non-empty, free of control characters and bounded in
//! length. Emails and passwords have extra rules on top.

use crate::error::ValidationError;
use crate::secret::Secret;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 7;

/// Trim/empty/control-character/length rule for a text field.
///
/// # Examples
///
/// ```
/// use marketplace_core::validate::TextRule;
///
/// let rule = TextRule::new(32);
/// assert_eq!(rule.clean("address", "  12 Elm St ").unwrap(), "12 Elm St");
/// assert!(rule.clean("address", "   ").is_err());
/// assert!(rule.clean("address", "12\nElm").is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TextRule {
    max_len: usize,
}

impl TextRule {
    /// Short single-line values such as names and categories.
    pub const SHORT: TextRule = TextRule::new(128);
    /// Longer free text such as descriptions.
    pub const LONG: TextRule = TextRule::new(4096);

    /// Creates a rule with the given maximum length in characters.
    pub const fn new(max_len: usize) -> Self {
        Self { max_len }
    }

    /// Returns the trimmed value, or the rule it broke.
    ///
    /// # Errors
    ///
    /// [`ValidationError::InvalidField`] naming `field`.
    pub fn clean(&self, field: &'static str, raw: &str) -> Result<String, ValidationError> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::field(field, "must not be empty"));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(ValidationError::field(
                field,
                "must not contain control characters",
            ));
        }
        if trimmed.chars().count() > self.max_len {
            return Err(ValidationError::field(
                field,
                format!("must be at most {} characters", self.max_len),
            ));
        }

        Ok(trimmed.to_string())
    }
}

/// Trims and lowercases an email, then checks its shape.
///
/// The check is structural only: one `@`, a non-empty local part and a
/// dotted domain with no empty labels.
///
/// ```
/// use marketplace_core::validate::normalize_email;
///
/// assert_eq!(normalize_email(" Ada@Example.COM ").unwrap(), "ada@example.com");
/// assert!(normalize_email("ada@localhost").is_err());
/// ```
pub fn normalize_email(raw: &str) -> Result<String, ValidationError> {
    let email = TextRule::SHORT.clean("email", raw)?.to_lowercase();
    let invalid = || ValidationError::field("email", "email is invalid");

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return Err(invalid());
    }

    Ok(email)
}

/// Checks the password rules: minimum length, and no literal "password".
pub fn check_password(password: &Secret<String>) -> Result<(), ValidationError> {
    let value = password.expose_secret().trim();

    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::field(
            "password",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if value.to_lowercase().contains("password") {
        return Err(ValidationError::field(
            "password",
            "cannot contain the word password",
        ));
    }
    Ok(())
}

/// Cleans a category label: trimmed and lowercased.
pub fn normalize_category(raw: &str) -> Result<String, ValidationError> {
    TextRule::SHORT
        .clean("categories", raw)
        .map(|c| c.to_lowercase())
}

/// Checks a coordinate is finite and within `[-bound, bound]`.
pub fn check_coordinate(field: &'static str, value: f64, bound: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() || value.abs() > bound {
        return Err(ValidationError::field(
            field,
            format!("must be a number between -{bound} and {bound}"),
        ));
    }
    Ok(value)
}
