//! Input validation for contact, sign-up and profile fields.

use std::fmt;

use serde::Serialize;

use crate::models::ContactFields;

/// Why a single value was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Malformed address; carries the reason.
    InvalidEmail(&'static str),
    /// Not a 10-digit mobile number starting with 6-9.
    InvalidPhoneNumber,
    /// Not a positive amount.
    InvalidWage,
    TooShort { field: String, min: usize, actual: usize },
    TooLong { field: String, max: usize, actual: usize },
    /// Required and missing.
    Empty(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail(reason) => write!(f, "Please enter a valid email address ({reason})"),
            Self::InvalidPhoneNumber => f.write_str("Please enter a valid 10-digit phone number"),
            Self::InvalidWage => f.write_str("Please enter a valid amount"),
            Self::TooShort { field, min, .. } => {
                write!(f, "{field} should be at least {min} characters long")
            }
            Self::TooLong { field, max, .. } => {
                write!(f, "{field} must be at most {max} characters")
            }
            Self::Empty(field) => write!(f, "{field} is required"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// A validation failure attached to the input field that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field name as used in request bodies (`full_name`, `phone_number`, ...).
    pub field: &'static str,
    /// User-facing message.
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, error: ValidationError) -> Self {
        Self {
            field,
            message: error.to_string(),
        }
    }
}

/// Longest address SMTP allows.
pub const EMAIL_MAX_LENGTH: usize = 254;

/// Minimum length of a contact name.
pub const MIN_NAME_LENGTH: usize = 3;

/// Maximum length of any free-text contact field.
pub const MAX_TEXT_LENGTH: usize = 500;

/// Minimum password length accepted at sign-up.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum password length accepted at sign-up.
pub const MAX_PASSWORD_LENGTH: usize = 72;

/// Shape check for a sign-up email: one `@`, a non-empty local part and a
/// dotted domain without empty labels. Surrounding whitespace is ignored.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::Empty("Email".to_string()));
    }
    if email.len() > EMAIL_MAX_LENGTH {
        return Err(ValidationError::TooLong {
            field: "Email".to_string(),
            max: EMAIL_MAX_LENGTH,
            actual: email.len(),
        });
    }

    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return Err(ValidationError::InvalidEmail("exactly one @ expected")),
    };

    if local.is_empty() {
        return Err(ValidationError::InvalidEmail("nothing before @"));
    }
    if !domain.contains('.') {
        return Err(ValidationError::InvalidEmail("domain needs a dot"));
    }
    if domain.split('.').any(str::is_empty) {
        return Err(ValidationError::InvalidEmail("empty domain label"));
    }

    Ok(())
}

/// Validate a sign-up password.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let length = password.chars().count();

    if length == 0 {
        return Err(ValidationError::Empty("password".to_string()));
    }

    if length < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LENGTH,
            actual: length,
        });
    }

    if length > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: MAX_PASSWORD_LENGTH,
            actual: length,
        });
    }

    Ok(())
}

/// Validate a contact name.
///
/// An empty name means "no input yet" and is not reported here; use
/// [`validate_contact`] to enforce presence.
pub fn validate_full_name(name: &str) -> Result<(), ValidationError> {
    let length = name.chars().count();

    if length == 0 {
        return Ok(());
    }

    if length < MIN_NAME_LENGTH {
        return Err(ValidationError::TooShort {
            field: "Name".to_string(),
            min: MIN_NAME_LENGTH,
            actual: length,
        });
    }

    if length > MAX_TEXT_LENGTH {
        return Err(ValidationError::TooLong {
            field: "Name".to_string(),
            max: MAX_TEXT_LENGTH,
            actual: length,
        });
    }

    Ok(())
}

/// Validate an Indian mobile number: exactly 10 digits, the first 6-9.
///
/// Empty input is not an error.
pub fn validate_phone_number(number: &str) -> Result<(), ValidationError> {
    if number.is_empty() {
        return Ok(());
    }

    let bytes = number.as_bytes();
    let valid = bytes.len() == 10
        && bytes.iter().all(u8::is_ascii_digit)
        && matches!(bytes[0], b'6'..=b'9');

    if !valid {
        return Err(ValidationError::InvalidPhoneNumber);
    }

    Ok(())
}

/// Validate an optional wage amount: empty, or a finite number above zero.
pub fn validate_wage(wage: &str) -> Result<(), ValidationError> {
    let wage = wage.trim();

    if wage.is_empty() {
        return Ok(());
    }

    match wage.parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount > 0.0 => Ok(()),
        _ => Err(ValidationError::InvalidWage),
    }
}

fn check_length(errors: &mut Vec<FieldError>, field: &'static str, value: &str) {
    let length = value.chars().count();
    if length > MAX_TEXT_LENGTH {
        errors.push(FieldError::new(
            field,
            ValidationError::TooLong {
                field: field.to_string(),
                max: MAX_TEXT_LENGTH,
                actual: length,
            },
        ));
    }
}

/// Validate a submitted contact form.
///
/// Every offending field is reported on its own so one bad value never hides
/// another. Name and phone number must be present.
pub fn validate_contact(fields: &ContactFields) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if fields.full_name.is_empty() {
        errors.push(FieldError::new(
            "full_name",
            ValidationError::Empty("Name".to_string()),
        ));
    } else if let Err(err) = validate_full_name(&fields.full_name) {
        errors.push(FieldError::new("full_name", err));
    }

    if fields.phone_number.is_empty() {
        errors.push(FieldError::new(
            "phone_number",
            ValidationError::Empty("Phone number".to_string()),
        ));
    } else if let Err(err) = validate_phone_number(&fields.phone_number) {
        errors.push(FieldError::new("phone_number", err));
    }

    if let Err(err) = validate_wage(&fields.expected_wage) {
        errors.push(FieldError::new("expected_wage", err));
    }

    if let Err(err) = validate_wage(&fields.daily_wage) {
        errors.push(FieldError::new("daily_wage", err));
    }

    check_length(&mut errors, "address", &fields.address);
    check_length(&mut errors, "occupation_1", &fields.occupation_1);
    check_length(&mut errors, "occupation_2", &fields.occupation_2);
    check_length(&mut errors, "occupation_3", &fields.occupation_3);
    check_length(&mut errors, "occupation_4", &fields.occupation_4);
    check_length(&mut errors, "work_experience", &fields.work_experience);

    errors
}
