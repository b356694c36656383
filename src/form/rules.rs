// Field validation rules for the contact form.
// Pure predicates over the raw field text plus the live phone reformatting.

use std::sync::OnceLock;

use regex::Regex;

use crate::config::FormConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Name,
    Email,
    Phone,
    Address,
    Rating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    Required,
    InvalidName,
    InvalidEmail,
    InvalidPhone,
    AddressTooShort,
    NotANumber,
}

impl FieldError {
    /// Inline message shown under the field.
    pub fn message(self, config: &FormConfig) -> String {
        match self {
            FieldError::Required => "Šis laukas privalomas".to_owned(),
            FieldError::InvalidName => {
                "Leidžiamos tik raidės, tarpai ir brūkšneliai".to_owned()
            }
            FieldError::InvalidEmail => "Neteisingas el. pašto adresas".to_owned(),
            FieldError::InvalidPhone => format!(
                "Neteisingas numeris! Naudokite formatą: {}{}",
                config.phone_prefix,
                "x".repeat(config.national_digits)
            ),
            FieldError::AddressTooShort => format!(
                "Adresas turi būti bent {} simbolių",
                config.address_min_len
            ),
            FieldError::NotANumber => "Įveskite skaičių nuo 1 iki 10".to_owned(),
        }
    }
}

/// Declarative display state of one field: the surface toggles the error and
/// valid styles and shows or removes the message element after the input.
/// The default is the neutral look of an untouched field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldView {
    pub invalid: bool,
    pub valid: bool,
    pub message: Option<String>,
}

impl FieldView {
    pub fn from_result(result: Result<(), FieldError>, config: &FormConfig) -> Self {
        match result {
            Ok(()) => Self {
                valid: true,
                ..Self::default()
            },
            Err(err) => Self {
                invalid: true,
                valid: false,
                message: Some(err.message(config)),
            },
        }
    }
}

pub fn validate(kind: FieldKind, raw: &str, config: &FormConfig) -> Result<(), FieldError> {
    match kind {
        FieldKind::Name => validate_name(raw),
        FieldKind::Email => validate_email(raw),
        FieldKind::Phone => validate_phone(raw, config),
        FieldKind::Address => validate_address(raw, config.address_min_len),
        FieldKind::Rating => parse_rating(raw).map(|_| ()),
    }
}

/// Letters (any script, diacritics included), spaces and hyphens.
pub fn validate_name(raw: &str) -> Result<(), FieldError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(FieldError::Required);
    }
    if is_match(name_pattern(), name) {
        Ok(())
    } else {
        Err(FieldError::InvalidName)
    }
}

/// `something@host.tld`, nothing stricter.
pub fn validate_email(raw: &str) -> Result<(), FieldError> {
    let email = raw.trim();
    if email.is_empty() {
        return Err(FieldError::Required);
    }
    if is_match(email_pattern(), email) {
        Ok(())
    } else {
        Err(FieldError::InvalidEmail)
    }
}

/// Digits (punctuation ignored) must be the country prefix plus the national
/// number, e.g. `37061234567`.
pub fn validate_phone(raw: &str, config: &FormConfig) -> Result<(), FieldError> {
    let digits = phone_digits(raw);
    if digits.is_empty() {
        return Err(FieldError::Required);
    }
    let complete = digits
        .strip_prefix(config.phone_prefix.as_str())
        .is_some_and(|national| national.len() == config.national_digits);
    if complete {
        Ok(())
    } else {
        Err(FieldError::InvalidPhone)
    }
}

pub fn validate_address(raw: &str, min_len: usize) -> Result<(), FieldError> {
    let address = raw.trim();
    if address.is_empty() {
        return Err(FieldError::Required);
    }
    if address.chars().count() >= min_len {
        Ok(())
    } else {
        Err(FieldError::AddressTooShort)
    }
}

/// Largest rating magnitude; three of them still sum to a finite number.
const MAX_RATING: f64 = f64::MAX / 3.0;

/// Any finite number; the 1..=10 range is not enforced.
pub fn parse_rating(raw: &str) -> Result<f64, FieldError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(FieldError::Required);
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value.abs() <= MAX_RATING => Ok(value),
        _ => Err(FieldError::NotANumber),
    }
}

pub fn phone_digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Canonical digit string for whatever the user typed so far: digits only,
/// an international `00` dropped, a leading trunk digit swapped for the
/// country code. A bare national number gets the country code and is cut at
/// the full number length, so `612345678` becomes `37061234567`. Input that
/// already carries the country code keeps every digit; overlong numbers stay
/// invalid.
pub fn normalize_phone(raw: &str, config: &FormConfig) -> String {
    let digits = phone_digits(raw);
    let prefix = config.phone_prefix.as_str();
    let trunk = config.trunk_prefix.as_str();
    // Empty, or the start of an international `00`.
    if "00".starts_with(digits.as_str()) {
        return digits;
    }
    if let Some(international) = digits.strip_prefix("00") {
        return international.to_owned();
    }
    if digits.starts_with(prefix) || prefix.starts_with(digits.as_str()) {
        return digits;
    }
    if let Some(national) = digits.strip_prefix(trunk).filter(|_| !trunk.is_empty()) {
        return format!("{prefix}{national}");
    }
    let mut canonical = format!("{prefix}{digits}");
    canonical.truncate(config.phone_len());
    canonical
}

/// Display grouping `+370 612 34567`; partial input is grouped as far as it
/// goes.
pub fn format_phone(canonical: &str, prefix: &str) -> String {
    if canonical.is_empty() {
        return String::new();
    }
    let Some(national) = canonical.strip_prefix(prefix) else {
        return format!("+{canonical}");
    };
    let (head, tail) = national.split_at(national.len().min(3));
    let mut out = format!("+{prefix}");
    for group in [head, tail] {
        if !group.is_empty() {
            out.push(' ');
            out.push_str(group);
        }
    }
    out
}

fn name_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\p{L}\p{M}\s-]+$").ok()).as_ref()
}

fn email_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok()).as_ref()
}

fn is_match(re: Option<&Regex>, text: &str) -> bool {
    re.is_some_and(|re| re.is_match(text))
}
