//! Field validators shared by entity modules.
//!
//! Validators return the normalized value so callers store exactly what was checked.

use rust_decimal::Decimal;

use crate::errors::ModelError;

/// Trim and enforce a character-count range.
pub fn text(field: &str, value: &str, min: usize, max: usize) -> Result<String, ModelError> {
    let v = value.trim();
    let n = v.chars().count();
    if n < min || n > max {
        return Err(ModelError::Validation(format!("{field} must be {min}..={max} characters")));
    }
    Ok(v.to_string())
}

/// Optional free text; blank becomes `None`.
pub fn optional_text(field: &str, value: Option<&str>, max: usize) -> Result<Option<String>, ModelError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.chars().count() > max => {
            Err(ModelError::Validation(format!("{field} must be at most {max} characters")))
        }
        Some(v) => Ok(Some(v.to_string())),
    }
}

pub fn email(value: &str) -> Result<String, ModelError> {
    let v = value.trim().to_lowercase();
    match v.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') && v.len() <= 255 => Ok(v),
        _ => Err(ModelError::Validation("invalid email".into())),
    }
}

pub fn optional_email(value: Option<&str>) -> Result<Option<String>, ModelError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => email(v).map(Some),
    }
}

/// Phone numbers keep digits only; `+`, spaces, dots, dashes and parentheses are formatting.
pub fn optional_phone(value: Option<&str>) -> Result<Option<String>, ModelError> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else { return Ok(None) };
    let mut digits = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '0'..='9' => digits.push(c),
            '+' | ' ' | '.' | '-' | '(' | ')' => {}
            _ => return Err(ModelError::Validation("phone contains invalid characters".into())),
        }
    }
    if !(8..=20).contains(&digits.len()) {
        return Err(ModelError::Validation("phone must have 8..=20 digits".into()));
    }
    Ok(Some(digits))
}

/// Upper-cased code restricted to an allowed character set.
pub fn code(field: &str, value: &str, min: usize, max: usize, allowed: impl Fn(char) -> bool) -> Result<String, ModelError> {
    let v = text(field, value, min, max)?.to_uppercase();
    if !v.chars().all(allowed) {
        return Err(ModelError::Validation(format!("{field} contains invalid characters")));
    }
    Ok(v)
}

/// Largest magnitude a `NUMERIC(14, 2)` money column holds.
pub fn max_money() -> Decimal {
    Decimal::new(99_999_999_999_999, 2)
}

/// Reject amounts that would overflow a `NUMERIC(14, 2)` column.
pub fn money(field: &str, value: Decimal) -> Result<Decimal, ModelError> {
    if value.abs() > max_money() {
        return Err(ModelError::Validation(format!("{field} must not exceed {}", max_money())));
    }
    Ok(value)
}

pub fn max_scale(field: &str, value: Decimal, scale: u32) -> Result<Decimal, ModelError> {
    if value.normalize().scale() > scale {
        return Err(ModelError::Validation(format!("{field} must have at most {scale} decimal places")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn text_trims_and_counts_chars() {
        assert_eq!(text("name", "  Café ", 2, 10).unwrap(), "Café");
        assert!(text("name", " a ", 2, 10).is_err());
        assert!(text("name", &"x".repeat(11), 2, 10).is_err());
    }

    #[test]
    fn optional_text_blank_is_none() {
        assert_eq!(optional_text("d", Some("   "), 5).unwrap(), None);
        assert_eq!(optional_text("d", None, 5).unwrap(), None);
        assert!(optional_text("d", Some("123456"), 5).is_err());
    }

    #[test]
    fn email_requires_local_and_domain() {
        assert_eq!(email(" Bob@Example.com ").unwrap(), "bob@example.com");
        assert!(email("@example.com").is_err());
        assert!(email("bob@").is_err());
        assert!(email("bob").is_err());
        assert!(email("a@b@c").is_err());
    }

    #[test]
    fn phone_strips_formatting() {
        assert_eq!(optional_phone(Some("+55 (11) 98765-4321")).unwrap().as_deref(), Some("5511987654321"));
        assert!(optional_phone(Some("1234")).is_err());
        assert!(optional_phone(Some("12345678x")).is_err());
        assert_eq!(optional_phone(Some("")).unwrap(), None);
    }

    #[test]
    fn scale_ignores_trailing_zeros() {
        assert!(max_scale("price", Decimal::from_str("10.500").unwrap(), 2).is_ok());
        assert!(max_scale("price", Decimal::from_str("10.555").unwrap(), 2).is_err());
        assert!(money("total", Decimal::from_str("999999999999.99").unwrap()).is_ok());
        assert!(money("total", Decimal::from_str("1000000000000").unwrap()).is_err());
    }
}
