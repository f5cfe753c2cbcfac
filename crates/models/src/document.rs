//! Brazilian taxpayer documents: CPF (individuals) and CNPJ (companies).

use crate::errors::ModelError;

const CPF_WEIGHTS_1: [u32; 9] = [10, 9, 8, 7, 6, 5, 4, 3, 2];
const CPF_WEIGHTS_2: [u32; 10] = [11, 10, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_WEIGHTS_1: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_WEIGHTS_2: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Document {
    Cpf(String),
    Cnpj(String),
}

impl Document {
    /// Parse either document kind, picking by digit count.
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        let digits = digits_only(raw)?;
        match digits.len() {
            11 if cpf_checksum_ok(&digits) => Ok(Document::Cpf(digits)),
            14 if cnpj_checksum_ok(&digits) => Ok(Document::Cnpj(digits)),
            11 => Err(ModelError::Validation("invalid CPF".into())),
            14 => Err(ModelError::Validation("invalid CNPJ".into())),
            _ => Err(ModelError::Validation("document must be a CPF (11 digits) or CNPJ (14 digits)".into())),
        }
    }

    pub fn digits(&self) -> &str {
        match self {
            Document::Cpf(d) | Document::Cnpj(d) => d,
        }
    }

    pub fn into_digits(self) -> String {
        match self {
            Document::Cpf(d) | Document::Cnpj(d) => d,
        }
    }
}

pub fn parse_cnpj(raw: &str) -> Result<String, ModelError> {
    match Document::parse(raw)? {
        Document::Cnpj(d) => Ok(d),
        Document::Cpf(_) => Err(ModelError::Validation("a company document must be a CNPJ".into())),
    }
}

fn digits_only(raw: &str) -> Result<String, ModelError> {
    let mut out = String::with_capacity(14);
    for c in raw.trim().chars() {
        match c {
            '0'..='9' => out.push(c),
            '.' | '-' | '/' | ' ' => {}
            _ => return Err(ModelError::Validation("document contains invalid characters".into())),
        }
    }
    Ok(out)
}

fn check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    let rem = sum % 11;
    if rem < 2 { 0 } else { 11 - rem }
}

fn to_numbers(s: &str) -> Vec<u32> {
    s.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn all_equal(d: &[u32]) -> bool {
    d.windows(2).all(|w| w[0] == w[1])
}

fn cpf_checksum_ok(s: &str) -> bool {
    let d = to_numbers(s);
    if d.len() != 11 || all_equal(&d) {
        return false;
    }
    check_digit(&d[..9], &CPF_WEIGHTS_1) == d[9] && check_digit(&d[..10], &CPF_WEIGHTS_2) == d[10]
}

fn cnpj_checksum_ok(s: &str) -> bool {
    let d = to_numbers(s);
    if d.len() != 14 || all_equal(&d) {
        return false;
    }
    check_digit(&d[..12], &CNPJ_WEIGHTS_1) == d[12] && check_digit(&d[..13], &CNPJ_WEIGHTS_2) == d[13]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpf_accepts_formatted_and_plain() {
        assert_eq!(Document::parse("529.982.247-25").unwrap(), Document::Cpf("52998224725".into()));
        assert_eq!(Document::parse("52998224725").unwrap().digits(), "52998224725");
    }

    #[test]
    fn cpf_rejects_bad_check_digit_and_repeats() {
        assert!(Document::parse("529.982.247-24").is_err());
        assert!(Document::parse("111.111.111-11").is_err());
    }

    #[test]
    fn cnpj_accepts_formatted() {
        assert_eq!(Document::parse("11.222.333/0001-81").unwrap(), Document::Cnpj("11222333000181".into()));
        assert_eq!(parse_cnpj("11222333000181").unwrap(), "11222333000181");
    }

    #[test]
    fn cnpj_rejects_bad_check_digit_and_repeats() {
        assert!(Document::parse("11.222.333/0001-82").is_err());
        assert!(Document::parse("00000000000000").is_err());
    }

    #[test]
    fn wrong_length_and_letters_are_rejected() {
        assert!(Document::parse("1234").is_err());
        assert!(Document::parse("529.982.247-2X").is_err());
        assert!(parse_cnpj("529.982.247-25").is_err());
    }
}
