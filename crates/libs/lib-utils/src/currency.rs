//! # Currency
//!
//! Parsing of user- and model-supplied dollar strings into integer cents, and
//! formatting of cents back into display strings.
//!
//! All amounts are stored as `i64` cents. Parsing never goes through floating
//! point so `"0.29"` is always exactly 29 cents.

/// Largest amount accepted, in cents ($999,999,999,999.99).
pub const MAX_CENTS: i64 = 99_999_999_999_999;

/// Parse a dollar string such as `"$2,234.56"`, `"1534"` or `"0.77"` into cents.
///
/// Extra fractional digits are truncated (`"143.456"` is 14345), a single
/// fractional digit is padded (`"113.7"` is 11370).
pub fn parse_currency(input: &str) -> Result<i64, Error> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed == "nil" {
        return Err(Error::Empty);
    }

    let cleaned: String = trimmed.chars().filter(|c| *c != '$' && *c != ',').collect();
    let cleaned = cleaned.trim();

    if cleaned.starts_with('-') {
        return Err(Error::Negative(input.to_string()));
    }

    let mut parts = cleaned.split('.');
    let dollars = parts.next().unwrap_or_default();
    let cents = parts.next();
    if parts.next().is_some() {
        return Err(Error::InvalidFormat(input.to_string()));
    }

    if dollars.is_empty() || !dollars.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidFormat(input.to_string()));
    }
    let dollars: i64 = dollars
        .parse()
        .map_err(|_| Error::TooLarge(input.to_string()))?;

    let cents: i64 = match cents {
        None | Some("") => 0,
        Some(frac) if frac.bytes().all(|b| b.is_ascii_digit()) => {
            let mut digits: String = frac.chars().take(2).collect();
            if digits.len() == 1 {
                digits.push('0');
            }
            digits
                .parse()
                .map_err(|_| Error::InvalidFormat(input.to_string()))?
        }
        Some(_) => return Err(Error::InvalidFormat(input.to_string())),
    };

    let total = dollars
        .checked_mul(100)
        .and_then(|d| d.checked_add(cents))
        .ok_or_else(|| Error::TooLarge(input.to_string()))?;

    if total > MAX_CENTS {
        return Err(Error::TooLarge(input.to_string()));
    }

    Ok(total)
}

/// Format cents as a plain two-decimal amount (`3650` becomes `"36.50"`).
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// Format cents as a dollar string (`-1234` becomes `"$-12.34"`).
pub fn format_cents_to_usd(cents: i64) -> String {
    format!("${}", format_cents(cents))
}

// region:    --- Error
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    Empty,
    Negative(String),
    InvalidFormat(String),
    TooLarge(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Empty => write!(fmt, "amount is empty"),
            Error::Negative(v) => write!(fmt, "amount cannot be negative: {v}"),
            Error::InvalidFormat(v) => write!(fmt, "invalid amount format: {v}"),
            Error::TooLarge(v) => write!(fmt, "amount exceeds maximum: {v}"),
        }
    }
}

impl std::error::Error for Error {}
// endregion: --- Error
