// 🧮 Lenient Parsing - Best-effort numeric coercion for ragged source cells
//
// Registry and transaction extracts change column layouts between years, so
// a cell that should hold a number regularly holds a label, a blank, or
// nothing at all. None of that is an error here: a cell either parses or
// becomes the type's zero, and the result says which.

use serde::{Deserialize, Serialize};

// ============================================================================
// LENIENT VALUE
// ============================================================================

/// Result of a lenient parse: a real value, or the type's default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Lenient<T> {
    /// Cell matched numeric syntax
    Parsed(T),

    /// Cell was blank or malformed - value is the type's zero
    Defaulted,
}

impl<T: Default + Copy> Lenient<T> {
    /// Value with the default substituted for unparseable input
    pub fn value(&self) -> T {
        match self {
            Lenient::Parsed(v) => *v,
            Lenient::Defaulted => T::default(),
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, Lenient::Defaulted)
    }
}

// ============================================================================
// SYNTAX
// ============================================================================

/// Optional sign, digits, at most one decimal point, at least one digit.
///
/// `str::parse::<f64>` alone would accept "nan", "inf" and exponents, none of
/// which appear as real values in these extracts.
fn is_numeric(text: &str) -> bool {
    let body = text.strip_prefix(['-', '+']).unwrap_or(text);

    let mut digits = 0;
    let mut dots = 0;
    for c in body.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return false,
        }
    }

    digits > 0 && dots <= 1
}

// ============================================================================
// PARSERS
// ============================================================================

/// Parse a decimal cell ("84.97", " 12 ", "-3.5")
pub fn parse_decimal(cell: &str) -> Lenient<f64> {
    let trimmed = cell.trim();
    if !is_numeric(trimmed) {
        return Lenient::Defaulted;
    }

    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Lenient::Parsed(v),
        _ => Lenient::Defaulted,
    }
}

/// Parse an integer cell. Decimal syntax is accepted and truncated toward
/// zero, so "12.0" and "12" both give 12.
pub fn parse_integer(cell: &str) -> Lenient<i64> {
    match parse_decimal(cell) {
        Lenient::Parsed(v) => Lenient::Parsed(v.trunc() as i64),
        Lenient::Defaulted => Lenient::Defaulted,
    }
}

/// Parse a currency cell: thousands separators are stripped first
/// ("12,500" → 12500).
pub fn parse_amount(cell: &str) -> Lenient<i64> {
    let stripped: String = cell.chars().filter(|c| *c != ',').collect();
    parse_integer(&stripped)
}

/// Trimmed text cell; missing cells read as "".
pub fn text(cell: Option<&str>) -> String {
    cell.map(|s| s.trim().to_string()).unwrap_or_default()
}
