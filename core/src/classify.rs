//! Derived demographic and satisfaction classifications
//!
//! Small value-level helpers used by the transform layer: participant id
//! normalization, net-promoter banding of a 0-10 satisfaction score,
//! generation labeling from a birth-year field, and label cleanup.

use crate::table::CellValue;
use regex::Regex;
use std::sync::OnceLock;

fn non_digits() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\D").unwrap())
}

fn year() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{4}").unwrap())
}

fn spaces() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Strip everything but ASCII digits from the rendered identifier.
/// Null, or a value with no digits at all, normalizes to null.
pub fn normalize_digits(value: &CellValue) -> CellValue {
    if value.is_null() {
        return CellValue::Null;
    }
    let text = value.canonical_text();
    let digits = non_digits().replace_all(&text, "");
    if digits.is_empty() {
        CellValue::Null
    } else {
        CellValue::Text(digits.into_owned())
    }
}

/// Net-promoter band for a 0-10 score: 9-10 Promoters, 7-8 Passives,
/// 0-6 Detractors. Unparseable or negative scores classify as nothing.
pub fn net_promoter_class(value: &CellValue) -> Option<&'static str> {
    let score = as_integer(value)?;
    match score {
        s if s >= 9 => Some("Promoters"),
        s if s >= 7 => Some("Passives"),
        s if s >= 0 => Some("Detractors"),
        _ => None,
    }
}

/// Generation label from the first 4-digit year found in the cell.
pub fn generation_label(value: &CellValue) -> Option<&'static str> {
    let text = match value {
        CellValue::Null => return None,
        other => other.canonical_text(),
    };
    let year: i64 = year().find(&text)?.as_str().parse().ok()?;
    match year {
        1946..=1964 => Some("Baby Boomers"),
        1965..=1980 => Some("Generation X"),
        1981..=1996 => Some("Millennials"),
        1997..=2012 => Some("Centennials"),
        _ => None,
    }
}

/// Canonicalize a free-text label: trim, uppercase, collapse internal
/// whitespace. Null stays null.
pub fn clean_label(value: &CellValue) -> CellValue {
    match value {
        CellValue::Null => CellValue::Null,
        CellValue::Text(s) => {
            let collapsed = spaces().replace_all(s.trim(), " ").to_uppercase();
            if collapsed.is_empty() {
                CellValue::Null
            } else {
                CellValue::Text(collapsed)
            }
        }
        other => other.clone(),
    }
}

fn as_integer(value: &CellValue) -> Option<i64> {
    match value {
        CellValue::Number(n) if n.fract() == 0.0 => Some(*n as i64),
        CellValue::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_digits() {
        assert_eq!(
            normalize_digits(&CellValue::Text("CC 10.203-40".into())),
            CellValue::Text("1020340".into())
        );
        assert_eq!(
            normalize_digits(&CellValue::Number(1001.0)),
            CellValue::Text("1001".into())
        );
        assert_eq!(normalize_digits(&CellValue::Text("n/a".into())), CellValue::Null);
        assert_eq!(normalize_digits(&CellValue::Null), CellValue::Null);
    }

    #[test]
    fn test_net_promoter_bands() {
        assert_eq!(net_promoter_class(&CellValue::Number(10.0)), Some("Promoters"));
        assert_eq!(net_promoter_class(&CellValue::Number(9.0)), Some("Promoters"));
        assert_eq!(net_promoter_class(&CellValue::Number(8.0)), Some("Passives"));
        assert_eq!(net_promoter_class(&CellValue::Number(7.0)), Some("Passives"));
        assert_eq!(net_promoter_class(&CellValue::Number(6.0)), Some("Detractors"));
        assert_eq!(net_promoter_class(&CellValue::Number(0.0)), Some("Detractors"));
        assert_eq!(net_promoter_class(&CellValue::Number(-1.0)), None);
        assert_eq!(net_promoter_class(&CellValue::Text("9".into())), Some("Promoters"));
        assert_eq!(net_promoter_class(&CellValue::Text("high".into())), None);
        assert_eq!(net_promoter_class(&CellValue::Null), None);
    }

    #[test]
    fn test_generation_boundaries() {
        assert_eq!(generation_label(&CellValue::Number(1946.0)), Some("Baby Boomers"));
        assert_eq!(generation_label(&CellValue::Number(1964.0)), Some("Baby Boomers"));
        assert_eq!(generation_label(&CellValue::Number(1965.0)), Some("Generation X"));
        assert_eq!(generation_label(&CellValue::Number(1981.0)), Some("Millennials"));
        assert_eq!(generation_label(&CellValue::Number(1997.0)), Some("Centennials"));
        assert_eq!(generation_label(&CellValue::Number(2012.0)), Some("Centennials"));
        assert_eq!(generation_label(&CellValue::Number(1900.0)), None);
        assert_eq!(generation_label(&CellValue::Text("born 1985".into())), Some("Millennials"));
        assert_eq!(generation_label(&CellValue::Null), None);
    }

    #[test]
    fn test_clean_label() {
        assert_eq!(
            clean_label(&CellValue::Text("  human   resources ".into())),
            CellValue::Text("HUMAN RESOURCES".into())
        );
        assert_eq!(clean_label(&CellValue::Text("   ".into())), CellValue::Null);
        assert_eq!(clean_label(&CellValue::Null), CellValue::Null);
    }
}
