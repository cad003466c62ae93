//! Canonical ticket keys.
//!
//! The requisition ledger refers to a ticket as `S<digits>` while the
//! relationship export stores the bare number, sometimes as a float cell.
//! Both sides are brought to the same decimal rendering before joining.

use crate::config::CellValue;

/// The letter that marks a reference document as a ticket.
pub const REFERENCE_MARKER: char = 'S';

/// Parses a digits-only string and renders it without leading zeros.
fn canonical_digits(s: &str) -> Option<String> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse::<u64>().ok().map(|n| n.to_string())
}

/// True when the (trimmed) reference starts with the ticket marker.
pub fn has_marker(raw: &str) -> bool {
    raw.trim_start().starts_with(REFERENCE_MARKER)
}

/// Normalizes a reference document such as `"S000123"` into `"123"`.
///
/// Returns None when the marker is missing or when the remainder is not a
/// plain non-negative integer.
pub fn normalize_reference(raw: &str) -> Option<String> {
    let rest = raw.trim_start().strip_prefix(REFERENCE_MARKER)?;
    canonical_digits(rest.trim())
}

/// Normalizes the ticket id column of the relationship export.
///
/// Numeric cells must hold an integral value; text cells may carry the
/// `.0` left behind by a float rendering.
pub fn normalize_ticket_id(cell: &CellValue) -> Option<String> {
    match cell {
        // Past u64::MAX the cast would saturate into a bogus key.
        CellValue::Number(f)
            if f.is_finite() && *f >= 0.0 && *f < u64::MAX as f64 && f.fract() == 0.0 =>
        {
            Some(format!("{}", *f as u64))
        }
        CellValue::Text(s) => {
            let s = s.trim();
            canonical_digits(s.strip_suffix(".0").unwrap_or(s))
        }
        _ => None,
    }
}

/// The ticket id as read back from the master document: trimmed, without
/// the trailing `.0` of a float rendering.
pub fn normalize_master_ticket(raw: &str) -> String {
    let s = raw.trim();
    s.strip_suffix(".0").unwrap_or(s).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_with_marker() {
        assert_eq!(normalize_reference("S100234"), Some("100234".to_string()));
        assert_eq!(normalize_reference("  S 0042 "), Some("42".to_string()));
        assert_eq!(normalize_reference("S0"), Some("0".to_string()));
    }

    #[test]
    fn reference_without_marker_is_excluded() {
        assert_eq!(normalize_reference("X998"), None);
        assert_eq!(normalize_reference("998"), None);
        assert_eq!(normalize_reference(""), None);
        assert!(!has_marker("X998"));
        assert!(has_marker(" S1"));
    }

    #[test]
    fn reference_with_non_numeric_remainder_is_excluded() {
        assert_eq!(normalize_reference("S"), None);
        assert_eq!(normalize_reference("SABC"), None);
        assert_eq!(normalize_reference("S12A"), None);
        assert_eq!(normalize_reference("S-5"), None);
        assert_eq!(normalize_reference("S1.5"), None);
        // Only one marker is stripped.
        assert_eq!(normalize_reference("SS12"), None);
    }

    #[test]
    fn reference_matches_integer_value() {
        for n in [0u64, 7, 10, 100234, 987654321] {
            for zeros in 0..3 {
                let raw = format!("S{}{}", "0".repeat(zeros), n);
                assert_eq!(normalize_reference(&raw), Some(n.to_string()));
            }
        }
    }

    #[test]
    fn ticket_ids() {
        assert_eq!(
            normalize_ticket_id(&CellValue::Number(100234.0)),
            Some("100234".to_string())
        );
        assert_eq!(
            normalize_ticket_id(&CellValue::Text(" 100234.0 ".to_string())),
            Some("100234".to_string())
        );
        assert_eq!(
            normalize_ticket_id(&CellValue::Text("00100234".to_string())),
            Some("100234".to_string())
        );
        assert_eq!(normalize_ticket_id(&CellValue::Number(1.5)), None);
        assert_eq!(normalize_ticket_id(&CellValue::Number(1e20)), None);
        assert_eq!(normalize_ticket_id(&CellValue::Number(f64::INFINITY)), None);
        assert_eq!(
            normalize_ticket_id(&CellValue::Number(9007199254740992.0)),
            Some("9007199254740992".to_string())
        );
        assert_eq!(normalize_ticket_id(&CellValue::Text("n/a".to_string())), None);
        assert_eq!(normalize_ticket_id(&CellValue::Empty), None);
    }

    #[test]
    fn master_tickets() {
        assert_eq!(normalize_master_ticket(" 100234.0 "), "100234");
        assert_eq!(normalize_master_ticket("100234"), "100234");
        assert_eq!(normalize_master_ticket(""), "");
    }
}
