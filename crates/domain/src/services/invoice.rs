//! Invoice numbering.
//!
//! Numbers look like `INV20250600042`: a fixed prefix, the year and month
//! of issue, then a five-digit sequence that restarts every month. The
//! next number derives from the highest already issued for that month, so
//! allocation must happen inside the same transaction that inserts the
//! payment row. Tombstoned payments keep their numbers.

use chrono::{Datelike, NaiveDate};

const PREFIX: &str = "INV";

/// Width of the per-month sequence suffix.
const SEQ_DIGITS: usize = 5;

/// `INV{yyyy}{mm}`, the shared prefix of all numbers issued that month.
pub fn month_prefix(issued_on: NaiveDate) -> String {
    format!("{}{:04}{:02}", PREFIX, issued_on.year(), issued_on.month())
}

/// The sequence component of an invoice number, if it parses.
pub fn sequence_of(invoice_number: &str) -> Option<i64> {
    if invoice_number.len() < SEQ_DIGITS {
        return None;
    }
    invoice_number[invoice_number.len() - SEQ_DIGITS..]
        .parse::<i64>()
        .ok()
}

/// Formats the next invoice number after `last_seq` (0 when the month has
/// none yet).
pub fn invoice_number(issued_on: NaiveDate, last_seq: i64) -> String {
    format!(
        "{}{:0width$}",
        month_prefix(issued_on),
        last_seq + 1,
        width = SEQ_DIGITS
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_of_month() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 12).unwrap();
        assert_eq!(invoice_number(date, 0), "INV20250600001");
    }

    #[test]
    fn test_sequence_is_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2025, 11, 3).unwrap();
        assert_eq!(invoice_number(date, 41), "INV20251100042");
        assert_eq!(invoice_number(date, 99_998), "INV20251199999");
    }

    #[test]
    fn test_sequence_restarts_with_month() {
        let june = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        let july = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        assert_eq!(invoice_number(june, 17), "INV20250600018");
        assert_eq!(invoice_number(july, 0), "INV20250700001");
    }

    #[test]
    fn test_numbers_sort_within_a_month() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let a = invoice_number(date, 8);
        let b = invoice_number(date, 9);
        assert!(a < b);
    }

    #[test]
    fn test_sequence_round_trip() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let number = invoice_number(date, 41);
        assert_eq!(sequence_of(&number), Some(42));
        assert_eq!(sequence_of("garbage"), None);
    }

    #[test]
    fn test_month_prefix() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 12).unwrap();
        assert_eq!(month_prefix(date), "INV202506");
    }
}
