//! Document numbers: `INV-YYMM-NNN` for invoices, `RET-YYMM-NNN` for returns.
//!
//! The sequence restarts every month. `NNN` is one more than the number of
//! existing documents with the same prefix, or one more than the highest
//! existing sequence if that is larger (after a deletion), so a number is
//! never handed out twice while its document still exists.

use chrono::NaiveDate;

const INVOICE_PREFIX: &str = "INV";
const RETURN_PREFIX: &str = "RET";

fn prefix(kind: &str, date: NaiveDate) -> String {
    format!("{}-{}-", kind, date.format("%y%m"))
}

/// `INV-YYMM-` for the month of `date`.
pub fn invoice_prefix(date: NaiveDate) -> String {
    prefix(INVOICE_PREFIX, date)
}

/// `RET-YYMM-` for the month of `date`.
pub fn return_prefix(date: NaiveDate) -> String {
    prefix(RETURN_PREFIX, date)
}

fn next_number<'a>(kind: &str, date: NaiveDate, existing: impl IntoIterator<Item = &'a str>) -> String {
    let prefix = prefix(kind, date);
    let (count, highest) = existing
        .into_iter()
        .filter_map(|number| number.strip_prefix(prefix.as_str()))
        .fold((0u32, 0u32), |(count, highest), seq| {
            (count + 1, highest.max(seq.parse().unwrap_or(0)))
        });
    format!("{}{:03}", prefix, count.max(highest) + 1)
}

/// Next invoice number for the month of `date`.
///
/// ```rust
/// use billbook_core::numbering::next_invoice_number;
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
/// assert_eq!(next_invoice_number(date, ["INV-2603-001"]), "INV-2603-002");
/// ```
pub fn next_invoice_number<'a>(date: NaiveDate, existing: impl IntoIterator<Item = &'a str>) -> String {
    next_number(INVOICE_PREFIX, date, existing)
}

/// Next return number for the month of `date`.
pub fn next_return_number<'a>(date: NaiveDate, existing: impl IntoIterator<Item = &'a str>) -> String {
    next_number(RETURN_PREFIX, date, existing)
}
