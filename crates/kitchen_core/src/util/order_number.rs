//! Order number formatting.

const ORDER_NUMBER_PREFIX: &str = "ORDER-";
const ORDER_NUMBER_MIN_DIGITS: usize = 4;

/// Formats the identifier for the order that follows `existing_count` orders.
///
/// The sequence part is zero-padded to at least four digits and widens past
/// `9999` instead of truncating. No uniqueness check is performed; callers
/// must supply an accurate count.
pub fn generate_order_number(existing_count: u64) -> String {
    let next = u128::from(existing_count) + 1;
    format!("{ORDER_NUMBER_PREFIX}{next:0width$}", width = ORDER_NUMBER_MIN_DIGITS)
}
