//! Phone normalization to E.164.
//!
//! # Invariants
//! - Never panics and never returns an error; every failure collapses to `None`.
//! - Raw phone input is never written to logs.

use log::debug;
use phonenumber::country;
use phonenumber::Mode;

/// Region used when the caller does not configure one.
pub const DEFAULT_PHONE_REGION: &str = "US";

/// Normalizes a free-form phone number to E.164.
///
/// Returns `None` when input is absent or blank, cannot be parsed with
/// `default_region` as the fallback region, or parses but is not a valid
/// number.
pub fn normalize_phone_to_e164(raw: Option<&str>, default_region: &str) -> Option<String> {
    let trimmed = raw.map(str::trim).filter(|value| !value.is_empty())?;
    let region = default_region
        .trim()
        .to_ascii_uppercase()
        .parse::<country::Id>()
        .ok();

    let number = match phonenumber::parse(region, trimmed) {
        Ok(number) => number,
        Err(err) => {
            debug!("event=phone_normalize module=util status=skipped reason=parse_failed error={err}");
            return None;
        }
    };

    if !phonenumber::is_valid(&number) {
        debug!("event=phone_normalize module=util status=skipped reason=invalid_number");
        return None;
    }

    Some(number.format().mode(Mode::E164).to_string())
}
