//! Content fingerprint for creatives.
//!
//! The value must stay stable across releases: stored creatives are matched
//! against freshly scraped ones by comparing it.

use chrono::{DateTime, SecondsFormat, Utc};

/// Hash of the identity fields of a creative.
#[must_use]
pub fn content_hash(headline: &str, destination_url: &str, start_date: DateTime<Utc>) -> String {
    let date = start_date.to_rfc3339_opts(SecondsFormat::Millis, true);
    hash_string(&format!("{headline}{destination_url}{date}"))
}

/// 32-bit `h * 31 + unit` rolling hash over UTF-16 code units, rendered as
/// the absolute value in base 36.
#[must_use]
pub fn hash_string(input: &str) -> String {
    let h = input
        .encode_utf16()
        .fold(0_i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)));
    to_base36(i64::from(h).unsigned_abs())
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_owned();
    }
    let mut out = Vec::new();
    while n > 0 {
        // n % 36 < 36, so the index is always in range.
        out.push(DIGITS[usize::try_from(n % 36).unwrap_or(0)]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn known_values() {
        assert_eq!(hash_string(""), "0");
        assert_eq!(hash_string("a"), "2p");
        assert_eq!(hash_string("ab"), "2e9");
    }

    #[test]
    fn wraps_at_32_bits() {
        // Long inputs overflow i32 many times; the result must still be a
        // base-36 rendering of a value that fits in 32 bits.
        let h = hash_string(&"x".repeat(500));
        let value = u64::from_str_radix(&h, 36).unwrap();
        assert!(value <= 1 << 31);
    }

    #[test]
    fn counts_utf16_units_not_bytes() {
        // U+00E9 is one UTF-16 unit (233) but two UTF-8 bytes.
        assert_eq!(hash_string("é"), to_base36(233));
    }

    #[test]
    fn identity_fields_drive_the_hash() {
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let base = content_hash("Headline", "https://a.example", date);
        assert_eq!(base, content_hash("Headline", "https://a.example", date));
        assert_ne!(base, content_hash("Headline!", "https://a.example", date));
        assert_ne!(base, content_hash("Headline", "https://b.example", date));
        assert_ne!(
            base,
            content_hash("Headline", "https://a.example", date + chrono::Duration::days(1))
        );
    }

    #[test]
    fn date_is_rendered_with_millis_and_z() {
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        assert_eq!(
            content_hash("h", "u", date),
            hash_string("hu2024-05-01T00:00:00.000Z")
        );
    }
}
