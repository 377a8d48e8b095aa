//! Human-readable, time-derived identifiers

use chrono::{DateTime, Utc};

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// `PREFIX-<base36 millis>`, suffixed `-2`, `-3`, ... until `taken` says no
///
/// Two ids generated in the same millisecond therefore never collide as long
/// as `taken` sees every id issued so far.
pub fn unique_id(prefix: &str, now: DateTime<Utc>, taken: impl Fn(&str) -> bool) -> String {
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or_default();
    let base = format!("{}-{}", prefix, to_base36(millis));
    if !taken(&base) {
        return base;
    }
    (2u32..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or(base)
}

/// Mask the middle of ids longer than 8 characters: `RP-***XYZ` style
pub fn anonymize_id(id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    if chars.len() <= 8 {
        return id.to_string();
    }
    let prefix: String = chars[..3].iter().collect();
    let suffix: String = chars[chars.len() - 3..].iter().collect();
    format!("{}***{}", prefix, suffix)
}
