/// 32-bit rolling string hash (`h = h * 31 + unit` over UTF-16 code units).
///
/// Matches the hash the dashboard tiles use to key cached insight results, so
/// keys computed here line up with keys computed client-side.
pub fn string_to_hash(text: &str) -> i32 {
    text.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}

/// Cache key for a prompt/temperature pair.
pub fn insight_cache_key(prompt: &str, temperature: f64) -> i32 {
    string_to_hash(&format!("{temperature}|{prompt}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_hashes_to_zero() {
        assert_eq!(string_to_hash(""), 0);
    }

    #[test]
    fn matches_reference_values() {
        assert_eq!(string_to_hash("a"), 97);
        assert_eq!(string_to_hash("hello"), 99162322);
        assert_eq!(string_to_hash("hello world"), 1794106052);
        // Overflows 32 bits and wraps negative.
        assert_eq!(string_to_hash("The quick brown fox"), -1739336029);
    }

    #[test]
    fn counts_utf16_units() {
        // U+1F600 is a surrogate pair: 0xD83D, 0xDE00.
        let expected = 0xD83Di32.wrapping_mul(31).wrapping_add(0xDE00);
        assert_eq!(string_to_hash("😀"), expected);
    }

    #[test]
    fn cache_key_depends_on_temperature() {
        assert_ne!(
            insight_cache_key("summarize", 0.2),
            insight_cache_key("summarize", 0.4)
        );
        assert_eq!(
            insight_cache_key("summarize", 0.2),
            insight_cache_key("summarize", 0.2)
        );
    }
}
