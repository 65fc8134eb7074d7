// crates/warden-store-json/src/naming.rs
// ============================================================================
// Module: JSON Key Naming
// Description: Column name to camelCase document key transform.
// Purpose: Produce the on-disk key spelling used by the JSON backend.
// Dependencies: none
// ============================================================================

//! ## Overview
//! [`adapt_position`] splits a column name on `_` and `-`, lowercases the
//! first token, and capitalizes the rest. Short all-caps tokens listed in
//! [`UPPERCASE_TOKENS`] are written fully uppercase wherever they appear, so
//! `ip_address` becomes `IPAddress` and `player_id` becomes `playerID`.

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Tokens always rendered in uppercase.
pub const UPPERCASE_TOKENS: [&str; 3] = ["id", "uuid", "ip"];

// ============================================================================
// SECTION: Transform
// ============================================================================

/// Converts a column name into its document key.
#[must_use]
pub fn adapt_position(column: &str) -> String {
    let mut key = String::with_capacity(column.len());
    let tokens = column.split(['_', '-']).filter(|token| !token.is_empty());
    for (index, token) in tokens.enumerate() {
        let lower = token.to_ascii_lowercase();
        if UPPERCASE_TOKENS.contains(&lower.as_str()) {
            key.push_str(&lower.to_ascii_uppercase());
        } else if index == 0 {
            key.push_str(&lower);
        } else {
            let mut chars = lower.chars();
            if let Some(first) = chars.next() {
                key.push(first.to_ascii_uppercase());
                key.push_str(chars.as_str());
            }
        }
    }
    key
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use warden_store_core::Container;

    use super::*;

    #[test]
    fn exceptions_are_uppercase() {
        assert_eq!(adapt_position("id"), "ID");
        assert_eq!(adapt_position("uuid"), "UUID");
        assert_eq!(adapt_position("ip_address"), "IPAddress");
        assert_eq!(adapt_position("player_id"), "playerID");
    }

    #[test]
    fn words_are_camel_cased() {
        assert_eq!(adapt_position("times_banned"), "timesBanned");
        assert_eq!(adapt_position("last-seen"), "lastSeen");
        assert_eq!(adapt_position("message"), "message");
    }

    #[test]
    fn keys_are_unique_per_container() {
        for container in Container::ALL {
            let mut keys: Vec<String> =
                container.columns().iter().map(|column| adapt_position(column.name)).collect();
            keys.sort();
            keys.dedup();
            assert_eq!(keys.len(), container.columns().len(), "{container}");
        }
    }
}
