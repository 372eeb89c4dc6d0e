//! Blank-value escaping
//!
//! SSM rejects empty parameter values. Values that consist only of spaces
//! (including the empty string) are padded with one extra space before a put
//! and the pad is removed again after a get, so blank local values survive a
//! round trip unchanged. Values with any non-space character pass through
//! untouched.

/// Remove the write-time pad: an all-space, non-empty value loses exactly one
/// trailing space.
pub fn unescape_value_after_get(value: &str) -> String {
    if !value.is_empty() && value.chars().all(|c| c == ' ') {
        value[..value.len() - 1].to_string()
    } else {
        value.to_string()
    }
}

/// Add the write-time pad: an all-space value (including the empty string)
/// gains exactly one trailing space so SSM accepts it.
pub fn escape_value_before_put(value: &str) -> String {
    if value.chars().all(|c| c == ' ') {
        format!("{value} ")
    } else {
        value.to_string()
    }
}
