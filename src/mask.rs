//! Masking of sensitive values before they reach the logs.

use serde_json::{Map, Value};

/// Field always masked in logged request bodies.
pub const PHONE_FIELD: &str = "phone";

/// Field masked with the mobile number rule.
pub const MOBILE_FIELD: &str = "mobileNo";

/// Keep the first `start` and last `end` characters of `s`, replacing the rest
/// with `mask`. Masks every character when `start + end` covers the string.
pub fn mask(s: &str, start: usize, end: usize, mask: char) -> String {
    let len = s.chars().count();
    if start + end >= len {
        return std::iter::repeat(mask).take(len).collect();
    }

    s.chars()
        .enumerate()
        .map(|(i, c)| if i < start || i >= len - end { c } else { mask })
        .collect()
}

/// Mask a named value for logging.
pub fn mask_field(name: &str, value: &str) -> String {
    if name == MOBILE_FIELD {
        mask(value, 2, 2, 'x')
    } else {
        mask(value, 0, 5, 'x')
    }
}

/// Mask a phone number, leaving the last three digits visible.
pub fn mask_phone(value: &str) -> Option<String> {
    (value.chars().count() > 3).then(|| mask(value, 0, 3, '*'))
}

/// Mask the sensitive top-level fields of a JSON body in place.
///
/// `phone` is always masked; `fields` lists additional names masked with
/// [`mask_field`]. Non-string values are left untouched.
pub fn mask_body(body: &mut Map<String, Value>, fields: &[String]) {
    if let Some(Value::String(phone)) = body.get_mut(PHONE_FIELD) {
        if let Some(masked) = mask_phone(phone) {
            *phone = masked;
        }
    }

    for name in fields {
        if let Some(Value::String(value)) = body.get_mut(name.as_str()) {
            *value = mask_field(name, value);
        }
    }
}
