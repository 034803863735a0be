//! Identifier generation and validation.
//!
//! Persons, teachers, subjects, classrooms and schedules use a 24-hex-char
//! object id (unix-seconds prefix + random tail) so ids sort roughly by
//! creation time. Invoices, products and users use opaque prefixed string
//! ids instead.

use chrono::Utc;
use uuid::Uuid;

/// Generate a new 24-hex-character object id.
pub fn new_object_id() -> String {
    let seconds = Utc::now().timestamp() as u32;
    let random = Uuid::new_v4();
    let mut id = format!("{:08x}", seconds);
    for byte in &random.as_bytes()[..8] {
        id.push_str(&format!("{:02x}", byte));
    }
    id
}

/// Check that a caller-supplied id has the 24-hex-char object id shape.
pub fn is_valid_object_id(id: &str) -> bool {
    id.len() == 24 && id.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_valid() {
        let id = new_object_id();
        assert!(is_valid_object_id(&id), "bad id: {}", id);
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = new_object_id();
        let b = new_object_id();
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(!is_valid_object_id(""));
        assert!(!is_valid_object_id("not-an-id"));
        assert!(!is_valid_object_id("664481c48fa7b11be59f53a")); // 23 chars
        assert!(!is_valid_object_id("664481c48fa7b11be59f53zz"));
    }

    #[test]
    fn accepts_object_id_shape() {
        assert!(is_valid_object_id("664481c48fa7b11be59f53ad"));
    }
}
