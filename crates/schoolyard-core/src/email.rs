//! Email addresses are stored trimmed and lower-cased, so one mailbox maps to
//! exactly one account regardless of how it was typed.

#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@School.TEST "), "ada@school.test");
        assert_eq!(normalize_email("ada@school.test"), "ada@school.test");
    }
}
