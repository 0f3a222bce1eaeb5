//! Input validation helpers shared by auth and post forms.

use regex::Regex;
use std::sync::OnceLock;

/// Maximum accepted length for free-form text inputs.
pub const MAX_INPUT_LEN: usize = 1000;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"))
}

/// Trim an input and cap it at [`MAX_INPUT_LEN`] characters.
pub fn sanitize_input(input: &str) -> String {
    input.trim().chars().take(MAX_INPUT_LEN).collect()
}

/// Loose email shape check: local part, `@`, domain with a dot.
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Password policy violations, in display order.
pub fn password_policy_errors(password: &str) -> Vec<String> {
    let mut errors = Vec::new();

    if password.chars().count() < 8 {
        errors.push("Password must be at least 8 characters long".to_string());
    }
    if password.chars().count() > 128 {
        errors.push("Password must be less than 128 characters".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one number".to_string());
    }
    if !password.chars().any(|c| "!@#$%^&*(),.?\":{}|<>".contains(c)) {
        errors.push("Password must contain at least one special character".to_string());
    }

    errors
}

/// Whether a password satisfies the full policy.
pub fn is_valid_password(password: &str) -> bool {
    password_policy_errors(password).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_email() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("first.last@example.co.uk"));
    }

    #[test]
    fn rejects_malformed_email() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn password_policy_accepts_strong_password() {
        assert!(is_valid_password("Abcd1234!"));
    }

    #[test]
    fn password_policy_reports_each_violation() {
        let errors = password_policy_errors("abc");
        assert!(errors.iter().any(|e| e.contains("8 characters")));
        assert!(errors.iter().any(|e| e.contains("uppercase")));
        assert!(errors.iter().any(|e| e.contains("number")));
        assert!(errors.iter().any(|e| e.contains("special character")));
    }

    #[test]
    fn sanitize_trims_and_caps() {
        assert_eq!(sanitize_input("  hello  "), "hello");
        let long = "x".repeat(MAX_INPUT_LEN + 50);
        assert_eq!(sanitize_input(&long).chars().count(), MAX_INPUT_LEN);
    }
}
