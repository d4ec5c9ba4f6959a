//! # Validation Utilities
//!
//! Input sanitizing and validation rules for account fields.

use lazy_regex::regex_is_match;

/// Characters that satisfy the "special character" password rule.
pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Longest email address accepted.
pub const MAX_EMAIL_LEN: usize = 255;

/// Trim surrounding whitespace and HTML-escape the rest.
pub fn sanitize_input(input: &str) -> String {
    let trimmed = input.trim();
    let mut out = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Validate that a string is not empty.
pub fn validate_not_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} cannot be empty", field_name))
    } else {
        Ok(())
    }
}

/// Validate maximum length (in bytes).
pub fn validate_max_length(value: &str, max: usize, field_name: &str) -> Result<(), String> {
    if value.len() > max {
        Err(format!("{} must be at most {} characters", field_name, max))
    } else {
        Ok(())
    }
}

/// Usernames are 3-20 ASCII letters or digits.
pub fn validate_username(username: &str) -> Result<(), String> {
    if regex_is_match!(r"^[a-zA-Z0-9]{3,20}$", username) {
        Ok(())
    } else {
        Err("Invalid username".to_string())
    }
}

/// Validate email format and length.
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.len() <= MAX_EMAIL_LEN
        && regex_is_match!(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$", email)
    {
        Ok(())
    } else {
        Err("Invalid email".to_string())
    }
}

/// Validate a new password against the account password policy.
///
/// Rules are checked in a fixed order and the first failure is reported.
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.len() > 100 {
        return Err("password must be less than 100 characters".to_string());
    }
    if password.len() < 8 {
        return Err("password must be at least 8 characters".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("password must contain at least one uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("password must contain at least one lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("password must contain at least one number".to_string());
    }
    if !password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c)) {
        return Err("password must contain at least one special character".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_input() {
        assert_eq!(sanitize_input("  alice  "), "alice");
        assert_eq!(
            sanitize_input("<script>\"x\" & 'y'</script>"),
            "&lt;script&gt;&#34;x&#34; &amp; &#39;y&#39;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("abc").is_ok());
        assert!(validate_username("a1b2c3d4e5f6g7h8i9j0").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("a1b2c3d4e5f6g7h8i9j0x").is_err());
        assert!(validate_username("alice_smith").is_err());
        assert!(validate_username("&lt;b&gt;").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("a.b+tag@mail.example.co").is_ok());
        assert!(validate_email("alice@example").is_err());
        assert!(validate_email("alice.example.com").is_err());

        let long = format!("{}@example.com", "a".repeat(250));
        assert!(validate_email(&long).is_err());
    }

    #[test]
    fn test_validate_password_rule_order() {
        let too_long = "Aa1!".repeat(26);
        let cases = [
            (too_long.as_str(), "password must be less than 100 characters"),
            ("Aa1!", "password must be at least 8 characters"),
            ("password1!", "password must contain at least one uppercase letter"),
            ("PASSWORD1!", "password must contain at least one lowercase letter"),
            ("Password!!", "password must contain at least one number"),
            ("Password12", "password must contain at least one special character"),
        ];

        for (password, expected) in cases {
            assert_eq!(validate_password(password), Err(expected.to_string()));
        }

        assert!(validate_password("Password123!").is_ok());
    }

    #[test]
    fn test_validate_max_length() {
        assert!(validate_max_length("abc", 3, "Field").is_ok());
        assert_eq!(
            validate_max_length("abcd", 3, "Field"),
            Err("Field must be at most 3 characters".to_string())
        );
    }
}
