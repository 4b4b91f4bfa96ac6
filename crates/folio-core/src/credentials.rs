//! Credential and title validation
//!
//! Pure predicates over user input. Nothing here touches the store; callers
//! run these first so malformed input never costs a lookup or a hash.
//! All lengths are counted in characters.

/// Characters besides ASCII letters and digits allowed in a password
const PASSWORD_SYMBOLS: &str = "~`!@#$%^&*()_+={}[]|\\:;\"'<,>.?/-";

/// Longest title accepted (exclusive bound is 64)
pub const MAX_TITLE_LEN: usize = 63;

/// Length of the derived content preview
pub const PREVIEW_LEN: usize = 127;

/// A username is 3 to 16 characters long
pub fn valid_username_length(username: &str) -> bool {
    let len = username.chars().count();
    len > 2 && len <= 16
}

/// A username consists solely of ASCII letters, digits, `_` and `.`
pub fn valid_username_chars(username: &str) -> bool {
    !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Both username predicates together
pub fn valid_username(username: &str) -> bool {
    valid_username_length(username) && valid_username_chars(username)
}

/// A password is 6 to 127 characters long
pub fn valid_password_length(password: &str) -> bool {
    let len = password.chars().count();
    len > 5 && len < 128
}

/// A password consists of ASCII letters, digits and a fixed symbol set
pub fn valid_password_chars(password: &str) -> bool {
    !password.is_empty()
        && password
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SYMBOLS.contains(c))
}

/// Both password predicates together
pub fn valid_password(password: &str) -> bool {
    valid_password_length(password) && valid_password_chars(password)
}

/// A title is 1 to 63 characters and not made only of whitespace
pub fn valid_title(title: &str) -> bool {
    let len = title.chars().count();
    len > 0 && len <= MAX_TITLE_LEN && !title.chars().all(char::is_whitespace)
}

/// Normalize a title for storage and uniqueness checks
///
/// Leading and trailing whitespace is dropped and every inner whitespace
/// run collapses to its last character.
pub fn normalize_title(title: &str) -> String {
    let trimmed = title.trim();
    let mut out = String::with_capacity(trimmed.len());
    let mut chars = trimmed.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_whitespace() && chars.peek().is_some_and(|next| next.is_whitespace()) {
            continue;
        }
        out.push(c);
    }

    out
}

/// Preview of document content: its first 127 characters, `None` when empty
pub fn preview_of(content: &str) -> Option<String> {
    if content.is_empty() {
        None
    } else {
        Some(content.chars().take(PREVIEW_LEN).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_length_bounds() {
        assert!(!valid_username_length("ab"));
        assert!(valid_username_length("abc"));
        assert!(valid_username_length("abcdefghijklmnop"));
        assert!(!valid_username_length("abcdefghijklmnopq"));
    }

    #[test]
    fn test_username_chars() {
        assert!(valid_username_chars("alice.smith_01"));
        assert!(!valid_username_chars("alice smith"));
        assert!(!valid_username_chars("alice-smith"));
        assert!(!valid_username_chars("ålice"));
        assert!(!valid_username_chars(""));
    }

    #[test]
    fn test_password_length_bounds() {
        assert!(!valid_password_length("12345"));
        assert!(valid_password_length("123456"));
        assert!(valid_password_length(&"a".repeat(127)));
        assert!(!valid_password_length(&"a".repeat(128)));
    }

    #[test]
    fn test_password_chars() {
        assert!(valid_password_chars("Secret1!"));
        assert!(valid_password_chars("~`!@#$%^&*()_+={}[]|:;\"'<,>.?/-"));
        assert!(valid_password_chars("back\\slash"));
        assert!(!valid_password_chars("has space"));
        assert!(!valid_password_chars("tab\tchar"));
        assert!(!valid_password_chars("émoji"));
    }

    #[test]
    fn test_title_validation() {
        assert!(valid_title("Notes"));
        assert!(valid_title(" padded "));
        assert!(!valid_title(""));
        assert!(!valid_title("   "));
        assert!(!valid_title("\t\n"));
        assert!(valid_title(&"t".repeat(63)));
        assert!(!valid_title(&"t".repeat(64)));
    }

    #[test]
    fn test_title_length_counts_chars() {
        // 63 two-byte characters is still a valid title
        assert!(valid_title(&"é".repeat(63)));
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("Notes"), "Notes");
        assert_eq!(normalize_title("  Notes  "), "Notes");
        assert_eq!(normalize_title("My   big\t notes"), "My big notes");
        assert_eq!(normalize_title("a \tb"), "a\tb");
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview_of(""), None);
        assert_eq!(preview_of("hello"), Some("hello".to_string()));

        let long = "x".repeat(300);
        assert_eq!(preview_of(&long).unwrap().chars().count(), PREVIEW_LEN);
    }
}
