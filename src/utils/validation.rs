use regex::Regex;
use std::sync::OnceLock;

/// Shortest password accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 8;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,4}$")
            .unwrap_or_else(|e| unreachable!("email pattern is a valid regex: {e}"))
    })
}

/// Lower-case addresses only; callers normalise before checking.
pub fn is_email_valid(email: &str) -> bool {
    email_pattern().is_match(email)
}

pub fn is_password_valid(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}
