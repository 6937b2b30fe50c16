//! Pure, stateless input checks and small generators shared by services
//! and request DTO validators.

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap());

// Local format 0XXXXXXXXX or international +233XXXXXXXXX
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(0\d{9}|\+233\d{9})$").unwrap());

// Ghana Card personal id: GHA-XXXXXXXXX-X
static GHANA_CARD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^GHA-\d{9}-\d$").unwrap());

static SLUG_STRIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone.trim())
}

/// Normalizes a Ghanaian phone number to +233 form. Returns `None` when the
/// input matches neither accepted format.
pub fn normalize_phone(phone: &str) -> Option<String> {
    let trimmed = phone.trim();
    if !PHONE_RE.is_match(trimmed) {
        return None;
    }
    if let Some(rest) = trimmed.strip_prefix('0') {
        Some(format!("+233{}", rest))
    } else {
        Some(trimmed.to_string())
    }
}

pub fn is_valid_ghana_card(id_number: &str) -> bool {
    GHANA_CARD_RE.is_match(id_number.trim())
}

/// Minimum eight characters with at least one letter and one digit.
pub fn validate_password_strength(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err("Password must contain at least one letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one digit");
    }
    Ok(())
}

/// Six decimal digits, zero-padded.
pub fn generate_otp() -> String {
    let mut rng = rand::thread_rng();
    format!("{:06}", rng.gen_range(0..1_000_000))
}

/// Lowercased, hyphenated slug with a short random suffix so two listings
/// with the same name never collide.
pub fn slugify(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let stripped = SLUG_STRIP_RE.replace_all(&lowered, "-");
    let base = stripped.trim_matches('-');
    let suffix: String = {
        let mut rng = rand::thread_rng();
        (0..6)
            .map(|_| {
                let v = rng.gen_range(0..16u8);
                char::from_digit(v as u32, 16).unwrap_or('0')
            })
            .collect()
    };
    if base.is_empty() {
        suffix
    } else {
        format!("{}-{}", base, suffix)
    }
}

/// Uppercase alphanumeric suffix used in order numbers and provider references.
pub fn random_reference_suffix(len: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_emails() {
        assert!(is_valid_email("ama.mensah@example.com"));
        assert!(is_valid_email("kofi+farm@co.gh"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("missing@tld"));
    }

    #[test]
    fn phone_formats() {
        assert!(is_valid_phone("0241234567"));
        assert!(is_valid_phone("+233241234567"));
        assert!(!is_valid_phone("241234567"));
        assert!(!is_valid_phone("024123456"));
        assert!(!is_valid_phone("+23324123456789"));
    }

    #[test]
    fn phone_normalization() {
        assert_eq!(
            normalize_phone("0241234567").as_deref(),
            Some("+233241234567")
        );
        assert_eq!(
            normalize_phone("+233241234567").as_deref(),
            Some("+233241234567")
        );
        assert_eq!(normalize_phone("12345"), None);
    }

    #[test]
    fn ghana_card_format() {
        assert!(is_valid_ghana_card("GHA-123456789-1"));
        assert!(!is_valid_ghana_card("GHA-12345678-1"));
        assert!(!is_valid_ghana_card("gha-123456789-1"));
        assert!(!is_valid_ghana_card("GHA-123456789"));
    }

    #[test]
    fn password_strength() {
        assert!(validate_password_strength("longpass1").is_ok());
        assert!(validate_password_strength("short1").is_err());
        assert!(validate_password_strength("lettersonly").is_err());
        assert!(validate_password_strength("12345678").is_err());
    }

    #[test]
    fn otp_is_six_digits() {
        for _ in 0..50 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn slugs_are_url_safe_and_distinct() {
        let a = slugify("Fresh Tomatoes (Grade A)");
        let b = slugify("Fresh Tomatoes (Grade A)");
        assert!(a.starts_with("fresh-tomatoes-grade-a-"));
        assert_ne!(a, b);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
    }
}
