use regex::Regex;

use super::ApiError;

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 40;
pub const MAX_ENCOUNTER_NAME_LENGTH: usize = 255;
pub const MAX_ENCOUNTER_DESCRIPTION_LENGTH: usize = 3000;

lazy_static::lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9][a-zA-Z0-9.!#$%&'*+-/=?^_`{|}~]*?[a-zA-Z0-9._-]?@[a-zA-Z0-9][a-zA-Z0-9._-]*?[a-zA-Z0-9]?\.[a-zA-Z]{2,63}$"
    ).expect("Invalid regex pattern defined in code");
}

/// Trims and checks a username, returning the trimmed value.
pub fn validate_username(raw: &str) -> Result<String, ApiError> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(ApiError::unprocessable("provided username is empty."));
    }
    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&username.chars().count()) {
        return Err(ApiError::unprocessable(format!(
            "username needs to be between {} and {} characters.",
            MIN_USERNAME_LENGTH, MAX_USERNAME_LENGTH
        )));
    }
    Ok(username.to_string())
}

/// Trims and checks an email address, returning the trimmed value.
pub fn validate_email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim();
    if email.is_empty() {
        return Err(ApiError::unprocessable("provided email is empty."));
    }
    if !EMAIL_REGEX.is_match(email) {
        return Err(ApiError::unprocessable(format!(
            "provided user email '{}' is not valid.",
            email
        )));
    }
    Ok(email.to_string())
}

/// Password policy: 8 to 50 characters with at least one uppercase letter,
/// one lowercase letter, one digit and one symbol. Checked as explicit scans;
/// the regex crate has no lookaheads.
pub fn validate_password(password: &str) -> Result<(), ApiError> {
    let length_ok = (8..=50).contains(&password.chars().count());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| !c.is_ascii_alphanumeric());

    if length_ok && has_upper && has_lower && has_digit && has_symbol {
        Ok(())
    } else {
        Err(ApiError::unprocessable(
            "new password doesn't satisfy requirement",
        ))
    }
}

pub fn validate_encounter_name(raw: &str) -> Result<String, ApiError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ApiError::unprocessable("provided name is empty."));
    }
    if name.chars().count() > MAX_ENCOUNTER_NAME_LENGTH {
        return Err(ApiError::unprocessable(format!(
            "name too long. Max '{}' signs allowed.",
            MAX_ENCOUNTER_NAME_LENGTH
        )));
    }
    Ok(name.to_string())
}

pub fn validate_encounter_description(raw: &str) -> Result<String, ApiError> {
    let description = raw.trim();
    if description.chars().count() > MAX_ENCOUNTER_DESCRIPTION_LENGTH {
        return Err(ApiError::unprocessable(format!(
            "description too long. Max '{}' signs allowed.",
            MAX_ENCOUNTER_DESCRIPTION_LENGTH
        )));
    }
    Ok(description.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert_eq!(validate_username("  alice  ").unwrap(), "alice");
        assert!(validate_username("").is_err());
        assert!(validate_username("   ").is_err());
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"x".repeat(41)).is_err());
        assert!(validate_username(&"x".repeat(40)).is_ok());
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email(" alice@test.com ").unwrap(), "alice@test.com");
        assert!(validate_email("first.last@sub.domain.org").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@missing-local.com").is_err());
        assert!(validate_email("trailing@dot.").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("Correct-1").is_ok());
        assert!(validate_password("weak").is_err());
        assert!(validate_password("alllowercase1!").is_err());
        assert!(validate_password("ALLUPPERCASE1!").is_err());
        assert!(validate_password("NoDigits-Here").is_err());
        assert!(validate_password("NoSymbols123").is_err());
        assert!(validate_password(&format!("Aa1!{}", "x".repeat(47))).is_err());
    }

    #[test]
    fn test_validate_encounter_name() {
        assert_eq!(validate_encounter_name(" Goblin Ambush ").unwrap(), "Goblin Ambush");
        assert!(validate_encounter_name("  ").is_err());
        assert!(validate_encounter_name(&"n".repeat(256)).is_err());
        assert!(validate_encounter_name(&"n".repeat(255)).is_ok());
    }

    #[test]
    fn test_validate_encounter_description() {
        assert_eq!(validate_encounter_description("").unwrap(), "");
        assert!(validate_encounter_description(&"d".repeat(3000)).is_ok());
        assert!(validate_encounter_description(&"d".repeat(3001)).is_err());
    }
}
