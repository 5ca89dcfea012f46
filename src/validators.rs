use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Script-injection shapes that have no business in a code prompt
    static ref DANGEROUS_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)<script[^>]*>.*?</script>").unwrap(),
        Regex::new(r"(?i)javascript:").unwrap(),
        Regex::new(r"(?i)on\w+\s*=").unwrap(),
    ];
}

/// Validate a code-generation prompt and temperature. Returns the
/// user-facing message on failure.
pub fn validate_prompt(prompt: &str, temperature: f32) -> Result<(), String> {
    if prompt.is_empty() {
        return Err("Prompt cannot be empty".to_string());
    }

    let length = prompt.chars().count();
    if length < 5 {
        return Err("Prompt is too short. Please provide more details.".to_string());
    }
    if length > 5000 {
        return Err("Prompt is too long. Maximum 5000 characters allowed.".to_string());
    }

    if !(0.0..=1.0).contains(&temperature) {
        return Err("Temperature must be between 0.0 and 1.0".to_string());
    }

    if DANGEROUS_PATTERNS.iter().any(|p| p.is_match(prompt)) {
        return Err("Invalid characters detected in prompt".to_string());
    }

    Ok(())
}

/// Validate code submitted for explanation or improvement.
pub fn validate_code(code: &str) -> Result<(), String> {
    if code.is_empty() {
        return Err("Code cannot be empty".to_string());
    }

    if code.chars().count() > 10000 {
        return Err("Code is too long. Maximum 10000 characters allowed.".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_reasonable_prompt() {
        assert!(validate_prompt("write a binary search in rust", 0.2).is_ok());
    }

    #[test]
    fn rejects_empty_and_short_prompts() {
        assert!(validate_prompt("", 0.2).is_err());
        assert_eq!(
            validate_prompt("hey", 0.2).unwrap_err(),
            "Prompt is too short. Please provide more details."
        );
    }

    #[test]
    fn rejects_overlong_prompt() {
        let prompt = "a".repeat(5001);
        assert_eq!(
            validate_prompt(&prompt, 0.2).unwrap_err(),
            "Prompt is too long. Maximum 5000 characters allowed."
        );
    }

    #[test]
    fn rejects_out_of_range_temperature() {
        assert!(validate_prompt("write a parser", -0.1).is_err());
        assert!(validate_prompt("write a parser", 1.1).is_err());
        assert!(validate_prompt("write a parser", 1.0).is_ok());
    }

    #[test]
    fn rejects_injection_patterns() {
        assert!(validate_prompt("<script>alert(1)</script>", 0.2).is_err());
        assert!(validate_prompt("click javascript:void(0)", 0.2).is_err());
        assert!(validate_prompt("set onclick= something", 0.2).is_err());
    }

    #[test]
    fn validates_code_length() {
        assert!(validate_code("fn main() {}").is_ok());
        assert!(validate_code("").is_err());
        assert!(validate_code(&"x".repeat(10001)).is_err());
    }
}
