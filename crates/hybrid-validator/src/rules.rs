use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// A single validation rule: optional pattern, length bounds, and an
/// optional closed set of allowed values.
#[derive(Clone)]
pub struct ValidationRule {
    pub name: String,
    pub pattern: Option<Regex>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub required: bool,
    pub allowed_values: Option<HashSet<String>>,
    pub error_message: String,
}

impl ValidationRule {
    pub fn new(name: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: None,
            min_length: None,
            max_length: None,
            required: false,
            allowed_values: None,
            error_message: error_message.into(),
        }
    }

    pub fn with_pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn with_length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_allowed_values(mut self, values: HashSet<String>) -> Self {
        self.allowed_values = Some(values);
        self
    }

    /// Runs this rule against `value`, returning `None` when it passes or
    /// `Some(message)` when it fails.
    pub fn check(&self, value: &str) -> Option<&str> {
        if self.required && value.is_empty() {
            return Some(&self.error_message);
        }

        if let Some(min) = self.min_length {
            if value.chars().count() < min {
                return Some(&self.error_message);
            }
        }

        if let Some(max) = self.max_length {
            if value.chars().count() > max {
                return Some(&self.error_message);
            }
        }

        if let Some(pattern) = &self.pattern {
            if !value.is_empty() && !pattern.is_match(value) {
                return Some(&self.error_message);
            }
        }

        if let Some(allowed) = &self.allowed_values {
            if !value.is_empty() && !allowed.contains(value) {
                return Some(&self.error_message);
            }
        }

        None
    }
}

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap()
});
static PHONE_US_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?1?[-. ]?\(?\d{3}\)?[-. ]?\d{3}[-. ]?\d{4}$").unwrap());
static PHONE_INTL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+[1-9]\d{6,14}$").unwrap());
static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").unwrap());
static ZIP_US_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{5}(-\d{4})?$").unwrap());
static CREDIT_CARD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{13,19}$").unwrap());
static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .unwrap()
});
static ALPHANUMERIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+$").unwrap());
static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").unwrap());
static HEX_COLOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}){1,2}$").unwrap());
static IPV4_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)(\.(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)){3}$").unwrap()
});

/// Returns the built-in rule registry: `email`, `phone_us`, `phone_intl`,
/// `url`, `zip_us`, `credit_card`, `uuid`, `alphanumeric`, `slug`,
/// `hex_color`, `ipv4`.
pub fn builtin_rules() -> Vec<ValidationRule> {
    vec![
        ValidationRule::new("email", "must be a valid email address").with_pattern(EMAIL_RE.clone()),
        ValidationRule::new("phone_us", "must be a valid US phone number")
            .with_pattern(PHONE_US_RE.clone()),
        ValidationRule::new("phone_intl", "must be a valid international phone number")
            .with_pattern(PHONE_INTL_RE.clone()),
        ValidationRule::new("url", "must be a valid URL").with_pattern(URL_RE.clone()),
        ValidationRule::new("zip_us", "must be a valid US ZIP code").with_pattern(ZIP_US_RE.clone()),
        ValidationRule::new("credit_card", "must be a valid credit card number")
            .with_pattern(CREDIT_CARD_RE.clone()),
        ValidationRule::new("uuid", "must be a valid UUID").with_pattern(UUID_RE.clone()),
        ValidationRule::new("alphanumeric", "must be alphanumeric")
            .with_pattern(ALPHANUMERIC_RE.clone()),
        ValidationRule::new("slug", "must be a valid slug").with_pattern(SLUG_RE.clone()),
        ValidationRule::new("hex_color", "must be a valid hex color").with_pattern(HEX_COLOR_RE.clone()),
        ValidationRule::new("ipv4", "must be a valid IPv4 address").with_pattern(IPV4_RE.clone()),
    ]
}

/// Guesses a built-in rule name from a field name using simple substring
/// heuristics (e.g. `user_email` -> `email`).
pub fn heuristic_rule_for_field(field_name: &str) -> Option<&'static str> {
    let lower = field_name.to_lowercase();
    let candidates: &[(&str, &str)] = &[
        ("email", "email"),
        ("phone", "phone_us"),
        ("url", "url"),
        ("website", "url"),
        ("zip", "zip_us"),
        ("postal", "zip_us"),
        ("credit_card", "credit_card"),
        ("card_number", "credit_card"),
        ("uuid", "uuid"),
        ("slug", "slug"),
        ("color", "hex_color"),
        ("ip", "ipv4"),
    ];

    candidates
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, rule)| *rule)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_rule_accepts_valid_and_rejects_invalid() {
        let rule = builtin_rules().into_iter().find(|r| r.name == "email").unwrap();
        assert!(rule.check("user@example.com").is_none());
        assert!(rule.check("not-an-email").is_some());
    }

    #[test]
    fn heuristic_matches_field_name_substring() {
        assert_eq!(heuristic_rule_for_field("user_email"), Some("email"));
        assert_eq!(heuristic_rule_for_field("billing_zip_code"), Some("zip_us"));
        assert_eq!(heuristic_rule_for_field("unrelated"), None);
    }

    #[test]
    fn required_rejects_empty_value() {
        let rule = ValidationRule::new("name", "required").required();
        assert!(rule.check("").is_some());
        assert!(rule.check("x").is_none());
    }
}
