use once_cell::sync::Lazy;
use regex::Regex;

/// Which classes of attack a value was checked against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SecurityThreats {
    pub sql_injection: bool,
    pub xss: bool,
    pub command_injection: bool,
    pub path_traversal: bool,
}

impl SecurityThreats {
    pub fn any(&self) -> bool {
        self.sql_injection || self.xss || self.command_injection || self.path_traversal
    }
}

/// Result of [`check_security`].
#[derive(Debug, Clone)]
pub struct SecurityCheckResult {
    pub safe: bool,
    pub threats: SecurityThreats,
    /// The value with any detected threat replaced by `[REDACTED]`.
    pub sanitized: String,
}

static SQL_KEYWORDS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(select|insert|update|delete|drop|union|exec|execute)\b.*\b(from|into|table|where)\b")
        .unwrap()
});
static SQL_TERMINATOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(--|;)").unwrap());
static SQL_TAUTOLOGY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bor\b\s+['\x22]?\s*\d+\s*=\s*\d+").unwrap());
static XSS_SCRIPT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<\s*script[^>]*>").unwrap());
static XSS_HANDLER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)on\w+\s*=\s*["'].*["']"#).unwrap());
static XSS_JS_URI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)javascript:").unwrap());
static SHELL_METACHAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[|;&`$]").unwrap());
static PATH_TRAVERSAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\./|\.\.\\").unwrap());

/// Scans `value` for SQL injection, XSS, shell command injection, and
/// path traversal patterns.
pub fn check_security(value: &str) -> SecurityCheckResult {
    let mut threats = SecurityThreats::default();

    if SQL_KEYWORDS_RE.is_match(value) || SQL_TERMINATOR_RE.is_match(value) || SQL_TAUTOLOGY_RE.is_match(value) {
        threats.sql_injection = true;
    }

    if XSS_SCRIPT_RE.is_match(value) || XSS_HANDLER_RE.is_match(value) || XSS_JS_URI_RE.is_match(value) {
        threats.xss = true;
    }

    if SHELL_METACHAR_RE.is_match(value) {
        threats.command_injection = true;
    }

    if PATH_TRAVERSAL_RE.is_match(value) {
        threats.path_traversal = true;
    }

    let sanitized = if threats.any() {
        "[REDACTED]".to_string()
    } else {
        value.to_string()
    };

    SecurityCheckResult {
        safe: !threats.any(),
        threats,
        sanitized,
    }
}
