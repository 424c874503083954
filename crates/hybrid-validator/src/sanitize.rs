use unicode_normalization::UnicodeNormalization;

/// A single sanitization stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizeStage {
    Trim,
    HtmlEscape,
    NullByteRemoval,
    UnicodeNfc,
    StripTags,
    SqlEscape,
}

/// The default pipeline: trim, HTML-escape, normalize. Null-byte removal
/// runs first since it must happen before any other text processing.
pub fn default_pipeline() -> Vec<SanitizeStage> {
    vec![
        SanitizeStage::NullByteRemoval,
        SanitizeStage::Trim,
        SanitizeStage::HtmlEscape,
        SanitizeStage::UnicodeNfc,
    ]
}

/// Runs `value` through the given pipeline stages in order.
pub fn sanitize(value: &str, stages: &[SanitizeStage]) -> String {
    let mut current = value.to_string();
    for stage in stages {
        current = apply_stage(&current, *stage);
    }
    current
}

fn apply_stage(value: &str, stage: SanitizeStage) -> String {
    match stage {
        SanitizeStage::Trim => value.trim().to_string(),
        SanitizeStage::HtmlEscape => html_escape(value),
        SanitizeStage::NullByteRemoval => value.replace('\0', ""),
        SanitizeStage::UnicodeNfc => value.nfc().collect(),
        SanitizeStage::StripTags => strip_tags(value),
        SanitizeStage::SqlEscape => sql_escape(value),
    }
}

fn html_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}

fn strip_tags(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_tag = false;
    for ch in value.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

fn sql_escape(value: &str) -> String {
    value.replace('\'', "''")
}
