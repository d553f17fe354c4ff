//! URL templates with `{param}` placeholders.
//!
//! A template such as `https://api.example.com/users/{id}/posts/{post_id}` is
//! expanded by substituting each placeholder with a percent-encoded value.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::request::RequestError;

/// Matches `{name}` where name is ASCII word characters.
#[allow(clippy::expect_used)]
static PLACEHOLDER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("placeholder regex is valid") // Static pattern, safe to panic
});

/// Expands every `{name}` placeholder in `template` with the matching value in `params`.
///
/// Values are percent-encoded so a value like `a/b` stays a single path segment.
///
/// # Errors
///
/// Returns [`RequestError::MissingParam`] for the first placeholder with no value.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use fetcher_core::template::expand;
///
/// let params = HashMap::from([("id".to_string(), "42".to_string())]);
/// let url = expand("https://api.example.com/users/{id}", &params).unwrap();
/// assert_eq!(url, "https://api.example.com/users/42");
/// ```
pub fn expand(template: &str, params: &HashMap<String, String>) -> Result<String, RequestError> {
    let mut expanded = String::with_capacity(template.len());
    let mut last = 0;

    for caps in PLACEHOLDER_PATTERN.captures_iter(template) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value = params
            .get(name.as_str())
            .ok_or_else(|| RequestError::missing_param(name.as_str(), template))?;

        trace!(param = name.as_str(), "substituting URL parameter");
        expanded.push_str(&template[last..whole.start()]);
        expanded.push_str(&urlencoding::encode(value));
        last = whole.end();
    }

    expanded.push_str(&template[last..]);
    Ok(expanded)
}

/// Returns placeholder names in order of appearance (duplicates included).
#[must_use]
pub fn placeholders(template: &str) -> Vec<&str> {
    PLACEHOLDER_PATTERN
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}
