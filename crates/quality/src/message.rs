//! Message template rendering.
//!
//! Templates reference the observed value and the threshold with
//! `{current_value}` and `{threshold}`. A `:F<n>` suffix (e.g.
//! `{current_value:F0}`) selects the number of decimals; the default is two.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(current_value|threshold)(?::[Ff](\d{1,2}))?\}")
        .expect("placeholder pattern is valid")
});

const DEFAULT_PRECISION: usize = 2;

/// Substitute the placeholders of `template`.
pub fn render_message(template: &str, current_value: f64, threshold: f64) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let value = match &caps[1] {
                "current_value" => current_value,
                _ => threshold,
            };
            let precision = caps
                .get(2)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(DEFAULT_PRECISION);
            format!("{:.*}", precision, value)
        })
        .into_owned()
}
