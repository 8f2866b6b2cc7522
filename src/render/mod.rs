//! Pure renderers: each takes state and returns a freshly built fragment, so
//! re-rendering always rebuilds rather than appends.

pub mod charts;
pub mod columns;
pub mod page;
pub mod preview;
pub mod stats;

pub(crate) fn escape_text(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Two decimals with ties rounded away from zero, or `N/A` when the value
/// is absent or not finite.
pub(crate) fn two_decimals(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => {
            // `{:.2}` alone rounds exact ties to even (1.125 -> 1.12).
            let scaled = v * 100.0;
            let rounded = if scaled.is_finite() {
                scaled.round() / 100.0
            } else {
                v
            };
            format!("{:.2}", rounded)
        }
        _ => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_text(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn formats_two_decimals() {
        assert_eq!(two_decimals(Some(30.333)), "30.33");
        assert_eq!(two_decimals(Some(2.0)), "2.00");
        assert_eq!(two_decimals(Some(-0.456)), "-0.46");
        assert_eq!(two_decimals(None), "N/A");
        assert_eq!(two_decimals(Some(f64::NAN)), "N/A");
    }

    #[test]
    fn exact_ties_round_up() {
        assert_eq!(two_decimals(Some(1.125)), "1.13");
        assert_eq!(two_decimals(Some(0.125)), "0.13");
        assert_eq!(two_decimals(Some(30.625)), "30.63");
        assert_eq!(two_decimals(Some(-1.125)), "-1.13");
    }
}
