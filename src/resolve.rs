//! Ordered "first non-null wins" field resolution.
//!
//! Every place that merges two sources, or reads a field that upstream
//! reports under several names, goes through these helpers so the precedence
//! is written down once per field instead of as ad hoc `or` chains.

use serde_json::Value;

/// Return the first candidate that is `Some`, in priority order.
pub fn first_present<T>(candidates: impl IntoIterator<Item = Option<T>>) -> Option<T> {
    candidates.into_iter().flatten().next()
}

/// Resolve a numeric field from a JSON object by trying `aliases` in order.
///
/// Numbers encoded as strings (`"1012.0"`) are accepted; anything else is
/// skipped so the next alias can win.
pub fn first_number(obj: &Value, aliases: &[&str]) -> Option<f64> {
    // ---
    first_present(aliases.iter().map(|key| match obj.get(*key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }))
}

/// Resolve a string field from a JSON object by trying `aliases` in order.
pub fn first_string(obj: &Value, aliases: &[&str]) -> Option<String> {
    // ---
    first_present(aliases.iter().map(|key| {
        obj.get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    }))
}

/// Normalize a condition that is either `{"text": "..."}` or a bare string.
///
/// Missing, empty or oddly-typed values become `"Unknown"`.
pub fn condition_text(raw: Option<&Value>) -> String {
    // ---
    let text = match raw {
        Some(Value::Object(_)) => raw.and_then(|v| first_string(v, &["text"])),
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    };
    text.unwrap_or_else(|| "Unknown".to_string())
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_present_keeps_priority_order() {
        // ---
        assert_eq!(first_present([None, Some(2), Some(3)]), Some(2));
        assert_eq!(first_present([Some(1), Some(2)]), Some(1));
        assert_eq!(first_present::<i32>([None, None]), None);
    }

    #[test]
    fn test_first_number_resolves_aliases() {
        // ---
        let obj = json!({ "pressure_mb": 1009.0, "temp_c": "29.5" });

        assert_eq!(first_number(&obj, &["pressure_hpa", "pressure_mb"]), Some(1009.0));
        assert_eq!(first_number(&obj, &["temperature_c", "temp_c"]), Some(29.5));
        assert_eq!(first_number(&obj, &["wind_kph"]), None);
    }

    #[test]
    fn test_first_number_skips_null_alias() {
        // ---
        let obj = json!({ "pressure_hpa": null, "pressure_mb": 1001 });
        assert_eq!(first_number(&obj, &["pressure_hpa", "pressure_mb"]), Some(1001.0));
    }

    #[test]
    fn test_condition_text_shapes() {
        // ---
        assert_eq!(condition_text(Some(&json!({ "text": "Mist" }))), "Mist");
        assert_eq!(condition_text(Some(&json!("Sunny"))), "Sunny");
        assert_eq!(condition_text(Some(&json!({ "code": 1000 }))), "Unknown");
        assert_eq!(condition_text(Some(&json!(""))), "Unknown");
        assert_eq!(condition_text(Some(&json!(42))), "Unknown");
        assert_eq!(condition_text(None), "Unknown");
    }
}
