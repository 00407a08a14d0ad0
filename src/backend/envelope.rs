use serde_json::Value;

/// Extract the human-readable message from an error body.
///
/// Accepts `{detail: "..."}`, `{detail: {message: "..."}}`, `{detail: [{msg: "..."}]}`
/// (validation errors, joined with "; "), `{error: "..."}` and `{message: "..."}`.
pub fn error_message(body: &str) -> Option<String> {
    let v: Value = serde_json::from_str(body).ok()?;
    let msg = match v.get("detail") {
        Some(detail) => detail_message(detail),
        None => v
            .get("message")
            .or_else(|| v.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string),
    };
    msg.map(|m| m.trim().to_string()).filter(|m| !m.is_empty())
}

fn detail_message(detail: &Value) -> Option<String> {
    match detail {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("message")
            .or_else(|| map.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string),
        Value::Array(items) => {
            let parts: Vec<&str> = items
                .iter()
                .filter_map(|i| i.get("msg").or_else(|| i.get("message")))
                .filter_map(Value::as_str)
                .collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_detail() {
        assert_eq!(
            error_message(r#"{"detail":"Workflow not found"}"#).as_deref(),
            Some("Workflow not found")
        );
    }

    #[test]
    fn structured_detail_prefers_message() {
        let body = r#"{"detail":{"error":"rate_limit","message":"Daily limit reached","retry_after_seconds":120}}"#;
        assert_eq!(error_message(body).as_deref(), Some("Daily limit reached"));
        assert_eq!(
            error_message(r#"{"detail":{"error":"captcha_failed"}}"#).as_deref(),
            Some("captcha_failed")
        );
    }

    #[test]
    fn validation_detail_list() {
        let body = r#"{"detail":[{"loc":["body","name"],"msg":"field required"},{"msg":"too short"}]}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("field required; too short")
        );
    }

    #[test]
    fn proxy_style_error_and_garbage() {
        assert_eq!(
            error_message(r#"{"error":"Failed to create workflow"}"#).as_deref(),
            Some("Failed to create workflow")
        );
        assert_eq!(error_message("<html>502</html>"), None);
        assert_eq!(error_message(r#"{"detail":"   "}"#), None);
        assert_eq!(error_message(r#"{"detail":42}"#), None);
    }
}
