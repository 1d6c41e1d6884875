//! Utility functions for notification channels

use serde_json::Value;

/// Maximum length of a response body kept in error messages
pub const MAX_BODY_LENGTH: usize = 4000;

/// Truncate a string to at most `max_len` bytes, on a char boundary
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated]", &s[..end])
}

/// Escape a value for substitution inside a JSON string literal
pub fn json_escape(s: &str) -> String {
    let quoted = Value::String(s.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

/// Redact sensitive fields from JSON configuration
///
/// Replaces values for keys that commonly carry secrets (passwords, tokens,
/// API keys) and for webhook URLs, which embed their own credentials.
pub fn redact_sensitive_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = serde_json::Map::new();
            for (key, val) in map {
                let key_lower = key.to_lowercase();
                let is_sensitive = key_lower.contains("password")
                    || key_lower.contains("token")
                    || key_lower.contains("secret")
                    || key_lower.contains("api_key")
                    || key_lower.contains("webhook_url");

                if is_sensitive {
                    redacted.insert(key.clone(), Value::String("***".to_string()));
                } else if val.is_object() || val.is_array() {
                    redacted.insert(key.clone(), redact_sensitive_json(val));
                } else {
                    redacted.insert(key.clone(), val.clone());
                }
            }
            Value::Object(redacted)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(redact_sensitive_json).collect()),
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_escape() {
        assert_eq!(json_escape("plain"), "plain");
        assert_eq!(json_escape("say \"hi\"\nnow"), r#"say \"hi\"\nnow"#);
        assert_eq!(json_escape("back\\slash"), r#"back\\slash"#);
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("hello world", 5), "hello... [truncated]");
        // never splits a multi-byte char
        assert_eq!(truncate_string("héllo", 2), "h... [truncated]");
    }

    #[test]
    fn test_redact_sensitive_json() {
        let json = serde_json::json!({
            "webhook_url": "https://hooks.slack.com/services/T000/B000/XXXX",
            "channel": "#alerts",
            "nested": {
                "auth_token": "xyz789",
                "username": "relay-bot"
            }
        });

        let redacted = redact_sensitive_json(&json);
        assert_eq!(redacted["webhook_url"], "***");
        assert_eq!(redacted["channel"], "#alerts");
        assert_eq!(redacted["nested"]["auth_token"], "***");
        assert_eq!(redacted["nested"]["username"], "relay-bot");
    }
}
