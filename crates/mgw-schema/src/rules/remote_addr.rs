//! Client address filters (`remote_addr`, `remote_addrs`).

use serde_json::Value;

use crate::error::SemanticViolation;

/// Rejects the first empty address.
pub fn check_remote_addr<S: AsRef<str>>(addrs: &[S]) -> Result<(), SemanticViolation> {
    match addrs.iter().position(|a| a.as_ref().is_empty()) {
        Some(index) => Err(SemanticViolation::InvalidRemoteAddr { index }),
        None => Ok(()),
    }
}

/// Reads an address field that holds either one address or a list.
/// Non-string entries read as empty.
pub(crate) fn addresses(value: &Value) -> Vec<&str> {
    match value {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items.iter().map(|v| v.as_str().unwrap_or("")).collect(),
        _ => vec![""],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_addresses() {
        assert!(check_remote_addr(&["127.0.0.1", "192.168.1.1"]).is_ok());
        assert!(check_remote_addr(&["10.0.0.0/8"]).is_ok());
        assert!(check_remote_addr::<&str>(&[]).is_ok());
    }

    #[test]
    fn test_empty_address() {
        assert_eq!(
            check_remote_addr(&[""]),
            Err(SemanticViolation::InvalidRemoteAddr { index: 0 })
        );
        assert_eq!(
            check_remote_addr(&["127.0.0.1".to_string(), String::new()]),
            Err(SemanticViolation::InvalidRemoteAddr { index: 1 })
        );
    }

    #[test]
    fn test_addresses_forms() {
        assert_eq!(addresses(&json!("127.0.0.1")), vec!["127.0.0.1"]);
        assert_eq!(addresses(&json!(["a", 1])), vec!["a", ""]);
        assert_eq!(addresses(&json!(null)), vec![""]);
    }
}
