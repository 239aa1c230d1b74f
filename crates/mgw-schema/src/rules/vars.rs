//! Route filter expressions (`vars`).
//!
//! Each expression is `[subject, operator, value]` or, negated,
//! `[subject, "!", operator, value]`:
//!
//! ```json
//! [["arg_id", "==", "123"], ["http_x_header", "!", "~~", "test.*"]]
//! ```

use serde_json::Value;

use crate::error::SemanticViolation;

/// Comparison operators the gateway evaluates.
pub const VARS_OPERATORS: &[&str] = &[
    "==", "~=", ">", ">=", "<", "<=", "~~", "~*", "in", "has", "ipmatch", "IN", "HAS", "IPMATCH",
];

/// Negation marker in the four-element form.
pub const NEGATION: &str = "!";

/// Checks every expression in order and reports the first bad one.
pub fn check_vars(vars: &[Value]) -> Result<(), SemanticViolation> {
    for (index, item) in vars.iter().enumerate() {
        let Some(item) = item.as_array() else {
            return Err(SemanticViolation::VarsGrammar {
                index,
                reason: "expression must be an array".to_string(),
            });
        };
        validate_var_item(item)
            .map_err(|reason| SemanticViolation::VarsGrammar { index, reason })?;
    }
    Ok(())
}

/// Checks a single expression, returning the reason it is malformed.
pub fn validate_var_item(item: &[Value]) -> Result<(), String> {
    let (subject, operator, value) = match item {
        [subject, operator, value] => (subject, operator, value),
        [subject, negation, operator, value] => {
            if negation.as_str() != Some(NEGATION) {
                return Err(format!(
                    "second element of a four-element expression must be \"!\", got {negation}"
                ));
            }
            (subject, operator, value)
        }
        _ => {
            return Err(format!(
                "expression must have 3 or 4 elements, got {}",
                item.len()
            ))
        }
    };

    match subject.as_str() {
        Some(s) if !s.is_empty() => {}
        _ => return Err(format!("subject must be a non-empty string, got {subject}")),
    }

    match operator.as_str() {
        Some(op) if VARS_OPERATORS.contains(&op) => {}
        _ => return Err(format!("unknown operator {operator}")),
    }

    if value.is_null() {
        return Err("value must not be null".to_string());
    }

    Ok(())
}
