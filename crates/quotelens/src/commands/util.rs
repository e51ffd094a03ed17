//! Shared helpers for command handlers.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::CliError;

/// Parse repeated `-p key=value` flags into a parameter map.
///
/// Values that parse as JSON are kept typed (`-p count=10` is a number,
/// `-p depth=true` a bool); anything else is taken as a string.
pub fn parse_params(pairs: &[String]) -> Result<BTreeMap<String, Value>, CliError> {
    let mut params = BTreeMap::new();
    for pair in pairs {
        let (key, value) = pair.split_once('=').ok_or_else(|| CliError::Validation {
            field: "param".into(),
            reason: format!("expected key=value, got '{pair}'"),
        })?;
        if key.is_empty() {
            return Err(CliError::Validation {
                field: "param".into(),
                reason: format!("empty key in '{pair}'"),
            });
        }
        let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.into()));
        params.insert(key.to_owned(), value);
    }
    Ok(params)
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn params_parse_typed_json_values() {
        let params =
            parse_params(&["pair=XBTUSD".into(), "count=10".into(), "deep=true".into()]).unwrap();
        assert_eq!(params["pair"], json!("XBTUSD"));
        assert_eq!(params["count"], json!(10));
        assert_eq!(params["deep"], json!(true));
    }

    #[test]
    fn value_may_contain_equals() {
        let params = parse_params(&["filter=a=b".into()]).unwrap();
        assert_eq!(params["filter"], json!("a=b"));
    }

    #[test]
    fn missing_separator_is_rejected() {
        assert!(parse_params(&["justakey".into()]).is_err());
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(parse_params(&["=value".into()]).is_err());
    }
}
