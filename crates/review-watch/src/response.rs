//! Shape checks for the homework API response.

use serde_json::Value;

use crate::error::{Result, WatchError};

/// Checks that a response is a mapping with a `homeworks` sequence and
/// returns that sequence.
///
/// An empty sequence is valid: it means nothing changed since the cursor.
///
/// # Examples
///
/// ```
/// use review_watch::check_response;
/// use serde_json::json;
///
/// let response = json!({"homeworks": [], "current_date": 1000});
/// assert!(check_response(&response).unwrap().is_empty());
///
/// assert!(check_response(&json!([])).is_err());
/// ```
pub fn check_response(response: &Value) -> Result<&[Value]> {
    let Some(object) = response.as_object() else {
        return Err(WatchError::schema(format!(
            "expected a JSON object, got {}",
            json_type(response)
        )));
    };

    let homeworks = object
        .get("homeworks")
        .ok_or_else(|| WatchError::schema("response has no 'homeworks' key"))?;

    homeworks.as_array().map(Vec::as_slice).ok_or_else(|| {
        WatchError::schema(format!(
            "'homeworks' is {}, expected an array",
            json_type(homeworks)
        ))
    })
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
