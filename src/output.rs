//! Serialization and size capping of tool answers.

use crate::error::ToolError;
use serde::Serialize;

/// Serialize an answer as compact JSON, keeping map keys in insertion order.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ToolError> {
    serde_json::to_string(value)
        .map_err(|e| ToolError::validation(format!("failed to serialize answer: {e}")))
}

/// Cut `answer` to `max_chars` characters and append a marker saying so.
///
/// A non-positive `max_chars` means unlimited.
pub fn limit_length(answer: String, max_chars: i64) -> String {
    let Ok(max) = usize::try_from(max_chars) else {
        return answer;
    };
    if max == 0 {
        return answer;
    }

    match answer.char_indices().nth(max) {
        None => answer,
        Some((cut, _)) => {
            let total = answer.chars().count();
            let mut truncated = answer;
            truncated.truncate(cut);
            truncated.push_str(&format!("\n... [truncated: {max} of {total} characters shown]"));
            truncated
        }
    }
}
