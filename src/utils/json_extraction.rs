//! JSON extraction from LLM responses.
//!
//! The planner and architect stages ask the model for strict JSON, but real
//! responses often wrap it in markdown fences or lead with prose. This module
//! recovers the JSON payload with a small ladder of strategies:
//!
//! 1. ```json code fences
//! 2. generic ``` code fences
//! 3. direct JSON (content starts with '{' or '[')
//! 4. first balanced object/array anywhere in the content
//!
//! Candidates are only accepted if they parse as JSON. When a payload starts
//! but never closes, the result reports truncation instead of "not found" so
//! the caller can produce a useful parse error.

use regex::Regex;

/// Result of a JSON extraction attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonExtraction {
    /// A validated JSON string was recovered.
    Success(String),
    /// JSON started but the structure never closed.
    Truncated {
        partial_json: String,
        unclosed_braces: usize,
        unclosed_brackets: usize,
    },
    /// No JSON-like content found.
    NotFound,
}

impl JsonExtraction {
    pub fn is_success(&self) -> bool {
        matches!(self, JsonExtraction::Success(_))
    }

    /// Renders the non-success cases as a short parse-error message.
    pub fn describe_failure(&self, content: &str) -> String {
        match self {
            JsonExtraction::Success(_) => String::new(),
            JsonExtraction::Truncated {
                partial_json,
                unclosed_braces,
                unclosed_brackets,
            } => {
                let preview: String = partial_json.chars().take(100).collect();
                format!(
                    "JSON truncated: {} unclosed braces, {} unclosed brackets. Partial: {}...",
                    unclosed_braces, unclosed_brackets, preview
                )
            }
            JsonExtraction::NotFound => {
                let preview: String = content.trim().chars().take(60).collect();
                format!("No JSON found in response. Content starts with: '{}'", preview)
            }
        }
    }
}

/// Brace/bracket balance of a candidate string, string-literal aware.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Balance {
    unclosed_braces: usize,
    unclosed_brackets: usize,
    in_string: bool,
}

fn analyze_balance(s: &str) -> Balance {
    let mut braces: isize = 0;
    let mut brackets: isize = 0;
    let mut in_string = false;
    let mut escaped = false;

    for c in s.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => braces += 1,
            '[' if !in_string => brackets += 1,
            '}' if !in_string => braces -= 1,
            ']' if !in_string => brackets -= 1,
            _ => {}
        }
    }

    Balance {
        unclosed_braces: braces.max(0) as usize,
        unclosed_brackets: brackets.max(0) as usize,
        in_string,
    }
}

/// Byte index of the character that closes the object/array opening at
/// position 0, or `None` if the structure never balances.
fn find_balanced_end(s: &str) -> Option<usize> {
    let mut depth: isize = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' | '[' if !in_string => depth += 1,
            '}' | ']' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn validate(candidate: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(candidate)
        .ok()
        .map(|_| candidate.to_string())
}

fn extract_from_fence(content: &str, tagged: bool) -> Option<String> {
    // (?s) so the body may span lines; the tag line may carry "json" or not.
    let pattern = if tagged {
        r"(?s)```(?:json|JSON)\s*\n(.*?)```"
    } else {
        r"(?s)```\s*\n(.*?)```"
    };
    let re = Regex::new(pattern).expect("fence regex is valid");
    re.captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Extracts JSON from an LLM response, reporting truncation when the payload
/// starts but never closes.
pub fn try_extract_json(content: &str) -> JsonExtraction {
    let trimmed = content.trim();

    // Fenced blocks first: the most reliable signal when present.
    for tagged in [true, false] {
        if let Some(body) = extract_from_fence(trimmed, tagged) {
            if let Some(json) = validate(&body) {
                return JsonExtraction::Success(json);
            }
        }
    }

    // Direct JSON, or the first balanced structure anywhere in the content.
    let start = match (trimmed.find('{'), trimmed.find('[')) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };

    if let Some(start) = start {
        let tail = &trimmed[start..];
        if let Some(end) = find_balanced_end(tail) {
            if let Some(json) = validate(&tail[..=end]) {
                return JsonExtraction::Success(json);
            }
        }
        let balance = analyze_balance(tail);
        if balance.unclosed_braces > 0 || balance.unclosed_brackets > 0 || balance.in_string {
            return JsonExtraction::Truncated {
                partial_json: tail.to_string(),
                unclosed_braces: balance.unclosed_braces,
                unclosed_brackets: balance.unclosed_brackets,
            };
        }
    }

    JsonExtraction::NotFound
}

/// Convenience wrapper: extracted JSON, or the trimmed input when nothing
/// better was found (lets serde produce the final error message).
pub fn extract_json(content: &str) -> String {
    match try_extract_json(content) {
        JsonExtraction::Success(json) => json,
        JsonExtraction::Truncated { partial_json, .. } => partial_json,
        JsonExtraction::NotFound => content.trim().to_string(),
    }
}
