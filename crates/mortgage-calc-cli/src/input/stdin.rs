use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Read a piped JSON or YAML document into a typed input.
/// Returns None if stdin is a TTY (interactive) or the pipe is empty.
pub fn read_stdin<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_piped(&buffer)
}

/// JSON when the document opens with `{` or `[`, YAML otherwise.
fn parse_piped<T: DeserializeOwned>(text: &str) -> Result<Option<T>, Box<dyn std::error::Error>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value: T = if trimmed.starts_with(|c| c == '{' || c == '[') {
        serde_json::from_str(trimmed).map_err(|e| format!("Failed to parse piped JSON: {}", e))?
    } else {
        serde_yaml::from_str(trimmed).map_err(|e| format!("Failed to parse piped YAML: {}", e))?
    };
    log::debug!("read {} bytes of input from stdin", trimmed.len());
    Ok(Some(value))
}
