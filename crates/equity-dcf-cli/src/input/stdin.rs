use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Read a JSON request from stdin when data is being piped. Interactive
/// sessions (stdin is a TTY) and empty pipes yield `None` so flag-based
/// invocation still works.
pub fn read_stdin<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    Ok(Some(serde_json::from_str(trimmed)?))
}
