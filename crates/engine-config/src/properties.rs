use crate::error::ConfigError;
use std::{collections::HashMap, fs, path::Path};

/// Reads a `key=value` properties file.
pub fn load_properties(path: impl AsRef<Path>) -> Result<HashMap<String, String>, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_properties(&content)
}

/// Parses properties text: one `key=value` per line, `#` and `!` start
/// comments, values may be wrapped in single or double quotes. Later
/// definitions of a key replace earlier ones.
pub fn parse_properties(content: &str) -> Result<HashMap<String, String>, ConfigError> {
    let mut props = HashMap::new();

    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(ConfigError::Syntax {
                line: line_num + 1,
                reason: "expected key=value".to_string(),
            });
        };

        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError::Syntax {
                line: line_num + 1,
                reason: "empty key".to_string(),
            });
        }

        props.insert(key.to_string(), unquote(value));
    }

    Ok(props)
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    let quoted = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')));
    if quoted {
        value[1..value.len() - 1].to_string()
    } else {
        value.to_string()
    }
}
