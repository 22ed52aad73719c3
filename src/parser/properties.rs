//! Key/value property files referenced by `<property src>`.
//!
//! The format is line based:
//!
//! ```text
//! # comment
//! ! also a comment
//! home = London
//! key: ${home} City
//! ```
//!
//! Keys and values are trimmed. Lines without a separator are skipped.

use crate::error::{Error, Result};
use std::fs;
use std::io;
use std::path::Path;

/// Parse property file content into entries, in file order.
pub fn parse_properties(text: &str) -> Vec<(String, String)> {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let mut entries = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }

        let Some(split) = line.find(['=', ':']) else {
            log::debug!("Skipping property line {} without separator", line_no + 1);
            continue;
        };
        let key = line[..split].trim();
        if key.is_empty() {
            continue;
        }
        let value = line[split + 1..].trim();
        entries.push((key.to_string(), value.to_string()));
    }

    entries
}

/// Load a property file.
///
/// A missing file is reported as [`Error::NotFound`] with its path.
pub fn load_properties(path: &Path) -> Result<Vec<(String, String)>> {
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::NotFound(path.to_path_buf()),
        _ => Error::Io(e),
    })?;
    let entries = parse_properties(&text);
    log::debug!("Loaded {} properties from {}", entries.len(), path.display());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_properties() {
        let text = "# header\n\nhome = London\nkey: ${home} City\n! note\nurl=http://x/y?a=b\nbroken line\n";
        let entries = parse_properties(text);
        assert_eq!(
            entries,
            vec![
                ("home".to_string(), "London".to_string()),
                ("key".to_string(), "${home} City".to_string()),
                ("url".to_string(), "http://x/y?a=b".to_string()),
            ]
        );
    }

    #[test]
    fn test_load_properties() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "title=Guide").unwrap();
        let entries = load_properties(file.path()).unwrap();
        assert_eq!(entries, vec![("title".to_string(), "Guide".to_string())]);
    }

    #[test]
    fn test_load_missing_properties() {
        let err = load_properties(Path::new("/nonexistent/folio.properties")).unwrap_err();
        assert!(matches!(err, Error::NotFound(p) if p.ends_with("folio.properties")));
    }
}
