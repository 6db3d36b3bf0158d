//! JSON side data exposed to templates.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::builder::BuildError;

/// Template globals keyed by data file stem.
pub type DataMap = BTreeMap<String, Value>;

/// Load every `.json` file directly inside `dir`.
///
/// Subdirectories and other files are skipped. A missing directory yields an
/// empty map; a file that is not valid JSON is an error.
pub fn load_data(dir: &Path) -> Result<DataMap, BuildError> {
    let mut data = DataMap::new();

    if !dir.exists() {
        tracing::debug!("No data directory at {}", dir.display());
        return Ok(data);
    }

    let entries = fs::read_dir(dir)
        .map_err(|e| BuildError::ReadError(format!("{}: {}", dir.display(), e)))?;

    for entry in entries {
        let entry = entry.map_err(|e| BuildError::ReadError(format!("{}: {}", dir.display(), e)))?;
        let path = entry.path();

        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }

        let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
            tracing::warn!("Skipping data file with non UTF-8 name: {}", path.display());
            continue;
        };

        let content = fs::read_to_string(&path)
            .map_err(|e| BuildError::ReadError(format!("{}: {}", path.display(), e)))?;

        let value: Value = serde_json::from_str(&content).map_err(|e| BuildError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        tracing::debug!("Loaded data key '{}' from {}", key, path.display());
        data.insert(key.to_string(), value);
    }

    Ok(data)
}

/// Regroup array values into consecutive chunks of the configured size.
///
/// `{"projects": [a, b, c]}` with `projects = 2` becomes `{"projects": [[a, b], [c]]}`.
pub fn chunk_arrays(data: &mut DataMap, chunks: &BTreeMap<String, usize>) -> Result<(), BuildError> {
    for (key, &size) in chunks {
        if size == 0 {
            return Err(BuildError::DataError(format!(
                "chunk size for '{}' must be at least 1",
                key
            )));
        }

        let items = match data.get_mut(key) {
            Some(Value::Array(items)) => std::mem::take(items),
            Some(_) => {
                return Err(BuildError::DataError(format!(
                    "cannot chunk '{}': value is not an array",
                    key
                )))
            }
            None => {
                return Err(BuildError::DataError(format!(
                    "cannot chunk '{}': no such data key",
                    key
                )))
            }
        };

        let grouped = items
            .chunks(size)
            .map(|chunk| Value::Array(chunk.to_vec()))
            .collect();

        data.insert(key.clone(), Value::Array(grouped));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn keys_by_file_stem() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("site.json"), r#"{"name": "Home"}"#).unwrap();
        fs::write(temp.path().join("projects.json"), "[1, 2, 3]").unwrap();

        let data = load_data(temp.path()).unwrap();

        assert_eq!(data.len(), 2);
        assert_eq!(data["site"], json!({"name": "Home"}));
        assert_eq!(data["projects"], json!([1, 2, 3]));
    }

    #[test]
    fn skips_other_files_and_directories() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("notes.txt"), "not json").unwrap();
        fs::create_dir(temp.path().join("nested.json")).unwrap();
        fs::write(temp.path().join("a.json"), "true").unwrap();

        let data = load_data(temp.path()).unwrap();

        assert_eq!(data.keys().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn missing_directory_is_empty() {
        let temp = tempdir().unwrap();
        let data = load_data(&temp.path().join("data")).unwrap();

        assert!(data.is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("broken.json"), "{ nope").unwrap();

        let result = load_data(temp.path());

        assert!(matches!(result, Err(BuildError::ParseError { .. })));
    }

    #[test]
    fn chunks_arrays() {
        let mut data = DataMap::new();
        data.insert("projects".to_string(), json!(["a", "b", "c"]));

        let chunks = BTreeMap::from([("projects".to_string(), 2)]);
        chunk_arrays(&mut data, &chunks).unwrap();

        assert_eq!(data["projects"], json!([["a", "b"], ["c"]]));
    }

    #[test]
    fn chunking_a_non_array_fails() {
        let mut data = DataMap::new();
        data.insert("site".to_string(), json!({"name": "x"}));

        let chunks = BTreeMap::from([("site".to_string(), 2)]);

        assert!(matches!(
            chunk_arrays(&mut data, &chunks),
            Err(BuildError::DataError(_))
        ));
    }

    #[test]
    fn chunking_missing_key_fails() {
        let mut data = DataMap::new();
        let chunks = BTreeMap::from([("projects".to_string(), 2)]);

        assert!(chunk_arrays(&mut data, &chunks).is_err());
    }
}
