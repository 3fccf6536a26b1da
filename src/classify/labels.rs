//! Class label loading.

use std::path::Path;

use super::types::ClassifyError;

/// Load class labels from a text file, one label per class index.
///
/// Blank lines are skipped; surrounding whitespace is trimmed. The line
/// number (after skipping blanks) is the class index the model's output
/// vector is matched against.
pub fn load_labels(path: &Path) -> Result<Vec<String>, ClassifyError> {
    let content = std::fs::read_to_string(path).map_err(|e| ClassifyError::Labels {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_labels_trims_and_skips_blanks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tench").unwrap();
        writeln!(file, "  goldfish  ").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "great white shark").unwrap();

        let labels = load_labels(file.path()).unwrap();
        assert_eq!(labels, vec!["tench", "goldfish", "great white shark"]);
    }

    #[test]
    fn test_load_labels_missing_file() {
        let result = load_labels(Path::new("/nonexistent/labels.txt"));
        assert!(matches!(result, Err(ClassifyError::Labels { .. })));
    }
}
