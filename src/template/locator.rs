//! Template lookup across an ordered list of search directories.

use crate::error::{RelayError, Result};
use std::path::{Path, PathBuf};

/// A template file found on disk, with its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTemplate {
    pub path: PathBuf,
    pub raw_text: String,
}

/// Append `.{extension}` to `name` unless it already ends with it.
pub fn template_file_name(name: &str, extension: &str) -> String {
    let suffix = format!(".{}", extension);
    if name.ends_with(&suffix) {
        name.to_string()
    } else {
        format!("{}{}", name, suffix)
    }
}

/// Find `name` in the first directory of `search_dirs` that contains it.
///
/// Directories are probed strictly in order and later directories are not
/// consulted once a match is found.
pub fn locate(name: &str, search_dirs: &[PathBuf], extension: &str) -> Result<ResolvedTemplate> {
    let file_name = template_file_name(name, extension);

    let path = search_dirs
        .iter()
        .map(|dir| dir.join(&file_name))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| RelayError::TemplateNotFound {
            name: file_name.clone(),
            searched: search_dirs.to_vec(),
        })?;

    let raw_text = read_template(&path)?;
    Ok(ResolvedTemplate { path, raw_text })
}

fn read_template(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        RelayError::UserError(format!(
            "failed to read prompt file '{}': {}",
            path.display(),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn two_dirs(temp_dir: &TempDir) -> Vec<PathBuf> {
        let first = temp_dir.path().join("prompts");
        let second = temp_dir.path().join("agents");
        std::fs::create_dir_all(&first).unwrap();
        std::fs::create_dir_all(&second).unwrap();
        vec![first, second]
    }

    #[test]
    fn test_extension_is_appended_once() {
        assert_eq!(template_file_name("review", "md"), "review.md");
        assert_eq!(template_file_name("review.md", "md"), "review.md");
        assert_eq!(template_file_name("notes.txt", "md"), "notes.txt.md");
    }

    #[test]
    fn test_match_in_second_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = two_dirs(&temp_dir);
        std::fs::write(dirs[1].join("review.md"), "second").unwrap();

        let found = locate("review.md", &dirs, "md").unwrap();

        assert_eq!(found.path, dirs[1].join("review.md"));
        assert_eq!(found.raw_text, "second");
    }

    #[test]
    fn test_first_directory_wins() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = two_dirs(&temp_dir);
        std::fs::write(dirs[0].join("review.md"), "first").unwrap();
        std::fs::write(dirs[1].join("review.md"), "second").unwrap();

        let found = locate("review", &dirs, "md").unwrap();

        assert_eq!(found.raw_text, "first");
    }

    #[test]
    fn test_missing_directory_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let mut dirs = two_dirs(&temp_dir);
        dirs.insert(0, temp_dir.path().join("does-not-exist"));
        std::fs::write(dirs[2].join("spec-writer.md"), "x").unwrap();

        let found = locate("spec-writer", &dirs, "md").unwrap();
        assert_eq!(found.path, dirs[2].join("spec-writer.md"));
    }

    #[test]
    fn test_directory_with_template_name_is_not_a_match() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = two_dirs(&temp_dir);
        std::fs::create_dir_all(dirs[0].join("review.md")).unwrap();
        std::fs::write(dirs[1].join("review.md"), "file").unwrap();

        let found = locate("review", &dirs, "md").unwrap();
        assert_eq!(found.raw_text, "file");
    }

    #[test]
    fn test_not_found_carries_search_list() {
        let temp_dir = TempDir::new().unwrap();
        let dirs = two_dirs(&temp_dir);

        let err = locate("auditor", &dirs, "md").unwrap_err();

        match err {
            RelayError::TemplateNotFound { name, searched } => {
                assert_eq!(name, "auditor.md");
                assert_eq!(searched, dirs);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
