use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

use crate::error::CurateError;

const ALLOWED_EXTS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "bmp", "tiff"];

/// Recursively walk `dir`, returning the image file paths in sorted order.
/// Paths under `exclude` (the removed store) are never returned, so a
/// re-run over an already-curated folder only sees the survivors.
pub fn scan_directory(dir: &Path, exclude: Option<&Path>) -> Result<Vec<PathBuf>, CurateError> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Scanning for images…");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let mut images = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("Skipping unreadable directory entry: {err}");
                continue;
            }
        };
        let path = entry.path();
        if let Some(skip) = exclude {
            if path.starts_with(skip) {
                continue;
            }
        }
        if path.is_file() && has_image_extension(path) {
            images.push(path.to_path_buf());
        }
        spinner.tick();
    }
    spinner.finish_with_message("Scan complete");

    // Sorted order keeps pair indices, grouping and tie-breaks deterministic.
    images.sort();
    Ok(images)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ALLOWED_EXTS.contains(&ext.to_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn finds_only_image_extensions() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        fs::write(dir.path().join("b.PNG"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let found = scan_directory(dir.path(), None).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn skips_the_excluded_store() {
        let dir = TempDir::new().unwrap();
        let removed = dir.path().join("removed");
        fs::create_dir(&removed).unwrap();
        fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        fs::write(removed.join("b.jpg"), b"x").unwrap();

        let found = scan_directory(dir.path(), Some(&removed)).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("a.jpg"));
    }

    #[test]
    fn output_is_sorted() {
        let dir = TempDir::new().unwrap();
        for name in ["c.jpg", "a.jpg", "b.jpg"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        let found = scan_directory(dir.path(), None).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.jpg", "b.jpg", "c.jpg"]);
    }
}
