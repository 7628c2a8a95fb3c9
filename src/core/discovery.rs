use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions considered before any decode attempt. Matched case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Recursively walk `dir`, returning image file paths.
///
/// Entries are visited in file-name order so that first-seen wins during
/// deduplication is reproducible across filesystems. Unreadable entries are
/// skipped.
pub fn discover_images(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && is_image_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_is_image_file_extensions() {
        assert!(is_image_file(Path::new("a.jpg")));
        assert!(is_image_file(Path::new("a.png")));
        assert!(is_image_file(Path::new("a.webp")));
        assert!(is_image_file(Path::new("a.JPEG")));
        assert!(!is_image_file(Path::new("a.txt")));
        assert!(!is_image_file(Path::new("a.gif")));
        assert!(!is_image_file(Path::new("jpg")));
    }

    #[test]
    fn test_discover_images_recurses_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("nested/deeper")).unwrap();
        fs::write(root.join("b.JPG"), b"").unwrap();
        fs::write(root.join("a.png"), b"").unwrap();
        fs::write(root.join("notes.txt"), b"").unwrap();
        fs::write(root.join("nested/c.webp"), b"").unwrap();
        fs::write(root.join("nested/deeper/d.jpeg"), b"").unwrap();
        fs::create_dir(root.join("folder.jpg")).unwrap();

        let found: Vec<PathBuf> = discover_images(root)
            .into_iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            found,
            vec![
                PathBuf::from("a.png"),
                PathBuf::from("b.JPG"),
                PathBuf::from("nested/c.webp"),
                PathBuf::from("nested/deeper/d.jpeg"),
            ]
        );
    }

    #[test]
    fn test_discover_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_images(&dir.path().join("missing")).is_empty());
    }
}
