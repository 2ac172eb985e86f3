use glob::Pattern;
use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};
use walkdir::WalkDir;

use crate::config::AuditConfig;
use crate::error::Error;
use crate::model::{DirectoryRecord, RecordMap};
use crate::progress::ProgressReporter;

pub const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "webp", "jfif", "bmp"];
pub const VIDEO_EXTENSIONS: [&str; 5] = ["mp4", "webm", "mov", "avi", "mkv"];
pub const METADATA_FILE_NAME: &str = "config.json";
const HERO_STEM: &str = "hero";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Video,
    Metadata,
    Other,
}

/// Classify a file by name. Extension matching is case-insensitive, the
/// metadata file name is not.
pub fn classify_file(path: &Path) -> FileKind {
    if path.file_name() == Some(OsStr::new(METADATA_FILE_NAME)) {
        return FileKind::Metadata;
    }
    let ext = match path.extension().and_then(OsStr::to_str) {
        Some(ext) => ext.to_lowercase(),
        None => return FileKind::Other,
    };
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        FileKind::Image
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        FileKind::Video
    } else {
        FileKind::Other
    }
}

fn is_hero(path: &Path) -> bool {
    path.file_stem()
        .and_then(OsStr::to_str)
        .is_some_and(|stem| stem.eq_ignore_ascii_case(HERO_STEM))
}

/// Depth-first walk of a content root producing one record per directory,
/// keyed by canonical identifier.
pub struct FilesystemScanner {
    root: PathBuf,
    excluded: Vec<Pattern>,
}

impl FilesystemScanner {
    pub fn new(root: impl Into<PathBuf>, excluded_dirs: &[String]) -> Self {
        let excluded = excluded_dirs
            .iter()
            .filter_map(|glob| match Pattern::new(glob) {
                Ok(p) => Some(p),
                Err(e) => {
                    error!("Invalid exclusion pattern '{}': {}", glob, e);
                    None
                }
            })
            .collect();

        Self {
            root: root.into(),
            excluded,
        }
    }

    pub fn from_config(config: &AuditConfig) -> Self {
        Self::new(&config.content_root, &config.excluded_dirs)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_excluded(&self, name: &OsStr) -> bool {
        let name = name.to_string_lossy();
        self.excluded.iter().any(|pattern| pattern.matches(&name))
    }

    /// Walk the whole tree. Only an unusable root is fatal; unreadable
    /// subdirectories are logged and skipped.
    pub fn scan(&self, reporter: &dyn ProgressReporter) -> Result<RecordMap, Error> {
        if !self.root.is_dir() {
            return Err(Error::ContentRootNotFound(self.root.clone()));
        }
        // Surface permission problems on the root itself as a setup error.
        fs::read_dir(&self.root)?;

        let mut map = RecordMap::new();

        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !(entry.file_type().is_dir() && self.is_excluded(entry.file_name())));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    warn!("Skipping unreadable path {}: {}", path, err);
                    continue;
                }
            };

            if !entry.file_type().is_dir() {
                continue;
            }

            let chain = self.identifier_chain(entry.path());
            if let Some(record) = self.scan_directory(entry.path(), chain) {
                let key = record.canonical_identifier();
                debug!(
                    "{} -> {} ({} images, {} videos)",
                    entry.path().display(),
                    key,
                    record.image_count,
                    record.video_count
                );
                if map.contains_key(&key) {
                    warn!(
                        "Canonical identifier '{}' already taken, keeping {} as an extra occurrence",
                        key,
                        entry.path().display()
                    );
                }
                map.insert(key, record);
                reporter.on_directory_scanned(map.record_count(), &entry.path().to_string_lossy());
            }
        }

        Ok(map)
    }

    fn identifier_chain(&self, dir: &Path) -> Vec<String> {
        dir.strip_prefix(&self.root)
            .unwrap_or(dir)
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect()
    }

    /// Build the record for one directory from its immediate children.
    /// Returns `None` when the directory cannot be listed.
    fn scan_directory(&self, dir: &Path, chain: Vec<String>) -> Option<DirectoryRecord> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("Cannot list directory {}: {}", dir.display(), err);
                return None;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.path()),
                Err(err) => {
                    warn!("Error reading entry in {}: {}", dir.display(), err);
                    None
                }
            })
            .collect();
        paths.sort();

        let mut record = DirectoryRecord {
            identifier: chain.last().cloned().unwrap_or_default(),
            parent_identifier: chain.len().checked_sub(2).map(|i| chain[i].clone()),
            location: Some(dir.to_path_buf()),
            path_identifier_chain: chain,
            ..DirectoryRecord::default()
        };

        for path in paths {
            let name = match path.file_name() {
                Some(name) => name.to_string_lossy().into_owned(),
                None => continue,
            };

            if path.is_dir() {
                if !self.is_excluded(OsStr::new(&name)) {
                    record.child_identifiers.push(name);
                }
                continue;
            }
            if !path.is_file() {
                continue;
            }

            match classify_file(&path) {
                FileKind::Image => {
                    if is_hero(&path) {
                        record.hero_asset = Some(name.clone());
                    }
                    record.image_names.push(name);
                }
                FileKind::Video => record.video_names.push(name),
                FileKind::Metadata => record.metadata = read_metadata(&path),
                FileKind::Other => {}
            }
        }

        record.image_count = record.image_names.len();
        record.video_count = record.video_names.len();
        record.child_count = record.child_identifiers.len();
        Some(record)
    }
}

/// Parse a `config.json`. Any failure is a warning and yields no metadata.
fn read_metadata(path: &Path) -> Option<Value> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            warn!("Failed to read {}: {}", path.display(), err);
            return None;
        }
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("Failed to parse {}: {}", path.display(), err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_file() {
        assert_eq!(classify_file(Path::new("a/hero.JPG")), FileKind::Image);
        assert_eq!(classify_file(Path::new("a/shot.jfif")), FileKind::Image);
        assert_eq!(classify_file(Path::new("a/clip.MkV")), FileKind::Video);
        assert_eq!(classify_file(Path::new("a/config.json")), FileKind::Metadata);
        assert_eq!(classify_file(Path::new("a/Config.json")), FileKind::Other);
        assert_eq!(classify_file(Path::new("a/notes.txt")), FileKind::Other);
        assert_eq!(classify_file(Path::new("a/README")), FileKind::Other);
    }

    #[test]
    fn test_hero_detection_ignores_case() {
        assert!(is_hero(Path::new("HERO.png")));
        assert!(is_hero(Path::new("Hero.webp")));
        assert!(!is_hero(Path::new("hero-2.png")));
        assert!(!is_hero(Path::new("superhero.png")));
    }

    #[test]
    fn test_exclusions_accept_globs() {
        let scanner = FilesystemScanner::new(
            "/tmp",
            &[".thumbnails".to_string(), "cache-*".to_string()],
        );
        assert!(scanner.is_excluded(OsStr::new(".thumbnails")));
        assert!(scanner.is_excluded(OsStr::new("cache-2024")));
        assert!(!scanner.is_excluded(OsStr::new("Couples")));
    }
}
