//! Catalog of imported images, keyed by file name.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::LoadError;
use crate::constants::IMAGE_EXTENSIONS;

/// Check if a filename has a supported image extension.
pub fn is_image_filename(name: &str) -> bool {
    let lower = name.to_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{}", ext)))
}

/// Where the bytes of an image come from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// File on disk
    Path(PathBuf),
    /// Encoded image already in memory
    Bytes(Arc<[u8]>),
}

/// Imported images, addressed by the identifier used for grouping.
#[derive(Debug, Clone, Default)]
pub struct ImageCatalog {
    sources: HashMap<String, ImageSource>,
    order: Vec<String>,
}

impl ImageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from files and folders.
    ///
    /// Files are added directly; folders are scanned non-recursively for
    /// supported image extensions. The identifier of each image is its
    /// file name.
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self, LoadError> {
        let mut catalog = Self::new();

        for path in paths {
            let path = path.as_ref();
            if path.is_dir() {
                let entries =
                    std::fs::read_dir(path).map_err(|e| LoadError::io(path.display(), e))?;
                let mut files: Vec<PathBuf> = entries
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.path())
                    .filter(|p| p.is_file() && Self::has_image_name(p))
                    .collect();
                files.sort();
                for file in files {
                    catalog.insert_path(file);
                }
            } else if path.is_file() {
                catalog.insert_path(path.to_path_buf());
            } else {
                log::warn!("Skipping {:?}: not a file or folder", path);
            }
        }

        if catalog.is_empty() {
            return Err(LoadError::NoImages);
        }

        log::info!(
            "Created catalog from {} paths: {} images",
            paths.len(),
            catalog.len()
        );
        Ok(catalog)
    }

    fn has_image_name(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(is_image_filename)
            .unwrap_or(false)
    }

    fn insert_path(&mut self, path: PathBuf) {
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
            log::warn!("Skipping {:?}: file name is not valid UTF-8", path);
            return;
        };
        self.insert(name, ImageSource::Path(path));
    }

    /// Add or replace an image.
    pub fn insert(&mut self, name: impl Into<String>, source: ImageSource) {
        let name = name.into();
        if self.sources.insert(name.clone(), source).is_some() {
            log::warn!("Image '{}' imported twice; keeping the later one", name);
        } else {
            self.order.push(name);
        }
    }

    /// Add an encoded image held in memory.
    pub fn insert_bytes(&mut self, name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.insert(name, ImageSource::Bytes(bytes.into()));
    }

    pub fn get(&self, name: &str) -> Option<&ImageSource> {
        self.sources.get(name)
    }

    /// Image identifiers in import order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
