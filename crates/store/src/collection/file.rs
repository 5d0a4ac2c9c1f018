//! File-backed collection
//!
//! Layout: `{root}/{id}.json`, one extended-JSON document per file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use warden_document::{Document, ObjectId, ID_KEY};

use super::{assign_id, DocumentCollection};
use crate::CollectionError;

const EXTENSION: &str = "json";

/// Collection stored as a directory of JSON files.
///
/// Writes go to a temporary file that is renamed into place, so a reader
/// never observes a half-written document. Files that fail to parse are
/// skipped with a warning.
pub struct FileCollection {
    name: String,
    root: PathBuf,
}

impl FileCollection {
    /// Open (creating if needed) the collection directory
    pub fn open(name: impl Into<String>, root: impl Into<PathBuf>) -> Result<Self, CollectionError> {
        let name = name.into();
        let root = root.into();
        fs::create_dir_all(&root)?;
        tracing::debug!("Opened file collection {} at {:?}", name, root);
        Ok(Self { name, root })
    }

    /// Directory holding the documents
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &ObjectId) -> PathBuf {
        self.root.join(format!("{}.{}", id, EXTENSION))
    }

    fn read_document(&self, path: &Path) -> Option<Document> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Skipping unreadable document {:?}: {}", path, e);
                return None;
            }
        };

        let mut document = match Document::from_json_str(&text) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!("Skipping malformed document {:?}: {}", path, e);
                return None;
            }
        };

        // The file name is authoritative when the body lost its id
        if !document.contains_key(ID_KEY) {
            if let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<ObjectId>().ok())
            {
                document.insert(ID_KEY, id);
            }
        }
        Some(document)
    }
}

impl DocumentCollection for FileCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn find_all(&self) -> Result<Vec<Document>, CollectionError> {
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(EXTENSION))
            .collect();
        paths.sort();

        Ok(paths
            .iter()
            .filter_map(|path| self.read_document(path))
            .collect())
    }

    fn upsert(&self, mut document: Document) -> Result<ObjectId, CollectionError> {
        let id = assign_id(&mut document)?;
        let text = document.to_json_string()?;

        let path = self.path_for(&id);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &path)?;

        Ok(id)
    }

    fn delete(&self, id: &ObjectId) -> Result<bool, CollectionError> {
        match fs::remove_file(self.path_for(id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
