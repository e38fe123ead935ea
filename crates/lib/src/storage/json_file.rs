//! Storage writing the document as pretty JSON to a file.

use std::{
    fs::{self, File},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use super::{Storage, StorageError};
use crate::{Result, tree::Element};

/// The current file format version.
/// v0 indicates this is an unstable format subject to breaking changes.
const FILE_FORMAT_VERSION: u8 = 0;

fn is_v0(v: &u8) -> bool {
    *v == 0
}

fn validate_format_version<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let version = u8::deserialize(deserializer)?;
    if version != FILE_FORMAT_VERSION {
        return Err(serde::de::Error::custom(format!(
            "unsupported file format version {version}; only version {FILE_FORMAT_VERSION} is supported"
        )));
    }
    Ok(version)
}

#[derive(Serialize, Deserialize)]
struct StoredDocument<D> {
    #[serde(
        rename = "_v",
        default,
        skip_serializing_if = "is_v0",
        deserialize_with = "validate_format_version"
    )]
    version: u8,
    document: D,
}

/// A JSON file holding the whole document.
///
/// Saves go to a sibling temporary file that is flushed to disk and renamed
/// over the target, so readers never see a partially written document.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temporary_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Storage for JsonFile {
    fn load(&self) -> Result<Option<Element>> {
        match fs::read_to_string(&self.path) {
            Ok(json) => {
                let stored: StoredDocument<Element> = serde_json::from_str(&json)
                    .map_err(|source| StorageError::DeserializationFailed { source })?;
                Ok(Some(stored.document))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::FileIo { source }.into()),
        }
    }

    fn save(&self, document: &Element) -> Result<()> {
        let stored = StoredDocument {
            version: FILE_FORMAT_VERSION,
            document,
        };
        let json = serde_json::to_string_pretty(&stored)
            .map_err(|source| StorageError::SerializationFailed { source })?;
        let temporary = self.temporary_path();
        let written = write_synced(&temporary, json.as_bytes())
            .and_then(|()| fs::rename(&temporary, &self.path));
        if let Err(source) = written {
            if let Err(err) = fs::remove_file(&temporary)
                && err.kind() != ErrorKind::NotFound
            {
                warn!(path = %temporary.display(), error = %err, "Could not remove temporary file");
            }
            return Err(StorageError::FileIo { source }.into());
        }
        debug!(path = %self.path.display(), "Document written");
        Ok(())
    }
}

fn write_synced(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(contents)?;
    file.sync_all()
}
