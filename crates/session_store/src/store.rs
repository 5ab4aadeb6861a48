use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use assistant_service::Thread;

use crate::error::SessionStoreError;
use crate::paths::{store_path, temp_sibling};
use crate::schema::StoreRecord;

/// Whether the active thread came from disk or was just created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadOrigin {
    Loaded,
    Created,
}

/// File-backed record of the single active conversation thread.
#[derive(Debug, Clone)]
pub struct ThreadStore {
    path: PathBuf,
}

impl ThreadStore {
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn in_dir(cwd: &Path) -> Self {
        Self::at(store_path(cwd))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the persisted thread. A missing file is `Ok(None)`; a corrupt one is an error
    /// and is left on disk.
    pub fn load(&self) -> Result<Option<Thread>, SessionStoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SessionStoreError::io("reading thread record", &self.path, source));
            }
        };

        let record = serde_json::from_slice::<StoreRecord>(&bytes)
            .map_err(|source| SessionStoreError::json_parse(&self.path, source))?;
        validate_record(&self.path, &record)?;

        Ok(Some(record.thread))
    }

    /// Writes the record through a temporary sibling file and an atomic rename.
    pub fn save(&self, thread: &Thread) -> Result<(), SessionStoreError> {
        let record = StoreRecord::new(thread.clone());
        validate_record(&self.path, &record)?;

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| {
                SessionStoreError::io("creating thread record directory", parent, source)
            })?;
        }

        let mut payload = serde_json::to_vec_pretty(&record)
            .map_err(|source| SessionStoreError::json_serialize(&self.path, source))?;
        payload.push(b'\n');

        let temp_path = temp_sibling(&self.path);
        let write_result = fs::File::create(&temp_path)
            .and_then(|mut file| {
                file.write_all(&payload)?;
                file.sync_all()
            })
            .map_err(|source| SessionStoreError::io("writing thread record", &temp_path, source));
        if let Err(error) = write_result {
            let _ = fs::remove_file(&temp_path);
            return Err(error);
        }

        fs::rename(&temp_path, &self.path).map_err(|source| {
            let _ = fs::remove_file(&temp_path);
            SessionStoreError::io("replacing thread record", &self.path, source)
        })
    }

    /// Loads the persisted thread, or calls `create` once and persists its result.
    ///
    /// An unparseable or empty-id record is replaced by the newly created thread.
    pub fn load_or_create<F, E>(&self, create: F) -> Result<(Thread, ThreadOrigin), E>
    where
        F: FnOnce() -> Result<Thread, E>,
        E: From<SessionStoreError>,
    {
        match self.load() {
            Ok(Some(thread)) => return Ok((thread, ThreadOrigin::Loaded)),
            Ok(None) => {}
            Err(
                error @ (SessionStoreError::JsonParse { .. }
                | SessionStoreError::EmptyThreadId { .. }),
            ) => {
                tracing::warn!(path = %self.path.display(), %error, "replacing unreadable thread record");
            }
            Err(error) => return Err(error.into()),
        }

        let thread = create()?;
        self.save(&thread)?;
        Ok((thread, ThreadOrigin::Created))
    }
}

fn validate_record(path: &Path, record: &StoreRecord) -> Result<(), SessionStoreError> {
    if record.thread.id.trim().is_empty() {
        return Err(SessionStoreError::EmptyThreadId {
            path: path.to_path_buf(),
        });
    }

    Ok(())
}
