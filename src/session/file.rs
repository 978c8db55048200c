use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::{format_history, push_bounded, Exchange, SessionStore};
use crate::error::{Result, SyllabusError};

/// Sessions persisted as one TOML file each.
///
/// # Example
/// ```no_run
/// use syllabus::session::{FileSessionStore, SessionStore};
///
/// let store = FileSessionStore::new("/tmp/syllabus-sessions", 2);
/// let id = store.create_session()?;
/// store.append_exchange(&id, "What is MCP?", "An open protocol.")?;
/// # Ok::<(), syllabus::SyllabusError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    base_dir: PathBuf,
    max_history: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionFile {
    version: u32,
    session_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    exchanges: Vec<Exchange>,
}

impl SessionFile {
    fn new(session_id: &str) -> Self {
        let now = Utc::now();
        Self {
            version: 1,
            session_id: session_id.to_string(),
            created_at: now,
            updated_at: now,
            exchanges: Vec::new(),
        }
    }
}

impl FileSessionStore {
    pub fn new(base_dir: impl Into<PathBuf>, max_history: usize) -> Self {
        Self {
            base_dir: base_dir.into(),
            max_history,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn session_path(&self, session_id: &str) -> Result<PathBuf> {
        let valid = !session_id.is_empty()
            && session_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(SyllabusError::Session(format!("invalid session id: {session_id:?}")));
        }
        Ok(self.base_dir.join(format!("{session_id}.toml")))
    }

    fn load(&self, session_id: &str) -> Result<Option<SessionFile>> {
        let path = self.session_path(session_id)?;
        let raw = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        toml::from_str(&raw)
            .map(Some)
            .map_err(|e| SyllabusError::Session(format!("{}: {e}", path.display())))
    }

    fn save(&self, file: &SessionFile) -> Result<()> {
        let path = self.session_path(&file.session_id)?;
        fs::create_dir_all(&self.base_dir)?;
        let serialized =
            toml::to_string(file).map_err(|e| SyllabusError::Session(e.to_string()))?;
        fs::write(&path, serialized)?;
        debug!(path = %path.display(), "saved session");
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn create_session(&self) -> Result<String> {
        let id = format!("session_{}", Uuid::new_v4().simple());
        self.save(&SessionFile::new(&id))?;
        Ok(id)
    }

    fn get_history(&self, session_id: &str) -> Result<Option<String>> {
        Ok(self
            .load(session_id)?
            .and_then(|file| format_history(&file.exchanges)))
    }

    fn append_exchange(&self, session_id: &str, query: &str, answer: &str) -> Result<()> {
        let mut file = self
            .load(session_id)?
            .unwrap_or_else(|| SessionFile::new(session_id));
        push_bounded(&mut file.exchanges, Exchange::new(query, answer), self.max_history);
        file.updated_at = Utc::now();
        self.save(&file)
    }

    fn clear(&self, session_id: &str) -> Result<()> {
        match self.load(session_id)? {
            Some(mut file) => {
                file.exchanges.clear();
                file.updated_at = Utc::now();
                self.save(&file)
            }
            None => Ok(()),
        }
    }
}
