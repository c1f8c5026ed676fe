//! JSON persistence for fetch state and the event store.
//!
//! Both files use atomic replace-on-write (write to a sibling `.tmp`,
//! then rename) so an interrupted run never corrupts what was on
//! disk. A missing file is an empty starting point; an unreadable or
//! unparseable one is fatal.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::StateError;
use crate::fingerprint::FetchState;
use crate::reconcile::EventStore;
use crate::types::Event;

/// Load persisted fetch state, or a fresh one if the file is absent.
pub fn load_state(path: &Path) -> Result<FetchState, StateError> {
    match fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents).map_err(|source| StateError::Corrupt {
            path: path.to_path_buf(),
            source,
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No fetch state on disk, starting fresh");
            Ok(FetchState::new())
        }
        Err(source) => Err(StateError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Persist fetch state atomically.
pub fn save_state(path: &Path, state: &FetchState) -> Result<(), StateError> {
    let json = serde_json::to_string_pretty(state).map_err(|source| StateError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    atomic_write(path, json.as_bytes())
}

/// Load the persisted event store, or an empty one if absent.
pub fn load_events(path: &Path) -> Result<EventStore, StateError> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let events: Vec<Event> =
                serde_json::from_str(&contents).map_err(|source| StateError::Corrupt {
                    path: path.to_path_buf(),
                    source,
                })?;
            Ok(EventStore::from_events(events))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No event store on disk, starting fresh");
            Ok(EventStore::new())
        }
        Err(source) => Err(StateError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Persist the event store atomically.
pub fn save_events(path: &Path, store: &EventStore) -> Result<(), StateError> {
    let json =
        serde_json::to_string_pretty(store.events()).map_err(|source| StateError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
    atomic_write(path, json.as_bytes())
}

/// Write to `<path>.tmp` then rename over the target.
fn atomic_write(path: &Path, contents: &[u8]) -> Result<(), StateError> {
    let io_err = |source| StateError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, contents).map_err(io_err)?;
    fs::rename(&tmp_path, path).map_err(io_err)?;
    Ok(())
}
