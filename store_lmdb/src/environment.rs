//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::{Bytes, Str};
use heed::{Database, Env, EnvOpenOptions};

use crate::{LmdbError, LmdbReleaseStateStore};

const RELEASE_STATE_DB: &str = "release_state";

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    release_state_db: Database<Str, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per directory by this
        // process and never memory-mapped elsewhere concurrently.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let release_state_db = env.create_database(&mut wtxn, Some(RELEASE_STATE_DB))?;
        wtxn.commit()?;

        tracing::debug!(path = %path.display(), "opened LMDB environment");

        Ok(Self {
            env: Arc::new(env),
            release_state_db,
        })
    }

    /// Handle implementing the release-state storage trait.
    pub fn release_state_store(&self) -> LmdbReleaseStateStore {
        LmdbReleaseStateStore {
            env: Arc::clone(&self.env),
            release_state_db: self.release_state_db,
        }
    }
}
