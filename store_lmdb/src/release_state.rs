//! LMDB implementation of ReleaseStateStorage.

use std::sync::Arc;

use heed::types::{Bytes, Str};
use heed::{Database, Env};

use fedsync_store::{ReleaseState, ReleaseStateStorage, StoreError};
use fedsync_types::NetworkId;

use crate::LmdbError;

/// Leading byte of every stored record.
const RECORD_VERSION: u8 = 1;

#[derive(Clone)]
pub struct LmdbReleaseStateStore {
    pub(crate) env: Arc<Env>,
    pub(crate) release_state_db: Database<Str, Bytes>,
}

fn encode(state: &ReleaseState) -> Result<Vec<u8>, LmdbError> {
    let mut bytes = vec![RECORD_VERSION];
    bytes.extend(bincode::serialize(state)?);
    Ok(bytes)
}

fn decode(bytes: &[u8]) -> Result<ReleaseState, LmdbError> {
    match bytes.split_first() {
        Some((&RECORD_VERSION, body)) => bincode::deserialize(body)
            .map_err(|e| LmdbError::Corruption(format!("undecodable release state: {e}"))),
        Some((version, _)) => Err(LmdbError::Corruption(format!(
            "unknown release state version {version}"
        ))),
        None => Err(LmdbError::Corruption("empty release state record".into())),
    }
}

impl ReleaseStateStorage for LmdbReleaseStateStore {
    fn read(&self, network: NetworkId) -> Result<ReleaseState, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .release_state_db
            .get(&rtxn, network.as_str())
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => Ok(decode(bytes)?),
            None => Ok(ReleaseState::default()),
        }
    }

    fn write(&self, network: NetworkId, state: &ReleaseState) -> Result<(), StoreError> {
        let bytes = encode(state)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.release_state_db
            .put(&mut wtxn, network.as_str(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        tracing::trace!(
            network = network.as_str(),
            entries = state.release_hashes.len(),
            "release state written"
        );
        Ok(())
    }
}
