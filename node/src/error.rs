use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("release storage error: {0}")]
    Accessor(#[from] fedsync_release::AccessorError),

    #[error("store error: {0}")]
    Store(#[from] fedsync_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] fedsync_store_lmdb::LmdbError),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("background task failed: {0}")]
    Task(String),
}
