use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}

pub type Result<T> = std::result::Result<T, CacheError>;
