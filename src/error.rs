use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersonaError {
    #[error("Malformed persona state: {0}")]
    StorageParse(#[from] serde_json::Error),

    #[error("Failed to read persona state: {0}")]
    StorageRead(std::io::Error),

    #[error("Failed to write persona state: {0}")]
    StorageWrite(std::io::Error),
}

pub type Result<T> = std::result::Result<T, PersonaError>;
