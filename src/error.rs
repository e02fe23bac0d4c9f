/// Error types for storage, image ingestion and publishing

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not determine user data directory")]
    DataDirUnavailable,
    #[error("failed to create storage directory: {0}")]
    DirCreation(std::io::Error),
    #[error("storage error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("failed to serialize drafts: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read image file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to decode image: {0}")]
    Decode(image::ImageError),
    #[error("failed to encode image: {0}")]
    Encode(image::ImageError),
    #[error("background task failed: {0}")]
    Join(String),
    #[error("failed to fetch remote image: {0}")]
    Fetch(#[from] reqwest::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("no publish endpoint configured")]
    MissingEndpoint,
    #[error("a title is required before publishing")]
    MissingTitle,
    #[error("no draft is open")]
    NoCurrentDraft,
    #[error("failed to send request: {0}")]
    Transport(#[from] reqwest::Error),
}
