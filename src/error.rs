use thiserror::Error;

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error(transparent)]
    Shutter(#[from] shutter::ShutterError),

    #[error("{} is not set", shutter::config::ACCESS_KEY_ENV)]
    MissingAccessKey,

    #[error("browse stopped: {0}")]
    Browse(String),

    #[error("likes failed: {0}")]
    Likes(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
