use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid retry policy: {0}")]
    InvalidPolicy(String),

    #[error("Config error: {error}\nMsg: {msg}")]
    Config {
        error: serde_json::Error,
        msg: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
