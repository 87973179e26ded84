use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to binding cache failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected http response from binding cache: {0}")]
    UnexpectedStatus(u16),
}
