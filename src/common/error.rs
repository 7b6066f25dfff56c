use thiserror::Error as TError;

#[derive(TError, Debug)]
pub enum UpqueueError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Send(#[from] futures_channel::mpsc::SendError),

    #[cfg(target_arch = "wasm32")]
    #[error("javascript error: {0}")]
    Js(String),

    #[error("{0}")]
    Other(String),
}

impl From<String> for UpqueueError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for UpqueueError {
    fn from(s: &str) -> Self {
        Self::Other(s.into())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for UpqueueError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        match value.as_string() {
            Some(s) => Self::Js(s),
            None => Self::Js(format!("{:?}", value)),
        }
    }
}

pub type UpqueueResult<T> = Result<T, UpqueueError>;
