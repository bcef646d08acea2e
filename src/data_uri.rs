use base64::{engine::general_purpose::STANDARD, Engine as _};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DataUriError {
    #[error("not a data URI")]
    MissingScheme,

    #[error("data URI must be base64 encoded")]
    NotBase64,

    #[error("invalid base64 payload: {0}")]
    Payload(String),
}

/// A parsed `data:<mime>;base64,<payload>` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri<'a> {
    pub mime: &'a str,
    payload: &'a str,
}

impl<'a> DataUri<'a> {
    pub fn parse(uri: &'a str) -> Result<Self, DataUriError> {
        let rest = uri.strip_prefix("data:").ok_or(DataUriError::MissingScheme)?;
        let (header, payload) = rest.split_once(',').ok_or(DataUriError::MissingScheme)?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or(DataUriError::NotBase64)?;
        Ok(Self { mime, payload })
    }

    pub fn decode(&self) -> Result<Vec<u8>, DataUriError> {
        STANDARD
            .decode(self.payload.trim())
            .map_err(|e| DataUriError::Payload(e.to_string()))
    }
}

pub fn encode(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}
