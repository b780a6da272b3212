pub mod dummy;
pub mod porkbun;

use thiserror::Error;

#[derive(Clone, Error, Debug, PartialEq, Eq)]
pub enum DdnsUpdateError {
    #[error("Porkbun API credentials not provided (arguments, environment or secrets file)")]
    CredentialsMissing,

    #[error("record type {0} is not supported by the Porkbun client")]
    RecordTypeUnsupported(Box<str>),

    #[error("record type {0} does not support priority")]
    PriorityUnsupported(porkbun::RecordType),

    // used when Porkbun answers with "status": "ERROR"
    #[error("Porkbun returned error: {0}")]
    Porkbun(Box<str>),

    #[error("Porkbun returned HTTP {0}")]
    Status(u16),

    // used when the response is not the JSON we expect
    #[error("received erroneous JSON: {0}")]
    Json(Box<str>),

    #[error("HTTP transport error: {0}")]
    TransportError(Box<str>),
}

pub trait TxtPublisher {
    /// Replace the content of the configured TXT record with `token`. Only
    /// an `Ok` means the provider accepted the new content.
    fn publish_txt(&mut self, token: &str) -> Result<(), DdnsUpdateError>;

    /// Whether an accepted publish actually reached the provider. A
    /// publisher that only simulates updates returns `false`, and the
    /// last-known IP must then stay where it is.
    fn commits(&self) -> bool {
        true
    }
}

impl<P: TxtPublisher + ?Sized> TxtPublisher for Box<P> {
    fn publish_txt(&mut self, token: &str) -> Result<(), DdnsUpdateError> {
        (**self).publish_txt(token)
    }

    fn commits(&self) -> bool {
        (**self).commits()
    }
}
