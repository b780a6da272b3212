use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

use crate::crypto::{self, CryptoError};
use crate::services::{DdnsUpdateError, TxtPublisher};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("encryption key unavailable: {0}")]
    KeyUnavailable(CryptoError),

    #[error("unable to encrypt the IP: {0}")]
    EncryptionFailed(CryptoError),

    #[error("TXT record update failed: {0}")]
    RemoteUpdateFailed(DdnsUpdateError),
}

/// Turns an IP address into an encrypted token and pushes it into the TXT
/// record. Nothing is committed unless every step succeeds.
pub struct Pipeline<P> {
    key_file: PathBuf,
    publisher: P,
}

impl<P: TxtPublisher> Pipeline<P> {
    pub fn new(key_file: impl Into<PathBuf>, publisher: P) -> Self {
        Self {
            key_file: key_file.into(),
            publisher,
        }
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn publisher_mut(&mut self) -> &mut P {
        &mut self.publisher
    }

    pub fn publish(&mut self, ip: &str) -> Result<(), PublishError> {
        // Loaded on every publish so that a replaced key file takes effect
        // without a restart.
        let key = crypto::load_key(&self.key_file).map_err(PublishError::KeyUnavailable)?;

        let token = crypto::encrypt_text(&key, ip).map_err(PublishError::EncryptionFailed)?;
        debug!("Encrypted IP into a {}-character token", token.len());

        self.publisher
            .publish_txt(&token)
            .map_err(PublishError::RemoteUpdateFailed)
    }
}
