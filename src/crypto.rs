//! Compress-then-encrypt helpers for short texts such as IP addresses.
//!
//! A token is `BASE64URL(nonce || ciphertext)`, where the ciphertext is the
//! AES-256-GCM encryption of the zlib-compressed UTF-8 text. The nonce is 96
//! bits, freshly drawn for every encryption, and no associated data is used.

use std::fs::{self, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use data_encoding::BASE64URL;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

pub const DEFAULT_KEY_FILE: &str = "aes_key.bin";

pub const KEY_SIZE: usize = 32;

pub const NONCE_SIZE: usize = 12;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key file {0} is unavailable: {1}")]
    KeyUnavailable(Box<str>, Box<str>),

    #[error("key file {0} already exists, use --force to overwrite")]
    KeyExists(Box<str>),

    #[error("unable to write key file {0}: {1}")]
    KeyWrite(Box<str>, io::Error),

    #[error("expected a {KEY_SIZE}-byte key, found {0} byte(s)")]
    InvalidKeyLength(usize),

    #[error("encryption failed: {0}")]
    EncryptionFailed(Box<str>),

    #[error("token failed authentication")]
    AuthenticationFailed,

    #[error("unable to decode token: {0}")]
    DecodeFailed(Box<str>),
}

/// A raw AES-256 key. Its contents never show up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Key([u8; KEY_SIZE]);

impl Key {
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        <[u8; KEY_SIZE]>::try_from(bytes)
            .map(Self)
            .map_err(|_| CryptoError::InvalidKeyLength(bytes.len()))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(aes_gcm::Key::<Aes256Gcm>::from_slice(&self.0))
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Key(..)")
    }
}

fn display(path: &Path) -> Box<str> {
    path.display().to_string().into()
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// Creates a new key at `path`. An existing file is left untouched unless
/// `force` is set. The key is written to a sibling temporary file with
/// owner-only permissions and then renamed into place.
pub fn generate_key(path: &Path, force: bool) -> Result<Key, CryptoError> {
    if path.exists() && !force {
        return Err(CryptoError::KeyExists(display(path)));
    }

    let key = Key::generate();
    let tmp = temp_path(path);

    let write = || -> io::Result<()> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&tmp)?;
        file.write_all(key.as_bytes())?;
        file.sync_all()?;
        drop(file);

        // A stale temporary file keeps its old mode, so set it explicitly.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))?;
        }

        fs::rename(&tmp, path)
    };

    if let Err(e) = write() {
        let _ = fs::remove_file(&tmp);
        return Err(CryptoError::KeyWrite(display(path), e));
    }

    Ok(key)
}

pub fn load_key(path: &Path) -> Result<Key, CryptoError> {
    let bytes = fs::read(path).map_err(|e| {
        let reason = match e.kind() {
            io::ErrorKind::NotFound => "not found, generate one with generate-key".into(),
            _ => e.to_string(),
        };
        CryptoError::KeyUnavailable(display(path), reason.into())
    })?;

    Key::from_slice(&bytes)
}

pub fn encrypt_text(key: &Key, plaintext: &str) -> Result<Box<str>, CryptoError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(plaintext.as_bytes())
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string().into()))?;
    let compressed = encoder
        .finish()
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string().into()))?;

    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let ciphertext = key
        .cipher()
        .encrypt(Nonce::from_slice(&nonce), compressed.as_slice())
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string().into()))?;

    let mut data = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    data.extend_from_slice(&nonce);
    data.extend_from_slice(&ciphertext);

    Ok(BASE64URL.encode(&data).into())
}

pub fn decrypt_text(key: &Key, token: &str) -> Result<String, CryptoError> {
    let data = BASE64URL
        .decode(token.trim().as_bytes())
        .map_err(|e| CryptoError::DecodeFailed(e.to_string().into()))?;

    if data.len() < NONCE_SIZE {
        return Err(CryptoError::DecodeFailed("token is too short".into()));
    }

    let (nonce, ciphertext) = data.split_at(NONCE_SIZE);

    let compressed = key
        .cipher()
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::AuthenticationFailed)?;

    let mut plaintext = Vec::with_capacity(compressed.len() * 2);
    ZlibDecoder::new(compressed.as_slice())
        .read_to_end(&mut plaintext)
        .map_err(|e| CryptoError::DecodeFailed(e.to_string().into()))?;

    String::from_utf8(plaintext).map_err(|e| CryptoError::DecodeFailed(e.to_string().into()))
}
