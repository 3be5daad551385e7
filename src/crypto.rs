//! Authenticated encryption for stored attachment paths.
//!
//! Records never hold a plaintext file path; they hold an opaque token
//! produced here. Layout of the stored token: `base64(nonce || tag || body)`
//! with a fresh random 96-bit nonce per encryption.

use aes_gcm::{aead::Aead, Aes256Gcm, KeyInit, Nonce};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;

use crate::config::FILE_ENCRYPTION_KEY_LEN;

/// Nonce length for AES-GCM (96 bits)
const NONCE_LEN: usize = 12;
/// Authentication tag length (128 bits)
const TAG_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("cipher token is malformed")]
    Malformed,
    #[error("cipher token failed authentication")]
    Integrity,
    #[error("encryption failed")]
    Encrypt,
}

#[derive(Clone)]
pub struct ReferenceCipher {
    cipher: Aes256Gcm,
}

impl ReferenceCipher {
    pub fn new(key: &[u8; FILE_ENCRYPTION_KEY_LEN]) -> Self {
        Self {
            cipher: Aes256Gcm::new(key.into()),
        }
    }

    pub fn encrypt(&self, plain: &str) -> Result<String, CipherError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from(nonce_bytes);

        let sealed = self
            .cipher
            .encrypt(&nonce, plain.as_bytes())
            .map_err(|_| CipherError::Encrypt)?;

        // aes-gcm appends the tag to the ciphertext; the stored layout keeps
        // the tag up front, right after the nonce.
        let (body, tag) = sealed.split_at(sealed.len() - TAG_LEN);
        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(tag);
        out.extend_from_slice(body);

        Ok(BASE64.encode(out))
    }

    /// Fails closed: a tampered token or a token sealed under a different
    /// key yields `Integrity`, never partial plaintext.
    pub fn decrypt(&self, token: &str) -> Result<String, CipherError> {
        let raw = BASE64.decode(token).map_err(|_| CipherError::Malformed)?;
        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(CipherError::Malformed);
        }

        let (nonce_bytes, rest) = raw.split_at(NONCE_LEN);
        let (tag, body) = rest.split_at(TAG_LEN);

        let mut sealed = Vec::with_capacity(rest.len());
        sealed.extend_from_slice(body);
        sealed.extend_from_slice(tag);

        let nonce_bytes: [u8; NONCE_LEN] = nonce_bytes
            .try_into()
            .map_err(|_| CipherError::Malformed)?;
        let plain = self
            .cipher
            .decrypt(&Nonce::from(nonce_bytes), sealed.as_ref())
            .map_err(|_| CipherError::Integrity)?;

        String::from_utf8(plain).map_err(|_| CipherError::Malformed)
    }
}
