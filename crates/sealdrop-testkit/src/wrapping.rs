//! Client-side key wrapping, as a sealdrop client would do it.
//!
//! Sealdrop stores wrapped keys without looking at them. Tests use this module
//! to produce real ones: content is sealed under a random [`ContentKey`], and
//! that key is wrapped for each reader with X25519 key agreement and
//! ChaCha20-Poly1305.
//!
//! Wrapped key layout: `ephemeral_public (32) || nonce (12) || ciphertext`.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::RngCore;
use thiserror::Error;
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};

const WRAP_CONTEXT: &str = "sealdrop-testkit v1 key wrap";
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WrapError {
    #[error("public key must be 32 bytes, got {0}")]
    InvalidPublicKey(usize),

    #[error("wrapped data too short: {0} bytes")]
    Truncated(usize),

    #[error("decryption failed")]
    Decryption,
}

pub type Result<T> = std::result::Result<T, WrapError>;

/// A 256-bit symmetric key that encrypts one file's content.
#[derive(Clone, PartialEq, Eq)]
pub struct ContentKey([u8; KEY_LEN]);

impl std::fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ContentKey(..)")
    }
}

impl ContentKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Encrypt content. Output is `nonce || ciphertext`.
    pub fn seal(&self, plaintext: &[u8]) -> Vec<u8> {
        seal_with(&self.0, plaintext)
    }

    /// Decrypt content produced by [`ContentKey::seal`].
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        open_with(&self.0, sealed)
    }
}

/// A reader's X25519 key pair. The public half goes into their profile.
pub struct KeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair.
    pub fn generate() -> Self {
        Self::from_secret(StaticSecret::random_from_rng(rand::thread_rng()))
    }

    /// Create from seed bytes.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self::from_secret(StaticSecret::from(seed))
    }

    fn from_secret(secret: StaticSecret) -> Self {
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    pub fn public_key(&self) -> [u8; 32] {
        *self.public.as_bytes()
    }

    /// Recover a content key wrapped for this key pair.
    pub fn unwrap_key(&self, wrapped: &[u8]) -> Result<ContentKey> {
        if wrapped.len() < 32 + NONCE_LEN {
            return Err(WrapError::Truncated(wrapped.len()));
        }
        let (ephemeral, sealed) = wrapped.split_at(32);
        let mut ephemeral_bytes = [0u8; 32];
        ephemeral_bytes.copy_from_slice(ephemeral);
        let ephemeral = PublicKey::from(ephemeral_bytes);

        let shared = self.secret.diffie_hellman(&ephemeral);
        let wrap_key = derive_wrap_key(shared.as_bytes(), &ephemeral, &self.public);

        let bytes = open_with(&wrap_key, sealed)?;
        let key: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| WrapError::Truncated(b.len()))?;
        Ok(ContentKey(key))
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", self.public.as_bytes())
            .finish_non_exhaustive()
    }
}

/// Wrap `key` for the holder of `recipient_public`.
pub fn wrap_key(key: &ContentKey, recipient_public: &[u8]) -> Result<Vec<u8>> {
    let recipient: [u8; 32] = recipient_public
        .try_into()
        .map_err(|_| WrapError::InvalidPublicKey(recipient_public.len()))?;
    let recipient = PublicKey::from(recipient);

    let ephemeral = EphemeralSecret::random_from_rng(rand::thread_rng());
    let ephemeral_public = PublicKey::from(&ephemeral);
    let shared = ephemeral.diffie_hellman(&recipient);
    let wrap_key = derive_wrap_key(shared.as_bytes(), &ephemeral_public, &recipient);

    let mut out = ephemeral_public.as_bytes().to_vec();
    out.extend(seal_with(&wrap_key, key.as_bytes()));
    Ok(out)
}

fn derive_wrap_key(shared: &[u8; 32], ephemeral: &PublicKey, recipient: &PublicKey) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(WRAP_CONTEXT);
    hasher.update(shared);
    hasher.update(ephemeral.as_bytes());
    hasher.update(recipient.as_bytes());
    *hasher.finalize().as_bytes()
}

fn seal_with(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Vec<u8> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);

    let mut out = nonce.to_vec();
    out.extend(
        cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .expect("plaintext within the ChaCha20-Poly1305 length limit"),
    );
    out
}

fn open_with(key: &[u8; KEY_LEN], sealed: &[u8]) -> Result<Vec<u8>> {
    if sealed.len() < NONCE_LEN {
        return Err(WrapError::Truncated(sealed.len()));
    }
    let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| WrapError::Decryption)
}
