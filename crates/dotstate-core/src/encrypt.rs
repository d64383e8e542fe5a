//! Encryption collaborator

use crate::Result;

/// Encrypts source contents when adding and decrypts them when evaluating.
///
/// No implementation ships with the engine; callers plug in their own tool.
pub trait Encryptor {
    fn encrypt(&self, name: &str, plaintext: &[u8]) -> Result<Vec<u8>>;

    fn decrypt(&self, name: &str, ciphertext: &[u8]) -> Result<Vec<u8>>;
}
