//! Block cipher calls used by the search.
//!
//! The search never looks inside the cipher. It only needs to encrypt a
//! reference message once, optionally encrypt per candidate (known-plaintext
//! matching), and decrypt once with the recovered key.

use crate::error::{KeySweepError, OracleError};
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};

/// AES-128 key length in bytes.
pub const KEY_LEN: usize = 16;
/// AES block length in bytes; also the IV length for CBC.
pub const BLOCK_LEN: usize = 16;

/// A full cipher key.
pub type Key = [u8; KEY_LEN];
/// A CBC initialization vector.
pub type Iv = [u8; BLOCK_LEN];

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// Encrypt/decrypt provider shared read-only by all workers.
pub trait CipherOracle: Send + Sync {
    /// Encrypt `plaintext` and return the padded ciphertext.
    fn encrypt(&self, plaintext: &[u8], key: &Key, iv: &Iv) -> Result<Vec<u8>, OracleError>;

    /// Decrypt `ciphertext` and return the unpadded plaintext.
    fn decrypt(&self, ciphertext: &[u8], key: &Key, iv: &Iv) -> Result<Vec<u8>, OracleError>;
}

/// AES-128 in CBC mode with PKCS#7 padding.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aes128CbcOracle;

impl CipherOracle for Aes128CbcOracle {
    fn encrypt(&self, plaintext: &[u8], key: &Key, iv: &Iv) -> Result<Vec<u8>, OracleError> {
        Ok(Aes128CbcEnc::new(key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext))
    }

    fn decrypt(&self, ciphertext: &[u8], key: &Key, iv: &Iv) -> Result<Vec<u8>, OracleError> {
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
            return Err(OracleError::InvalidCiphertextLength(ciphertext.len()));
        }
        Aes128CbcDec::new(key.into(), iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| OracleError::Padding)
    }
}

/// Parse a hex-encoded IV or key of exactly one block.
pub fn parse_block(text: &str) -> Result<[u8; BLOCK_LEN], KeySweepError> {
    let bytes = hex::decode(text.trim())?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| KeySweepError::InvalidBlockLength(bytes.len()))
}

/// Interpret raw text as a 16-byte block (e.g. `0123456789012345`).
pub fn block_from_text(text: &str) -> Result<[u8; BLOCK_LEN], KeySweepError> {
    text.as_bytes()
        .try_into()
        .map_err(|_| KeySweepError::InvalidBlockLength(text.len()))
}
