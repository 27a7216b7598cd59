use super::SecurityError;
use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::Engine;

const NONCE_LEN: usize = 12;

/// 32-byte key sealing sub-account credentials at rest.
///
/// Accepts either 32 raw bytes or 64 hex characters from the environment. The `Debug`
/// implementation never renders key material.
#[derive(Clone)]
pub struct SealKey([u8; 32]);

impl std::fmt::Debug for SealKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SealKey(<redacted>)")
    }
}

impl SealKey {
    pub fn parse(raw: &str) -> Result<Self, SecurityError> {
        let bytes = if raw.len() == 64 {
            hex::decode(raw).map_err(|_| SecurityError::InvalidKey)?
        } else if raw.len() == 32 {
            raw.as_bytes().to_vec()
        } else {
            return Err(SecurityError::InvalidKey);
        };

        let key: [u8; 32] = bytes.try_into().map_err(|_| SecurityError::InvalidKey)?;
        Ok(Self(key))
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.0))
    }

    /// Seal a plaintext into `base64(nonce || ciphertext)` with a fresh random nonce.
    pub fn seal(&self, plaintext: &str) -> String {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher()
            .encrypt(&nonce, plaintext.as_bytes())
            .expect("AES-GCM encryption is infallible for in-memory payloads");

        let mut envelope = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        envelope.extend_from_slice(&nonce);
        envelope.extend_from_slice(&ciphertext);
        base64::engine::general_purpose::STANDARD.encode(envelope)
    }

    /// Unseal a `base64(nonce || ciphertext)` envelope.
    ///
    /// Authentication failure (tampering, wrong key, or a legacy CBC envelope from
    /// before the GCM migration) surfaces as [`SecurityError::Unseal`]; the caller
    /// quarantines the affected challenge.
    pub fn unseal(&self, sealed: &str) -> Result<String, SecurityError> {
        let envelope = base64::engine::general_purpose::STANDARD
            .decode(sealed)
            .map_err(|err| SecurityError::Envelope(err.to_string()))?;

        if envelope.len() < NONCE_LEN {
            return Err(SecurityError::Envelope("envelope shorter than nonce".into()));
        }

        let (nonce, ciphertext) = envelope.split_at(NONCE_LEN);
        let plaintext = self
            .cipher()
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| SecurityError::Unseal)?;

        String::from_utf8(plaintext).map_err(|err| SecurityError::Envelope(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SealKey {
        SealKey::parse("0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef").unwrap()
    }

    #[test]
    fn test_parse_raw_and_hex_keys() {
        assert!(SealKey::parse("abcdefghijklmnopqrstuvwxyz012345").is_ok());
        assert!(SealKey::parse(
            "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef"
        )
        .is_ok());
        assert!(matches!(
            SealKey::parse("short"),
            Err(SecurityError::InvalidKey)
        ));
    }

    #[test]
    fn test_seal_unseal_round_trip() {
        let key = key();
        for plaintext in ["", "api-key-123", "ключ-с-юникодом-🔑"] {
            let sealed = key.seal(plaintext);
            assert_eq!(key.unseal(&sealed).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_nonces_differ_between_seals() {
        let key = key();
        assert_ne!(key.seal("same"), key.seal("same"));
    }

    #[test]
    fn test_tampered_envelope_rejected() {
        let key = key();
        let sealed = key.seal("api-key-123");
        let mut envelope = base64::engine::general_purpose::STANDARD
            .decode(&sealed)
            .unwrap();
        let last = envelope.len() - 1;
        envelope[last] ^= 0x01;
        let tampered = base64::engine::general_purpose::STANDARD.encode(envelope);

        assert!(matches!(key.unseal(&tampered), Err(SecurityError::Unseal)));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let sealed = key().seal("api-key-123");
        let other = SealKey::parse("ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff").unwrap();
        assert!(matches!(other.unseal(&sealed), Err(SecurityError::Unseal)));
    }
}
