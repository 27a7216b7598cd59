use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Convenient type alias for the HMAC-SHA256 [`Mac`] used to sign exchange requests.
pub type HmacSha256 = Hmac<Sha256>;

/// Compute the HMAC-SHA256 digest of `message` under `secret`.
///
/// The caller chooses the wire representation via an [`Encoder`].
pub fn hmac_sha256_digest(secret: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC supports any key length");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// Verify `signature` is the HMAC-SHA256 digest of `message` under `secret` in constant time.
pub fn hmac_sha256_verify(secret: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC supports any key length");
    mac.update(message);
    mac.verify_slice(signature).is_ok()
}

/// Encodes bytes data.
pub trait Encoder {
    /// Encodes the bytes data into some `String` format.
    fn encode<Bytes>(&self, data: Bytes) -> String
    where
        Bytes: AsRef<[u8]>;
}

/// Encodes bytes data as a hex `String` using lowercase characters.
#[derive(Debug, Copy, Clone)]
pub struct HexEncoder;

impl Encoder for HexEncoder {
    fn encode<Bytes>(&self, data: Bytes) -> String
    where
        Bytes: AsRef<[u8]>,
    {
        hex::encode(data)
    }
}

/// Encodes bytes data as a base64 `String`.
#[derive(Debug, Copy, Clone)]
pub struct Base64Encoder;

impl Encoder for Base64Encoder {
    fn encode<Bytes>(&self, data: Bytes) -> String
    where
        Bytes: AsRef<[u8]>,
    {
        base64::engine::general_purpose::STANDARD.encode(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hmac_sha256_digest_round_trip() {
        let secret = b"super-secret";
        let message = b"1672304486865api-key5000symbol=BTCUSDT";

        let signature = hmac_sha256_digest(secret, message);
        assert!(hmac_sha256_verify(secret, message, &signature));

        // Tampered message must not verify
        assert!(!hmac_sha256_verify(
            secret,
            b"1672304486865api-key5000symbol=ETHUSDT",
            &signature
        ));
    }

    #[test]
    fn test_encoders() {
        let data = [0xde, 0xad, 0xbe, 0xef];
        assert_eq!(HexEncoder.encode(data), "deadbeef");
        assert_eq!(Base64Encoder.encode(data), "3q2+7w==");
    }
}
