/// `SecretBuffer`: a heap byte region for key material, zeroized on drop.
///
/// Anything that is, or can derive, private key material lives here.
/// Public material (sealing keys, verification keys, signatures,
/// ciphertexts) stays in ordinary `Vec<u8>`s.
use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::encoding;
use crate::error::{Result, SeedSealError};

/// A variable-length sensitive buffer, overwritten before release.
///
/// The length is fixed at construction; copies are explicit via `clone`.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretBuffer(Vec<u8>);

impl SecretBuffer {
    /// A zero-filled buffer of the given length.
    pub fn new_zeroed(length: usize) -> Self {
        Self(vec![0u8; length])
    }

    /// Take ownership of an existing byte vector.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Copy bytes out of a slice.
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    /// Decode from hex (`0x` prefix and mixed case tolerated).
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        Ok(Self(encoding::from_hex(hex_str)?))
    }

    /// The UTF-8 bytes of a string.
    pub fn from_utf8(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// An explicit copy into an ordinary (non-zeroized) vector.
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.clone()
    }

    /// Lowercase hex without a prefix.
    pub fn to_hex(&self) -> String {
        encoding::to_hex(&self.0)
    }

    /// Reinterpret the contents as a UTF-8 string.
    pub fn to_utf8(&self) -> Result<String> {
        String::from_utf8(self.0.clone()).map_err(|_| SeedSealError::MalformedData)
    }

    /// Serialize a list of buffers: per element, a big-endian u32 length
    /// followed by the element's bytes. No count header; the reader must
    /// know the arity.
    pub fn combine_fixed_length_list(fields: &[&SecretBuffer]) -> SecretBuffer {
        let total: usize = fields.iter().map(|f| 4 + f.len()).sum();
        let mut out = Vec::with_capacity(total);
        for field in fields {
            out.extend_from_slice(&(field.len() as u32).to_be_bytes());
            out.extend_from_slice(field.as_bytes());
        }
        SecretBuffer(out)
    }

    /// Parse exactly `count` length-prefixed elements.
    ///
    /// Short reads and trailing bytes both fail.
    pub fn split_fixed_length_list(&self, count: usize) -> Result<Vec<SecretBuffer>> {
        let data = &self.0;
        let mut fields = Vec::with_capacity(count);
        let mut offset = 0usize;
        for _ in 0..count {
            if data.len() < offset + 4 {
                return Err(SeedSealError::MalformedData);
            }
            let length = u32::from_be_bytes(
                data[offset..offset + 4]
                    .try_into()
                    .map_err(|_| SeedSealError::MalformedData)?,
            ) as usize;
            offset += 4;
            if data.len() < offset + length {
                return Err(SeedSealError::MalformedData);
            }
            fields.push(SecretBuffer::from_slice(&data[offset..offset + length]));
            offset += length;
        }
        if offset != data.len() {
            return Err(SeedSealError::MalformedData);
        }
        Ok(fields)
    }
}

impl AsRef<[u8]> for SecretBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBuffer({} bytes)", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_zeroed() {
        let buffer = SecretBuffer::new_zeroed(8);
        assert_eq!(buffer.as_bytes(), &[0u8; 8]);
    }

    #[test]
    fn test_hex_roundtrip() {
        let buffer = SecretBuffer::from_slice(&[0xfe, 0xdc, 0x00, 0x01]);
        assert_eq!(buffer.to_hex(), "fedc0001");
        assert_eq!(SecretBuffer::from_hex("0xFEdc0001").unwrap(), buffer);
    }

    #[test]
    fn test_utf8_roundtrip() {
        let buffer = SecretBuffer::from_utf8("yoto");
        assert_eq!(buffer.to_utf8().unwrap(), "yoto");
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let buffer = SecretBuffer::from_slice(&[0xff, 0xfe]);
        assert!(matches!(
            buffer.to_utf8(),
            Err(SeedSealError::MalformedData)
        ));
    }

    #[test]
    fn test_fixed_length_list_roundtrip() {
        let a = SecretBuffer::from_slice(b"alpha");
        let b = SecretBuffer::from_slice(b"");
        let c = SecretBuffer::from_slice(&[0u8; 300]);

        let combined = SecretBuffer::combine_fixed_length_list(&[&a, &b, &c]);
        assert_eq!(combined.len(), 4 + 5 + 4 + 4 + 300);

        let fields = combined.split_fixed_length_list(3).unwrap();
        assert_eq!(fields, vec![a, b, c]);
    }

    #[test]
    fn test_fixed_length_list_underflow() {
        let a = SecretBuffer::from_slice(b"alpha");
        let combined = SecretBuffer::combine_fixed_length_list(&[&a]);
        assert!(matches!(
            combined.split_fixed_length_list(2),
            Err(SeedSealError::MalformedData)
        ));

        let truncated = SecretBuffer::from_slice(&combined.as_bytes()[..combined.len() - 1]);
        assert!(matches!(
            truncated.split_fixed_length_list(1),
            Err(SeedSealError::MalformedData)
        ));
    }

    #[test]
    fn test_fixed_length_list_trailing_bytes() {
        let a = SecretBuffer::from_slice(b"alpha");
        let mut bytes = SecretBuffer::combine_fixed_length_list(&[&a]).to_vec();
        bytes.push(0);
        assert!(matches!(
            SecretBuffer::from_vec(bytes).split_fixed_length_list(1),
            Err(SeedSealError::MalformedData)
        ));
    }
}
