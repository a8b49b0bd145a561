//! Deterministic type-tagged payload encoding.
//!
//! Signing payloads and derived commitment hashes are computed over an
//! encoding where every field carries a one-byte type tag and, for
//! variable-width fields, an 8-byte big-endian length prefix. Bare
//! concatenation of variable-length fields is not injective: shifting a
//! byte between two adjacent string fields would produce the same bytes for
//! two different logical tuples, a forgeable collision. The tag and length
//! prefixes make the encoding injective for a fixed field schema.

const TAG_U64: u8 = 0x01;
const TAG_I64: u8 = 0x02;
const TAG_BYTES: u8 = 0x03;
const TAG_STR: u8 = 0x04;

/// Builds a type-tagged, deterministic byte encoding of a field sequence.
#[derive(Debug, Default)]
pub struct TaggedEncoder {
    buf: Vec<u8>,
}

impl TaggedEncoder {
    /// Create an empty encoder.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Append an unsigned 64-bit field.
    pub fn push_u64(mut self, value: u64) -> Self {
        self.buf.push(TAG_U64);
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Append a signed 64-bit field.
    pub fn push_i64(mut self, value: i64) -> Self {
        self.buf.push(TAG_I64);
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Append a raw byte field with a length prefix.
    pub fn push_bytes(mut self, bytes: &[u8]) -> Self {
        self.buf.push(TAG_BYTES);
        self.buf.extend_from_slice(&(bytes.len() as u64).to_be_bytes());
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Append a UTF-8 string field with a length prefix.
    pub fn push_str(mut self, value: &str) -> Self {
        self.buf.push(TAG_STR);
        self.buf
            .extend_from_slice(&(value.len() as u64).to_be_bytes());
        self.buf.extend_from_slice(value.as_bytes());
        self
    }

    /// Consume the encoder and return the encoded payload.
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}
