use credo_core::Hash;

/// Hash arbitrary data using BLAKE3.
pub fn hash(data: &[u8]) -> Hash {
    Hash::from_bytes(*blake3::hash(data).as_bytes())
}
