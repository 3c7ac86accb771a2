//! The simulator's message-identifier hash.
//!
//! Message ids are the FNV-1a 64 hash of the dotted variable name, the same
//! convention the host SDK applies when it builds its message tables. The
//! registry treats the function as an oracle: correctness is pinned by
//! round-tripping registered names, not by literal constants.

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Hash a variable name to its 64-bit message id.
#[inline]
pub const fn message_hash(name: &str) -> u64 {
    let bytes = name.as_bytes();
    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}
