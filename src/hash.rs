//! Non-cryptographic hashing for rollout bucketing.
//!
//! Changing the hash function reassigns every identity to a new bucket, so
//! existing experiments would reshuffle. Keep FNV-1a.
//!
//! The hash runs over UTF-8 bytes. Browser-side FNV-1a implementations that
//! XOR UTF-16 code units (`charCodeAt`) produce the same buckets only for
//! ASCII identities and seeds; non-ASCII input lands in different buckets.

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Number of rollout buckets. Buckets are `0..BUCKETS`.
pub const BUCKETS: u32 = 100;

/// 32-bit FNV-1a over the given byte chunks, hashed as if concatenated.
#[must_use]
pub fn fnv1a(chunks: &[&[u8]]) -> u32 {
    let mut h = FNV_OFFSET_BASIS;
    for chunk in chunks {
        for &b in *chunk {
            h ^= u32::from(b);
            h = h.wrapping_mul(FNV_PRIME);
        }
    }
    h
}

/// The rollout bucket for `identity` under `seed`, in `[0, 99]`.
#[must_use]
pub fn bucket(identity: &str, seed: &str) -> u8 {
    let h = fnv1a(&[identity.as_bytes(), seed.as_bytes()]);
    u8::try_from(h % BUCKETS).unwrap_or(99)
}
