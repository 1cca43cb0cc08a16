//! Payload masking (RFC 6455 Section 5.3).
//!
//! Masking XORs every payload byte `i` with `key[i % 4]`. The operation is its
//! own inverse, so the same functions mask outgoing and unmask incoming data.

/// Byte-by-byte XOR masking.
#[inline]
pub fn apply_mask(data: &mut [u8], mask: [u8; 4]) {
    for (i, byte) in data.iter_mut().enumerate() {
        *byte ^= mask[i % 4];
    }
}

/// Word-at-a-time XOR masking; equivalent to [`apply_mask`].
#[inline]
pub fn apply_mask_fast(data: &mut [u8], mask: [u8; 4]) {
    let mask_u32 = u32::from_ne_bytes(mask);
    let mut chunks = data.chunks_exact_mut(4);

    for chunk in &mut chunks {
        let val = u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        chunk.copy_from_slice(&(val ^ mask_u32).to_ne_bytes());
    }

    // Every full chunk consumed a multiple of four bytes, so the tail starts
    // at key index 0.
    for (byte, key) in chunks.into_remainder().iter_mut().zip(mask) {
        *byte ^= key;
    }
}

/// Source of masking keys for outgoing frames.
///
/// Keys only need to be unpredictable to intermediaries, not secret, so a
/// getrandom-seeded mixing counter is used instead of drawing entropy per
/// frame.
#[derive(Debug, Clone)]
pub struct MaskGenerator {
    counter: u32,
}

impl MaskGenerator {
    /// Create a generator with a random seed.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(random_mask_seed())
    }

    /// Create a generator with a fixed seed.
    #[must_use]
    pub const fn with_seed(seed: u32) -> Self {
        Self { counter: seed }
    }

    /// Produce the next masking key.
    pub fn next_mask(&mut self) -> [u8; 4] {
        self.counter = self.counter.wrapping_add(0x9E37_79B9);
        let a = self.counter;
        let b = a.wrapping_mul(0x85EB_CA6B);
        let c = b ^ (b >> 13);
        let d = c.wrapping_mul(0xC2B2_AE35);
        d.to_le_bytes()
    }
}

impl Default for MaskGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Falls back to system time if getrandom fails.
fn random_mask_seed() -> u32 {
    let mut buf = [0u8; 4];
    if getrandom::getrandom(&mut buf).is_ok() {
        u32::from_le_bytes(buf)
    } else {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u32)
            .unwrap_or(0x1234_5678)
    }
}
