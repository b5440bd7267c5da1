use alloy_primitives::{U256, keccak256};

/// Left-pads `key` to a full 32-byte word, keeping only the last 32 bytes of longer keys.
#[inline]
fn left_pad_to_32(key: &[u8]) -> [u8; 32] {
    let mut word = [0u8; 32];
    let len = key.len().min(32);
    word[32 - len..].copy_from_slice(&key[key.len() - len..]);
    word
}

/// Compute storage slot for a mapping
#[inline]
pub fn mapping_slot<T: AsRef<[u8]>>(key: T, mapping_slot: U256) -> U256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(&left_pad_to_32(key.as_ref()));
    buf[32..].copy_from_slice(&mapping_slot.to_be_bytes::<32>());
    U256::from_be_bytes(keccak256(buf).0)
}

/// Compute storage slot for a double mapping (mapping\[key1\]\[key2\])
#[inline]
pub fn double_mapping_slot<T: AsRef<[u8]>, U: AsRef<[u8]>>(
    key1: T,
    key2: U,
    base_slot: U256,
) -> U256 {
    mapping_slot(key2, mapping_slot(key1, base_slot))
}

/// Encodes a signed tick as a storage word, two's complement in the low 32 bits.
#[inline]
pub fn tick_to_word(tick: i32) -> U256 {
    U256::from(tick as u32)
}

/// Inverse of [`tick_to_word`].
#[inline]
pub fn word_to_tick(word: U256) -> i32 {
    word.to::<u32>() as i32
}

/// Storage key for a tick used as a mapping key.
#[inline]
pub fn tick_key(tick: i32) -> [u8; 32] {
    tick_to_word(tick).to_be_bytes::<32>()
}
