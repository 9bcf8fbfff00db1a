// src/bigint/bitarray.rs

use bitvec::prelude::{BitVec, Lsb0};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::error::{MpqsError, MpqsResult};

/// A bit vector over 64-bit words, growable but never shrinkable.
///
/// Backs both the relations store's exponent vectors (§3, one bit per
/// factor-base prime) and the matrix's row storage (§4.8). Capacity is
/// always rounded up to a multiple of 64 so the hex-word persistence format
/// (§6) round-trips without a trailing partial word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BigBitArray {
    bits: BitVec<u64, Lsb0>,
}

fn round_up_64(n: usize) -> usize {
    (n + 63) / 64 * 64
}

impl BigBitArray {
    pub fn new(capacity: usize) -> Self {
        BigBitArray {
            bits: BitVec::repeat(false, round_up_64(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.bits.len()
    }

    fn check_index(&self, i: usize) -> MpqsResult<()> {
        if i >= self.bits.len() {
            return Err(MpqsError::PreconditionViolated(format!(
                "bit index {} out of range (capacity {})",
                i,
                self.bits.len()
            )));
        }
        Ok(())
    }

    pub fn get(&self, i: usize) -> bool {
        debug_assert!(i < self.bits.len(), "BigBitArray::get index out of range");
        self.bits[i]
    }

    pub fn try_get(&self, i: usize) -> MpqsResult<bool> {
        self.check_index(i)?;
        Ok(self.bits[i])
    }

    pub fn set(&mut self, i: usize, v: bool) {
        debug_assert!(i < self.bits.len(), "BigBitArray::set index out of range");
        self.bits.set(i, v);
    }

    pub fn try_set(&mut self, i: usize, v: bool) -> MpqsResult<()> {
        self.check_index(i)?;
        self.bits.set(i, v);
        Ok(())
    }

    pub fn flip(&mut self, i: usize) {
        debug_assert!(i < self.bits.len(), "BigBitArray::flip index out of range");
        let cur = self.bits[i];
        self.bits.set(i, !cur);
    }

    /// Grow to at least `new_capacity` bits, rounded up to a multiple of 64.
    /// Never shrinks; new bits are zero.
    pub fn expand(&mut self, new_capacity: usize) {
        let rounded = round_up_64(new_capacity);
        if rounded > self.bits.len() {
            self.bits.resize(rounded, false);
        }
    }

    /// In-place XOR, bit by bit, up to `min(self.capacity(), other.capacity())`.
    pub fn xor_with(&mut self, other: &BigBitArray) {
        let n = self.bits.len().min(other.bits.len());
        for i in 0..n {
            let b = other.bits[i];
            if b {
                self.flip(i);
            }
        }
    }

    pub fn pop_count(&self) -> usize {
        self.bits.count_ones()
    }

    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter_ones()
    }

    /// Serialize as `(capacity, hex)` per §6: uppercase hex, 16 digits per
    /// 64-bit word, least-significant nibble first within each word.
    pub fn to_hex(&self) -> (i64, String) {
        let mut hex = String::with_capacity(self.bits.len() / 4);
        for word in self.bits.chunks(64) {
            let mut w: u64 = 0;
            for (i, bit) in word.iter().enumerate() {
                if *bit {
                    w |= 1u64 << i;
                }
            }
            for nibble in 0..16 {
                let shift = nibble * 4;
                let v = (w >> shift) & 0xF;
                hex.push(std::char::from_digit(v as u32, 16).unwrap().to_ascii_uppercase());
            }
        }
        (self.bits.len() as i64, hex)
    }

    pub fn from_hex(capacity: i64, hex: &str) -> MpqsResult<Self> {
        if capacity < 0 {
            return Err(MpqsError::PreconditionViolated(
                "BigBitArray capacity must be non-negative".into(),
            ));
        }
        let capacity = capacity as usize;
        let rounded = round_up_64(capacity);
        let expected_nibbles = rounded / 4;
        if hex.len() != expected_nibbles {
            return Err(MpqsError::PreconditionViolated(format!(
                "BigBitArray hex length {} does not match capacity {}",
                hex.len(),
                capacity
            )));
        }
        let mut bits = BitVec::<u64, Lsb0>::repeat(false, rounded);
        for (word_idx, word_chars) in hex.as_bytes().chunks(16).enumerate() {
            let mut w: u64 = 0;
            for (nibble, &c) in word_chars.iter().enumerate() {
                let v = (c as char)
                    .to_digit(16)
                    .ok_or_else(|| MpqsError::PreconditionViolated(format!("invalid hex digit '{}'", c as char)))?;
                w |= (v as u64) << (nibble * 4);
            }
            for bit in 0..64 {
                let idx = word_idx * 64 + bit;
                if idx < rounded {
                    bits.set(idx, (w >> bit) & 1 == 1);
                }
            }
        }
        Ok(BigBitArray { bits })
    }
}

/// Wire format per §6: `(capacity, bits)` where `bits` is the uppercase-hex
/// encoding produced by `to_hex`.
impl Serialize for BigBitArray {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (capacity, hex) = self.to_hex();
        (capacity, hex).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BigBitArray {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (capacity, hex): (i64, String) = Deserialize::deserialize(deserializer)?;
        BigBitArray::from_hex(capacity, &hex).map_err(serde::de::Error::custom)
    }
}
