//! Counter-derived short codes
//!
//! Each counter value is mapped into the fixed-length base62 code space by
//! an affine permutation `(n * MULTIPLIER + offset) mod 62^len`. The
//! multiplier is coprime with `62^len`, so distinct counter values below the
//! space size always produce distinct codes, and the codes do not look
//! sequential. The offset is drawn at startup.

pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

pub const MIN_CODE_LENGTH: usize = 3;
pub const MAX_CODE_LENGTH: usize = 20;

// Odd and not a multiple of 31, the two prime factors of 62
const MULTIPLIER: u128 = 0x5_DEEC_E66D;

#[derive(Debug, Clone)]
pub struct CodeGenerator {
    length: usize,
    space: u128,
    offset: u128,
}

impl CodeGenerator {
    /// Generator with a random permutation offset
    pub fn new(length: usize) -> Self {
        let mut generator = Self::with_offset(length, 0);
        generator.offset = u128::from(rand::random::<u64>()) % generator.space;
        generator
    }

    /// Generator with a fixed offset, for reproducible codes
    pub fn with_offset(length: usize, offset: u128) -> Self {
        let length = length.clamp(MIN_CODE_LENGTH, MAX_CODE_LENGTH);
        let space = (ALPHABET.len() as u128).pow(length as u32);
        Self {
            length,
            space,
            offset: offset % space,
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Number of distinct codes this generator can produce
    pub fn capacity(&self) -> u128 {
        self.space
    }

    /// Code for counter value `sequence` (starting at 1), or `None` once the
    /// counter has run past the code space
    pub fn derive(&self, sequence: u64) -> Option<String> {
        let index = u128::from(sequence.checked_sub(1)?);
        if index >= self.space {
            return None;
        }

        let mut value = (index * MULTIPLIER + self.offset) % self.space;
        let mut code = vec![ALPHABET[0]; self.length];
        for slot in code.iter_mut().rev() {
            *slot = ALPHABET[(value % 62) as usize];
            value /= 62;
        }

        String::from_utf8(code).ok()
    }
}
