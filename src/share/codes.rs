//! Share code generation and validation
//!
//! Codes are six characters from an alphabet without look-alike glyphs
//! (no 0/O, 1/I/L), so they survive being read aloud or retyped.

use rand::Rng;

/// Digits 2-9 and uppercase letters except I, L and O
pub const ALPHABET: &[u8] = b"23456789ABCDEFGHJKMNPQRSTUVWXYZ";

pub const CODE_LENGTH: usize = 6;

/// Draw a random code
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LENGTH)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Codes are case-insensitive; the canonical form is uppercase
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Whether `code` (already normalized) is well formed
pub fn is_valid_code(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| ALPHABET.contains(&b))
}
