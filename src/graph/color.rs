//! Deterministic identifier → palette color mapping.
//!
//! The hash is the classic `h = c + (h << 5) - h` string hash over UTF-16
//! code units with 32-bit signed wraparound, so a channel keeps the same
//! color across runs and across implementations of the same hash.

use crate::theme::NODE_PALETTE;
use egui::Color32;

/// 32-bit rolling hash of an identifier.
pub fn hash_identifier(id: &str) -> i32 {
    id.encode_utf16().fold(0i32, |hash, unit| {
        (unit as i32).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash))
    })
}

/// Index into [`NODE_PALETTE`] for an identifier.
pub fn palette_index(id: &str) -> usize {
    (hash_identifier(id).unsigned_abs() % NODE_PALETTE.len() as u32) as usize
}

/// Node color for an identifier.
pub fn color_for(id: &str) -> Color32 {
    NODE_PALETTE[palette_index(id)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_maps_to_first_color() {
        assert_eq!(hash_identifier(""), 0);
        assert_eq!(palette_index(""), 0);
        assert_eq!(color_for(""), NODE_PALETTE[0]);
    }

    #[test]
    fn known_values() {
        // 'a' = 97; 98 + 97 * 31 = 3105; 99 + 3105 * 31 = 96354
        assert_eq!(hash_identifier("a"), 97);
        assert_eq!(hash_identifier("abc"), 96354);
        assert_eq!(palette_index("abc"), 4);
    }

    #[test]
    fn same_identifier_same_color() {
        for _ in 0..3 {
            assert_eq!(color_for("@some_channel"), color_for("@some_channel"));
        }
    }

    #[test]
    fn wraps_like_32_bit_integers() {
        // Long inputs overflow i32 many times over; the result must stay in range
        // and match a reference computed with i64 arithmetic truncated each step.
        let id = "t.me/joinchat/AAAAAEXAMPLE_very_long_identifier_0123456789";
        let reference = id.encode_utf16().fold(0i64, |hash, unit| {
            let shifted = ((hash as i32).wrapping_shl(5)) as i64;
            ((unit as i64 + shifted - hash) as i32) as i64
        });
        assert_eq!(hash_identifier(id) as i64, reference);
        assert!(palette_index(id) < NODE_PALETTE.len());
    }

    #[test]
    fn minimum_value_does_not_overflow_abs() {
        // unsigned_abs(i32::MIN) = 2147483648, which ends in 8
        assert_eq!(i32::MIN.unsigned_abs() % 10, 8);
    }

    #[test]
    fn hashes_utf16_code_units() {
        // 'я' is U+044F, a single code unit of 1103
        assert_eq!(hash_identifier("я"), 1103);
    }
}
