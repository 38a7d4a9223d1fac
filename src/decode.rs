//! Scalar decode rules.
//!
//! These operate on already-fetched register words and never fail. Which rule applies to which
//! register is decided by the catalogue in [`crate::registers`].

pub const fn high_byte(word: u16) -> u8 {
    (word >> 8) as u8
}

pub const fn low_byte(word: u16) -> u8 {
    word as u8
}

/// Extract `mask` after shifting `word` right by `shift` bits.
pub const fn field(word: u16, shift: u8, mask: u16) -> u16 {
    (word >> shift) & mask
}

/// Temperatures are stored as sign-and-magnitude bytes: bit 7 is the sign, bits 0-6 the
/// magnitude in degrees. This is not two's complement.
pub const fn sign_magnitude(byte: u8) -> i8 {
    let magnitude = (byte & 0x7F) as i8;
    if byte & 0x80 == 0 { magnitude } else { -magnitude }
}

/// Join two registers, the first one holding the upper 16 bits.
pub const fn double_word(high: u16, low: u16) -> u32 {
    (high as u32) << 16 | low as u32
}

/// Render a two-register version number.
///
/// The four bytes are taken in register order, high byte first. The leading byte is reserved
/// by the device and is only shown when it is not zero.
pub fn version([first, second]: [u16; 2]) -> String {
    let [reserved, major] = first.to_be_bytes();
    let [minor, patch] = second.to_be_bytes();
    if reserved == 0 {
        format!("{major}.{minor}.{patch}")
    } else {
        format!("{reserved}.{major}.{minor}.{patch}")
    }
}

/// Assemble characters packed two per register, high byte first.
///
/// Bytes are interpreted as Latin-1, so every byte maps to exactly one `char`.
pub fn text(words: &[u16]) -> String {
    words.iter().flat_map(|w| w.to_be_bytes()).map(char::from).collect()
}

/// Strip the space and NUL padding the device uses to fill fixed-length strings.
pub fn trim_text(text: &str) -> &str {
    text.trim_matches(|c: char| c == '\0' || c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn temperature_bytes() {
        assert_eq!(sign_magnitude(high_byte(0x8514)), -5);
        assert_eq!(sign_magnitude(low_byte(0x8514)), 20);
        assert_eq!(sign_magnitude(0x80), 0);
        assert_eq!(sign_magnitude(0xFF), -127);
        assert_eq!(sign_magnitude(0x7F), 127);
    }

    #[test]
    fn split_bytes() {
        assert_eq!(high_byte(0x3014), 48);
        assert_eq!(low_byte(0x3014), 20);
        assert_eq!(high_byte(0x6432), 100);
        assert_eq!(low_byte(0x6432), 50);
    }

    #[test]
    fn fields() {
        assert_eq!(field(0xBE02, 8, 0x7F), 62);
        assert_eq!(field(0x80FF, 15, 0x1), 1);
        assert_eq!(field(0x70FF, 15, 0x1), 0);
        assert_eq!(field(0xF4FF, 10, 0x1), 1);
        assert_eq!(field(0xFF06, 0, 0xFF), 6);
    }

    #[test]
    fn double_words() {
        assert_eq!(double_word(0x1234, 0x5678), 305419896);
        assert_eq!(double_word(0x0053, 0x0101), 5439745);
        assert_eq!(double_word(0xFFFF, 0xFFFF), u32::MAX);
    }

    #[test]
    fn versions() {
        assert_eq!(version([0x0010, 0x2234]), "16.34.52");
        assert_eq!(version([0x0011, 0x3422]), "17.52.34");
        assert_eq!(version([0x0001, 0x0203]), "1.2.3");
        assert_eq!(version([0x0201, 0x0203]), "2.1.2.3");
    }

    #[test]
    fn product_model_text() {
        let words = [
            0x2020, 0x524E, 0x472D, 0x4354, 0x524C, 0x2D52, 0x5652, 0x3430,
        ];
        let raw = text(&words);
        assert_eq!(raw, "  RNG-CTRL-RVR40");
        assert_eq!(trim_text(&raw), "RNG-CTRL-RVR40");
        assert_eq!(trim_text("RVR20\0\0\0"), "RVR20");
    }

    proptest! {
        #[test]
        fn sign_bit_negates_magnitude(magnitude in 0u8..=0x7F) {
            prop_assert_eq!(sign_magnitude(magnitude), magnitude as i8);
            prop_assert_eq!(sign_magnitude(magnitude | 0x80), -(magnitude as i8));
        }

        #[test]
        fn bytes_recombine(word in any::<u16>()) {
            prop_assert_eq!(u16::from_be_bytes([high_byte(word), low_byte(word)]), word);
        }
    }
}
