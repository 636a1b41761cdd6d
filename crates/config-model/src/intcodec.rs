//! Fixed-radix integer text encoding and the CRC-32 used as an integrity
//! and version guard on persisted blobs.

/// The 64-symbol alphabet, most significant symbol written first.
pub const SYMBOLS: &[u8; 64] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz()";

/// Single-character token written in place of a value that cannot be encoded.
pub const INVALID_MARKER: &str = "!";

const RADIX: u64 = 64;

/// Result of decoding a radix-64 token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedInt {
    /// The empty token; distinct from zero.
    Null,
    Int(i64),
    /// A symbol outside the alphabet, or a value that overflows `i64`.
    Invalid,
}

impl DecodedInt {
    pub fn int(self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(value),
            Self::Null | Self::Invalid => None,
        }
    }
}

pub fn encode_int(value: i64) -> String {
    let mut residual = value.unsigned_abs();
    let mut symbols = Vec::new();
    loop {
        symbols.push(SYMBOLS[(residual % RADIX) as usize]);
        residual /= RADIX;
        if residual == 0 {
            break;
        }
    }
    if value < 0 {
        symbols.push(b'-');
    }
    symbols.reverse();
    symbols.into_iter().map(char::from).collect()
}

/// Encodes an arbitrary number, yielding [`INVALID_MARKER`] unless it is integral.
pub fn encode_number(value: f64) -> String {
    const LIMIT: f64 = 9_223_372_036_854_775_807.0;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < LIMIT {
        encode_int(value as i64)
    } else {
        INVALID_MARKER.to_string()
    }
}

/// Encodes free text holding a number. The empty string has no encoding.
pub fn encode_int_text(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    Some(match raw.trim().parse::<f64>() {
        Ok(value) => encode_number(value),
        Err(_) => INVALID_MARKER.to_string(),
    })
}

pub fn decode_int(encoded: &str) -> DecodedInt {
    if encoded.is_empty() {
        return DecodedInt::Null;
    }
    let (negative, digits) = match encoded.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, encoded),
    };
    if digits.is_empty() {
        return DecodedInt::Invalid;
    }
    let mut magnitude: i128 = 0;
    for symbol in digits.bytes() {
        let Some(index) = SYMBOLS.iter().position(|s| *s == symbol) else {
            return DecodedInt::Invalid;
        };
        magnitude = match magnitude
            .checked_mul(i128::from(RADIX as u8))
            .and_then(|m| m.checked_add(index as i128))
        {
            Some(m) if m <= i128::from(i64::MAX) + 1 => m,
            _ => return DecodedInt::Invalid,
        };
    }
    let signed = if negative { -magnitude } else { magnitude };
    match i64::try_from(signed) {
        Ok(value) => DecodedInt::Int(value),
        Err(_) => DecodedInt::Invalid,
    }
}

const CRC_TABLE: [u32; 256] = build_crc_table();

const fn build_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut c = i as u32;
        let mut bit = 0;
        while bit < 8 {
            c = if c & 1 != 0 {
                0xEDB8_8320 ^ (c >> 1)
            } else {
                c >> 1
            };
            bit += 1;
        }
        table[i] = c;
        i += 1;
    }
    table
}

/// Reflected CRC-32. The seed is folded in before the initial inversion, so
/// a schema version passed as seed invalidates checksums of other versions.
pub fn crc32(bytes: &[u8], seed: u32) -> u32 {
    let mut crc = !seed;
    for byte in bytes {
        crc = CRC_TABLE[((crc ^ u32::from(*byte)) & 0xff) as usize] ^ (crc >> 8);
    }
    !crc
}

/// [`crc32`] over `length` bytes starting at `offset`; `None` when out of range.
pub fn crc32_range(bytes: &[u8], offset: usize, length: usize, seed: u32) -> Option<u32> {
    let end = offset.checked_add(length)?;
    bytes.get(offset..end).map(|window| crc32(window, seed))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn round_trips_representative_integers() {
        for value in [
            0,
            1,
            -1,
            63,
            64,
            -64,
            4095,
            4096,
            217,
            16_777_215,
            -2_147_483_648,
            i64::MAX,
            i64::MIN,
        ] {
            assert_eq!(decode_int(&encode_int(value)), DecodedInt::Int(value), "{value}");
        }
    }

    #[test]
    fn encodes_most_significant_symbol_first() {
        assert_eq!(encode_int(0), "0");
        assert_eq!(encode_int(63), ")");
        assert_eq!(encode_int(64), "10");
        assert_eq!(encode_int(-65), "-11");
    }

    #[test]
    fn invalid_inputs_use_marker_or_sentinel() {
        assert_eq!(encode_number(1.5), INVALID_MARKER);
        assert_eq!(encode_number(f64::NAN), INVALID_MARKER);
        assert_eq!(encode_int_text("abc").as_deref(), Some(INVALID_MARKER));
        assert_eq!(encode_int_text("42").as_deref(), Some("g"));
        assert_eq!(encode_int_text(""), None);
        assert_eq!(decode_int(""), DecodedInt::Null);
        assert_eq!(decode_int("!"), DecodedInt::Invalid);
        assert_eq!(decode_int("12 "), DecodedInt::Invalid);
        assert_eq!(decode_int("-"), DecodedInt::Invalid);
    }

    #[test]
    fn overflow_is_invalid() {
        assert_eq!(decode_int("))))))))))))"), DecodedInt::Invalid);
    }

    #[test]
    fn crc_matches_reference_check_value() {
        assert_eq!(crc32(b"123456789", 0), 0xCBF4_3926);
        assert_eq!(crc32_range(b"xx123456789", 2, 9, 0), Some(0xCBF4_3926));
        assert_eq!(crc32_range(b"123", 2, 9, 0), None);
        assert_eq!(crc32(b"", 0), 0);
    }

    #[test]
    fn crc_is_seed_sensitive() {
        let data = b"4,0,1,photos";
        assert_eq!(crc32(data, 217), crc32(data, 217));
        assert_ne!(crc32(data, 217), crc32(data, 218));
        assert_ne!(crc32(data, 217), crc32(b"4,0,1,phntos", 217));
    }

    proptest! {
        #[test]
        fn every_integer_round_trips(value in any::<i64>()) {
            let encoded = encode_int(value);
            prop_assert!(encoded.bytes().all(|b| b == b'-' || SYMBOLS.contains(&b)));
            prop_assert_eq!(decode_int(&encoded), DecodedInt::Int(value));
        }

        #[test]
        fn integral_floats_encode_like_integers(value in -(1i64 << 52)..(1i64 << 52)) {
            prop_assert_eq!(encode_number(value as f64), encode_int(value));
            prop_assert_eq!(encode_int_text(&value.to_string()), Some(encode_int(value)));
        }

        #[test]
        fn distinct_seeds_give_distinct_checksums(
            data in proptest::collection::vec(any::<u8>(), 0..64),
            seed in any::<u32>(),
            other in any::<u32>(),
        ) {
            prop_assume!(seed != other);
            prop_assert_ne!(crc32(&data, seed), crc32(&data, other));
        }

        #[test]
        fn single_byte_corruption_is_detected(
            data in proptest::collection::vec(any::<u8>(), 1..64),
            position in any::<prop::sample::Index>(),
            flip in 1u8..=255,
        ) {
            let mut corrupted = data.clone();
            let at = position.index(data.len());
            corrupted[at] ^= flip;
            prop_assert_ne!(crc32(&data, 217), crc32(&corrupted, 217));
        }
    }
}
