//! Structured-append header parsing.
//!
//! A QR symbol that is one part of a multi-symbol message starts its
//! codeword stream with a structured-append header: a mode indicator
//! nibble of `0011`, a zero-based symbol position nibble, and a
//! total-count nibble storing the part count minus one. Parsing reads the
//! first two bytes of the error-corrected payload; anything shorter, or
//! any other mode indicator, means the symbol stands alone.

/// Mode indicator nibble marking a structured-append symbol.
const MODE_STRUCTURED_APPEND: u8 = 0b0011;

/// Position of one symbol within a multi-symbol message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructuredAppend {
    index: u8,
    total: u8,
}

impl StructuredAppend {
    /// Reads the structured-append header from a codeword payload.
    ///
    /// Returns `None` when the payload is shorter than two bytes or does
    /// not start with the structured-append mode indicator.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        if payload.len() < 2 {
            return None;
        }
        if (payload[0] >> 4) & 0x0F != MODE_STRUCTURED_APPEND {
            return None;
        }
        Some(Self {
            index: payload[0] & 0x0F,
            total: ((payload[1] >> 4) & 0x0F) + 1,
        })
    }

    /// Zero-based position of this symbol in the sequence.
    #[inline]
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Number of symbols in the sequence, at least 1.
    #[inline]
    pub fn total(&self) -> u8 {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parses_second_of_three() {
        let header = StructuredAppend::parse(&[0x31, 0x20]).unwrap();
        assert_eq!(header.index(), 1);
        assert_eq!(header.total(), 3);
    }

    #[test]
    fn test_short_payloads_have_no_header() {
        assert_eq!(StructuredAppend::parse(&[]), None);
        assert_eq!(StructuredAppend::parse(&[0x31]), None);
    }

    #[test]
    fn test_other_modes_have_no_header() {
        // 0x40 is the byte-mode indicator.
        assert_eq!(StructuredAppend::parse(&[0x40, 0x20]), None);
        assert_eq!(StructuredAppend::parse(&[0x12, 0x20]), None);
    }

    proptest! {
        #[test]
        fn prop_header_fields_come_from_nibbles(index in 0u8..16, count_less_one in 0u8..16, tail in proptest::collection::vec(any::<u8>(), 0..8)) {
            let mut payload = vec![0x30 | index, count_less_one << 4];
            payload.extend(tail);

            let header = StructuredAppend::parse(&payload).unwrap();
            prop_assert_eq!(header.index(), index);
            prop_assert_eq!(header.total(), count_less_one + 1);
        }

        #[test]
        fn prop_non_append_modes_never_parse(first in any::<u8>(), second in any::<u8>()) {
            prop_assume!((first >> 4) & 0x0F != MODE_STRUCTURED_APPEND);
            prop_assert_eq!(StructuredAppend::parse(&[first, second]), None);
        }

        #[test]
        fn prop_parse_never_panics(payload in proptest::collection::vec(any::<u8>(), 0..64)) {
            if let Some(header) = StructuredAppend::parse(&payload) {
                prop_assert!(header.total() >= 1);
                prop_assert!(header.index() < 16);
            }
        }
    }
}
