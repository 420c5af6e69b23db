//! Binary-coded decimal encoding of one two-digit time field.
//!
//! Each field owns an 8-position window. The tens digit is written from the
//! start of the window upwards, the ones digit from the end of the window
//! downwards, so the two digits grow toward each other.

use heapless::Vec;

/// Bits per decimal digit.
pub const DIGIT_BITS: u8 = 4;

/// Positions per field window.
pub const FIELD_WIDTH: u8 = 2 * DIGIT_BITS;

/// Indicator positions switched on by one field.
pub type Positions = Vec<u8, { FIELD_WIDTH as usize }>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Field {
    Seconds,
    Minutes,
    Hours,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Seconds, Field::Minutes, Field::Hours];

    /// First position of the field's window.
    pub const fn offset(self) -> u8 {
        match self {
            Field::Seconds => 0,
            Field::Minutes => FIELD_WIDTH,
            Field::Hours => 2 * FIELD_WIDTH,
        }
    }
}

/// Returns the positions to switch on for `value` in the window starting at `offset`.
///
/// Bit `i` of the ones digit lands on `offset + 7 - i`, bit `i` of the tens digit
/// on `offset + i`. Clear bits produce nothing; the encoder never switches a
/// position off.
pub fn encode(offset: u8, value: u8) -> Positions {
    let tens = value / 10;
    let ones = value % 10;

    let mut positions = Positions::new();
    for i in 0..DIGIT_BITS {
        if ones & (1 << i) != 0 {
            // capacity is FIELD_WIDTH and at most FIELD_WIDTH bits are tested
            let _ = positions.push(offset + FIELD_WIDTH - 1 - i);
        }
    }
    for i in 0..DIGIT_BITS {
        if tens & (1 << i) != 0 {
            let _ = positions.push(offset + i);
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(positions: Positions) -> std::vec::Vec<u8> {
        let mut v: std::vec::Vec<u8> = positions.into_iter().collect();
        v.sort_unstable();
        v
    }

    #[test]
    fn thirty_seven_splits_into_tens_and_ones() {
        let offset = Field::Seconds.offset();
        // tens 3 -> offset+0, offset+1; ones 7 -> offset+7, offset+6, offset+5
        assert_eq!(sorted(encode(offset, 37)), [0, 1, 5, 6, 7]);
    }

    #[test]
    fn ones_only_value_lights_the_far_end() {
        // 5 = 0b0101 -> bits 0 and 2 -> offset+7 and offset+5
        assert_eq!(sorted(encode(0, 5)), [5, 7]);
        assert_eq!(sorted(encode(8, 5)), [13, 15]);
    }

    #[test]
    fn zero_lights_nothing() {
        assert!(encode(16, 0).is_empty());
    }

    #[test]
    fn count_and_window_hold_for_every_field_value() {
        for field in Field::ALL {
            let offset = field.offset();
            for value in 0..=59u8 {
                let positions = encode(offset, value);
                let expected = (value / 10).count_ones() + (value % 10).count_ones();
                assert_eq!(positions.len() as u32, expected, "value {value}");
                assert!(positions
                    .iter()
                    .all(|&p| (offset..offset + FIELD_WIDTH).contains(&p)));
            }
        }
    }

    #[test]
    fn digits_never_collide() {
        for value in 0..=59u8 {
            let all = sorted(encode(0, value));
            let mut dedup = all.clone();
            dedup.dedup();
            assert_eq!(all, dedup, "value {value}");
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        for value in 0..=59u8 {
            assert_eq!(encode(8, value), encode(8, value));
        }
    }

    #[test]
    fn field_windows_are_disjoint() {
        assert_eq!(Field::Seconds.offset(), 0);
        assert_eq!(Field::Minutes.offset(), 8);
        assert_eq!(Field::Hours.offset(), 16);
    }
}
