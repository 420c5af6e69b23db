use embedded_graphics::pixelcolor::PixelColor;

use crate::encoder::{self, Field, FIELD_WIDTH};
use crate::timestamp::Timestamp;

/// Total addressable indicators: three field windows.
pub const INDICATOR_COUNT: u8 = 3 * FIELD_WIDTH;

/// Status pattern shown while a resync has connectivity.
pub const STATUS_CONNECTED: u8 = 4;
/// Status pattern shown when a resync sequence ends.
pub const STATUS_DONE: u8 = 8;

/// On/off state of every indicator, one bit per position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IndicatorSet(u32);

impl IndicatorSet {
    pub const fn new() -> Self {
        Self(0)
    }

    /// Full indicator set for `time`, built from a cleared set.
    pub fn from_time(time: &Timestamp) -> Self {
        let mut set = Self::new();
        set.show(Field::Seconds.offset(), time.second());
        set.show(Field::Minutes.offset(), time.minute());
        set.show(Field::Hours.offset(), time.hour());
        set
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// Positions outside the display are ignored.
    pub fn set(&mut self, position: u8) {
        if position < INDICATOR_COUNT {
            self.0 |= 1 << position;
        }
    }

    pub fn is_on(&self, position: u8) -> bool {
        position < INDICATOR_COUNT && self.0 & (1 << position) != 0
    }

    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Switches on the encoding of `value` in the window at `offset`.
    pub fn show(&mut self, offset: u8, value: u8) {
        for position in encoder::encode(offset, value) {
            self.set(position);
        }
    }

    pub fn iter_on(&self) -> impl Iterator<Item = u8> + '_ {
        (0..INDICATOR_COUNT).filter(move |&p| self.is_on(p))
    }

    /// Rows for an 8x8 matrix: one field window per row, window position
    /// `k` in column `k` counted from the most significant bit.
    pub fn rows(&self) -> [u8; 8] {
        let mut rows = [0u8; 8];
        for position in self.iter_on() {
            let row = (position / FIELD_WIDTH) as usize;
            let column = position % FIELD_WIDTH;
            rows[row] |= 0x80 >> column;
        }
        rows
    }
}

/// Physical indicator display.
///
/// Writes are fire-and-forget: implementations log their own bus failures.
pub trait IndicatorDisplay {
    type Color: PixelColor;

    fn clear(&mut self);
    fn set_indicator(&mut self, position: u8, color: Self::Color);
    fn flush(&mut self);
}

/// Pushes whole indicator sets to a display; never carries state between frames.
pub struct Renderer<C> {
    color: C,
}

impl<C: PixelColor> Renderer<C> {
    pub const fn new(color: C) -> Self {
        Self { color }
    }

    /// Full redraw of seconds, minutes and hours from one snapshot.
    pub fn render<D>(&self, display: &mut D, time: &Timestamp) -> IndicatorSet
    where
        D: IndicatorDisplay<Color = C>,
    {
        let set = IndicatorSet::from_time(time);
        self.push(display, &set);
        set
    }

    /// Replaces the face with a status pattern in the minutes window.
    pub fn show_status<D>(&self, display: &mut D, code: u8) -> IndicatorSet
    where
        D: IndicatorDisplay<Color = C>,
    {
        let mut set = IndicatorSet::new();
        set.show(Field::Minutes.offset(), code);
        self.push(display, &set);
        set
    }

    fn push<D>(&self, display: &mut D, set: &IndicatorSet)
    where
        D: IndicatorDisplay<Color = C>,
    {
        display.clear();
        for position in set.iter_on() {
            display.set_indicator(position, self.color);
        }
        display.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::mocks::RecordingDisplay;
    use embedded_graphics::pixelcolor::{BinaryColor, Rgb888};

    fn at(hour: u32, min: u32, sec: u32) -> Timestamp {
        Timestamp::from_ymd_hms(2024, 6, 1, hour, min, sec).unwrap()
    }

    #[test]
    fn full_face_for_twelve_thirty_four_fifty_six() {
        let set = IndicatorSet::from_time(&at(12, 34, 56));
        let on: std::vec::Vec<u8> = set.iter_on().collect();
        // 56: tens 5 -> 0, 2; ones 6 -> 6, 5
        // 34: tens 3 -> 8, 9; ones 4 -> 13
        // 12: tens 1 -> 16; ones 2 -> 22
        assert_eq!(on, [0, 2, 5, 6, 8, 9, 13, 16, 22]);
    }

    #[test]
    fn midnight_is_dark() {
        assert!(IndicatorSet::from_time(&at(0, 0, 0)).is_empty());
    }

    #[test]
    fn out_of_range_positions_are_ignored() {
        let mut set = IndicatorSet::new();
        set.set(INDICATOR_COUNT);
        set.set(31);
        assert!(set.is_empty());
    }

    #[test]
    fn rows_place_each_window_on_its_own_row() {
        let set = IndicatorSet::from_time(&at(12, 34, 56));
        let rows = set.rows();
        assert_eq!(rows[0], 0b1010_0110);
        assert_eq!(rows[1], 0b1100_0100);
        assert_eq!(rows[2], 0b1000_0010);
        assert_eq!(&rows[3..], &[0; 5]);
    }

    #[test]
    fn render_clears_before_drawing() {
        let renderer = Renderer::new(Rgb888::new(10, 22, 22));
        let mut display: RecordingDisplay<Rgb888> = RecordingDisplay::default();

        renderer.render(&mut display, &at(23, 59, 59));
        renderer.render(&mut display, &at(0, 0, 1));

        assert_eq!(display.frames.len(), 2);
        // only the seconds ones bit 0 survives the second frame
        assert_eq!(display.frames[1].iter_on().collect::<std::vec::Vec<_>>(), [7]);
        assert_eq!(display.clears, 2);
        assert!(display.colors.iter().all(|&c| c == Rgb888::new(10, 22, 22)));
    }

    #[test]
    fn render_reports_what_was_pushed() {
        let renderer = Renderer::new(BinaryColor::On);
        let mut display: RecordingDisplay = RecordingDisplay::default();
        let shown = renderer.render(&mut display, &at(10, 20, 30));
        assert_eq!(display.frames.last(), Some(&shown));
    }

    #[test]
    fn status_pattern_uses_minutes_window() {
        let renderer = Renderer::new(BinaryColor::On);
        let mut display: RecordingDisplay = RecordingDisplay::default();
        let connected = renderer.show_status(&mut display, STATUS_CONNECTED);
        let done = renderer.show_status(&mut display, STATUS_DONE);
        assert_eq!(connected.iter_on().collect::<std::vec::Vec<_>>(), [13]);
        assert_eq!(done.iter_on().collect::<std::vec::Vec<_>>(), [12]);
    }
}
