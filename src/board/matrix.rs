use binclock::{IndicatorDisplay, IndicatorSet};
use embedded_graphics::pixelcolor::BinaryColor;
use max7219::connectors::Connector;
use max7219::MAX7219;

/// Intensity register value, 0x0 (dimmest) to 0xF.
const INTENSITY: u8 = 0x0;

/// Single 8x8 MAX7219 module: seconds, minutes and hours on rows 0 to 2.
pub struct MatrixDisplay<C> {
    driver: MAX7219<C>,
    pending: IndicatorSet,
}

impl<C: Connector> MatrixDisplay<C> {
    pub fn new(mut driver: MAX7219<C>) -> Result<Self, max7219::DataError> {
        driver.power_on()?;
        driver.set_intensity(0, INTENSITY)?;
        driver.clear_display(0)?;
        Ok(Self {
            driver,
            pending: IndicatorSet::new(),
        })
    }
}

impl<C: Connector> IndicatorDisplay for MatrixDisplay<C> {
    type Color = BinaryColor;

    fn clear(&mut self) {
        self.pending.clear();
    }

    fn set_indicator(&mut self, position: u8, color: BinaryColor) {
        if color.is_on() {
            self.pending.set(position);
        }
    }

    fn flush(&mut self) {
        if self.driver.write_raw(0, &self.pending.rows()).is_err() {
            defmt::warn!("matrix write failed");
        }
    }
}
