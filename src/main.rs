#![no_std]
#![no_main]

use defmt_rtt as _;
use panic_probe as _;
use rtic::app;

mod board;

use binclock::TickFlag;

/// Raised by the timer interrupt, cleared by the control loop.
static TICK: TickFlag = TickFlag::new();

#[app(device = rp_pico::hal::pac, peripherals = true)]
mod app {
    use super::*;
    use binclock::esp_at::EspAt;
    use binclock::tick::{self, TICK_PERIOD_US};
    use binclock::{ClockConfig, Controller, InitError, Peripheral, SntpClient};
    use embedded_graphics::pixelcolor::BinaryColor;
    use max7219::MAX7219;
    use rp_pico::hal::{
        clocks::{init_clocks_and_plls, Clock},
        gpio::{FunctionI2C, FunctionUart, Pin, PullUp},
        sio::Sio,
        spi::Spi,
        timer::{Alarm, Timer},
        uart::{DataBits, StopBits, UartConfig, UartPeripheral},
        watchdog::Watchdog,
        fugit::{RateExtU32, ExtU32},
        I2C,
    };
    use crate::board::{MatrixDisplay, RtcClock, TickAlarm};

    // Type definition for the MAX7219 display
    type Spi0 = Spi<rp_pico::hal::spi::Enabled, rp_pico::hal::pac::SPI0, (
        Pin<rp_pico::hal::gpio::bank0::Gpio19, rp_pico::hal::gpio::FunctionSpi, rp_pico::hal::gpio::PullDown>,
        Pin<rp_pico::hal::gpio::bank0::Gpio16, rp_pico::hal::gpio::FunctionSpi, rp_pico::hal::gpio::PullDown>,
        Pin<rp_pico::hal::gpio::bank0::Gpio18, rp_pico::hal::gpio::FunctionSpi, rp_pico::hal::gpio::PullDown>
    )>;
    type CsPin = Pin<rp_pico::hal::gpio::bank0::Gpio17, rp_pico::hal::gpio::FunctionSio<rp_pico::hal::gpio::SioOutput>, rp_pico::hal::gpio::PullDown>;
    type DisplayType = MatrixDisplay<max7219::connectors::SpiConnectorSW<Spi0, CsPin>>;

    // DS3231 on I2C0 (GP4 = SDA, GP5 = SCL)
    type I2c0 = I2C<rp_pico::hal::pac::I2C0, (
        Pin<rp_pico::hal::gpio::bank0::Gpio4, FunctionI2C, PullUp>,
        Pin<rp_pico::hal::gpio::bank0::Gpio5, FunctionI2C, PullUp>
    )>;

    // ESP-AT modem on UART0 (GP0 = TX, GP1 = RX)
    type Uart0 = UartPeripheral<rp_pico::hal::uart::Enabled, rp_pico::hal::pac::UART0, (
        Pin<rp_pico::hal::gpio::bank0::Gpio0, FunctionUart, rp_pico::hal::gpio::PullDown>,
        Pin<rp_pico::hal::gpio::bank0::Gpio1, FunctionUart, rp_pico::hal::gpio::PullDown>
    )>;
    type Network = SntpClient<EspAt<Uart0, Timer>>;

    type ClockController = Controller<RtcClock<I2c0>, Network, DisplayType, Timer>;

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        alarm: TickAlarm,
        controller: ClockController,
    }

    fn fatal(err: InitError) -> ! {
        defmt::panic!("{}", err)
    }

    #[init]
    fn init(ctx: init::Context) -> (Shared, Local, init::Monotonics) {
        let mut pac = ctx.device;
        let mut watchdog = Watchdog::new(pac.WATCHDOG);
        let sio = Sio::new(pac.SIO);
        let config = ClockConfig::DEFAULT;
        if let Err(err) = config.validate() {
            defmt::panic!("invalid clock config: {}", err);
        }

        let external_xtal_freq_hz = 12_000_000u32;
        let clocks = init_clocks_and_plls(
            external_xtal_freq_hz,
            pac.XOSC,
            pac.CLOCKS,
            pac.PLL_SYS,
            pac.PLL_USB,
            &mut pac.RESETS,
            &mut watchdog,
        )
        .ok()
        .unwrap();

        let mut timer = Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);

        let pins = rp_pico::Pins::new(
            pac.IO_BANK0,
            pac.PADS_BANK0,
            sio.gpio_bank0,
            &mut pac.RESETS,
        );

        let mosi = pins.gpio19.into_function::<rp_pico::hal::gpio::FunctionSpi>();
        let sck = pins.gpio18.into_function::<rp_pico::hal::gpio::FunctionSpi>();
        let miso = pins.gpio16.into_function::<rp_pico::hal::gpio::FunctionSpi>();
        let cs = pins.gpio17.into_push_pull_output();

        let spi = Spi::<_, _, _, 8>::new(pac.SPI0, (mosi, miso, sck));
        let spi = spi.init(
            &mut pac.RESETS,
            clocks.peripheral_clock.freq(),
            2_000_000u32.Hz(),
            &embedded_hal::spi::MODE_0,
        );
        let display = MAX7219::from_spi_cs(1, spi, cs)
            .and_then(MatrixDisplay::new)
            .unwrap_or_else(|_| fatal(InitError::HardwareInitFailure(Peripheral::Display)));

        let sda: Pin<_, FunctionI2C, PullUp> = pins.gpio4.reconfigure();
        let scl: Pin<_, FunctionI2C, PullUp> = pins.gpio5.reconfigure();
        let i2c = I2C::i2c0(
            pac.I2C0,
            sda,
            scl,
            400.kHz(),
            &mut pac.RESETS,
            &clocks.system_clock,
        );
        let rtc = RtcClock::begin(i2c).unwrap_or_else(|err| fatal(err));

        let tx = pins.gpio0.into_function::<FunctionUart>();
        let rx = pins.gpio1.into_function::<FunctionUart>();
        let uart = UartPeripheral::new(pac.UART0, (tx, rx), &mut pac.RESETS)
            .enable(
                UartConfig::new(115_200.Hz(), DataBits::Eight, None, StopBits::One),
                clocks.peripheral_clock.freq(),
            )
            .ok()
            .unwrap();
        let mut modem = EspAt::new(uart, timer);
        if let Err(err) = modem.init() {
            // not fatal: every resync will just find no connectivity
            defmt::warn!("esp-at modem not ready: {}", err);
        }

        let controller = Controller::new(
            rtc,
            SntpClient::new(modem, &config),
            display,
            timer,
            &config,
            BinaryColor::On,
        );

        let mut alarm = timer.alarm_0().unwrap();
        alarm.schedule(TICK_PERIOD_US.micros()).unwrap();
        alarm.enable_interrupt();

        // prime our first tick
        TICK.signal();
        defmt::info!("binclock up");

        (
            Shared {},
            Local {
                alarm: TickAlarm(alarm),
                controller,
            },
            init::Monotonics(),
        )
    }

    // Hardware Task: Timer Interrupt (1Hz), signal only
    #[task(binds = TIMER_IRQ_0, priority = 1, local = [alarm])]
    fn timer_tick(ctx: timer_tick::Context) {
        tick::service_interrupt(ctx.local.alarm, &TICK);
    }

    // Control loop: resync decision, then a full redraw, once per tick
    #[idle(local = [controller])]
    fn idle(ctx: idle::Context) -> ! {
        loop {
            if ctx.local.controller.poll(&TICK).is_none() {
                core::hint::spin_loop();
            }
        }
    }
}
