//! Xiphos 1.0 board: fixed pin setup, peripheral bring-up and the utility operations.
//!
//! Fixed pins:
//! - PD4: BTN1 input with pullup
//! - PD5: 74LS374 (D flip-flop) clock, output
//! - PG2: LED, output
//! - PORTC: LCD/servo bus, all outputs
//! - PG3/PG4: 32 kHz crystal for the RTC, left to the RTC initializer
//!
//! Registers are the only state. Nothing is cached here.

use crate::config::{BoardConfig, Peripheral, BUTTON_DEBOUNCE_MS};
use crate::drivers::button::{Button, ButtonPin, BUTTON_BIT, BUTTON_PORT};
use crate::drivers::led::{Led, LED_BIT, LED_PORT};
use crate::hal::delay::BusyDelay;
use crate::hal::gpio::{DigitalIo, Direction, Line, LinePin};
use crate::hal::registers::{Port, Register, RegisterFile};
use crate::hal::watchdog::{self, Watchdog};
use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use ufmt::{uWrite, uwrite};

/// Latch clock for the 74LS374 on the port C bus.
pub const LATCH_CLOCK_PORT: Port = Port::D;
pub const LATCH_CLOCK_BIT: u8 = 5;

/// Brings up one peripheral. The application implements this for the drivers it links;
/// the board calls it for each peripheral enabled in the [`BoardConfig`].
pub trait PeripheralInit {
    fn init(&mut self, peripheral: Peripheral);
}

/// For boards that link no peripheral drivers.
impl PeripheralInit for () {
    fn init(&mut self, _peripheral: Peripheral) {}
}

pub struct Board<R, D = BusyDelay> {
    regs: R,
    delay: D,
}

#[cfg(target_arch = "avr")]
impl Board<crate::hal::mcu::Mcu, BusyDelay> {
    /// Claims the MCU registers. Returns `None` on a second call.
    pub fn take() -> Option<Self> {
        crate::hal::mcu::Mcu::take().map(|mcu| Board::new(mcu, BusyDelay::new()))
    }
}

impl<R, D> Board<R, D>
where
    R: RegisterFile,
    D: DelayMs<u16> + DelayUs<u16>,
{
    pub fn new(regs: R, delay: D) -> Self {
        Self { regs, delay }
    }

    /// Put the fixed pins into their working state, then bring up every enabled
    /// peripheral in order. Safe to run again.
    pub fn initialize<P: PeripheralInit>(&mut self, config: &BoardConfig, peripherals: &mut P) {
        self.configure_fixed_pins();
        for peripheral in config.enabled() {
            peripherals.init(peripheral);
        }
    }

    /// [`Board::initialize`], reporting each step to `log`.
    pub fn initialize_logged<P, W>(
        &mut self,
        config: &BoardConfig,
        peripherals: &mut P,
        log: &mut W,
    ) -> Result<(), W::Error>
    where
        P: PeripheralInit,
        W: uWrite,
    {
        self.configure_fixed_pins();
        uwrite!(log, "board: fixed pins configured\r\n")?;
        for peripheral in config.enabled() {
            peripherals.init(peripheral);
            uwrite!(log, "board: {} initialized\r\n", peripheral)?;
        }
        uwrite!(log, "board: ready, {}\r\n", config)
    }

    fn configure_fixed_pins(&mut self) {
        let regs = &mut self.regs;
        regs.clear_bit(Register::Ddr(BUTTON_PORT), BUTTON_BIT);
        regs.set_bit(Register::Port(BUTTON_PORT), BUTTON_BIT);
        regs.set_bit(Register::Ddr(LED_PORT), LED_BIT);
        regs.set_bit(Register::Ddr(LATCH_CLOCK_PORT), LATCH_CLOCK_BIT);
        regs.write(Register::Ddr(Port::C), 0xFF);
    }

    #[inline]
    pub fn delay_ms(&mut self, ms: u16) {
        self.delay.delay_ms(ms);
    }

    #[inline]
    pub fn delay_us(&mut self, us: u16) {
        self.delay.delay_us(us);
    }

    pub fn button_pressed(&self) -> bool {
        self.button().is_pressed().unwrap_or_else(|never| match never {})
    }

    /// Block until BTN1 is pressed and released, with debouncing.
    pub fn button_wait(&mut self) {
        let button = Button::new(ButtonPin::new(&self.regs), BUTTON_DEBOUNCE_MS);
        button
            .wait_for_click(&mut self.delay)
            .unwrap_or_else(|never| match never {});
    }

    fn button(&self) -> Button<ButtonPin<'_, R>> {
        Button::new(ButtonPin::new(&self.regs), BUTTON_DEBOUNCE_MS)
    }

    pub fn led(&mut self) -> Led<'_, R> {
        Led::new(&mut self.regs)
    }

    pub fn led_on(&mut self) {
        self.led().on();
    }

    pub fn led_off(&mut self) {
        self.led().off();
    }

    pub fn led_toggle(&mut self) {
        self.led().toggle();
    }

    pub fn is_led_on(&self) -> bool {
        self.regs.bit(Register::Port(LED_PORT), LED_BIT)
    }

    pub fn set_direction(&mut self, line: Line, direction: Direction) {
        self.regs.set_direction(line, direction);
    }

    pub fn set_directions(&mut self, outputs: u16) {
        self.regs.set_directions(outputs);
    }

    pub fn set_pullups(&mut self, pullups: u16) {
        self.regs.set_pullups(pullups);
    }

    pub fn direction(&self, line: Line) -> Direction {
        self.regs.direction(line)
    }

    pub fn directions(&self) -> u16 {
        self.regs.directions()
    }

    pub fn read_line(&self, line: Line) -> bool {
        self.regs.read_line(line)
    }

    pub fn write_line(&mut self, line: Line, high: bool) {
        self.regs.write_line(line, high);
    }

    pub fn write_lines(&mut self, levels: u16) {
        self.regs.write_lines(levels);
    }

    pub fn read_lines(&self) -> u16 {
        self.regs.read_lines()
    }

    pub fn toggle_line(&mut self, line: Line) {
        self.regs.toggle_line(line);
    }

    /// One line as an embedded-hal pin, for drivers written against those traits.
    pub fn line(&mut self, line: Line) -> LinePin<'_, R> {
        LinePin::new(&mut self.regs, line)
    }

    pub fn watchdog(&mut self) -> Watchdog<'_, R> {
        Watchdog::new(&mut self.regs)
    }

    /// Restart the MCU through the watchdog. Never returns.
    pub fn soft_reset(&mut self) -> ! {
        watchdog::soft_reset(&mut self.regs)
    }

    pub fn registers(&self) -> &R {
        &self.regs
    }

    pub fn registers_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    pub fn free(self) -> (R, D) {
        (self.regs, self.delay)
    }
}
