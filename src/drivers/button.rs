use crate::hal::registers::{Port, Register, RegisterFile};
use core::convert::Infallible;
use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::InputPin;

/// BTN1 is wired to PD4 and pulls the pin low when pressed.
pub const BUTTON_PORT: Port = Port::D;
pub const BUTTON_BIT: u8 = 4;

/// Raw level of the board button, read straight from PIND.
pub struct ButtonPin<'a, R> {
    regs: &'a R,
}

impl<'a, R: RegisterFile> ButtonPin<'a, R> {
    pub fn new(regs: &'a R) -> Self {
        Self { regs }
    }
}

impl<R: RegisterFile> InputPin for ButtonPin<'_, R> {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(self.regs.bit(Register::Pin(BUTTON_PORT), BUTTON_BIT))
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// Active-low push button.
pub struct Button<P> {
    pin: P,
    debounce_ms: u16,
}

impl<P: InputPin> Button<P> {
    pub fn new(pin: P, debounce_ms: u16) -> Self {
        Self { pin, debounce_ms }
    }

    pub fn is_pressed(&self) -> Result<bool, P::Error> {
        self.pin.is_low()
    }

    /// Block until a full press and release, settling for the debounce time after each
    /// edge. Samples back to back while waiting.
    pub fn wait_for_click<D: DelayMs<u16>>(&self, delay: &mut D) -> Result<(), P::Error> {
        while !self.is_pressed()? {}
        delay.delay_ms(self.debounce_ms);
        while self.is_pressed()? {}
        delay.delay_ms(self.debounce_ms);
        Ok(())
    }

    pub fn release(self) -> P {
        self.pin
    }
}
