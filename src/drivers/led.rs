use crate::hal::registers::{Port, Register, RegisterFile};

/// The on-board LED sits on PG2, active high.
pub const LED_PORT: Port = Port::G;
pub const LED_BIT: u8 = 2;

pub struct Led<'a, R> {
    regs: &'a mut R,
}

impl<'a, R: RegisterFile> Led<'a, R> {
    pub fn new(regs: &'a mut R) -> Self {
        Self { regs }
    }

    #[inline]
    pub fn on(&mut self) {
        self.regs.set_bit(Register::Port(LED_PORT), LED_BIT);
    }

    #[inline]
    pub fn off(&mut self) {
        self.regs.clear_bit(Register::Port(LED_PORT), LED_BIT);
    }

    #[inline]
    pub fn set(&mut self, on: bool) {
        if on {
            self.on();
        } else {
            self.off();
        }
    }

    #[inline]
    pub fn toggle(&mut self) {
        self.regs.write(Register::Pin(LED_PORT), 1 << LED_BIT);
    }

    pub fn is_on(&self) -> bool {
        self.regs.bit(Register::Port(LED_PORT), LED_BIT)
    }

    /// Blink `count` times with the given on and off time.
    pub fn blink<D>(&mut self, count: u8, period_ms: u16, delay: &mut D)
    where
        D: embedded_hal::blocking::delay::DelayMs<u16>,
    {
        for _ in 0..count {
            self.on();
            delay.delay_ms(period_ms);
            self.off();
            delay.delay_ms(period_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimRegisters;
    use embedded_hal_mock::delay::MockNoop;

    #[test]
    fn on_off_touch_only_pg2() {
        let mut regs = SimRegisters::new();
        regs.write(Register::Port(Port::G), 0b0001_1011);
        let mut led = Led::new(&mut regs);
        led.off();
        assert!(!led.is_on());
        led.on();
        assert!(led.is_on());
        assert_eq!(regs.read(Register::Port(Port::G)), 0b0001_1111);
    }

    #[test]
    fn toggle_flips_the_led() {
        let mut regs = SimRegisters::new();
        let mut led = Led::new(&mut regs);
        led.toggle();
        assert!(led.is_on());
        led.toggle();
        assert!(!led.is_on());
    }

    #[test]
    fn blink_leaves_the_led_off() {
        let mut regs = SimRegisters::new();
        let mut led = Led::new(&mut regs);
        led.set(true);
        led.blink(3, 100, &mut MockNoop::new());
        assert!(!led.is_on());
    }
}
