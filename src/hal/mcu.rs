//! [`RegisterFile`] over the real ATmega1281 registers.

use super::registers::{Port, Register, RegisterFile};
use avr_device::atmega1280::Peripherals;
use avr_device::interrupt;

/// Handle to the MCU's I/O registers.
pub struct Mcu {
    _private: (),
}

impl Mcu {
    /// Claims the device peripherals. Returns `None` if they were already taken.
    pub fn take() -> Option<Self> {
        Peripherals::take().map(|_| Self { _private: () })
    }
}

// One row per register: how to reach it through the PAC.
macro_rules! register_map {
    ($($reg:pat => $periph:ident . $field:ident,)*) => {
        #[inline]
        fn read_raw(reg: Register) -> u8 {
            let dp = unsafe { Peripherals::steal() };
            match reg {
                $($reg => dp.$periph.$field.read().bits(),)*
            }
        }

        #[inline]
        #[allow(unused_unsafe)]
        fn write_raw(reg: Register, value: u8) {
            let dp = unsafe { Peripherals::steal() };
            match reg {
                $($reg => dp.$periph.$field.write(|w| unsafe { w.bits(value) }),)*
            }
        }
    };
}

register_map! {
    Register::Ddr(Port::A) => PORTA.ddra,
    Register::Port(Port::A) => PORTA.porta,
    Register::Pin(Port::A) => PORTA.pina,
    Register::Ddr(Port::B) => PORTB.ddrb,
    Register::Port(Port::B) => PORTB.portb,
    Register::Pin(Port::B) => PORTB.pinb,
    Register::Ddr(Port::C) => PORTC.ddrc,
    Register::Port(Port::C) => PORTC.portc,
    Register::Pin(Port::C) => PORTC.pinc,
    Register::Ddr(Port::D) => PORTD.ddrd,
    Register::Port(Port::D) => PORTD.portd,
    Register::Pin(Port::D) => PORTD.pind,
    Register::Ddr(Port::G) => PORTG.ddrg,
    Register::Port(Port::G) => PORTG.portg,
    Register::Pin(Port::G) => PORTG.ping,
    Register::Mcusr => CPU.mcusr,
    Register::Wdtcsr => WDT.wdtcsr,
}

impl RegisterFile for Mcu {
    #[inline]
    fn read(&self, reg: Register) -> u8 {
        read_raw(reg)
    }

    #[inline]
    fn write(&mut self, reg: Register, value: u8) {
        write_raw(reg, value)
    }

    #[inline]
    fn modify<F>(&mut self, reg: Register, f: F)
    where
        F: FnOnce(u8) -> u8,
    {
        // An ISR touching the same port must not land between the read and the write
        interrupt::free(|_| write_raw(reg, f(read_raw(reg))));
    }

    #[inline]
    fn critical<T, F>(&mut self, f: F) -> T
    where
        F: FnOnce(&mut Self) -> T,
    {
        interrupt::free(|_| f(self))
    }
}
