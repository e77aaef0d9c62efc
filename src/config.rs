//! Configuration constants for the Xiphos 1.0 board
//!
//! Values that vary per build come in through `build.rs`: the clock from `XIPHOS_F_CPU`
//! and the servo count from `XIPHOS_NUM_SERVOS`. Peripheral switches are Cargo features.

use ufmt::{uDisplay, uWrite, uwrite, Formatter};

/// CPU frequency in Hz
pub const CPU_FREQ_HZ: u32 = parse_decimal(env!("XIPHOS_F_CPU"));

/// Settle time after each button edge in milliseconds
pub const BUTTON_DEBOUNCE_MS: u16 = 30;

/// Number of servos driven from the port C bus
pub const NUM_SERVOS: u8 = parse_decimal(env!("XIPHOS_NUM_SERVOS")) as u8;

const fn parse_decimal(digits: &str) -> u32 {
    let bytes = digits.as_bytes();
    let mut value = 0u32;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        assert!(b.is_ascii_digit(), "expected a decimal number");
        value = value * 10 + (b - b'0') as u32;
        i += 1;
    }
    value
}

/// Peripheral collaborators that board initialization may bring up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Peripheral {
    Lcd,
    I2c,
    Motors,
    Servos,
    Adc,
    Uart0,
    Uart1,
    Rtc,
}

impl Peripheral {
    /// Initialization order.
    pub const ALL: [Peripheral; 8] = [
        Peripheral::Lcd,
        Peripheral::I2c,
        Peripheral::Motors,
        Peripheral::Servos,
        Peripheral::Adc,
        Peripheral::Uart0,
        Peripheral::Uart1,
        Peripheral::Rtc,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Peripheral::Lcd => "LCD",
            Peripheral::I2c => "I2C",
            Peripheral::Motors => "motors",
            Peripheral::Servos => "servos",
            Peripheral::Adc => "ADC",
            Peripheral::Uart0 => "UART0",
            Peripheral::Uart1 => "UART1",
            Peripheral::Rtc => "RTC",
        }
    }
}

impl uDisplay for Peripheral {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        f.write_str(self.name())
    }
}

/// Which peripherals this board build carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct BoardConfig {
    pub lcd: bool,
    pub i2c: bool,
    pub motor0: bool,
    pub motor1: bool,
    pub num_servos: u8,
    pub adc: bool,
    pub uart0: bool,
    pub uart1: bool,
    pub rtc: bool,
}

impl BoardConfig {
    /// Configuration selected by Cargo features and the build environment.
    pub const FROM_FEATURES: BoardConfig = BoardConfig {
        lcd: cfg!(feature = "lcd"),
        i2c: cfg!(feature = "i2c"),
        motor0: cfg!(feature = "motor0"),
        motor1: cfg!(feature = "motor1"),
        num_servos: NUM_SERVOS,
        adc: cfg!(feature = "adc"),
        uart0: cfg!(feature = "uart0"),
        uart1: cfg!(feature = "uart1"),
        rtc: cfg!(feature = "rtc"),
    };

    /// A board with no peripherals beyond the fixed pins.
    pub const fn bare() -> Self {
        BoardConfig {
            lcd: false,
            i2c: false,
            motor0: false,
            motor1: false,
            num_servos: 0,
            adc: false,
            uart0: false,
            uart1: false,
            rtc: false,
        }
    }

    pub const fn is_enabled(&self, peripheral: Peripheral) -> bool {
        match peripheral {
            Peripheral::Lcd => self.lcd,
            // One initializer handles both motor channels
            Peripheral::Motors => self.motor0 || self.motor1,
            Peripheral::I2c => self.i2c,
            Peripheral::Servos => self.num_servos > 0,
            Peripheral::Adc => self.adc,
            Peripheral::Uart0 => self.uart0,
            Peripheral::Uart1 => self.uart1,
            Peripheral::Rtc => self.rtc,
        }
    }

    /// Enabled peripherals in initialization order.
    pub fn enabled(&self) -> impl Iterator<Item = Peripheral> + '_ {
        Peripheral::ALL
            .iter()
            .copied()
            .filter(move |p| self.is_enabled(*p))
    }
}

impl uDisplay for BoardConfig {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        f.write_str("peripherals:")?;
        let mut any = false;
        for p in self.enabled() {
            any = true;
            if p == Peripheral::Servos {
                uwrite!(f, " {}({})", p, self.num_servos)?;
            } else {
                uwrite!(f, " {}", p)?;
            }
        }
        if !any {
            f.write_str(" none")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::string::String;
    use std::vec::Vec;

    struct Sink(String);

    impl uWrite for Sink {
        type Error = core::convert::Infallible;

        fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
            self.0.push_str(s);
            Ok(())
        }
    }

    #[test]
    fn parses_build_environment_numbers() {
        assert_eq!(parse_decimal("16000000"), 16_000_000);
        assert_eq!(parse_decimal("0"), 0);
        assert_eq!(parse_decimal("8"), 8);
    }

    #[test]
    fn bare_board_enables_nothing() {
        assert_eq!(BoardConfig::bare().enabled().count(), 0);
        assert_eq!(BoardConfig::bare(), BoardConfig::default());
    }

    #[test]
    fn either_motor_enables_the_motor_initializer() {
        let one = BoardConfig { motor1: true, ..BoardConfig::bare() };
        let both = BoardConfig { motor0: true, motor1: true, ..BoardConfig::bare() };
        assert_eq!(one.enabled().collect::<Vec<_>>(), [Peripheral::Motors]);
        assert_eq!(both.enabled().collect::<Vec<_>>(), [Peripheral::Motors]);
    }

    #[test]
    fn servos_follow_the_servo_count() {
        let none = BoardConfig { num_servos: 0, ..BoardConfig::bare() };
        let four = BoardConfig { num_servos: 4, ..BoardConfig::bare() };
        assert!(!none.is_enabled(Peripheral::Servos));
        assert!(four.is_enabled(Peripheral::Servos));
    }

    #[test]
    fn enabled_keeps_initialization_order() {
        let config = BoardConfig {
            rtc: true,
            lcd: true,
            uart0: true,
            adc: true,
            ..BoardConfig::bare()
        };
        let order: Vec<_> = config.enabled().collect();
        assert_eq!(
            order,
            [Peripheral::Lcd, Peripheral::Adc, Peripheral::Uart0, Peripheral::Rtc]
        );
    }

    #[test]
    fn displays_enabled_peripherals() {
        let mut sink = Sink(String::new());
        let config = BoardConfig { i2c: true, num_servos: 2, ..BoardConfig::bare() };
        ufmt::uwrite!(&mut sink, "{}", config).unwrap();
        assert_eq!(sink.0, "peripherals: I2C servos(2)");

        let mut sink = Sink(String::new());
        ufmt::uwrite!(&mut sink, "{}", BoardConfig::bare()).unwrap();
        assert_eq!(sink.0, "peripherals: none");
    }
}
