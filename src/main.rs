#![cfg_attr(target_arch = "avr", no_std)]
#![cfg_attr(target_arch = "avr", no_main)]

#[cfg(target_arch = "avr")]
mod firmware {
    use avr_device::atmega1280::Peripherals;
    use core::convert::Infallible;
    use panic_halt as _;
    use ufmt::{uWrite, uwrite};
    use xiphos_board::config::CPU_FREQ_HZ;
    use xiphos_board::hal::watchdog::{boot_reset_flags, ResetCause};
    use xiphos_board::{Board, BoardConfig, Peripheral, PeripheralInit};

    const UART_BAUD: u32 = 9600;

    /// Polled transmit-only console on USART0.
    pub struct Console;

    impl Console {
        pub fn init() {
            let dp = unsafe { Peripherals::steal() };
            let ubrr = (CPU_FREQ_HZ / (16 * UART_BAUD) - 1) as u16;
            dp.USART0.ubrr0.write(|w| unsafe { w.bits(ubrr) });
            dp.USART0.ucsr0b.write(|w| w.txen0().set_bit());
        }

        pub fn write_byte(&mut self, byte: u8) {
            let dp = unsafe { Peripherals::steal() };
            while dp.USART0.ucsr0a.read().udre0().bit_is_clear() {}
            dp.USART0.udr0.write(|w| unsafe { w.bits(byte) });
        }
    }

    impl uWrite for Console {
        type Error = Infallible;

        fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
            for byte in s.bytes() {
                self.write_byte(byte);
            }
            Ok(())
        }
    }

    /// Drivers linked into this firmware. Only the console is; the rest of the
    /// peripherals are reported and skipped.
    struct Linked<'a> {
        console: &'a mut Console,
    }

    impl PeripheralInit for Linked<'_> {
        fn init(&mut self, peripheral: Peripheral) {
            match peripheral {
                Peripheral::Uart0 => Console::init(),
                other => {
                    let _ = uwrite!(&mut *self.console, "board: no {} driver linked\r\n", other);
                }
            }
        }
    }

    #[avr_device::entry]
    fn main() -> ! {
        let mut board = match Board::take() {
            Some(board) => board,
            None => loop {},
        };
        let mut console = Console;
        let config = BoardConfig::FROM_FEATURES;

        board.initialize(&config, &mut Linked { console: &mut console });
        let _ = uwrite!(&mut console, "Xiphos board v0.1.0, {}\r\n", config);
        if let Some(cause) = ResetCause::from_flags(boot_reset_flags()) {
            let _ = uwrite!(&mut console, "reset cause: {}\r\n", cause);
        }

        #[cfg(feature = "hil_tests")]
        {
            use xiphos_board::testing::{
                BulkRoundTripTest, LineReadbackTest, PullupGuardTest, TestRunner, ToggleTest,
            };
            let mut runner = TestRunner::new(Console);
            let _ = runner.run_suite(
                "Digital lines",
                &mut board,
                &[&LineReadbackTest, &BulkRoundTripTest, &ToggleTest, &PullupGuardTest],
            );
            if !runner.all_passed() {
                // Leave the LED lit so a failed self test is visible without a console
                board.led_on();
                loop {}
            }
        }

        board.led_on();
        let _ = uwrite!(&mut console, "press BTN1 to toggle the LED; the fifth click resets\r\n");

        let mut clicks = 0u8;
        loop {
            board.button_wait();
            board.led_toggle();
            clicks += 1;
            let _ = uwrite!(&mut console, "click {}\r\n", clicks);
            if clicks == 5 {
                let _ = uwrite!(&mut console, "resetting\r\n");
                board.delay_ms(10);
                board.soft_reset();
            }
        }
    }
}

#[cfg(not(target_arch = "avr"))]
fn main() {
    eprintln!("xiphos_firmware only runs on the board; build it for an AVR target");
}
