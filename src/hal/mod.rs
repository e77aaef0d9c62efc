pub mod delay;
pub mod gpio;
#[cfg(target_arch = "avr")]
pub mod mcu;
pub mod registers;
pub mod watchdog;

// Re-export commonly used types
pub use delay::{delay_ms, delay_us, BusyDelay};
pub use gpio::{DigitalIo, Direction, Line, LinePin};
#[cfg(target_arch = "avr")]
pub use mcu::Mcu;
pub use registers::{Port, Register, RegisterFile};
pub use watchdog::{soft_reset, ResetCause, Watchdog, WatchdogTimeout};
