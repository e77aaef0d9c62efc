//! Board support for the Xiphos 1.0 (ATmega1281).
//!
//! Ten digital header lines, the BTN1 button, the status LED, busy-wait delays,
//! board bring-up and watchdog reset. All hardware access goes through
//! [`hal::RegisterFile`], implemented by [`hal::Mcu`] on AVR and by
//! [`sim::SimRegisters`] everywhere.
#![cfg_attr(not(test), no_std)]
#![cfg_attr(target_arch = "avr", feature(asm_experimental_arch))]

pub mod board;
pub mod config;
pub mod drivers;
pub mod error;
pub mod hal;
pub mod sim;
pub mod testing;

pub use board::{Board, PeripheralInit};
pub use config::{BoardConfig, Peripheral};
pub use error::Error;
pub use hal::gpio::{DigitalIo, Direction, Line};
