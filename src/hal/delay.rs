//! Busy-wait delays.
//!
//! A spin is one `nop` plus a 16-bit decrement-and-branch, five cycles on AVR. The spin
//! counts below assume that cost, so the delays are approximate and lengthen by whatever
//! interrupts steal while they run.

use crate::config::CPU_FREQ_HZ;
use embedded_hal::blocking::delay::{DelayMs, DelayUs};

const CYCLES_PER_SPIN: u32 = 5;

/// Spins per millisecond at the configured clock.
pub const SPINS_PER_MS: u16 = {
    let spins = CPU_FREQ_HZ / 1_000 / CYCLES_PER_SPIN;
    assert!(spins > 0 && spins <= u16::MAX as u32, "CPU clock out of range for delay_ms");
    spins as u16
};

/// Spins per microsecond, never less than one.
pub const SPINS_PER_US: u16 = {
    let spins = CPU_FREQ_HZ / 1_000_000 / CYCLES_PER_SPIN;
    if spins == 0 {
        1
    } else {
        spins as u16
    }
};

#[inline(always)]
fn nop() {
    #[cfg(target_arch = "avr")]
    avr_device::asm::nop();
    #[cfg(not(target_arch = "avr"))]
    core::hint::spin_loop();
}

#[cfg(test)]
std::thread_local! {
    static SPINS: core::cell::Cell<u64> = const { core::cell::Cell::new(0) };
}

#[inline(always)]
fn spin(mut count: u16) {
    #[cfg(test)]
    SPINS.with(|spins| spins.set(spins.get() + count as u64));
    while count > 0 {
        nop();
        count -= 1;
    }
}

/// Block for roughly `ms` milliseconds.
pub fn delay_ms(ms: u16) {
    for _ in 0..ms {
        spin(SPINS_PER_MS);
    }
}

/// Block for roughly `us` microseconds.
pub fn delay_us(us: u16) {
    for _ in 0..us {
        spin(SPINS_PER_US);
    }
}

/// Counted-loop delay provider.
#[derive(Clone, Copy, Debug, Default)]
pub struct BusyDelay;

impl BusyDelay {
    pub const fn new() -> Self {
        BusyDelay
    }
}

impl DelayMs<u16> for BusyDelay {
    fn delay_ms(&mut self, ms: u16) {
        delay_ms(ms);
    }
}

impl DelayMs<u8> for BusyDelay {
    fn delay_ms(&mut self, ms: u8) {
        delay_ms(ms as u16);
    }
}

impl DelayMs<u32> for BusyDelay {
    fn delay_ms(&mut self, mut ms: u32) {
        while ms > 0 {
            let chunk = ms.min(u16::MAX as u32);
            delay_ms(chunk as u16);
            ms -= chunk;
        }
    }
}

impl DelayUs<u16> for BusyDelay {
    fn delay_us(&mut self, us: u16) {
        delay_us(us);
    }
}

impl DelayUs<u8> for BusyDelay {
    fn delay_us(&mut self, us: u8) {
        delay_us(us as u16);
    }
}

impl DelayUs<u32> for BusyDelay {
    fn delay_us(&mut self, mut us: u32) {
        while us > 0 {
            let chunk = us.min(u16::MAX as u32);
            delay_us(chunk as u16);
            us -= chunk;
        }
    }
}
