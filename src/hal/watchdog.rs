//! Watchdog timer, software reset and the early-boot watchdog shutdown.
//!
//! The watchdog stays enabled across the reset it causes, with its shortest timeout. Left
//! alone it would fire again before `main` got far, so [`__xiphos_wdt_init`] turns it off
//! in `.init3`. That section runs after the stack and zero register are set up and before
//! `.data`/`.bss` are initialized. The MCUSR value it clears is kept for
//! [`boot_reset_flags`].

use super::registers::{Register, RegisterFile};
use ufmt::{uDisplay, uWrite, Formatter};

// WDTCSR bits
const WDCE: u8 = 1 << 4;
const WDE: u8 = 1 << 3;

// MCUSR bits
const PORF: u8 = 1 << 0;
const EXTRF: u8 = 1 << 1;
const BORF: u8 = 1 << 2;
const WDRF: u8 = 1 << 3;
const JTRF: u8 = 1 << 4;

/// Watchdog periods; the value is the WDP3..0 pattern as laid out in WDTCSR.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum WatchdogTimeout {
    Ms16 = 0x00,
    Ms32 = 0x01,
    Ms64 = 0x02,
    Ms125 = 0x03,
    Ms250 = 0x04,
    Ms500 = 0x05,
    Ms1000 = 0x06,
    Ms2000 = 0x07,
    Ms4000 = 0x20,
    Ms8000 = 0x21,
}

impl WatchdogTimeout {
    pub const SHORTEST: WatchdogTimeout = WatchdogTimeout::Ms16;
}

/// What caused the last reset, decoded from MCUSR.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetCause {
    PowerOn,
    External,
    BrownOut,
    Watchdog,
    Jtag,
}

impl ResetCause {
    /// A power-on reset also sets other flags, so the flags are checked in order of
    /// precedence.
    pub fn from_flags(mcusr: u8) -> Option<ResetCause> {
        if mcusr & PORF != 0 {
            Some(ResetCause::PowerOn)
        } else if mcusr & EXTRF != 0 {
            Some(ResetCause::External)
        } else if mcusr & BORF != 0 {
            Some(ResetCause::BrownOut)
        } else if mcusr & WDRF != 0 {
            Some(ResetCause::Watchdog)
        } else if mcusr & JTRF != 0 {
            Some(ResetCause::Jtag)
        } else {
            None
        }
    }
}

impl uDisplay for ResetCause {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        f.write_str(match self {
            ResetCause::PowerOn => "power-on",
            ResetCause::External => "external",
            ResetCause::BrownOut => "brown-out",
            ResetCause::Watchdog => "watchdog",
            ResetCause::Jtag => "JTAG",
        })
    }
}

pub struct Watchdog<'a, R> {
    regs: &'a mut R,
}

impl<'a, R: RegisterFile> Watchdog<'a, R> {
    #[inline]
    pub fn new(regs: &'a mut R) -> Self {
        Self { regs }
    }

    /// Enable system-reset mode with the given period.
    pub fn start(&mut self, timeout: WatchdogTimeout) {
        self.regs.critical(|regs| {
            feed();
            // WDCE|WDE opens a four-cycle window for the real write
            regs.write(Register::Wdtcsr, WDCE | WDE);
            regs.write(Register::Wdtcsr, WDE | timeout as u8);
        });
    }

    #[inline]
    pub fn feed(&mut self) {
        feed();
    }

    /// Clear the reset flags and stop the watchdog. Returns the flags that were cleared.
    ///
    /// WDE cannot be cleared while WDRF is set, so MCUSR goes first.
    pub fn disable(&mut self) -> u8 {
        self.regs.critical(|regs| {
            feed();
            let flags = regs.read(Register::Mcusr);
            regs.write(Register::Mcusr, 0);
            regs.write(Register::Wdtcsr, WDCE | WDE);
            regs.write(Register::Wdtcsr, 0);
            flags
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.regs.read(Register::Wdtcsr) & WDE != 0
    }

    /// Cause of the last reset, from the live MCUSR. After boot this is normally empty,
    /// because the early-boot hook clears it; see [`boot_reset_flags`].
    pub fn reset_cause(&self) -> Option<ResetCause> {
        ResetCause::from_flags(self.regs.read(Register::Mcusr))
    }
}

#[inline(always)]
fn feed() {
    #[cfg(target_arch = "avr")]
    avr_device::asm::wdr();
}

/// Arm the shortest watchdog period and wait for it to reset the MCU.
pub fn soft_reset<R: RegisterFile>(regs: &mut R) -> ! {
    Watchdog::new(regs).start(WatchdogTimeout::SHORTEST);
    #[allow(clippy::empty_loop)]
    loop {}
}

#[cfg(target_arch = "avr")]
#[unsafe(link_section = ".noinit")]
static mut BOOT_MCUSR: u8 = 0;

/// MCUSR as it was at reset, saved by the early-boot hook.
#[cfg(target_arch = "avr")]
pub fn boot_reset_flags() -> u8 {
    // Written once in .init3 before main; read-only afterwards
    unsafe { core::ptr::read_volatile(core::ptr::addr_of!(BOOT_MCUSR)) }
}

/// Saves and clears MCUSR, then runs the timed watchdog-off sequence. Lives in `.init3`
/// and falls through into `.init4`, so it has no prologue, epilogue or `ret`.
///
/// MCUSR is I/O 0x34 and WDTCSR is data address 0x60 on the ATmega1281. r1 is zeroed in
/// `.init2`.
#[cfg(target_arch = "avr")]
#[unsafe(naked)]
#[unsafe(no_mangle)]
#[unsafe(link_section = ".init3")]
pub unsafe extern "C" fn __xiphos_wdt_init() {
    core::arch::naked_asm!(
        "wdr",
        "in r24, 0x34",
        "sts {mcusr}, r24",
        "out 0x34, r1",
        "ldi r24, 0x18",
        "sts 0x60, r24",
        "sts 0x60, r1",
        mcusr = sym BOOT_MCUSR,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimRegisters;

    #[test]
    fn start_uses_the_timed_sequence() {
        let mut regs = SimRegisters::new();
        let mut wdt = Watchdog::new(&mut regs);
        wdt.start(WatchdogTimeout::Ms16);
        assert!(wdt.is_enabled());
        assert_eq!(regs.wdtcsr_writes(), &[0x18, 0x08]);
        assert_eq!(regs.unguarded_wdtcsr_writes(), 0);
    }

    #[test]
    fn long_timeouts_set_wdp3() {
        let mut regs = SimRegisters::new();
        Watchdog::new(&mut regs).start(WatchdogTimeout::Ms8000);
        assert_eq!(regs.read(Register::Wdtcsr), 0x29);
    }

    #[test]
    fn disable_clears_reset_flags_then_stops_the_watchdog() {
        let mut regs = SimRegisters::new();
        regs.set_reset_flags(WDRF);
        let mut wdt = Watchdog::new(&mut regs);
        wdt.start(WatchdogTimeout::Ms16);

        assert_eq!(wdt.disable(), WDRF);
        assert!(!wdt.is_enabled());
        assert_eq!(wdt.reset_cause(), None);
        assert_eq!(regs.read(Register::Mcusr), 0);
        assert_eq!(regs.wdtcsr_writes(), &[0x18, 0x08, 0x18, 0x00]);
        assert_eq!(regs.unguarded_wdtcsr_writes(), 0);
    }

    #[test]
    fn timed_sequences_write_wdtcsr_directly() {
        let mut regs = SimRegisters::new();
        let mut wdt = Watchdog::new(&mut regs);
        wdt.start(WatchdogTimeout::Ms500);
        wdt.disable();
        assert_eq!(regs.wdtcsr_modifies(), 0);
        assert_eq!(regs.wdtcsr_writes(), &[0x18, 0x0D, 0x18, 0x00]);
    }

    #[test]
    fn reset_cause_prefers_power_on() {
        assert_eq!(ResetCause::from_flags(PORF | BORF), Some(ResetCause::PowerOn));
        assert_eq!(ResetCause::from_flags(EXTRF), Some(ResetCause::External));
        assert_eq!(ResetCause::from_flags(BORF), Some(ResetCause::BrownOut));
        assert_eq!(ResetCause::from_flags(WDRF), Some(ResetCause::Watchdog));
        assert_eq!(ResetCause::from_flags(JTRF), Some(ResetCause::Jtag));
        assert_eq!(ResetCause::from_flags(0), None);
    }

    #[test]
    fn live_reset_cause_reads_mcusr() {
        let mut regs = SimRegisters::new();
        regs.set_reset_flags(EXTRF);
        assert_eq!(Watchdog::new(&mut regs).reset_cause(), Some(ResetCause::External));
    }
}
