//! Register-level simulation of the board for host builds.
//!
//! Models what the line logic relies on:
//! - PIN follows PORT on outputs.
//! - On inputs, PIN follows an external driver if one is attached, otherwise the pullup.
//!   A floating input without pullup reads low.
//! - Writing a 1 to PIN toggles PORT.

use crate::hal::gpio::Line;
use crate::hal::registers::{Port, Register, RegisterFile};

const PORTS: usize = Port::ALL.len();
const WDT_LOG_LEN: usize = 8;

#[derive(Clone, Debug, Default)]
pub struct SimRegisters {
    ddr: [u8; PORTS],
    port: [u8; PORTS],
    driven: [u8; PORTS],
    external: [u8; PORTS],
    mcusr: u8,
    wdtcsr: u8,
    wdt_log: [u8; WDT_LOG_LEN],
    wdt_writes: usize,
    unguarded_wdt_writes: usize,
    wdt_modifies: usize,
    critical_depth: u8,
}

impl SimRegisters {
    /// All registers at their power-on value (zero).
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an external driver to a pin.
    pub fn drive(&mut self, port: Port, bit: u8, high: bool) {
        let i = port.index();
        self.driven[i] |= 1 << bit;
        if high {
            self.external[i] |= 1 << bit;
        } else {
            self.external[i] &= !(1 << bit);
        }
    }

    /// Detach the external driver from a pin.
    pub fn release(&mut self, port: Port, bit: u8) {
        self.driven[port.index()] &= !(1 << bit);
    }

    pub fn drive_line(&mut self, line: Line, high: bool) {
        let (port, bit) = line.location();
        self.drive(port, bit, high);
    }

    /// Reset flags the MCU would present in MCUSR after a reset.
    pub fn set_reset_flags(&mut self, flags: u8) {
        self.mcusr = flags;
    }

    /// Values written to WDTCSR, oldest first (the last eight at most).
    pub fn wdtcsr_writes(&self) -> &[u8] {
        let n = self.wdt_writes.min(WDT_LOG_LEN);
        &self.wdt_log[..n]
    }

    /// WDTCSR writes that happened outside a critical section.
    pub fn unguarded_wdtcsr_writes(&self) -> usize {
        self.unguarded_wdt_writes
    }

    /// Read-modify-writes of WDTCSR. On the MCU each one nests an interrupt-free section,
    /// which is too slow inside the four-cycle change window.
    pub fn wdtcsr_modifies(&self) -> usize {
        self.wdt_modifies
    }

    fn pin_level(&self, i: usize) -> u8 {
        let ddr = self.ddr[i];
        let floating = !ddr & !self.driven[i];
        (ddr & self.port[i]) | (!ddr & self.driven[i] & self.external[i]) | (floating & self.port[i])
    }
}

impl RegisterFile for SimRegisters {
    fn read(&self, reg: Register) -> u8 {
        match reg {
            Register::Ddr(p) => self.ddr[p.index()],
            Register::Port(p) => self.port[p.index()],
            Register::Pin(p) => self.pin_level(p.index()),
            Register::Mcusr => self.mcusr,
            Register::Wdtcsr => self.wdtcsr,
        }
    }

    fn write(&mut self, reg: Register, value: u8) {
        match reg {
            Register::Ddr(p) => self.ddr[p.index()] = value,
            Register::Port(p) => self.port[p.index()] = value,
            Register::Pin(p) => self.port[p.index()] ^= value,
            Register::Mcusr => self.mcusr = value,
            Register::Wdtcsr => {
                if self.critical_depth == 0 {
                    self.unguarded_wdt_writes += 1;
                }
                if self.wdt_writes >= WDT_LOG_LEN {
                    self.wdt_log.copy_within(1.., 0);
                    self.wdt_log[WDT_LOG_LEN - 1] = value;
                } else {
                    self.wdt_log[self.wdt_writes] = value;
                }
                self.wdt_writes += 1;
                self.wdtcsr = value;
            }
        }
    }

    fn modify<F>(&mut self, reg: Register, f: F)
    where
        F: FnOnce(u8) -> u8,
    {
        if reg == Register::Wdtcsr {
            self.wdt_modifies += 1;
        }
        self.critical(|regs| {
            let value = f(regs.read(reg));
            regs.write(reg, value);
        });
    }

    fn critical<T, F>(&mut self, f: F) -> T
    where
        F: FnOnce(&mut Self) -> T,
    {
        self.critical_depth += 1;
        let out = f(self);
        self.critical_depth -= 1;
        out
    }
}
