//! Register identifiers and raw register access.
//!
//! Everything above this module talks to hardware through [`RegisterFile`], so the same
//! line/LED/watchdog logic runs against the MCU or against [`crate::sim::SimRegisters`].

/// I/O ports wired on the Xiphos board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Port {
    A,
    B,
    C,
    D,
    G,
}

impl Port {
    pub const ALL: [Port; 5] = [Port::A, Port::B, Port::C, Port::D, Port::G];

    /// Dense index, used by the simulator's register arrays.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Port::A => 0,
            Port::B => 1,
            Port::C => 2,
            Port::D => 3,
            Port::G => 4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Register {
    /// Data direction: 0 = input, 1 = output
    Ddr(Port),
    /// Output level, or pullup enable while the pin is an input
    Port(Port),
    /// Pin level on read; writing a 1 toggles the matching PORT bit
    Pin(Port),
    /// MCU status (reset flags)
    Mcusr,
    /// Watchdog control
    Wdtcsr,
}

/// Byte-wide access to memory-mapped registers.
pub trait RegisterFile {
    fn read(&self, reg: Register) -> u8;

    fn write(&mut self, reg: Register, value: u8);

    /// Read-modify-write. Implementations on hardware with interrupt handlers must make
    /// this atomic with respect to them.
    #[inline]
    fn modify<F>(&mut self, reg: Register, f: F)
    where
        F: FnOnce(u8) -> u8,
    {
        let value = self.read(reg);
        self.write(reg, f(value));
    }

    /// Run a multi-write sequence that must not be interrupted (e.g. timed watchdog
    /// changes).
    #[inline]
    fn critical<T, F>(&mut self, f: F) -> T
    where
        F: FnOnce(&mut Self) -> T,
        Self: Sized,
    {
        f(self)
    }

    #[inline]
    fn set_bit(&mut self, reg: Register, bit: u8) {
        self.modify(reg, |r| r | (1 << bit));
    }

    #[inline]
    fn clear_bit(&mut self, reg: Register, bit: u8) {
        self.modify(reg, |r| r & !(1 << bit));
    }

    #[inline]
    fn bit(&self, reg: Register, bit: u8) -> bool {
        self.read(reg) & (1 << bit) != 0
    }
}
