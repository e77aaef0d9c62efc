//! The ten logical digital lines of the Xiphos header.
//!
//! Lines 0 and 1 sit on port B (bits 4 and 7); lines 2 to 9 are port A bits 0 to 7. The
//! bulk operations use 10-bit masks where bit n is line n.
//!
//! Register meaning per bit:
//! - DDR: 0 = input, 1 = output
//! - PORT on an input: 0 = no pullup, 1 = pullup
//! - PORT on an output: drive level
//! - PIN read: level on the pin
//! - PIN write of 1: toggles PORT

use super::registers::{Port, Register, RegisterFile};
use crate::error::Error;
use core::convert::Infallible;
use embedded_hal::digital::v2::{InputPin, OutputPin, StatefulOutputPin, ToggleableOutputPin};

pub const LINE_COUNT: u8 = 10;

/// Bits of a line mask that name real lines.
pub const LINE_MASK: u16 = 0x03FF;

const LINE0_BIT: u8 = 4;
const LINE1_BIT: u8 = 7;
/// Port B bits owned by lines 0 and 1.
const PORTB_LINES: u8 = (1 << LINE0_BIT) | (1 << LINE1_BIT);

const LINE_MAP: [(Port, u8); LINE_COUNT as usize] = [
    (Port::B, LINE0_BIT),
    (Port::B, LINE1_BIT),
    (Port::A, 0),
    (Port::A, 1),
    (Port::A, 2),
    (Port::A, 3),
    (Port::A, 4),
    (Port::A, 5),
    (Port::A, 6),
    (Port::A, 7),
];

/// A validated digital line number (0-9).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Line(u8);

impl Line {
    pub const fn new(number: u8) -> Result<Self, Error> {
        if number < LINE_COUNT {
            Ok(Line(number))
        } else {
            Err(Error::InvalidLine(number))
        }
    }

    #[inline]
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Port and bit backing this line.
    #[inline]
    pub const fn location(self) -> (Port, u8) {
        LINE_MAP[self.0 as usize]
    }

    /// This line's bit in a 10-bit line mask.
    #[inline]
    pub const fn mask(self) -> u16 {
        1 << self.0
    }

    pub fn all() -> impl Iterator<Item = Line> + Clone {
        (0..LINE_COUNT).map(Line)
    }
}

impl TryFrom<u8> for Line {
    type Error = Error;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        Line::new(number)
    }
}

impl From<Line> for u8 {
    fn from(line: Line) -> u8 {
        line.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Input,
    InputPullup,
    Output,
}

/// Line-level operations for any register file.
pub trait DigitalIo: RegisterFile + Sized {
    /// Switching to `Output` leaves the PORT bit alone, so a pullup that was on becomes a
    /// high drive level.
    fn set_direction(&mut self, line: Line, direction: Direction) {
        let (port, bit) = line.location();
        match direction {
            Direction::Input => {
                self.clear_bit(Register::Ddr(port), bit);
                self.clear_bit(Register::Port(port), bit);
            }
            Direction::InputPullup => {
                self.clear_bit(Register::Ddr(port), bit);
                self.set_bit(Register::Port(port), bit);
            }
            Direction::Output => self.set_bit(Register::Ddr(port), bit),
        }
    }

    /// Set every line's direction from a mask (1 = output). Only DDR is written, so the DDR
    /// result matches ten [`DigitalIo::set_direction`] calls while pullups and drive levels
    /// stay as they were.
    fn set_directions(&mut self, outputs: u16) {
        for line in [Line(0), Line(1)] {
            let (port, bit) = line.location();
            if outputs & line.mask() != 0 {
                self.set_bit(Register::Ddr(port), bit);
            } else {
                self.clear_bit(Register::Ddr(port), bit);
            }
        }
        self.write(Register::Ddr(Port::A), (outputs >> 2) as u8);
    }

    /// Set pullups from a mask (1 = enabled), for input lines only. Lines configured as
    /// outputs keep their PORT bit whatever the mask says.
    fn set_pullups(&mut self, pullups: u16) {
        self.critical(|regs| {
            let ddrb = regs.read(Register::Ddr(Port::B));
            let inputs_b = !ddrb & PORTB_LINES;
            let wanted_b = (((pullups & 1) as u8) << LINE0_BIT)
                | ((((pullups >> 1) & 1) as u8) << LINE1_BIT);
            regs.modify(Register::Port(Port::B), |r| (r & !inputs_b) | (wanted_b & inputs_b));

            let inputs_a = !regs.read(Register::Ddr(Port::A));
            let wanted_a = (pullups >> 2) as u8;
            regs.modify(Register::Port(Port::A), |r| (r & !inputs_a) | (wanted_a & inputs_a));
        });
    }

    fn direction(&self, line: Line) -> Direction {
        let (port, bit) = line.location();
        if self.bit(Register::Ddr(port), bit) {
            Direction::Output
        } else if self.bit(Register::Port(port), bit) {
            Direction::InputPullup
        } else {
            Direction::Input
        }
    }

    /// Direction mask (1 = output) in line order.
    fn directions(&self) -> u16 {
        gather(self.read(Register::Ddr(Port::A)), self.read(Register::Ddr(Port::B)))
    }

    /// Level on the pin; meaningful for outputs too.
    fn read_line(&self, line: Line) -> bool {
        let (port, bit) = line.location();
        self.bit(Register::Pin(port), bit)
    }

    /// Set or clear the line's PORT bit. The line is not checked for being an output.
    fn write_line(&mut self, line: Line, high: bool) {
        let (port, bit) = line.location();
        if high {
            self.set_bit(Register::Port(port), bit);
        } else {
            self.clear_bit(Register::Port(port), bit);
        }
    }

    /// Write all ten PORT bits from a mask. Port B bits outside lines 0 and 1 are kept.
    fn write_lines(&mut self, levels: u16) {
        self.write(Register::Port(Port::A), (levels >> 2) as u8);
        let line_bits = (((levels & 1) as u8) << LINE0_BIT)
            | ((((levels >> 1) & 1) as u8) << LINE1_BIT);
        self.modify(Register::Port(Port::B), |r| (r & !PORTB_LINES) | line_bits);
    }

    /// All ten pin levels, same bit order as [`DigitalIo::write_lines`].
    fn read_lines(&self) -> u16 {
        gather(self.read(Register::Pin(Port::A)), self.read(Register::Pin(Port::B)))
    }

    /// Flip the line's PORT bit through the PIN toggle. Other bits of the port are
    /// unaffected because only the written 1 toggles.
    fn toggle_line(&mut self, line: Line) {
        let (port, bit) = line.location();
        self.write(Register::Pin(port), 1 << bit);
    }
}

impl<R: RegisterFile> DigitalIo for R {}

/// Combine a port A value and the two port B line bits into a line mask.
#[inline]
fn gather(a: u8, b: u8) -> u16 {
    ((a as u16) << 2)
        | ((((b >> LINE1_BIT) & 1) as u16) << 1)
        | (((b >> LINE0_BIT) & 1) as u16)
}

/// One digital line as an embedded-hal pin.
pub struct LinePin<'a, R> {
    regs: &'a mut R,
    line: Line,
}

impl<'a, R: RegisterFile> LinePin<'a, R> {
    pub fn new(regs: &'a mut R, line: Line) -> Self {
        Self { regs, line }
    }

    pub fn line(&self) -> Line {
        self.line
    }

    pub fn into_output(self) -> Self {
        self.regs.set_direction(self.line, Direction::Output);
        self
    }

    pub fn into_input(self) -> Self {
        self.regs.set_direction(self.line, Direction::Input);
        self
    }

    pub fn into_pull_up_input(self) -> Self {
        self.regs.set_direction(self.line, Direction::InputPullup);
        self
    }

    pub fn direction(&self) -> Direction {
        self.regs.direction(self.line)
    }
}

impl<R: RegisterFile> InputPin for LinePin<'_, R> {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(self.regs.read_line(self.line))
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(!self.regs.read_line(self.line))
    }
}

impl<R: RegisterFile> OutputPin for LinePin<'_, R> {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.regs.write_line(self.line, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.regs.write_line(self.line, true);
        Ok(())
    }
}

impl<R: RegisterFile> StatefulOutputPin for LinePin<'_, R> {
    fn is_set_high(&self) -> Result<bool, Self::Error> {
        let (port, bit) = self.line.location();
        Ok(self.regs.bit(Register::Port(port), bit))
    }

    fn is_set_low(&self) -> Result<bool, Self::Error> {
        self.is_set_high().map(|high| !high)
    }
}

impl<R: RegisterFile> ToggleableOutputPin for LinePin<'_, R> {
    type Error = Infallible;

    fn toggle(&mut self) -> Result<(), Self::Error> {
        self.regs.toggle_line(self.line);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimRegisters;

    fn line(n: u8) -> Line {
        Line::new(n).unwrap()
    }

    #[test]
    fn rejects_line_numbers_past_nine() {
        assert_eq!(Line::new(10), Err(Error::InvalidLine(10)));
        assert_eq!(Line::try_from(255), Err(Error::InvalidLine(255)));
        assert_eq!(Line::new(9).map(Line::number), Ok(9));
    }

    #[test]
    fn maps_lines_onto_ports() {
        assert_eq!(line(0).location(), (Port::B, 4));
        assert_eq!(line(1).location(), (Port::B, 7));
        for n in 2..10 {
            assert_eq!(line(n).location(), (Port::A, n - 2));
        }
    }

    #[test]
    fn output_lines_read_back_what_they_drive() {
        let mut regs = SimRegisters::new();
        for l in Line::all() {
            regs.set_direction(l, Direction::Output);
            regs.write_line(l, true);
            assert!(regs.read_line(l), "line {} high", l.number());
            regs.write_line(l, false);
            assert!(!regs.read_line(l), "line {} low", l.number());
        }
    }

    #[test]
    fn input_modes_manage_the_pullup() {
        let mut regs = SimRegisters::new();
        regs.set_direction(line(1), Direction::InputPullup);
        assert!(regs.bit(Register::Port(Port::B), 7));
        assert_eq!(regs.direction(line(1)), Direction::InputPullup);

        regs.set_direction(line(1), Direction::Input);
        assert!(!regs.bit(Register::Port(Port::B), 7));
        assert_eq!(regs.direction(line(1)), Direction::Input);
    }

    #[test]
    fn output_keeps_the_previous_pullup_as_drive_level() {
        let mut regs = SimRegisters::new();
        regs.set_direction(line(6), Direction::InputPullup);
        regs.set_direction(line(6), Direction::Output);
        assert_eq!(regs.direction(line(6)), Direction::Output);
        assert!(regs.read_line(line(6)));
    }

    #[test]
    fn set_directions_round_trips_through_direction() {
        let mut regs = SimRegisters::new();
        for mask in [0x000, 0x3FF, 0x001, 0x002, 0x155, 0x2AA, 0x0F3, 0x30C] {
            regs.set_directions(mask);
            assert_eq!(regs.directions(), mask);
            for l in Line::all() {
                let output = regs.direction(l) == Direction::Output;
                assert_eq!(output, mask & l.mask() != 0, "mask {:#x} line {}", mask, l.number());
            }
        }
    }

    #[test]
    fn set_directions_matches_single_line_calls() {
        let mask = 0x2D6;
        let mut bulk = SimRegisters::new();
        bulk.set_directions(mask);

        let mut single = SimRegisters::new();
        for l in Line::all() {
            let dir = if mask & l.mask() != 0 { Direction::Output } else { Direction::Input };
            single.set_direction(l, dir);
        }

        for port in [Port::A, Port::B] {
            assert_eq!(bulk.read(Register::Ddr(port)), single.read(Register::Ddr(port)));
        }
    }

    #[test]
    fn set_directions_leaves_port_bits_alone() {
        let mut regs = SimRegisters::new();
        regs.set_pullups(0x3FF);
        let (port_a, port_b) = (regs.read(Register::Port(Port::A)), regs.read(Register::Port(Port::B)));

        regs.set_directions(0x000);
        assert_eq!(regs.read(Register::Port(Port::A)), port_a);
        assert_eq!(regs.read(Register::Port(Port::B)), port_b);
        assert_eq!(regs.direction(line(3)), Direction::InputPullup);

        regs.set_directions(0x155);
        assert_eq!(regs.read(Register::Port(Port::A)), port_a);
        assert_eq!(regs.read(Register::Port(Port::B)), port_b);
    }

    #[test]
    fn pullups_skip_output_lines() {
        let mut regs = SimRegisters::new();
        regs.set_directions(0b10_0000_0001);
        regs.write_line(line(0), true);
        regs.write_line(line(9), false);

        regs.set_pullups(0x000);
        assert!(regs.bit(Register::Port(Port::B), 4));
        regs.set_pullups(0x3FF);
        assert!(!regs.bit(Register::Port(Port::A), 7));

        for n in 1..9 {
            assert_eq!(regs.direction(line(n)), Direction::InputPullup);
        }
    }

    #[test]
    fn bulk_write_round_trips_and_keeps_other_port_b_bits() {
        let mut regs = SimRegisters::new();
        regs.write(Register::Port(Port::B), 0b0110_1111);
        regs.set_directions(LINE_MASK);
        for mask in [0x000, 0x3FF, 0x001, 0x002, 0x155, 0x2AA, 0x1C3] {
            regs.write_lines(mask);
            assert_eq!(regs.read_lines(), mask);
            assert_eq!(regs.read(Register::Port(Port::B)) & 0x6F, 0x6F);
        }
    }

    #[test]
    fn write_lines_ignores_bits_above_line_nine() {
        let mut regs = SimRegisters::new();
        regs.set_directions(LINE_MASK);
        regs.write_lines(0xFC00 | 0x005);
        assert_eq!(regs.read_lines(), 0x005);
    }

    #[test]
    fn toggle_twice_restores_the_drive_bit() {
        let mut regs = SimRegisters::new();
        regs.set_directions(LINE_MASK);
        regs.write_lines(0x2A5);
        for l in Line::all() {
            let before = regs.read_lines();
            regs.toggle_line(l);
            assert_eq!(regs.read_lines(), before ^ l.mask());
            regs.toggle_line(l);
            assert_eq!(regs.read_lines(), before);
        }
    }

    #[test]
    fn line_pin_speaks_embedded_hal() {
        let mut regs = SimRegisters::new();
        let mut pin = LinePin::new(&mut regs, line(4)).into_output();
        pin.set_high().unwrap();
        assert!(pin.is_set_high().unwrap());
        assert!(pin.is_high().unwrap());
        pin.toggle().unwrap();
        assert!(pin.is_low().unwrap());
        assert!(pin.is_set_low().unwrap());
        let pin = pin.into_pull_up_input();
        assert_eq!(pin.direction(), Direction::InputPullup);
        assert_eq!(regs.read(Register::Port(Port::A)), 1 << 2);
    }
}
