//! On-target self tests, reported over a ufmt writer.
//!
//! The cases only use what the MCU itself guarantees (an output pin reads back its drive
//! level), so they pass on a bare board with nothing plugged into the header. Each case
//! leaves every line as an input without pullup.

use crate::board::Board;
use crate::hal::gpio::{Direction, Line, LINE_MASK};
use crate::hal::registers::RegisterFile;
use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use ufmt::{uDisplay, uWrite, uwrite, Formatter};

#[derive(Debug, PartialEq)]
pub enum TestResult {
    Pass,
    Fail(TestError),
}

#[derive(Debug, PartialEq)]
pub enum TestError {
    AssertionFailed(&'static str),
    /// A line read back the wrong level
    LineMismatch { line: u8, expected: bool },
    /// A bulk read did not return the mask written
    MaskMismatch { expected: u16, actual: u16 },
}

impl uDisplay for TestError {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        match self {
            TestError::AssertionFailed(what) => uwrite!(f, "assertion failed: {}", *what),
            TestError::LineMismatch { line, expected } => {
                let level = if *expected { "high" } else { "low" };
                uwrite!(f, "line {} did not read {}", *line, level)
            }
            TestError::MaskMismatch { expected, actual } => {
                uwrite!(f, "wrote mask {} read {}", *expected, *actual)
            }
        }
    }
}

pub trait TestCase<R, D> {
    fn run(&self, board: &mut Board<R, D>) -> TestResult;
    fn name(&self) -> &'static str;
}

macro_rules! check {
    ($cond:expr) => {
        if !$cond {
            return TestResult::Fail(TestError::AssertionFailed(stringify!($cond)));
        }
    };
}

pub struct TestRunner<W> {
    out: W,
    total_tests: u16,
    passed_tests: u16,
}

impl<W: uWrite> TestRunner<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            total_tests: 0,
            passed_tests: 0,
        }
    }

    pub fn run_suite<R, D>(
        &mut self,
        name: &'static str,
        board: &mut Board<R, D>,
        tests: &[&dyn TestCase<R, D>],
    ) -> Result<(), W::Error>
    where
        R: RegisterFile,
        D: DelayMs<u16> + DelayUs<u16>,
    {
        uwrite!(&mut self.out, "\r\n=== Test Suite: {} ===\r\n", name)?;
        let (mut total, mut passed) = (0u16, 0u16);

        for test in tests {
            total += 1;
            uwrite!(&mut self.out, "Running {}: ", test.name())?;
            let result = test.run(board);
            release_lines(board);
            match result {
                TestResult::Pass => {
                    passed += 1;
                    uwrite!(&mut self.out, "PASS\r\n")?;
                }
                TestResult::Fail(err) => uwrite!(&mut self.out, "FAIL - {}\r\n", err)?,
            }
        }

        self.total_tests += total;
        self.passed_tests += passed;
        uwrite!(&mut self.out, "Passed: {}/{}\r\n", passed, total)
    }

    pub fn total_tests(&self) -> u16 {
        self.total_tests
    }

    pub fn passed_tests(&self) -> u16 {
        self.passed_tests
    }

    pub fn all_passed(&self) -> bool {
        self.passed_tests == self.total_tests
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn release_lines<R, D>(board: &mut Board<R, D>)
where
    R: RegisterFile,
    D: DelayMs<u16> + DelayUs<u16>,
{
    board.set_directions(0);
    board.set_pullups(0);
}

/// Every line driven high then low reads back that level.
pub struct LineReadbackTest;

impl<R, D> TestCase<R, D> for LineReadbackTest
where
    R: RegisterFile,
    D: DelayMs<u16> + DelayUs<u16>,
{
    fn name(&self) -> &'static str {
        "Line readback"
    }

    fn run(&self, board: &mut Board<R, D>) -> TestResult {
        for line in Line::all() {
            board.set_direction(line, Direction::Output);
            for expected in [true, false] {
                board.write_line(line, expected);
                // One cycle of input synchronizer latency before PIN follows PORT
                board.delay_us(1);
                if board.read_line(line) != expected {
                    return TestResult::Fail(TestError::LineMismatch {
                        line: line.number(),
                        expected,
                    });
                }
            }
        }
        TestResult::Pass
    }
}

/// Bulk writes read back through the bulk read.
pub struct BulkRoundTripTest;

impl<R, D> TestCase<R, D> for BulkRoundTripTest
where
    R: RegisterFile,
    D: DelayMs<u16> + DelayUs<u16>,
{
    fn name(&self) -> &'static str {
        "Bulk write/read"
    }

    fn run(&self, board: &mut Board<R, D>) -> TestResult {
        board.set_directions(LINE_MASK);
        check!(board.directions() == LINE_MASK);
        for expected in [0x000, 0x3FF, 0x155, 0x2AA, 0x001, 0x200] {
            board.write_lines(expected);
            board.delay_us(1);
            let actual = board.read_lines();
            if actual != expected {
                return TestResult::Fail(TestError::MaskMismatch { expected, actual });
            }
        }
        TestResult::Pass
    }
}

/// Toggling twice restores each line.
pub struct ToggleTest;

impl<R, D> TestCase<R, D> for ToggleTest
where
    R: RegisterFile,
    D: DelayMs<u16> + DelayUs<u16>,
{
    fn name(&self) -> &'static str {
        "Line toggle"
    }

    fn run(&self, board: &mut Board<R, D>) -> TestResult {
        board.set_directions(LINE_MASK);
        board.write_lines(0x0F0);
        for line in Line::all() {
            let before = board.read_line(line);
            board.toggle_line(line);
            board.delay_us(1);
            check!(board.read_line(line) != before);
            board.toggle_line(line);
            board.delay_us(1);
            check!(board.read_line(line) == before);
        }
        TestResult::Pass
    }
}

/// Pullup writes leave output lines alone.
pub struct PullupGuardTest;

impl<R, D> TestCase<R, D> for PullupGuardTest
where
    R: RegisterFile,
    D: DelayMs<u16> + DelayUs<u16>,
{
    fn name(&self) -> &'static str {
        "Pullups skip outputs"
    }

    fn run(&self, board: &mut Board<R, D>) -> TestResult {
        let Ok(output) = Line::new(5) else {
            return TestResult::Fail(TestError::AssertionFailed("line 5 exists"));
        };
        board.set_directions(0);
        board.set_pullups(LINE_MASK);
        board.set_direction(output, Direction::Output);
        board.set_pullups(0);

        check!(board.direction(output) == Direction::Output);
        check!(board.read_line(output));
        for line in Line::all().filter(|l| *l != output) {
            check!(board.direction(line) == Direction::Input);
        }
        TestResult::Pass
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::sim::SimRegisters;
    use embedded_hal_mock::delay::MockNoop;
    use std::string::String;

    struct Out(String);

    impl uWrite for Out {
        type Error = core::convert::Infallible;

        fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
            self.0.push_str(s);
            Ok(())
        }
    }

    /// Fails on purpose to exercise the report path.
    struct AlwaysFails;

    impl<R, D> TestCase<R, D> for AlwaysFails {
        fn name(&self) -> &'static str {
            "Always fails"
        }

        fn run(&self, _board: &mut Board<R, D>) -> TestResult {
            TestResult::Fail(TestError::MaskMismatch { expected: 3, actual: 1 })
        }
    }

    #[test]
    fn self_tests_pass_on_the_simulated_board() {
        let mut board = Board::new(SimRegisters::new(), MockNoop::new());
        let mut runner = TestRunner::new(Out(String::new()));
        runner
            .run_suite(
                "Digital lines",
                &mut board,
                &[&LineReadbackTest, &BulkRoundTripTest, &ToggleTest, &PullupGuardTest],
            )
            .unwrap();

        assert!(runner.all_passed());
        assert_eq!(runner.total_tests(), 4);
        let out = runner.into_inner().0;
        assert!(out.contains("Running Line readback: PASS"));
        assert!(out.ends_with("Passed: 4/4\r\n"));
        assert_eq!(board.directions(), 0);
    }

    #[test]
    fn failures_are_reported_and_counted() {
        let mut board = Board::new(SimRegisters::new(), MockNoop::new());
        let mut runner = TestRunner::new(Out(String::new()));
        runner
            .run_suite("Mixed", &mut board, &[&ToggleTest, &AlwaysFails])
            .unwrap();

        assert!(!runner.all_passed());
        assert_eq!(runner.passed_tests(), 1);
        let out = runner.into_inner().0;
        assert!(out.contains("Running Always fails: FAIL - wrote mask 3 read 1\r\n"));
        assert!(out.ends_with("Passed: 1/2\r\n"));
    }
}
