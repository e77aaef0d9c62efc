use core::fmt;
use ufmt::{uDisplay, uWrite, uwrite, Formatter};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// Digital line numbers run from 0 to 9
    InvalidLine(u8),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidLine(n) => write!(f, "invalid digital line {} (expected 0-9)", n),
        }
    }
}

impl uDisplay for Error {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        match self {
            Error::InvalidLine(n) => uwrite!(f, "invalid digital line {} (expected 0-9)", n),
        }
    }
}
