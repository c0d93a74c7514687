//! Errors reported by the interrupt controller and tick timer drivers.

use core::fmt;

use crate::exception::ExceptionKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Interrupt line or exception ordinal outside the supported domain.
    OutOfRange(u16),
    /// The exception has no software controllable enable bit or priority.
    UnsupportedOperation(ExceptionKind),
    /// Priority value above [`crate::priority::Priority::MAX`].
    InvalidPriority(u8),
    /// Zero period or clock, or a reload value that does not fit the
    /// 24-bit counter.
    InvalidPeriod,
    /// The tick timer was started before being initialized.
    NotInitialized,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange(n) => write!(f, "ordinal {n} out of range"),
            Self::UnsupportedOperation(kind) =>
                write!(f, "{kind:?} is not software configurable"),
            Self::InvalidPriority(p) => write!(f, "invalid priority {p}"),
            Self::InvalidPeriod => write!(f, "invalid timer period"),
            Self::NotInitialized => write!(f, "tick timer not initialized"),
        }
    }
}

impl core::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;
