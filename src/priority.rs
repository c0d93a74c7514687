//! Priority values.  The hardware reserves 8 bits per priority slot but only
//! the top 3 are implemented, so a priority is 0 (highest) to 7 (lowest).

use crate::error::{Error, Result};
use crate::regs::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Priority(u8);

impl Priority {
    /// Number of implemented bits per slot.
    pub const BITS: u32 = 3;
    /// Bits below the implemented ones within each 8-bit slot.
    pub const SHIFT: u32 = 8 - Self::BITS;

    pub const HIGHEST: Priority = Priority(0);
    pub const LOWEST: Priority = Priority(7);
    pub const MAX: u8 = 7;

    /// Range checked constructor.  Out of range values are rejected rather
    /// than truncated.
    pub const fn new(value: u8) -> Result<Self> {
        if value > Self::MAX {
            Err(Error::InvalidPriority(value))
        }
        else {
            Ok(Priority(value))
        }
    }

    pub const fn value(self) -> u8 {self.0}

    /// The implemented bits of 8-bit priority slot `slot` within a 32-bit
    /// priority register.
    pub const fn field(slot: u32) -> Field {
        Field::new(slot * 8 + Self::SHIFT, Self::BITS)
    }
}

impl TryFrom<u8> for Priority {
    type Error = Error;
    fn try_from(value: u8) -> Result<Self> {Self::new(value)}
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> u8 {p.0}
}
