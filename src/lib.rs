//! Interrupt controller and SysTick drivers for Cortex-M4 based Tiva parts.
//!
//! [`nvic::InterruptController`] enables, disables and prioritizes interrupt
//! lines and the configurable core exceptions.  [`systick::TickTimer`] runs
//! the SysTick timer, either calling back from the SysTick exception or
//! busy-waiting on the count flag.  Both go through a
//! [`regs::RegisterFile`], so they run unchanged against a register model on the host.

#![no_std]

// Trace output goes to defmt when that is enabled, and nowhere otherwise.
macro_rules! trace {($($tt:tt)*) => {
    #[cfg(feature = "defmt")]
    defmt::trace!($($tt)*);
};}

macro_rules! debug {($($tt:tt)*) => {
    #[cfg(feature = "defmt")]
    defmt::debug!($($tt)*);
};}

pub mod error;
pub mod exception;
pub mod irq;
pub mod mask;
pub mod nvic;
pub mod priority;
pub mod regs;
pub mod systick;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use error::{Error, Result};
pub use exception::ExceptionKind;
pub use irq::{InterruptLine, NUM_INTERRUPTS};
pub use mask::{CoreMask, GlobalMask};
pub use nvic::InterruptController;
pub use priority::Priority;
pub use regs::{Mmio, RegisterFile};
pub use systick::TickTimer;
