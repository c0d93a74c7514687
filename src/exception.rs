//! Core exceptions and where their control bits live.

use crate::error::{Error, Result};
use crate::regs::{Field, Reg, STCTRL_INTEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ExceptionKind {
    Reset,
    Nmi,
    HardFault,
    MemManage,
    BusFault,
    UsageFault,
    SvCall,
    DebugMonitor,
    PendSv,
    SysTick,
}

/// The enable bit and priority field of an exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionControl {
    pub enable_reg: Reg,
    pub enable_bit: u32,
    pub priority_reg: Reg,
    pub priority: Field,
}

const fn control(enable_reg: Reg, enable_bit: u32, priority_reg: u8,
                 priority_shift: u32) -> ExceptionControl {
    ExceptionControl {
        enable_reg, enable_bit: 1 << enable_bit,
        priority_reg: Reg::SysPriority(priority_reg),
        priority: Field::new(priority_shift, 3),
    }
}

const MEM_MANAGE   : ExceptionControl = control(Reg::SysHandlerCtrl, 16, 1, 5);
const BUS_FAULT    : ExceptionControl = control(Reg::SysHandlerCtrl, 17, 1, 13);
const USAGE_FAULT  : ExceptionControl = control(Reg::SysHandlerCtrl, 18, 1, 21);
// The debug monitor priority shares SYSPRI3 with PendSV and SysTick.
const DEBUG_MONITOR: ExceptionControl = control(Reg::SysHandlerCtrl, 8, 3, 5);
// SysTick is gated by its own interrupt enable, not SYSHNDCTRL.
const SYS_TICK     : ExceptionControl = ExceptionControl {
    enable_reg: Reg::StCtrl, enable_bit: STCTRL_INTEN,
    priority_reg: Reg::SysPriority(3), priority: Field::new(29, 3),
};

impl ExceptionKind {
    pub const ALL: [ExceptionKind; 10] = [
        Self::Reset, Self::Nmi, Self::HardFault, Self::MemManage,
        Self::BusFault, Self::UsageFault, Self::SvCall, Self::DebugMonitor,
        Self::PendSv, Self::SysTick];

    /// Architectural exception number (vector table index).
    pub const fn number(self) -> u8 {
        match self {
            Self::Reset        => 1,
            Self::Nmi          => 2,
            Self::HardFault    => 3,
            Self::MemManage    => 4,
            Self::BusFault     => 5,
            Self::UsageFault   => 6,
            Self::SvCall       => 11,
            Self::DebugMonitor => 12,
            Self::PendSv       => 14,
            Self::SysTick      => 15,
        }
    }

    /// Registers controlling this exception, or `None` for the exceptions
    /// with fixed priority or no software enable.
    pub const fn control(self) -> Option<ExceptionControl> {
        match self {
            Self::MemManage    => Some(MEM_MANAGE),
            Self::BusFault     => Some(BUS_FAULT),
            Self::UsageFault   => Some(USAGE_FAULT),
            Self::DebugMonitor => Some(DEBUG_MONITOR),
            Self::SysTick      => Some(SYS_TICK),
            Self::Reset | Self::Nmi | Self::HardFault | Self::SvCall
                | Self::PendSv => None,
        }
    }

    pub fn try_control(self) -> Result<ExceptionControl> {
        self.control().ok_or(Error::UnsupportedOperation(self))
    }
}

impl TryFrom<u8> for ExceptionKind {
    type Error = Error;
    /// Converts from the enumeration ordinal (0 = reset ... 9 = SysTick).
    fn try_from(ordinal: u8) -> Result<Self> {
        Self::ALL.get(ordinal as usize).copied()
            .ok_or(Error::OutOfRange(ordinal as u16))
    }
}
