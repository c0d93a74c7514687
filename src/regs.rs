//! System control space registers.
//!
//! The drivers never touch memory directly.  They name a register with
//! [`Reg`] and go through a [`RegisterFile`], which is either the real
//! hardware ([`Mmio`]) or a host-side model ([`crate::sim::SimRegisters`]).
//!
//! Multi-field registers are only ever updated by read-modify-write of a
//! single [`Field`]; the write-1 set/clear banks of the NVIC are written with
//! just the bit of interest.

use volatile_register::RW;

/// Base address of the System Control Space.
pub const SCS_BASE: usize = 0xE000_E000;

/// Number of interrupt lines the architecture allows for.
pub const MAX_LINES: usize = 496;

/// Number of NVIC set/clear banks the architecture allows for.
pub const MAX_BANKS: usize = MAX_LINES.div_ceil(32);

/// Number of NVIC priority registers the architecture allows for.
pub const MAX_PRIORITY_REGS: usize = MAX_LINES / 4;

/// SysTick control bits.
pub const STCTRL_ENABLE   : u32 = 1 << 0;
pub const STCTRL_INTEN    : u32 = 1 << 1;
pub const STCTRL_CLK_SRC  : u32 = 1 << 2;
pub const STCTRL_COUNT    : u32 = 1 << 16;
/// The software writable control bits.
pub const STCTRL_CONTROL  : u32 = STCTRL_ENABLE | STCTRL_INTEN | STCTRL_CLK_SRC;

/// The SysTick counter is 24 bits wide.
pub const STRELOAD_MAX: u32 = 0x00ff_ffff;

/// One 32-bit register in the system control space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reg {
    /// Interrupt controller type.  The low four bits give the number of
    /// implemented banks, less one.
    Ictr,
    /// SysTick control and status.  Reading clears the count flag.
    StCtrl,
    /// SysTick reload value.
    StReload,
    /// SysTick current value.  Any write clears it and the count flag.
    StCurrent,
    /// SysTick calibration.
    StCalib,
    /// Interrupt set-enable bank (write 1 to enable, read gives state).
    SetEnable(u8),
    /// Interrupt clear-enable bank (write 1 to disable).
    ClearEnable(u8),
    /// Interrupt set-pending bank.
    SetPending(u8),
    /// Interrupt clear-pending bank.
    ClearPending(u8),
    /// Interrupt active bank, read only.
    Active(u8),
    /// Interrupt priority register, four lines per register.
    Priority(u8),
    /// System handler priority register, numbered 1 to 3.
    SysPriority(u8),
    /// System handler control and state.
    SysHandlerCtrl,
}

impl Reg {
    /// Offset from [`SCS_BASE`].
    pub const fn offset(self) -> usize {
        match self {
            Reg::Ictr           => 0x004,
            Reg::StCtrl         => 0x010,
            Reg::StReload       => 0x014,
            Reg::StCurrent      => 0x018,
            Reg::StCalib        => 0x01c,
            Reg::SetEnable(n)   => 0x100 + 4 * n as usize,
            Reg::ClearEnable(n) => 0x180 + 4 * n as usize,
            Reg::SetPending(n)  => 0x200 + 4 * n as usize,
            Reg::ClearPending(n)=> 0x280 + 4 * n as usize,
            Reg::Active(n)      => 0x300 + 4 * n as usize,
            Reg::Priority(n)    => 0x400 + 4 * n as usize,
            Reg::SysPriority(n) => 0xd14 + 4 * n as usize,
            Reg::SysHandlerCtrl => 0xd24,
        }
    }

    pub const fn address(self) -> usize {SCS_BASE + self.offset()}
}

/// A contiguous bit range within a 32-bit register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Field {
    pub shift: u32,
    pub width: u32,
}

impl Field {
    pub const fn new(shift: u32, width: u32) -> Self {
        debug_assert!(width >= 1 && shift + width <= 32);
        Field {shift, width}
    }

    pub const fn bit(shift: u32) -> Self {Self::new(shift, 1)}

    pub const fn mask(self) -> u32 {
        (u32::MAX >> (32 - self.width)) << self.shift
    }

    pub const fn extract(self, reg: u32) -> u32 {
        (reg & self.mask()) >> self.shift
    }

    /// Replace the field within `reg`, leaving every other bit alone.
    pub const fn insert(self, reg: u32, value: u32) -> u32 {
        reg & !self.mask() | value << self.shift & self.mask()
    }
}

/// Word access to the system control space.
///
/// Implementations take `&self`: the registers are shared with interrupt
/// handlers, so exclusive access is not something a borrow can express.
pub trait RegisterFile {
    fn read(&self, reg: Reg) -> u32;
    fn write(&self, reg: Reg, value: u32);

    fn read_field(&self, reg: Reg, field: Field) -> u32 {
        field.extract(self.read(reg))
    }

    /// Read-modify-write of a single field.
    fn modify_field(&self, reg: Reg, field: Field, value: u32) {
        let old = self.read(reg);
        self.write(reg, field.insert(old, value));
    }

    fn set_bits(&self, reg: Reg, bits: u32) {
        let old = self.read(reg);
        self.write(reg, old | bits);
    }

    fn clear_bits(&self, reg: Reg, bits: u32) {
        let old = self.read(reg);
        self.write(reg, old & !bits);
    }
}

impl<R: RegisterFile + ?Sized> RegisterFile for &R {
    #[inline(always)]
    fn read(&self, reg: Reg) -> u32 {(**self).read(reg)}
    #[inline(always)]
    fn write(&self, reg: Reg, value: u32) {(**self).write(reg, value)}
}

/// The memory mapped system control space of the running core.
#[derive(Debug)]
pub struct Mmio(());

impl Mmio {
    /// # Safety
    /// Only code running on a Cortex-M core may create this, and the caller
    /// is responsible for coordinating with any other code that touches the
    /// same registers.
    pub const unsafe fn new() -> Self {Mmio(())}

    #[inline(always)]
    fn cell(reg: Reg) -> &'static RW<u32> {
        // SAFETY: Every `Reg` is a word aligned address inside the system
        // control space, and `Mmio` only exists on the core that has one.
        unsafe {&*(reg.address() as *const RW<u32>)}
    }
}

impl RegisterFile for Mmio {
    #[inline(always)]
    fn read(&self, reg: Reg) -> u32 {Self::cell(reg).read()}
    #[inline(always)]
    fn write(&self, reg: Reg, value: u32) {
        unsafe {Self::cell(reg).write(value)}
    }
}
