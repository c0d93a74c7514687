//! Host model of the system control space registers.
//!
//! Models the access semantics the drivers depend on: write-1 set/clear
//! banks, the read-clears count flag, the write-clears current value, and a
//! SysTick counter that advances as the control register is polled.

use core::cell::Cell;

use crate::mask::GlobalMask;
use crate::regs::{
    MAX_BANKS, MAX_PRIORITY_REGS, Reg, RegisterFile, STCTRL_CONTROL,
    STCTRL_COUNT, STCTRL_ENABLE, STRELOAD_MAX};

pub struct SimRegisters {
    ictr: Cell<u32>,
    enabled: [Cell<u32>; MAX_BANKS],
    pending: [Cell<u32>; MAX_BANKS],
    active: [Cell<u32>; MAX_BANKS],
    priority: [Cell<u32>; MAX_PRIORITY_REGS],
    sys_priority: [Cell<u32>; 3],
    sys_handler_ctrl: Cell<u32>,
    st_ctrl: Cell<u32>,
    st_reload: Cell<u32>,
    st_current: Cell<u32>,
    st_calib: Cell<u32>,
    count_flag: Cell<bool>,
    /// Counter ticks per poll of the control register; `None` is one full
    /// period per poll.
    poll_step: Cell<Option<u32>>,
    polls: Cell<usize>,
    writes: Cell<usize>,
}

impl Default for SimRegisters {
    fn default() -> Self {Self::new()}
}

impl SimRegisters {
    pub const fn new() -> Self {
        SimRegisters {
            ictr: Cell::new(4),
            enabled: [const {Cell::new(0)}; MAX_BANKS],
            pending: [const {Cell::new(0)}; MAX_BANKS],
            active: [const {Cell::new(0)}; MAX_BANKS],
            priority: [const {Cell::new(0)}; MAX_PRIORITY_REGS],
            sys_priority: [const {Cell::new(0)}; 3],
            sys_handler_ctrl: Cell::new(0),
            st_ctrl: Cell::new(0),
            st_reload: Cell::new(0),
            st_current: Cell::new(0),
            st_calib: Cell::new(0),
            count_flag: Cell::new(false),
            poll_step: Cell::new(None),
            polls: Cell::new(0),
            writes: Cell::new(0),
        }
    }

    /// Number of register writes so far.
    pub fn writes(&self) -> usize {self.writes.get()}

    /// Number of reads of the SysTick control register so far.
    pub fn polls(&self) -> usize {self.polls.get()}

    /// Set the SysTick calibration register.
    pub fn set_calibration(&self, value: u32) {self.st_calib.set(value)}

    pub fn set_poll_step(&self, ticks: Option<u32>) {self.poll_step.set(ticks)}

    /// Backing cell for a register, if the model has one.  Banks and
    /// priority registers past the architectural limit have none.
    fn cell(&self, reg: Reg) -> Option<&Cell<u32>> {
        match reg {
            Reg::Ictr => Some(&self.ictr),
            Reg::StReload => Some(&self.st_reload),
            Reg::StCurrent => Some(&self.st_current),
            Reg::StCalib => Some(&self.st_calib),
            Reg::SetEnable(n) | Reg::ClearEnable(n) => self.enabled.get(n as usize),
            Reg::SetPending(n) | Reg::ClearPending(n) =>
                self.pending.get(n as usize),
            Reg::Active(n) => self.active.get(n as usize),
            Reg::Priority(n) => self.priority.get(n as usize),
            Reg::SysPriority(n) =>
                self.sys_priority.get((n as usize).checked_sub(1)?),
            Reg::SysHandlerCtrl => Some(&self.sys_handler_ctrl),
            Reg::StCtrl => None,
        }
    }

    /// Raw register contents, without side effects or counting.  Registers
    /// the model does not have read as zero.
    pub fn peek(&self, reg: Reg) -> u32 {
        match reg {
            Reg::StCtrl => self.st_ctrl.get()
                | if self.count_flag.get() {STCTRL_COUNT} else {0},
            _ => self.cell(reg).map_or(0, Cell::get),
        }
    }

    /// Raw register store, without side effects or counting.  Stores to
    /// registers the model does not have are dropped.
    pub fn poke(&self, reg: Reg, value: u32) {
        match reg {
            Reg::StCtrl => {
                self.st_ctrl.set(value & STCTRL_CONTROL);
                self.count_flag.set(value & STCTRL_COUNT != 0);
            }
            Reg::StReload | Reg::StCurrent =>
                self.poke_cell(reg, value & STRELOAD_MAX),
            _ => self.poke_cell(reg, value),
        }
    }

    fn poke_cell(&self, reg: Reg, value: u32) {
        if let Some(c) = self.cell(reg) {
            c.set(value);
        }
    }

    /// Advance the SysTick counter.  Counts down to zero, setting the count
    /// flag, then reloads on the following tick.  A disabled counter or a
    /// zero reload value does not count.
    pub fn tick(&self, mut ticks: u32) {
        let reload = self.st_reload.get();
        if reload == 0 || self.st_ctrl.get() & STCTRL_ENABLE == 0 {
            return;
        }
        while ticks > 0 {
            let current = self.st_current.get();
            if current == 0 {
                self.st_current.set(reload);
                ticks -= 1;
            }
            else if ticks < current {
                self.st_current.set(current - ticks);
                return;
            }
            else {
                ticks -= current;
                self.st_current.set(0);
                self.count_flag.set(true);
            }
        }
    }
}

impl RegisterFile for SimRegisters {
    fn read(&self, reg: Reg) -> u32 {
        if reg != Reg::StCtrl {
            return self.peek(reg);
        }
        self.polls.set(self.polls.get() + 1);
        let step = self.poll_step.get()
            .unwrap_or(self.st_reload.get().saturating_add(1));
        self.tick(step);
        let value = self.peek(Reg::StCtrl);
        self.count_flag.set(false);
        value
    }

    fn write(&self, reg: Reg, value: u32) {
        self.writes.set(self.writes.get() + 1);
        match reg {
            Reg::SetEnable(_) | Reg::SetPending(_) => {
                let old = self.peek(reg);
                self.poke(reg, old | value);
            }
            Reg::ClearEnable(_) | Reg::ClearPending(_) => {
                let old = self.peek(reg);
                self.poke(reg, old & !value);
            }
            Reg::StCtrl => self.st_ctrl.set(value & STCTRL_CONTROL),
            Reg::StCurrent => {
                self.st_current.set(0);
                self.count_flag.set(false);
            }
            Reg::Ictr | Reg::StCalib | Reg::Active(_) => (),
            _ => self.poke(reg, value),
        }
    }
}

/// A [`GlobalMask`] that records calls instead of touching the core.
#[derive(Default)]
pub struct RecordingMask {
    pub interrupts_enabled: Cell<usize>,
    pub faults_enabled: Cell<usize>,
    pub interrupts_disabled: Cell<usize>,
    pub faults_disabled: Cell<usize>,
}

fn bump(c: &Cell<usize>) {c.set(c.get() + 1)}

impl GlobalMask for RecordingMask {
    fn enable_global_interrupts(&self) {bump(&self.interrupts_enabled)}
    fn enable_global_faults(&self) {bump(&self.faults_enabled)}
    fn disable_global_interrupts(&self) {bump(&self.interrupts_disabled)}
    fn disable_global_faults(&self) {bump(&self.faults_disabled)}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_one_semantics() {
        let regs = SimRegisters::new();
        regs.write(Reg::SetEnable(1), 0x11);
        regs.write(Reg::SetEnable(1), 0x100);
        assert_eq!(regs.read(Reg::SetEnable(1)), 0x111);
        regs.write(Reg::ClearEnable(1), 0x10);
        assert_eq!(regs.read(Reg::SetEnable(1)), 0x101);
        assert_eq!(regs.read(Reg::ClearEnable(1)), 0x101);
        assert_eq!(regs.writes(), 3);
    }

    #[test]
    fn unmodelled_registers_ignored() {
        let regs = SimRegisters::new();
        let past = MAX_BANKS as u8;
        regs.write(Reg::SetEnable(past), !0);
        regs.write(Reg::ClearPending(past), !0);
        regs.write(Reg::Priority(MAX_PRIORITY_REGS as u8), !0);
        regs.write(Reg::SysPriority(0), !0);
        regs.write(Reg::SysPriority(4), !0);
        assert_eq!(regs.read(Reg::SetEnable(past)), 0);
        assert_eq!(regs.read(Reg::Active(past)), 0);
        assert_eq!(regs.read(Reg::Priority(MAX_PRIORITY_REGS as u8)), 0);
        assert_eq!(regs.read(Reg::SysPriority(0)), 0);
        assert_eq!(regs.peek(Reg::SysPriority(4)), 0);
        assert_eq!(regs.writes(), 5);
        // The modelled neighbours are untouched.
        assert_eq!(regs.peek(Reg::SetEnable(past - 1)), 0);
        assert_eq!(regs.peek(Reg::SysPriority(1)), 0);
        assert_eq!(regs.peek(Reg::SysPriority(3)), 0);
    }

    #[test]
    fn countdown() {
        let regs = SimRegisters::new();
        regs.set_poll_step(Some(0));
        regs.write(Reg::StReload, 9);
        regs.write(Reg::StCtrl, STCTRL_ENABLE);
        regs.tick(1);
        assert_eq!(regs.read(Reg::StCurrent), 9);
        regs.tick(8);
        assert_eq!(regs.read(Reg::StCurrent), 1);
        assert_eq!(regs.read(Reg::StCtrl) & STCTRL_COUNT, 0);
        regs.tick(1);
        assert_eq!(regs.read(Reg::StCtrl) & STCTRL_COUNT, STCTRL_COUNT);
        // Consumed by the read.
        assert_eq!(regs.read(Reg::StCtrl) & STCTRL_COUNT, 0);
    }

    #[test]
    fn current_write_clears() {
        let regs = SimRegisters::new();
        regs.poke(Reg::StCurrent, 1234);
        regs.poke(Reg::StCtrl, STCTRL_COUNT);
        regs.write(Reg::StCurrent, 0xdead);
        assert_eq!(regs.peek(Reg::StCurrent), 0);
        assert_eq!(regs.peek(Reg::StCtrl), 0);
    }
}
