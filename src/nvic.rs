//! Interrupt controller: enable, disable and prioritize peripheral interrupt
//! lines and the configurable core exceptions.
//!
//! Lines are grouped 32 to a bank for enable/disable.  Enabling writes the
//! line's bit to the set-enable bank and disabling writes it to the separate
//! clear-enable bank; neither is a read-modify-write.  Priorities are packed
//! four lines to a 32-bit register, 8 bits per slot of which the top 3 are
//! implemented; setting one rewrites exactly those 3 bits.

use crate::error::{Error, Result};
use crate::exception::ExceptionKind;
use crate::irq::{InterruptLine, NUM_INTERRUPTS};
use crate::mask::{self, CoreMask, GlobalMask};
use crate::priority::Priority;
use crate::regs::{MAX_LINES, Reg, RegisterFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Number of interrupt lines the chip implements.
    pub lines: u16,
    /// Whether [`InterruptController::enable`] also clears the global
    /// interrupt and fault masks.  Note that this is global, not scoped to
    /// the line.  When false, call [`InterruptController::unmask_global`]
    /// once during start-up instead.
    pub unmask_on_enable: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {lines: NUM_INTERRUPTS as u16, unmask_on_enable: true}
    }
}

/// The NVIC of a single core.
///
/// Holds no state beyond the registers themselves.  Configuration calls are
/// not reentrant; to reconfigure a line that its own handler also touches,
/// use [`with_line_masked`](Self::with_line_masked).
pub struct InterruptController<R, M = CoreMask> {
    regs: R,
    mask: M,
    config: Config,
}

impl<R: RegisterFile, M: GlobalMask> InterruptController<R, M> {
    /// Default configuration, limited to the lines the core reports in
    /// ICTR.
    pub fn new(regs: R, mask: M) -> Self {
        let lines = implemented_lines(&regs).min(NUM_INTERRUPTS as u16);
        Self::with_config(regs, mask, Config {lines, ..Config::default()})
    }

    /// Line counts beyond what the architecture allows are clamped.
    pub fn with_config(regs: R, mask: M, mut config: Config) -> Self {
        config.lines = config.lines.min(MAX_LINES as u16);
        InterruptController {regs, mask, config}
    }

    pub fn config(&self) -> &Config {&self.config}

    pub fn lines(&self) -> u16 {self.config.lines}

    fn banks(&self) -> u8 {self.config.lines.div_ceil(32) as u8}

    fn check(&self, line: InterruptLine) -> Result<()> {
        if line.number() < self.config.lines {
            Ok(())
        }
        else {
            Err(Error::OutOfRange(line.number()))
        }
    }

    /// Clear the global interrupt and fault masks.
    pub fn unmask_global(&self) {
        self.mask.enable_global_interrupts();
        self.mask.enable_global_faults();
    }

    /// Set the global interrupt and fault masks.  Only NMI gets through.
    pub fn mask_global(&self) {
        self.mask.disable_global_faults();
        self.mask.disable_global_interrupts();
    }

    /// Enable an interrupt line.  With [`Config::unmask_on_enable`] set (the
    /// default) this also lifts the global interrupt and fault masks.
    pub fn enable(&self, line: InterruptLine) -> Result<()> {
        self.check(line)?;
        if self.config.unmask_on_enable {
            self.unmask_global();
        }
        let (bank, bit) = line.bank();
        trace!("nvic enable {}", line.number());
        self.regs.write(Reg::SetEnable(bank), bit);
        Ok(())
    }

    pub fn disable(&self, line: InterruptLine) -> Result<()> {
        self.check(line)?;
        let (bank, bit) = line.bank();
        trace!("nvic disable {}", line.number());
        self.regs.write(Reg::ClearEnable(bank), bit);
        Ok(())
    }

    pub fn is_enabled(&self, line: InterruptLine) -> Result<bool> {
        self.check(line)?;
        let (bank, bit) = line.bank();
        Ok(self.regs.read(Reg::SetEnable(bank)) & bit != 0)
    }

    pub fn set_pending(&self, line: InterruptLine) -> Result<()> {
        self.check(line)?;
        let (bank, bit) = line.bank();
        self.regs.write(Reg::SetPending(bank), bit);
        Ok(())
    }

    pub fn clear_pending(&self, line: InterruptLine) -> Result<()> {
        self.check(line)?;
        let (bank, bit) = line.bank();
        self.regs.write(Reg::ClearPending(bank), bit);
        Ok(())
    }

    pub fn is_pending(&self, line: InterruptLine) -> Result<bool> {
        self.check(line)?;
        let (bank, bit) = line.bank();
        Ok(self.regs.read(Reg::SetPending(bank)) & bit != 0)
    }

    /// Whether the line's handler is running or preempted.
    pub fn is_active(&self, line: InterruptLine) -> Result<bool> {
        self.check(line)?;
        let (bank, bit) = line.bank();
        Ok(self.regs.read(Reg::Active(bank)) & bit != 0)
    }

    /// Lowest numbered pending line, if any.
    pub fn next_pending(&self) -> Option<InterruptLine> {
        for bank in 0 .. self.banks() {
            let pending = self.regs.read(Reg::SetPending(bank));
            if pending != 0 {
                let n = bank as u16 * 32 + pending.trailing_zeros() as u16;
                if n < self.config.lines {
                    return Some(InterruptLine::new(n));
                }
            }
        }
        None
    }

    pub fn disable_all(&self) {
        for bank in 0 .. self.banks() {
            self.regs.write(Reg::ClearEnable(bank), !0);
        }
    }

    pub fn clear_all_pending(&self) {
        for bank in 0 .. self.banks() {
            self.regs.write(Reg::ClearPending(bank), !0);
        }
    }

    /// Set the priority of a line, 0 (highest) to 7 (lowest).  The other
    /// three lines sharing the priority register are left untouched.
    pub fn set_priority(&self, line: InterruptLine, priority: u8) -> Result<()> {
        let priority = Priority::new(priority)?;
        self.check(line)?;
        let (reg, slot) = line.priority_slot();
        trace!("nvic priority {} = {}", line.number(), priority.value());
        self.regs.modify_field(
            Reg::Priority(reg), Priority::field(slot), priority.value() as u32);
        Ok(())
    }

    pub fn priority(&self, line: InterruptLine) -> Result<Priority> {
        self.check(line)?;
        let (reg, slot) = line.priority_slot();
        let value = self.regs.read_field(Reg::Priority(reg), Priority::field(slot));
        Priority::new(value as u8)
    }

    /// Run `f` with `line` disabled, re-enabling it afterwards if it was
    /// enabled before.  Use this to reconfigure state shared with the line's
    /// handler.
    pub fn with_line_masked<T>(&self, line: InterruptLine, f: impl FnOnce() -> T)
                               -> Result<T> {
        let was_enabled = mask::free(|| -> Result<bool> {
            let was_enabled = self.is_enabled(line)?;
            self.disable(line)?;
            Ok(was_enabled)
        })?;
        let result = f();
        if was_enabled {
            let (bank, bit) = line.bank();
            self.regs.write(Reg::SetEnable(bank), bit);
        }
        Ok(result)
    }

    /// Enable one of the configurable exceptions.  Reset, NMI, hard fault,
    /// SVCall and PendSV have no enable bit and are rejected.
    pub fn enable_exception(&self, kind: ExceptionKind) -> Result<()> {
        let control = kind.try_control()?;
        trace!("exception enable {}", kind);
        self.regs.set_bits(control.enable_reg, control.enable_bit);
        Ok(())
    }

    pub fn disable_exception(&self, kind: ExceptionKind) -> Result<()> {
        let control = kind.try_control()?;
        trace!("exception disable {}", kind);
        self.regs.clear_bits(control.enable_reg, control.enable_bit);
        Ok(())
    }

    pub fn is_exception_enabled(&self, kind: ExceptionKind) -> Result<bool> {
        let control = kind.try_control()?;
        Ok(self.regs.read(control.enable_reg) & control.enable_bit != 0)
    }

    pub fn set_exception_priority(&self, kind: ExceptionKind, priority: u8)
                                  -> Result<()> {
        let control = kind.try_control()?;
        let priority = Priority::new(priority)?;
        trace!("exception priority {} = {}", kind, priority.value());
        self.regs.modify_field(
            control.priority_reg, control.priority, priority.value() as u32);
        Ok(())
    }

    pub fn exception_priority(&self, kind: ExceptionKind) -> Result<Priority> {
        let control = kind.try_control()?;
        let value = self.regs.read_field(control.priority_reg, control.priority);
        Priority::new(value as u8)
    }
}

/// Lines implemented by the core, from ICTR, up to the architectural limit.
pub fn implemented_lines(regs: &impl RegisterFile) -> u16 {
    let banks = (regs.read(Reg::Ictr) & 0xf) as u16 + 1;
    (banks * 32).min(MAX_LINES as u16)
}

#[cfg(all(test, feature = "cpu_tm4c123"))]
mod tests {
    use super::*;
    use crate::irq::tm4c123;
    use crate::regs::{STCTRL_ENABLE, STCTRL_INTEN};
    use crate::sim::{RecordingMask, SimRegisters};

    fn setup<'a>(regs: &'a SimRegisters, mask: &'a RecordingMask)
                 -> InterruptController<&'a SimRegisters, &'a RecordingMask> {
        InterruptController::new(regs, mask)
    }

    #[test]
    fn enable_every_line() {
        let regs = SimRegisters::new();
        let mask = RecordingMask::default();
        let nvic = setup(&regs, &mask);
        for n in 0 .. NUM_INTERRUPTS as u16 {
            let line = InterruptLine::new(n);
            nvic.enable(line).unwrap();
            assert!(nvic.is_enabled(line).unwrap());
            assert_eq!(regs.peek(Reg::SetEnable((n / 32) as u8)) >> (n % 32) & 1, 1);
        }
        assert_eq!(mask.interrupts_enabled.get(), NUM_INTERRUPTS);
        assert_eq!(mask.faults_enabled.get(), NUM_INTERRUPTS);
    }

    #[test]
    fn disable_goes_to_clear_bank() {
        let regs = SimRegisters::new();
        let mask = RecordingMask::default();
        let nvic = setup(&regs, &mask);
        nvic.enable(tm4c123::UART0).unwrap();
        nvic.enable(tm4c123::GPIOA).unwrap();
        nvic.disable(tm4c123::UART0).unwrap();
        assert!(!nvic.is_enabled(tm4c123::UART0).unwrap());
        assert!(nvic.is_enabled(tm4c123::GPIOA).unwrap());
        // Disabling never lifts the global masks.
        assert_eq!(mask.interrupts_enabled.get(), 2);
    }

    #[test]
    fn no_unmask_when_configured_off() {
        let regs = SimRegisters::new();
        let mask = RecordingMask::default();
        let nvic = InterruptController::with_config(
            &regs, &mask, Config {unmask_on_enable: false, ..Config::default()});
        nvic.enable(tm4c123::TIMER0A).unwrap();
        assert_eq!(mask.interrupts_enabled.get(), 0);
        nvic.unmask_global();
        assert_eq!(mask.interrupts_enabled.get(), 1);
        assert_eq!(mask.faults_enabled.get(), 1);
    }

    #[test]
    fn global_mask_both_ways() {
        let regs = SimRegisters::new();
        let mask = RecordingMask::default();
        let nvic = setup(&regs, &mask);
        nvic.mask_global();
        assert_eq!(mask.interrupts_disabled.get(), 1);
        assert_eq!(mask.faults_disabled.get(), 1);
        assert_eq!(mask.interrupts_enabled.get(), 0);
        assert_eq!(regs.writes(), 0);
    }

    #[test]
    fn line_count_from_ictr() {
        let regs = SimRegisters::new();
        let mask = RecordingMask::default();
        // Five banks cover the whole chip.
        regs.poke(Reg::Ictr, 4);
        assert_eq!(implemented_lines(&regs), 160);
        assert_eq!(setup(&regs, &mask).lines(), NUM_INTERRUPTS as u16);

        // A core reporting one bank only gets 32 lines.
        regs.poke(Reg::Ictr, 0);
        let nvic = setup(&regs, &mask);
        assert_eq!(nvic.lines(), 32);
        assert_eq!(nvic.enable(tm4c123::UART2), Err(Error::OutOfRange(33)));
        nvic.disable_all();
        assert_eq!(regs.writes(), 1);

        // Reserved high bits are ignored, and 16 banks clamp to the maximum.
        regs.poke(Reg::Ictr, 0xffff_fff0);
        assert_eq!(implemented_lines(&regs), 32);
        regs.poke(Reg::Ictr, 0xf);
        assert_eq!(implemented_lines(&regs), MAX_LINES as u16);
    }

    #[test]
    fn active_lines() {
        let regs = SimRegisters::new();
        let mask = RecordingMask::default();
        let nvic = setup(&regs, &mask);
        regs.poke(Reg::Active(1), 1 << 14);
        assert!(nvic.is_active(tm4c123::UDMA).unwrap());
        assert!(!nvic.is_active(tm4c123::UDMA_ERROR).unwrap());
        // The active bank is read only.
        regs.write(Reg::Active(1), 0);
        assert!(nvic.is_active(tm4c123::UDMA).unwrap());
        let past = InterruptLine::new(NUM_INTERRUPTS as u16);
        assert_eq!(nvic.is_active(past), Err(Error::OutOfRange(past.number())));
    }

    #[test]
    fn out_of_range_lines_rejected() {
        let regs = SimRegisters::new();
        let mask = RecordingMask::default();
        let nvic = setup(&regs, &mask);
        let past = InterruptLine::new(NUM_INTERRUPTS as u16);
        assert_eq!(nvic.enable(past), Err(Error::OutOfRange(past.number())));
        assert_eq!(nvic.disable(past), Err(Error::OutOfRange(past.number())));
        assert_eq!(nvic.set_priority(past, 3),
                   Err(Error::OutOfRange(past.number())));
        let far = InterruptLine::new(1000);
        assert_eq!(nvic.enable(far), Err(Error::OutOfRange(1000)));
        assert_eq!(regs.writes(), 0);
        assert_eq!(mask.interrupts_enabled.get(), 0);
    }

    #[test]
    fn priority_round_trip_keeps_siblings() {
        let regs = SimRegisters::new();
        let mask = RecordingMask::default();
        let nvic = setup(&regs, &mask);
        for n in 0 .. NUM_INTERRUPTS as u16 {
            let line = InterruptLine::new(n);
            let reg = Reg::Priority((n / 4) as u8);
            let slot_mask = 0xe0u32 << (n % 4 * 8);
            for p in 0 ..= 7 {
                // Junk in every bit, so that untouched bits are visible.
                regs.poke(reg, 0xa5a5_a5a5 ^ (n as u32 * 0x0101_0101));
                let before = regs.peek(reg);
                nvic.set_priority(line, p).unwrap();
                let after = regs.peek(reg);
                assert_eq!(nvic.priority(line).unwrap().value(), p);
                assert_eq!(after & !slot_mask, before & !slot_mask,
                           "line {n} priority {p}");
            }
        }
    }

    #[test]
    fn invalid_priority_writes_nothing() {
        let regs = SimRegisters::new();
        let mask = RecordingMask::default();
        let nvic = setup(&regs, &mask);
        regs.poke(Reg::Priority(1), 0x1234_5678);
        assert_eq!(nvic.set_priority(InterruptLine::new(5), 8),
                   Err(Error::InvalidPriority(8)));
        assert_eq!(regs.peek(Reg::Priority(1)), 0x1234_5678);
        assert_eq!(regs.writes(), 0);
    }

    #[test]
    fn priority_layout() {
        let regs = SimRegisters::new();
        let mask = RecordingMask::default();
        let nvic = setup(&regs, &mask);
        nvic.set_priority(InterruptLine::new(4), 1).unwrap();
        nvic.set_priority(InterruptLine::new(5), 2).unwrap();
        nvic.set_priority(InterruptLine::new(6), 3).unwrap();
        nvic.set_priority(InterruptLine::new(7), 7).unwrap();
        assert_eq!(regs.peek(Reg::Priority(1)), 0xe060_4020);
    }

    #[test]
    fn pending() {
        let regs = SimRegisters::new();
        let mask = RecordingMask::default();
        let nvic = setup(&regs, &mask);
        assert_eq!(nvic.next_pending(), None);
        nvic.set_pending(tm4c123::PWM1_FAULT).unwrap();
        nvic.set_pending(tm4c123::UART2).unwrap();
        assert!(nvic.is_pending(tm4c123::UART2).unwrap());
        assert_eq!(nvic.next_pending(), Some(tm4c123::UART2));
        nvic.clear_pending(tm4c123::UART2).unwrap();
        assert_eq!(nvic.next_pending(), Some(tm4c123::PWM1_FAULT));
        nvic.clear_all_pending();
        assert_eq!(nvic.next_pending(), None);
    }

    #[test]
    fn disable_all_lines() {
        let regs = SimRegisters::new();
        let mask = RecordingMask::default();
        let nvic = setup(&regs, &mask);
        nvic.enable(tm4c123::GPIOF).unwrap();
        nvic.enable(tm4c123::PWM1_0).unwrap();
        nvic.disable_all();
        assert!(!nvic.is_enabled(tm4c123::GPIOF).unwrap());
        assert!(!nvic.is_enabled(tm4c123::PWM1_0).unwrap());
    }

    #[test]
    fn masked_section_restores() {
        let regs = SimRegisters::new();
        let mask = RecordingMask::default();
        let nvic = setup(&regs, &mask);
        nvic.enable(tm4c123::I2C0).unwrap();
        let inside = nvic.with_line_masked(
            tm4c123::I2C0, || nvic.is_enabled(tm4c123::I2C0).unwrap()).unwrap();
        assert!(!inside);
        assert!(nvic.is_enabled(tm4c123::I2C0).unwrap());

        // A line that was off stays off.
        nvic.with_line_masked(tm4c123::SSI0, || ()).unwrap();
        assert!(!nvic.is_enabled(tm4c123::SSI0).unwrap());
    }

    #[test]
    fn exception_enable_bits() {
        let regs = SimRegisters::new();
        let mask = RecordingMask::default();
        let nvic = setup(&regs, &mask);
        regs.poke(Reg::SysHandlerCtrl, 0x0000_0001);
        nvic.enable_exception(ExceptionKind::MemManage).unwrap();
        nvic.enable_exception(ExceptionKind::BusFault).unwrap();
        nvic.enable_exception(ExceptionKind::UsageFault).unwrap();
        nvic.enable_exception(ExceptionKind::DebugMonitor).unwrap();
        assert_eq!(regs.peek(Reg::SysHandlerCtrl), 0x0007_0101);
        nvic.disable_exception(ExceptionKind::BusFault).unwrap();
        assert_eq!(regs.peek(Reg::SysHandlerCtrl), 0x0005_0101);
        assert!(!nvic.is_exception_enabled(ExceptionKind::BusFault).unwrap());
        assert!(nvic.is_exception_enabled(ExceptionKind::UsageFault).unwrap());

        regs.poke(Reg::StCtrl, STCTRL_ENABLE);
        nvic.enable_exception(ExceptionKind::SysTick).unwrap();
        assert_eq!(regs.peek(Reg::StCtrl), STCTRL_ENABLE | STCTRL_INTEN);
        nvic.disable_exception(ExceptionKind::SysTick).unwrap();
        assert_eq!(regs.peek(Reg::StCtrl), STCTRL_ENABLE);
        assert_eq!(regs.peek(Reg::SysHandlerCtrl), 0x0005_0101);
    }

    #[test]
    fn exception_priorities() {
        let regs = SimRegisters::new();
        let mask = RecordingMask::default();
        let nvic = setup(&regs, &mask);
        regs.poke(Reg::SysPriority(1), 0xffff_ffff);
        nvic.set_exception_priority(ExceptionKind::MemManage, 0).unwrap();
        assert_eq!(regs.peek(Reg::SysPriority(1)), 0xffff_ff1f);
        nvic.set_exception_priority(ExceptionKind::BusFault, 2).unwrap();
        assert_eq!(regs.peek(Reg::SysPriority(1)), 0xffff_5f1f);
        nvic.set_exception_priority(ExceptionKind::UsageFault, 4).unwrap();
        assert_eq!(regs.peek(Reg::SysPriority(1)), 0xff9f_5f1f);

        nvic.set_exception_priority(ExceptionKind::SysTick, 6).unwrap();
        nvic.set_exception_priority(ExceptionKind::DebugMonitor, 5).unwrap();
        assert_eq!(regs.peek(Reg::SysPriority(3)), 0xc000_00a0);
        assert_eq!(nvic.exception_priority(ExceptionKind::SysTick).unwrap().value(), 6);
        assert_eq!(nvic.exception_priority(ExceptionKind::BusFault).unwrap().value(), 2);

        assert_eq!(nvic.set_exception_priority(ExceptionKind::SysTick, 9),
                   Err(Error::InvalidPriority(9)));
        assert_eq!(regs.peek(Reg::SysPriority(3)), 0xc000_00a0);
    }

    #[test]
    fn fixed_exceptions_rejected() {
        let regs = SimRegisters::new();
        let mask = RecordingMask::default();
        let nvic = setup(&regs, &mask);
        for kind in [ExceptionKind::Reset, ExceptionKind::Nmi,
                     ExceptionKind::HardFault, ExceptionKind::SvCall,
                     ExceptionKind::PendSv] {
            let err = Err(Error::UnsupportedOperation(kind));
            assert_eq!(nvic.enable_exception(kind), err);
            assert_eq!(nvic.disable_exception(kind), err);
            assert_eq!(nvic.set_exception_priority(kind, 1), err);
            assert_eq!(nvic.exception_priority(kind), Err(Error::UnsupportedOperation(kind)));
        }
        assert_eq!(regs.writes(), 0);
        assert_eq!(regs.polls(), 0);
    }
}
