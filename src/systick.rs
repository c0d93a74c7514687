//! SysTick periodic timer.
//!
//! The timer runs in one of two modes.  After [`TickTimer::init`] it raises
//! the SysTick exception on every expiry, and the exception handler calls
//! the registered callback.  [`TickTimer::start_busy_wait`] instead runs the
//! counter with the exception disabled and spins until one period elapses.
//!
//! Both modes derive the reload value from the same formula and the same
//! clock frequency: the one passed to the last `init`, or the one the timer
//! was constructed with.

use core::cell::Cell;
use core::convert::Infallible;

use critical_section::Mutex;

use crate::error::{Error, Result};
use crate::mask::barrier;
use crate::regs::{
    Reg, RegisterFile, STCTRL_CLK_SRC, STCTRL_CONTROL, STCTRL_COUNT,
    STCTRL_ENABLE, STCTRL_INTEN, STRELOAD_MAX};

/// 16MHz precision internal oscillator.
pub const DEFAULT_TICKS_PER_SECOND: u32 = 16_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Expiry raises the SysTick exception.
    Interrupt,
    /// Expiry is observed by polling the count flag.
    BusyWait,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    Uninitialized,
    Armed(Mode),
    Stopped(Mode),
}

/// Reload value for a period of `period_ms` at `ticks_per_second`,
/// `(period_ms - 1) * ticks_per_second / 1000`.
///
/// Rejects a zero period or clock, and reload values that are zero (the
/// counter would never expire) or wider than the 24-bit counter.
pub fn reload_value(period_ms: u32, ticks_per_second: u32) -> Result<u32> {
    if period_ms == 0 || ticks_per_second == 0 {
        return Err(Error::InvalidPeriod);
    }
    let reload = (period_ms as u64 - 1) * ticks_per_second as u64 / 1000;
    if reload == 0 || reload > STRELOAD_MAX as u64 {
        return Err(Error::InvalidPeriod);
    }
    Ok(reload as u32)
}

/// Callback run on each expiry, in exception context.
pub type Callback = fn();

/// The SysTick timer and its expiry callback.
///
/// All methods take `&self` so that the timer can live in a `static` shared
/// with the exception handler (see [`systick_handler!`](crate::systick_handler)).
/// The callback slot is a single word (`Option<fn()>` is pointer sized), so
/// on Cortex-M a store to it is one instruction and the handler never sees a
/// torn value; the critical section around it additionally orders it with
/// respect to the handler.
pub struct TickTimer<R> {
    regs: R,
    callback: Mutex<Cell<Option<Callback>>>,
    state: Mutex<Cell<State>>,
    ticks_per_second: Mutex<Cell<u32>>,
}

impl<R: RegisterFile> TickTimer<R> {
    pub const fn new(regs: R) -> Self {
        Self::with_clock(regs, DEFAULT_TICKS_PER_SECOND)
    }

    pub const fn with_clock(regs: R, ticks_per_second: u32) -> Self {
        TickTimer {
            regs,
            callback: Mutex::new(Cell::new(None)),
            state: Mutex::new(Cell::new(State::Uninitialized)),
            ticks_per_second: Mutex::new(Cell::new(ticks_per_second)),
        }
    }

    pub fn state(&self) -> State {
        critical_section::with(|cs| self.state.borrow(cs).get())
    }

    fn set_state(&self, state: State) {
        critical_section::with(|cs| self.state.borrow(cs).set(state));
    }

    pub fn ticks_per_second(&self) -> u32 {
        critical_section::with(|cs| self.ticks_per_second.borrow(cs).get())
    }

    /// Clock frequency implied by the calibration register, if the core
    /// provides one.  TENMS is the reload value for 10ms.
    pub fn calibrated_ticks_per_second(&self) -> Option<u32> {
        let tenms = self.regs.read(Reg::StCalib) & STRELOAD_MAX;
        if tenms == 0 {None} else {Some(tenms * 100)}
    }

    pub fn reload(&self) -> u32 {self.regs.read(Reg::StReload)}

    pub fn current(&self) -> u32 {self.regs.read(Reg::StCurrent)}

    /// Arm the timer to raise the SysTick exception every `period_ms`,
    /// clocked from the processor clock at `ticks_per_second`.
    pub fn init(&self, period_ms: u32, ticks_per_second: u32) -> Result<()> {
        let reload = reload_value(period_ms, ticks_per_second)?;
        debug!("systick init {}ms reload {}", period_ms, reload);
        self.regs.clear_bits(Reg::StCtrl, STCTRL_CONTROL);
        self.regs.write(Reg::StCurrent, 0);
        self.regs.write(Reg::StReload, reload);
        self.regs.set_bits(Reg::StCtrl, STCTRL_CONTROL);
        critical_section::with(|cs| {
            self.ticks_per_second.borrow(cs).set(ticks_per_second);
            self.state.borrow(cs).set(State::Armed(Mode::Interrupt));
        });
        Ok(())
    }

    /// Restart counting after [`stop`](Self::stop), keeping the reload value
    /// and interrupt configuration.
    pub fn start(&self) -> Result<()> {
        let mode = match self.state() {
            State::Uninitialized => return Err(Error::NotInitialized),
            State::Armed(mode) | State::Stopped(mode) => mode,
        };
        self.regs.set_bits(Reg::StCtrl, STCTRL_ENABLE);
        self.set_state(State::Armed(mode));
        Ok(())
    }

    /// Stop counting.  Only the enable bit changes.
    pub fn stop(&self) {
        self.regs.clear_bits(Reg::StCtrl, STCTRL_ENABLE);
        if let State::Armed(mode) = self.state() {
            self.set_state(State::Stopped(mode));
        }
    }

    /// Disarm and zero the reload and current values, whatever the state.
    pub fn deinit(&self) {
        debug!("systick deinit");
        self.regs.clear_bits(Reg::StCtrl, STCTRL_CONTROL);
        self.regs.write(Reg::StReload, 0);
        self.regs.write(Reg::StCurrent, 0);
        self.set_state(State::Uninitialized);
    }

    pub fn reinit(&self, period_ms: u32, ticks_per_second: u32) -> Result<()> {
        self.deinit();
        self.init(period_ms, ticks_per_second)
    }

    /// Replace the expiry callback.  `None` clears it, after which expiry
    /// does nothing.
    pub fn set_callback(&self, callback: Option<Callback>) {
        critical_section::with(|cs| self.callback.borrow(cs).set(callback));
        barrier();
    }

    pub fn callback(&self) -> Option<Callback> {
        critical_section::with(|cs| self.callback.borrow(cs).get())
    }

    /// Expiry handler: runs the registered callback, if any, to completion.
    ///
    /// # Safety
    /// Call only from the SysTick exception.  The callback runs at the
    /// SysTick priority and must finish before the next expiry is serviced;
    /// expiries that occur meanwhile are not queued.
    pub unsafe fn on_expiry(&self) {
        if let Some(callback) = self.callback() {
            callback();
        }
    }

    /// Poll the count flag.  Reading the flag clears it, so each completed
    /// period is reported once.
    pub fn poll_expired(&self) -> nb::Result<(), Infallible> {
        if self.regs.read(Reg::StCtrl) & STCTRL_COUNT != 0 {
            Ok(())
        }
        else {
            Err(nb::Error::WouldBlock)
        }
    }

    /// Run the counter with the exception disabled and block until one
    /// period of `period_ms` has elapsed.
    ///
    /// The reload value comes from the same formula as [`init`](Self::init),
    /// `(period_ms - 1) * ticks_per_second / 1000`, so the wait is one
    /// millisecond short of `period_ms`.  `period_ms` of 1 gives a zero
    /// reload and is rejected with [`Error::InvalidPeriod`]; ask for 2 to
    /// wait 1ms.
    ///
    /// There is no timeout: if the counter never expires, for instance
    /// because its clock is not running, this never returns.
    pub fn start_busy_wait(&self, period_ms: u32) -> Result<()> {
        let reload = reload_value(period_ms, self.ticks_per_second())?;
        debug!("systick busy wait {}ms reload {}", period_ms, reload);
        self.regs.clear_bits(Reg::StCtrl, STCTRL_INTEN | STCTRL_ENABLE);
        self.regs.write(Reg::StReload, reload);
        self.regs.write(Reg::StCurrent, 0);
        self.regs.set_bits(Reg::StCtrl, STCTRL_ENABLE | STCTRL_CLK_SRC);
        self.set_state(State::Armed(Mode::BusyWait));
        nb::block!(self.poll_expired()).unwrap_or_else(|never| match never {});
        Ok(())
    }
}

/// Define the `SysTick` exception entry point, forwarding to a `static`
/// [`TickTimer`].
///
/// ```ignore
/// static TIMER: TickTimer<Mmio> = TickTimer::new(unsafe {Mmio::new()});
/// tiva_common::systick_handler!(TIMER);
/// ```
#[macro_export]
macro_rules! systick_handler {
    ($timer:path) => {
        #[allow(non_snake_case)]
        #[unsafe(no_mangle)]
        pub extern "C" fn SysTick() {
            // SAFETY: This is the SysTick exception entry.
            unsafe {$timer.on_expiry()}
        }
    };
}
