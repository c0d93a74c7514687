//! Core-level interrupt and fault masking.

/// The PRIMASK / FAULTMASK primitives.  Each call is a single core
/// instruction, idempotent, and cannot fail.
pub trait GlobalMask {
    /// Clear PRIMASK (`cpsie i`).
    fn enable_global_interrupts(&self);
    /// Clear FAULTMASK (`cpsie f`).
    fn enable_global_faults(&self);
    /// Set PRIMASK (`cpsid i`).
    fn disable_global_interrupts(&self);
    /// Set FAULTMASK (`cpsid f`).
    fn disable_global_faults(&self);
}

/// The masks of the running core.  On anything other than an ARM target
/// these are no-ops.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreMask;

impl GlobalMask for CoreMask {
    #[inline(always)]
    fn enable_global_interrupts(&self) {
        #[cfg(target_arch = "arm")]
        unsafe {cortex_m::interrupt::enable()};
    }
    #[inline(always)]
    fn enable_global_faults(&self) {
        #[cfg(target_arch = "arm")]
        unsafe {
            core::arch::asm!("cpsie f", options(nomem, nostack, preserves_flags))};
    }
    #[inline(always)]
    fn disable_global_interrupts(&self) {
        #[cfg(target_arch = "arm")]
        cortex_m::interrupt::disable();
    }
    #[inline(always)]
    fn disable_global_faults(&self) {
        #[cfg(target_arch = "arm")]
        unsafe {
            core::arch::asm!("cpsid f", options(nomem, nostack, preserves_flags))};
    }
}

impl<M: GlobalMask + ?Sized> GlobalMask for &M {
    fn enable_global_interrupts(&self) {(**self).enable_global_interrupts()}
    fn enable_global_faults(&self) {(**self).enable_global_faults()}
    fn disable_global_interrupts(&self) {(**self).disable_global_interrupts()}
    fn disable_global_faults(&self) {(**self).disable_global_faults()}
}

/// Run `f` with interrupts masked, restoring the previous mask afterwards.
#[inline]
pub fn free<R>(f: impl FnOnce() -> R) -> R {
    critical_section::with(|_| f())
}

/// Sleep until the next interrupt.
#[inline(always)]
pub fn wait_for_interrupt() {
    #[cfg(target_arch = "arm")]
    cortex_m::asm::wfi();
}

/// Compiler barrier for values shared with handlers.
#[inline(always)]
pub fn barrier() {
    core::sync::atomic::compiler_fence(core::sync::atomic::Ordering::SeqCst);
}
