use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::fp::{FPExc, RoundingMode, FPCR, FPSR};

/// Accumulated block weight between interrupt checks.
pub const SYNC_THRESHOLD: u64 = 4_000_000;

/// Cache type register exposed to EL0.
pub const CTR_EL0: u32 = 0x8444_C004;
/// DC ZVA block size register (64-byte blocks).
pub const DCZID_EL0: u32 = 0x0000_0004;
/// Virtual counter frequency used until the host overrides it.
pub const DEFAULT_CNTFRQ_EL0: u64 = 19_200_000;

/// PSTATE condition flag positions.
const PSR_N_BIT: u32 = 31;
const PSR_Z_BIT: u32 = 30;
const PSR_C_BIT: u32 = 29;
const PSR_V_BIT: u32 = 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    #[default]
    AArch64,
    AArch32,
}

/// Single-bit FPCR controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum FPCRFlag {
    Ahp = 26,
    Dn = 25,
    Fz = 24,
    Ide = 15,
    Ixe = 12,
    Ufe = 11,
    Ofe = 10,
    Dze = 9,
    Ioe = 8,
}

/// Supervisor-side notifications.
///
/// Exception callbacks run synchronously from the instruction that raised them.
/// `on_interrupt` runs from `ThreadState::synchronize` once the sync threshold is reached.
pub trait ThreadCallbacks: Send {
    fn on_interrupt(&mut self) {}
    fn on_break(&mut self, _position: u64, _imm: u32) {}
    fn on_svc_call(&mut self, _position: u64, _imm: u32) {}
    fn on_undefined(&mut self, _position: u64, _raw: u32) {}
}

/// Cross-thread control of a running core: interrupt requests and stop.
#[derive(Debug, Clone)]
pub struct ThreadHandle {
    running: Arc<AtomicBool>,
    interrupt_pending: Arc<AtomicBool>,
}

impl ThreadHandle {
    /// Mark an interrupt pending. Delivered at the owning core's next sync point.
    pub fn request_interrupt(&self) {
        self.interrupt_pending.store(true, Ordering::Release);
    }

    /// Ask the core to stop. Observed cooperatively at the next sync point.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn interrupt_pending(&self) -> bool {
        self.interrupt_pending.load(Ordering::Acquire)
    }
}

/// Architectural state of one emulated core.
///
/// Owned by the executing thread; only the running and interrupt-pending flags are shared,
/// through [`ThreadHandle`].
pub struct ThreadState {
    /// AArch32 register bank.
    pub r32: [u32; 16],
    pub thumb: bool,
    pub execution_mode: ExecutionMode,

    /// General-purpose registers x0-x30.
    pub x: [u64; 31],
    pub sp: u64,
    pub pc: u64,
    /// SIMD&FP registers v0-v31.
    pub v: [u128; 32],

    pub negative: bool,
    pub zero: bool,
    pub carry: bool,
    pub overflow: bool,

    pub fpcr: FPCR,
    pub fpsr: FPSR,

    pub tpidr_el0: u64,
    pub tpidrro_el0: u64,
    pub core_id: u32,
    pub cntfrq_el0: u64,

    running: Arc<AtomicBool>,
    interrupt_pending: Arc<AtomicBool>,
    sync_count: u64,
    started: Instant,
    callbacks: Option<Box<dyn ThreadCallbacks>>,
}

impl Default for ThreadState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ThreadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadState")
            .field("core_id", &self.core_id)
            .field("pc", &format_args!("{:#x}", self.pc))
            .field("psr", &format_args!("{:#010x}", self.psr()))
            .field("fpcr", &self.fpcr)
            .field("fpsr", &self.fpsr)
            .field("running", &self.is_running())
            .field("sync_count", &self.sync_count)
            .finish_non_exhaustive()
    }
}

impl ThreadState {
    /// Create a zeroed, running state.
    pub fn new() -> Self {
        Self {
            r32: [0; 16],
            thumb: false,
            execution_mode: ExecutionMode::AArch64,
            x: [0; 31],
            sp: 0,
            pc: 0,
            v: [0; 32],
            negative: false,
            zero: false,
            carry: false,
            overflow: false,
            fpcr: FPCR::default(),
            fpsr: FPSR::default(),
            tpidr_el0: 0,
            tpidrro_el0: 0,
            core_id: 0,
            cntfrq_el0: DEFAULT_CNTFRQ_EL0,
            running: Arc::new(AtomicBool::new(true)),
            interrupt_pending: Arc::new(AtomicBool::new(false)),
            sync_count: 0,
            started: Instant::now(),
            callbacks: None,
        }
    }

    pub fn handle(&self) -> ThreadHandle {
        ThreadHandle {
            running: Arc::clone(&self.running),
            interrupt_pending: Arc::clone(&self.interrupt_pending),
        }
    }

    pub fn set_callbacks(&mut self, callbacks: Box<dyn ThreadCallbacks>) {
        self.callbacks = Some(callbacks);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn set_running(&mut self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    pub fn request_interrupt(&self) {
        self.interrupt_pending.store(true, Ordering::Release);
    }

    pub fn interrupt_pending(&self) -> bool {
        self.interrupt_pending.load(Ordering::Acquire)
    }

    /// Weight accumulated since the last interrupt check.
    pub fn sync_count(&self) -> u64 {
        self.sync_count
    }

    // --- Condition flags ---

    /// NZCV packed in PSTATE layout (bits 31:28).
    pub fn psr(&self) -> u32 {
        (self.negative as u32) << PSR_N_BIT
            | (self.zero as u32) << PSR_Z_BIT
            | (self.carry as u32) << PSR_C_BIT
            | (self.overflow as u32) << PSR_V_BIT
    }

    pub fn set_psr(&mut self, psr: u32) {
        self.negative = psr & (1 << PSR_N_BIT) != 0;
        self.zero = psr & (1 << PSR_Z_BIT) != 0;
        self.carry = psr & (1 << PSR_C_BIT) != 0;
        self.overflow = psr & (1 << PSR_V_BIT) != 0;
    }

    // --- System registers ---

    pub fn ctr_el0(&self) -> u32 {
        CTR_EL0
    }

    pub fn dczid_el0(&self) -> u32 {
        DCZID_EL0
    }

    /// Virtual count: wall-clock time since creation scaled by `cntfrq_el0`.
    pub fn cntpct_el0(&self) -> u64 {
        let elapsed = self.started.elapsed();
        (elapsed.as_secs_f64() * self.cntfrq_el0 as f64) as u64
    }

    // --- Floating-point control and status ---

    pub fn fpcr_flag(&self, flag: FPCRFlag) -> bool {
        self.fpcr.value() & (1 << flag as u32) != 0
    }

    pub fn set_fpsr_flag(&mut self, flag: FPExc) {
        self.fpsr.set(flag);
    }

    pub fn fp_rounding_mode(&self) -> RoundingMode {
        self.fpcr.rmode()
    }

    // --- Synchronization ---

    /// Report the weight of a block that just ran. Delivers a pending interrupt once the
    /// accumulated weight reaches [`SYNC_THRESHOLD`]. Returns whether the core should keep running.
    pub fn synchronize(&mut self, weight: u64) -> bool {
        self.sync_count += weight;
        if self.sync_count >= SYNC_THRESHOLD {
            self.check_interrupt();
        }
        self.is_running()
    }

    fn check_interrupt(&mut self) {
        self.sync_count = 0;
        if self.interrupt_pending.swap(false, Ordering::AcqRel) {
            log::trace!("core {}: delivering interrupt", self.core_id);
            if let Some(callbacks) = self.callbacks.as_mut() {
                callbacks.on_interrupt();
            }
        }
    }

    // --- Exception channels ---

    pub fn on_break(&mut self, position: u64, imm: u32) {
        log::debug!("core {}: BRK #{:#x} at {:#x}", self.core_id, imm, position);
        if let Some(callbacks) = self.callbacks.as_mut() {
            callbacks.on_break(position, imm);
        }
    }

    pub fn on_svc_call(&mut self, position: u64, imm: u32) {
        log::debug!("core {}: SVC #{:#x} at {:#x}", self.core_id, imm, position);
        if let Some(callbacks) = self.callbacks.as_mut() {
            callbacks.on_svc_call(position, imm);
        }
    }

    pub fn on_undefined(&mut self, position: u64, raw: u32) {
        log::debug!("core {}: undefined instruction {:#010x} at {:#x}", self.core_id, raw, position);
        if let Some(callbacks) = self.callbacks.as_mut() {
            callbacks.on_undefined(position, raw);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, PartialEq, Eq)]
    enum Event {
        Interrupt,
        Undefined(u64, u32),
    }

    struct Recorder(Arc<Mutex<Vec<Event>>>);

    impl ThreadCallbacks for Recorder {
        fn on_interrupt(&mut self) {
            self.0.lock().unwrap().push(Event::Interrupt);
        }

        fn on_undefined(&mut self, position: u64, raw: u32) {
            self.0.lock().unwrap().push(Event::Undefined(position, raw));
        }
    }

    fn recording_state() -> (ThreadState, Arc<Mutex<Vec<Event>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut state = ThreadState::new();
        state.set_callbacks(Box::new(Recorder(Arc::clone(&events))));
        (state, events)
    }

    #[test]
    fn test_psr_packing() {
        let mut state = ThreadState::new();
        assert_eq!(state.psr(), 0);
        state.negative = true;
        state.overflow = true;
        assert_eq!(state.psr(), 0x9000_0000);

        state.set_psr(0x6000_0000);
        assert!(!state.negative && state.zero && state.carry && !state.overflow);
        assert_eq!(state.psr(), 0x6000_0000);
    }

    #[test]
    fn test_interrupt_below_threshold_does_not_fire() {
        let (mut state, events) = recording_state();
        state.request_interrupt();
        assert!(state.synchronize(SYNC_THRESHOLD - 1));
        assert!(events.lock().unwrap().is_empty());
        assert!(state.interrupt_pending());
    }

    #[test]
    fn test_interrupt_fires_once_at_threshold() {
        let (mut state, events) = recording_state();
        state.handle().request_interrupt();
        state.synchronize(SYNC_THRESHOLD / 2);
        state.synchronize(SYNC_THRESHOLD / 2);
        assert_eq!(*events.lock().unwrap(), vec![Event::Interrupt]);
        assert!(!state.interrupt_pending());
        assert_eq!(state.sync_count(), 0);

        state.synchronize(SYNC_THRESHOLD);
        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_handle_from_another_thread() {
        let mut state = ThreadState::new();
        let handle = state.handle();
        std::thread::spawn(move || {
            handle.request_interrupt();
            handle.stop();
        })
        .join()
        .unwrap();

        assert!(state.interrupt_pending());
        assert!(!state.synchronize(1));
    }

    #[test]
    fn test_undefined_carries_payload() {
        let (mut state, events) = recording_state();
        state.on_undefined(0x4000_1234, 0xDEAD_BEEF);
        assert_eq!(*events.lock().unwrap(), vec![Event::Undefined(0x4000_1234, 0xDEAD_BEEF)]);
    }

    #[test]
    fn test_fp_helpers() {
        let mut state = ThreadState::new();
        state.fpcr = FPCR::new(1 << 24).with_rmode(RoundingMode::TowardsZero);
        assert!(state.fpcr_flag(FPCRFlag::Fz));
        assert!(!state.fpcr_flag(FPCRFlag::Dn));
        assert_eq!(state.fp_rounding_mode(), RoundingMode::TowardsZero);

        state.set_fpsr_flag(FPExc::QC);
        assert!(state.fpsr.qc());
    }

    #[test]
    fn test_system_registers() {
        let state = ThreadState::new();
        assert_eq!(state.ctr_el0(), 0x8444_C004);
        assert_eq!(state.dczid_el0(), 4);
        assert_eq!(state.cntfrq_el0, 19_200_000);
        let first = state.cntpct_el0();
        assert!(state.cntpct_el0() >= first);
    }
}
