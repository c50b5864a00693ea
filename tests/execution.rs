use std::sync::{Arc, Mutex};

use a64emit::fp::{RoundingMode, FPCR};
use a64emit::thread_state::SYNC_THRESHOLD;
use a64emit::{
    translate, translate_all, A64Vec, Block, ConfigError, EmitConfig, HaltReason, HostFeature,
    InstName, Interpreter, OpDescriptor, ThreadCallbacks, ThreadState,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn lanes16(values: [u16; 8]) -> u128 {
    values.iter().enumerate().fold(0, |acc, (i, &v)| acc | (v as u128) << (16 * i))
}

fn lanes32(values: [u32; 4]) -> u128 {
    values.iter().enumerate().fold(0, |acc, (i, &v)| acc | (v as u128) << (32 * i))
}

fn f32_lanes(values: [f32; 4]) -> u128 {
    lanes32(values.map(f32::to_bits))
}

fn native_config() -> EmitConfig {
    let mut config = EmitConfig::portable().with_host(HostFeature::all());
    config.set("native_integer_vectors", true).unwrap();
    config.set("native_bit_count", true).unwrap();
    config
}

/// Translate `op`, run it on `state` and return the halt reason.
fn run(op: OpDescriptor, config: &EmitConfig, state: &mut ThreadState) -> HaltReason {
    let block = translate(&op, config);
    Interpreter::new().execute(&block, state)
}

fn binary(name: InstName, size: u32) -> OpDescriptor {
    OpDescriptor::new(name)
        .with_size(size)
        .with_regs(A64Vec::V0, A64Vec::V1, A64Vec::V2)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Interrupt,
    Svc(u64, u32),
    Undefined(u64, u32),
}

struct Recorder(Arc<Mutex<Vec<Event>>>);

impl ThreadCallbacks for Recorder {
    fn on_interrupt(&mut self) {
        self.0.lock().unwrap().push(Event::Interrupt);
    }

    fn on_svc_call(&mut self, position: u64, imm: u32) {
        self.0.lock().unwrap().push(Event::Svc(position, imm));
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

// --- Integer lanes ---

#[test]
fn test_half_width_clears_upper() {
    init();
    let mut state = ThreadState::new();
    state.v[0] = u128::MAX;
    state.v[1] = lanes32([1, 1, 1, 1]);
    state.v[2] = lanes32([2, 2, 2, 2]);
    run(binary(InstName::ADD_V, 2).half(), &EmitConfig::portable(), &mut state);
    assert_eq!(state.v[0], lanes32([3, 3, 0, 0]));
}

#[test]
fn test_upper_widen_reads_high_half() {
    init();
    let mut state = ThreadState::new();
    state.v[1] = lanes16([0, 1, 2, 3, 4, 5, 6, 0xFFFF]);
    state.v[2] = lanes16([100; 8]);
    run(binary(InstName::SADDL, 1), &EmitConfig::portable(), &mut state);
    assert_eq!(state.v[0], lanes32([104, 105, 106, 99]));
}

#[test]
fn test_upper_narrow_keeps_lower_half() {
    init();
    let mut state = ThreadState::new();
    state.v[0] = 0x1111_1111_1111_1111_2222_2222_2222_2222;
    state.v[1] = lanes32([0x0001_0000, 0x0002_0000, 0x0003_0000, 0x0004_0000]);
    state.v[2] = 0;
    run(binary(InstName::ADDHN, 1), &EmitConfig::portable(), &mut state);
    assert_eq!(state.v[0], lanes16([0x2222, 0x2222, 0x2222, 0x2222, 1, 2, 3, 4]));

    state.v[0] = u128::MAX;
    run(binary(InstName::ADDHN, 1).half(), &EmitConfig::portable(), &mut state);
    assert_eq!(state.v[0], lanes16([1, 2, 3, 4, 0, 0, 0, 0]));
}

#[test]
fn test_bit_counts() {
    init();
    for config in [EmitConfig::portable(), native_config()] {
        let mut state = ThreadState::new();
        state.v[1] = lanes32([1, 0, 0x8000_0000, 0xFFFF]);
        run(binary(InstName::CLZ, 2), &config, &mut state);
        assert_eq!(state.v[0], lanes32([31, 32, 0, 16]));

        state.v[1] = lanes32([0, 0xFFFF_FFFF, 1, 0xC000_0000]);
        run(binary(InstName::CLS, 2), &config, &mut state);
        assert_eq!(state.v[0], lanes32([31, 31, 30, 1]));

        state.v[0] = u128::MAX;
        state.v[1] = u128::from_le_bytes([0xFF, 0x0F, 0x01, 0x00, 0x80, 0, 0, 0, 0xFF, 0xFF, 0, 0, 0, 0, 0, 0]);
        run(binary(InstName::CNT, 0).half(), &config, &mut state);
        assert_eq!(state.v[0], u128::from_le_bytes([8, 4, 1, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]));
    }
}

#[test]
fn test_native_and_software_paths_agree() {
    init();
    let ops = [
        binary(InstName::ADD_V, 0),
        binary(InstName::SUB_V, 3),
        binary(InstName::MUL_V, 1),
        binary(InstName::MUL_V, 2),
        binary(InstName::SMAX, 0),
        binary(InstName::UMIN, 1),
        binary(InstName::URHADD, 1),
        binary(InstName::ABS_V, 2),
        binary(InstName::NEG_V, 3),
        binary(InstName::SADDL, 1),
        binary(InstName::USUBL, 0).half(),
    ];

    let mut seed = 0x9E37_79B9_7F4A_7C15u64;
    let mut next = move || {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        seed
    };

    for op in ops {
        for _ in 0..8 {
            let n = (next() as u128) << 64 | next() as u128;
            let m = (next() as u128) << 64 | next() as u128;
            let mut results = Vec::new();
            for config in [EmitConfig::portable(), native_config()] {
                let mut state = ThreadState::new();
                state.v[1] = n;
                state.v[2] = m;
                run(op, &config, &mut state);
                results.push(state.v[0]);
            }
            assert_eq!(results[0], results[1], "{} size {} n={:#x} m={:#x}", op.name, op.size, n, m);
        }
    }
}

// --- Saturation ---

#[test]
fn test_signed_saturating_add_clamps_and_sets_qc() {
    init();
    let mut state = ThreadState::new();
    state.v[1] = u128::from_le_bytes([0x80; 16]);
    state.v[2] = u128::from_le_bytes([0xFF; 16]);
    run(binary(InstName::SQADD_V, 0), &EmitConfig::portable(), &mut state);
    assert_eq!(state.v[0], u128::from_le_bytes([0x80; 16]));
    assert!(state.fpsr.qc());
}

#[test]
fn test_unsigned_saturating_sub_clamps_at_zero() {
    init();
    let mut state = ThreadState::new();
    state.v[0] = u128::MAX;
    state.v[1] = 0;
    state.v[2] = lanes32([1, 1, 1, 1]);
    run(binary(InstName::UQSUB_V, 2), &EmitConfig::portable(), &mut state);
    assert_eq!(state.v[0], 0);
    assert!(state.fpsr.qc());
}

#[test]
fn test_rounding_doubling_multiply_high_saturates() {
    init();
    let mut state = ThreadState::new();
    state.v[1] = lanes16([0x8000; 8]);
    state.v[2] = lanes16([0x8000; 8]);
    run(binary(InstName::SQRDMULH_V, 1), &EmitConfig::portable(), &mut state);
    assert_eq!(state.v[0], lanes16([0x7FFF; 8]));
    assert!(state.fpsr.qc());
}

#[test]
fn test_saturation_tracking_can_be_disabled() {
    init();
    let mut config = EmitConfig::portable();
    config.set("track_saturation", false).unwrap();

    let mut state = ThreadState::new();
    state.v[1] = u128::from_le_bytes([0x80; 16]);
    state.v[2] = u128::from_le_bytes([0xFF; 16]);
    run(binary(InstName::SQADD_V, 0), &config, &mut state);
    assert_eq!(state.v[0], u128::from_le_bytes([0x80; 16]));
    assert!(!state.fpsr.qc());
}

#[test]
fn test_no_saturation_leaves_qc_clear() {
    init();
    let mut state = ThreadState::new();
    state.v[1] = lanes32([1, 2, 3, 4]);
    state.v[2] = lanes32([1, 1, 1, 1]);
    run(binary(InstName::SQADD_V, 2), &EmitConfig::portable(), &mut state);
    assert_eq!(state.v[0], lanes32([2, 3, 4, 5]));
    assert!(!state.fpsr.qc());
}

// --- Floating point ---

fn round_scalar(name: InstName, value: f64, state: &mut ThreadState) -> f64 {
    state.v[1] = value.to_bits() as u128;
    run(binary(name, 1), &EmitConfig::portable(), state);
    assert_eq!(state.v[0] >> 64, 0);
    f64::from_bits(state.v[0] as u64)
}

#[test]
fn test_round_to_integral_ties() {
    init();
    let mut state = ThreadState::new();
    assert_eq!(round_scalar(InstName::FRINTN_S, 2.5, &mut state), 2.0);
    assert_eq!(round_scalar(InstName::FRINTN_S, -2.5, &mut state), -2.0);
    assert_eq!(round_scalar(InstName::FRINTN_S, 3.5, &mut state), 4.0);
    assert_eq!(round_scalar(InstName::FRINTA_S, 2.5, &mut state), 3.0);
    assert_eq!(round_scalar(InstName::FRINTA_S, -2.5, &mut state), -3.0);
    assert_eq!(round_scalar(InstName::FRINTM_S, -0.5, &mut state), -1.0);
    assert_eq!(round_scalar(InstName::FRINTZ_S, -1.75, &mut state), -1.0);
}

#[test]
fn test_dynamic_rounding_follows_fpcr() {
    init();
    let mut state = ThreadState::new();
    state.fpcr = FPCR::new(0).with_rmode(RoundingMode::TowardsPlusInfinity);
    assert_eq!(round_scalar(InstName::FRINTI_S, 2.1, &mut state), 3.0);

    state.fpcr = FPCR::new(0).with_rmode(RoundingMode::TowardsMinusInfinity);
    assert_eq!(round_scalar(InstName::FRINTI_S, 2.9, &mut state), 2.0);
}

#[test]
fn test_fused_multiply_add_rounds_once() {
    init();
    let x = 1.0 + f64::powi(2.0, -27);
    let addend = -(1.0 + f64::powi(2.0, -26));
    let fast = EmitConfig::portable()
        .with_host(HostFeature::SSE | HostFeature::SSE2 | HostFeature::FMA)
        .with_fast_fp(true);

    for config in [EmitConfig::portable(), fast] {
        let mut state = ThreadState::new();
        state.v[1] = x.to_bits() as u128;
        state.v[2] = x.to_bits() as u128;
        state.v[3] = addend.to_bits() as u128;
        let op = binary(InstName::FMADD_S, 1).with_ra(A64Vec::V3);
        run(op, &config, &mut state);
        assert_eq!(f64::from_bits(state.v[0] as u64), f64::powi(2.0, -54));
    }
}

#[test]
fn test_pairwise_add() {
    init();
    let mut state = ThreadState::new();
    state.v[1] = f32_lanes([1.0, 2.0, 3.0, 4.0]);
    state.v[2] = f32_lanes([5.0, 6.0, 7.0, 8.0]);
    run(binary(InstName::FADDP_V, 0), &EmitConfig::portable(), &mut state);
    assert_eq!(state.v[0], f32_lanes([3.0, 7.0, 11.0, 15.0]));
}

#[test]
fn test_max_across_lanes() {
    init();
    let mut state = ThreadState::new();
    state.v[0] = u128::MAX;
    state.v[1] = f32_lanes([1.0, 5.0, -3.0, 2.0]);
    run(binary(InstName::FMAXV, 0), &EmitConfig::portable(), &mut state);
    assert_eq!(state.v[0], 5.0f32.to_bits() as u128);
}

#[test]
fn test_fast_fp_matches_exact_on_ordinary_values() {
    init();
    let fast = EmitConfig::portable()
        .with_host(HostFeature::SSE | HostFeature::SSE2)
        .with_fast_fp(true);
    for name in [InstName::FADD_V, InstName::FSUB_V, InstName::FMUL_V, InstName::FDIV_V] {
        let mut results = Vec::new();
        for config in [EmitConfig::portable(), fast] {
            let mut state = ThreadState::new();
            state.v[1] = f32_lanes([1.5, -2.0, 100.0, 0.25]);
            state.v[2] = f32_lanes([0.5, 4.0, -8.0, 2.0]);
            run(binary(name, 0), &config, &mut state);
            results.push(state.v[0]);
        }
        assert_eq!(results[0], results[1], "{}", name);
    }
}

#[test]
fn test_exact_division_by_zero_sets_dzc() {
    init();
    let mut state = ThreadState::new();
    state.v[1] = 1.0f64.to_bits() as u128;
    state.v[2] = 0.0f64.to_bits() as u128;
    run(binary(InstName::FDIV_S, 1), &EmitConfig::portable(), &mut state);
    assert_eq!(f64::from_bits(state.v[0] as u64), f64::INFINITY);
    assert!(state.fpsr.dzc());
}

// --- Exceptions and synchronization ---

#[test]
fn test_undefined_reports_raw_bits_and_position() {
    init();
    let (mut state, events) = recording_state();
    let op = OpDescriptor::new(InstName::UDF).at(0x4000).with_raw(0xDEAD_BEEF);
    let halt = run(op, &EmitConfig::portable(), &mut state);
    assert!(halt.contains(HaltReason::UNDEFINED));
    assert_eq!(state.pc, 0x4000);
    assert_eq!(*events.lock().unwrap(), vec![Event::Undefined(0x4000, 0xDEAD_BEEF)]);
}

#[test]
fn test_supervisor_call_ends_block() {
    init();
    let (mut state, events) = recording_state();
    state.v[1] = lanes32([1, 2, 3, 4]);
    let ops = [
        binary(InstName::ADD_V, 2).at(0x100).with_regs(A64Vec::V0, A64Vec::V1, A64Vec::V1),
        OpDescriptor::new(InstName::SVC).at(0x104).with_immediate(0x42),
        binary(InstName::ADD_V, 2).at(0x108).with_regs(A64Vec::V5, A64Vec::V1, A64Vec::V1),
    ];
    let block = translate_all(&ops, &EmitConfig::portable());
    let halt = Interpreter::new().execute(&block, &mut state);

    assert!(halt.contains(HaltReason::SVC));
    assert_eq!(state.pc, 0x108);
    assert_eq!(state.v[0], lanes32([2, 4, 6, 8]));
    assert_eq!(state.v[5], 0);
    assert_eq!(*events.lock().unwrap(), vec![Event::Svc(0x104, 0x42)]);
}

#[test]
fn test_interrupt_delivered_once_at_threshold() {
    init();
    let (mut state, events) = recording_state();
    state.handle().request_interrupt();

    let mut block = Block::new(0);
    block.weight = SYNC_THRESHOLD - 1;
    let halt = Interpreter::new().execute(&block, &mut state);
    assert!(!halt.contains(HaltReason::INTERRUPT));
    assert!(events.lock().unwrap().is_empty());

    block.weight = 1;
    let halt = Interpreter::new().execute(&block, &mut state);
    assert!(halt.contains(HaltReason::INTERRUPT));

    block.weight = SYNC_THRESHOLD;
    let halt = Interpreter::new().execute(&block, &mut state);
    assert!(!halt.contains(HaltReason::INTERRUPT));
    assert_eq!(*events.lock().unwrap(), vec![Event::Interrupt]);
}

#[test]
fn test_stop_reports_external_halt() {
    init();
    let mut state = ThreadState::new();
    state.handle().stop();
    let halt = Interpreter::new().execute(&Block::new(0), &mut state);
    assert!(halt.contains(HaltReason::EXTERNAL_HALT));
}

// --- Configuration ---

#[test]
fn test_config_errors() {
    let mut config = EmitConfig::portable();
    assert_eq!(
        config.set("no_such_option", true),
        Err(ConfigError::UnknownOption("no_such_option".to_string()))
    );
    assert_eq!(
        config.set("fast_fp", true),
        Err(ConfigError::UnsafeOptionLocked("fast_fp".to_string()))
    );
    assert!(!config.fast_fp());

    config.set("unsafe_optimizations", true).unwrap();
    config.set("fast_fp", true).unwrap();
    assert!(config.fast_fp());
}
