//! ARM64 SIMD and floating-point instruction emission.
//!
//! Decoded instructions ([`OpDescriptor`]) are translated into IR [`Block`]s, choosing per
//! instruction between native host vector operations and architecturally exact software
//! routines according to an [`EmitConfig`]. The [`Interpreter`] backend runs blocks against a
//! [`ThreadState`], which owns the register file, FPCR/FPSR, interrupt accounting and the
//! exception callbacks.
//!
//! ```
//! use a64emit::{translate, EmitConfig, InstName, Interpreter, OpDescriptor, ThreadState, A64Vec};
//!
//! let op = OpDescriptor::new(InstName::ADD_V)
//!     .with_size(2)
//!     .with_regs(A64Vec::V0, A64Vec::V1, A64Vec::V2);
//! let block = translate(&op, &EmitConfig::portable());
//!
//! let mut state = ThreadState::new();
//! state.v[1] = 1;
//! state.v[2] = 2;
//! Interpreter::new().execute(&block, &mut state);
//! assert_eq!(state.v[0], 3);
//! ```

pub mod backend;
pub mod config;
pub mod fp;
pub mod frontend;
pub mod halt_reason;
pub mod host_features;
pub mod ir;
pub mod thread_state;

pub use backend::Interpreter;
pub use config::{ConfigError, EmitConfig, OptimizationFlag};
pub use frontend::a64::{translate, translate_all, A64Vec, InstName, OpDescriptor, RegisterSize};
pub use halt_reason::HaltReason;
pub use host_features::{host_features, HostFeature};
pub use ir::Block;
pub use thread_state::{ThreadCallbacks, ThreadHandle, ThreadState};
