pub mod block;
pub mod emitter;
pub mod inst;
pub mod opcode;
pub mod opt;
pub mod types;
pub mod value;

pub use block::Block;
pub use emitter::IREmitter;
pub use opcode::Opcode;
pub use types::Type;
pub use value::{InstRef, Value};
