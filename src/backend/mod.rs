pub mod interp;

pub use interp::Interpreter;
