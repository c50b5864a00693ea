pub mod descriptor;
pub mod translate;
pub mod types;

pub use descriptor::OpDescriptor;
pub use translate::{handler, translate, translate_all, Handler, TranslatorVisitor};
pub use types::{InstName, RegisterSize, Vec as A64Vec};
