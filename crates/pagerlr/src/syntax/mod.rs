pub mod node;
pub mod value;

pub use node::*;
pub use value::*;
