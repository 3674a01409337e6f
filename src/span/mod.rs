pub mod range;
pub mod text;

pub use range::*;
pub use text::*;
