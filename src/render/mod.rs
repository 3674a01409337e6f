pub mod marks;
pub mod html;
pub mod lists;

pub use marks::*;
pub use html::*;
pub use lists::*;
