pub mod ease;
pub mod transform;
pub mod vec;

pub use ease::*;
pub use transform::*;
pub use vec::*;
