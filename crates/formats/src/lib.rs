pub mod map_file;
pub mod rows;
pub mod save_request;

pub use map_file::*;
pub use rows::*;
pub use save_request::*;
