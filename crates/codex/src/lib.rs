//! Narrative "codex" records attached to the lore map.

pub mod entry;
pub mod query;
pub mod record;
pub mod relationships;
pub mod timeline;

pub use entry::*;
pub use query::*;
pub use record::*;
pub use relationships::*;
pub use timeline::*;
