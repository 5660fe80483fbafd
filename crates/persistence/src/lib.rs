//! Storage boundary for the lore map.
//!
//! [`LoreBackend`] is the seam between the app and the hosted database:
//! [`MemoryBackend`] keeps the tables in process, [`RpcBackend`] talks to the
//! hosted REST/RPC interface. On top of it sit the bulk save report, the map
//! loader with its cache fallback, and the admin wallet check.

pub mod auth;
pub mod backend;
pub mod bulk;
pub mod error;
pub mod loader;
pub mod memory;
pub mod rpc;

pub use auth::{MASTER_WALLET, check_admin};
pub use backend::{BoxFuture, LoreBackend};
pub use bulk::{BulkReport, SaveFailure, SaveItem, bulk_upsert, save_all};
pub use error::{ErrorKind, PersistenceError};
pub use loader::{Fetched, LoadSource, LoadedMap, fetch_remote, settle};
pub use memory::MemoryBackend;
pub use rpc::RpcBackend;
