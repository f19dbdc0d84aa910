pub mod dedup;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod traits;

pub use dedup::{DedupStore, Stored};
pub use error::{Result, StoreError};
pub use memory::MemoryPublicationStore;
pub use postgres::PgPublicationStore;
pub use traits::PublicationStore;
