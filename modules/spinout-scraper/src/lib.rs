pub mod error;
pub mod parse;
pub mod portal;
pub mod traits;

pub use error::CollectionError;
pub use portal::PortalScraper;
pub use traits::PublicationSource;
