//! Transactional persistence for TRAC's metadata model.
//!
//! Two backends implement the same [`MetadataDal`] trait:
//! [`PgMetadataDal`] for production use against Postgres, and
//! [`InMemoryMetadataDal`] for dev/test use without a live database.

pub mod dal;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod resolve;

pub use dal::MetadataDal;
pub use error::{DalError, DalResult};
pub use memory::InMemoryMetadataDal;
pub use postgres::PgMetadataDal;
