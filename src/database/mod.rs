pub mod audit;
pub mod documents;
pub mod manager;

pub use audit::PgAuditLog;
pub use documents::PgDocumentStore;
pub use manager::{DatabaseError, DatabaseManager};
