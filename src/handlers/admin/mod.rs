// handlers/admin - administrative operations
//
// Every route here sits behind require_bearer and require_admin, and answers
// cross-origin preflight requests.

pub mod delete_user;

pub use delete_user::delete_user;
