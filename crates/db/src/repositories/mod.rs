//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` (or an open transaction) as the first argument.

pub mod page_repo;
pub mod session_repo;
pub mod user_repo;
pub mod wiki_repo;

pub use page_repo::PageRepo;
pub use session_repo::WikiSessionRepo;
pub use user_repo::UserRepo;
pub use wiki_repo::WikiRepo;
