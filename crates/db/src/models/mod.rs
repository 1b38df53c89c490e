//! Row models and request/response DTOs.

pub mod page;
pub mod user;
pub mod wiki;
