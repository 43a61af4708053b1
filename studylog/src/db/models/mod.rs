//! Database-side request and response models.
//!
//! These structs are distinct from the API DTOs in [`crate::api::models`]:
//! they describe what goes into and comes out of the repositories in
//! [`crate::db::handlers`], allowing the storage representation to evolve
//! independently of the public API contract.

pub mod challenges;
pub mod quizzes;
pub mod refresh_tokens;
pub mod resources;
pub mod sessions;
pub mod tags;
pub mod users;
