//! Repository implementations for database access.
//!
//! Each repository wraps a SQLx connection or transaction, provides
//! strongly-typed CRUD operations, and returns domain models from
//! [`crate::db::models`]. Owner-scoped repositories key their lookups by a
//! `(row id, owner id)` tuple so that one user can never observe another
//! user's rows; a missing row and a foreign row are indistinguishable.
//!
//! # Common pattern
//!
//! ```ignore
//! use studylog::db::handlers::{Repository, Tags};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut conn = pool.acquire().await?;
//!     let mut repo = Tags::new(&mut conn);
//!     let tags = repo.list(&studylog::db::handlers::tags::TagFilter { user_id }).await?;
//!     Ok(())
//! }
//! ```

pub mod challenges;
pub mod quizzes;
pub mod refresh_tokens;
pub mod repository;
pub mod resources;
pub mod sessions;
pub mod tags;
pub mod users;

pub use challenges::Challenges;
pub use quizzes::Quizzes;
pub use refresh_tokens::RefreshTokens;
pub use repository::Repository;
pub use resources::Resources;
pub use sessions::Sessions;
pub use tags::Tags;
pub use users::Users;
