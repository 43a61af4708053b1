//! Common type definitions.
//!
//! All entity IDs are UUIDs wrapped in type aliases for better type safety:
//!
//! - [`UserId`]: user account identifier
//! - [`TagId`]: tag identifier
//! - [`SessionId`]: study session identifier
//! - [`ResourceId`]: study resource identifier
//! - [`QuizId`]: quiz identifier
//! - [`QuizAttemptId`]: quiz attempt identifier
//! - [`ChallengeId`]: challenge identifier

use uuid::Uuid;

// Type aliases for IDs
pub type UserId = Uuid;
pub type TagId = Uuid;
pub type SessionId = Uuid;
pub type ResourceId = Uuid;
pub type QuizId = Uuid;
pub type QuizAttemptId = Uuid;
pub type ChallengeId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}
