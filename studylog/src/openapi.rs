//! OpenAPI/Swagger documentation configuration.
//!
//! The rendered documentation is served at `/docs` when the server is
//! running.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "studylog API",
        description = "REST API for tracking study sessions, tags, resources, quizzes, and goals"
    ),
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh_token,
        handlers::auth::logout,
        handlers::users::get_user_details,
        handlers::users::get_user_events,
        handlers::tags::list_tags,
        handlers::tags::create_tag,
        handlers::tags::update_tag,
        handlers::tags::delete_tag,
        handlers::sessions::list_sessions,
        handlers::sessions::get_session,
        handlers::sessions::get_session_resources,
        handlers::sessions::create_session,
        handlers::sessions::replace_session,
        handlers::sessions::delete_session,
        handlers::resources::list_resources,
        handlers::resources::get_resource,
        handlers::resources::create_resource,
        handlers::resources::update_resource,
        handlers::resources::delete_resource,
        handlers::quizzes::list_quizzes,
        handlers::quizzes::get_quiz,
        handlers::quizzes::create_quiz,
        handlers::quizzes::update_quiz,
        handlers::quizzes::delete_quiz,
        handlers::quizzes::create_quiz_attempt,
        handlers::quizzes::list_quiz_attempts,
        handlers::quizzes::get_quiz_attempt,
        handlers::quizzes::delete_quiz_attempt,
        handlers::challenges::get_challenge,
        handlers::challenges::upsert_challenge,
        handlers::challenges::delete_challenge,
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login, and token lifecycle"),
        (name = "users", description = "Profile and dashboard feed"),
        (name = "tags", description = "User-defined labels for sessions and quizzes"),
        (name = "sessions", description = "Study session tracking"),
        (name = "resources", description = "Reusable study materials"),
        (name = "quizzes", description = "Quizzes and attempts"),
        (name = "challenges", description = "Per-user goals"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "BearerAuth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}
