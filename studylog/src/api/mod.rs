//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API structure
//!
//! - **Authentication** (`/auth/*`): register, login, refresh, logout
//! - **Users** (`/api/v1/users/me*`): profile and dashboard event feed
//! - **Tags** (`/api/v1/tags*`)
//! - **Sessions** (`/api/v1/sessions*`): study sessions with embedded resource links
//! - **Resources** (`/api/v1/resources*`)
//! - **Quizzes** (`/api/v1/quizzes*`): quizzes and their attempts
//! - **Challenges** (`/api/v1/challenges`): one goal per user
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`;
//! the rendered documentation is served at `/docs`.

pub mod handlers;
pub mod models;
