//! Caller identity and role permissions.
//!
//! Authentication happens upstream; the service trusts the `x-user-id` and
//! `x-user-role` headers set by the fronting identity layer. Requests without
//! an id are anonymous: they may run the pipeline but never touch the store.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub mod handlers;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    ContentEditor,
    CommerceManager,
    #[default]
    IndividualUser,
}

impl Role {
    /// Unknown or missing role strings fall back to the least-privileged role.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "super_admin" => Role::SuperAdmin,
            "content_editor" => Role::ContentEditor,
            "commerce_manager" => Role::CommerceManager,
            _ => Role::IndividualUser,
        }
    }
}

/// Permission-gated actions. This service enforces the optimization actions
/// itself; the rest are reported through `/admin/capabilities` for admin
/// clients outside this service and have no endpoints here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    AccessAdminPanel,
    ViewAllOptimizations,
    MarkOptimizationPaid,
    /// Blog CMS, gated by an external client.
    ManageBlogPosts,
    /// Role management, gated by an external client.
    ManageUserRoles,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::AccessAdminPanel,
        Action::ViewAllOptimizations,
        Action::MarkOptimizationPaid,
        Action::ManageBlogPosts,
        Action::ManageUserRoles,
    ];
}

/// Pure permission predicate.
pub fn authorize(role: Role, action: Action) -> bool {
    use Action::*;
    use Role::*;
    match action {
        AccessAdminPanel => role != IndividualUser,
        ViewAllOptimizations | MarkOptimizationPaid => matches!(role, SuperAdmin | CommerceManager),
        ManageBlogPosts => matches!(role, SuperAdmin | ContentEditor),
        ManageUserRoles => role == SuperAdmin,
    }
}

/// Authenticated caller. Handlers that allow anonymous use take `Option<CurrentUser>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn require(&self, action: Action) -> Result<(), AppError> {
        if authorize(self.role, action) {
            Ok(())
        } else {
            tracing::warn!("User {} ({:?}) denied {:?}", self.id, self.role, action);
            Err(AppError::Forbidden)
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(AppError::Unauthorized)?
            .to_string();
        let role = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(Role::parse)
            .unwrap_or_default();
        Ok(CurrentUser { id, role })
    }
}
