use std::sync::Arc;

use crate::{
    auth::token::{TokenPayload, TokenService},
    error::{AppError, AppResult},
    models::Role,
};

/// RolePolicy
///
/// Decides whether a verified role may enter a class of routes.
pub trait RolePolicy: Send + Sync {
    fn allows(&self, role: Role) -> bool;
}

/// RoutePolicy
///
/// The two route classes the router needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePolicy {
    /// Any holder of a valid token.
    AnyUser,
    AdminOnly,
}

impl RolePolicy for RoutePolicy {
    fn allows(&self, role: Role) -> bool {
        match self {
            RoutePolicy::AnyUser => matches!(role, Role::User | Role::Admin),
            RoutePolicy::AdminOnly => role == Role::Admin,
        }
    }
}

/// RoleGate
///
/// Request-boundary authorization. The order is fixed:
/// extract the bearer token, verify signature and expiry, then check the role.
/// Any token problem yields `Unauthorized` (401) before the policy is consulted;
/// a wrong role yields `Forbidden` (403).
#[derive(Clone)]
pub struct RoleGate {
    tokens: Arc<TokenService>,
}

impl RoleGate {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }

    /// Runs the full gate against the raw `Authorization` header value.
    pub fn authorize(
        &self,
        authorization: Option<&str>,
        policy: &dyn RolePolicy,
    ) -> AppResult<TokenPayload> {
        // The auth scheme is case-insensitive.
        let token = authorization
            .and_then(|value| value.trim_start().split_once(' '))
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
            .map(|(_, token)| token.trim())
            .filter(|token| !token.is_empty())
            .ok_or(AppError::Unauthorized)?;

        let payload = self.tokens.verify(token).map_err(|e| {
            tracing::debug!(reason = %e, "token rejected at gate");
            AppError::Unauthorized
        })?;

        Self::check_role(payload, policy)
    }

    /// The role half of the gate, for callers that already hold a verified payload.
    pub fn check_role(payload: TokenPayload, policy: &dyn RolePolicy) -> AppResult<TokenPayload> {
        if policy.allows(payload.role) {
            Ok(payload)
        } else {
            tracing::warn!(subject = %payload.subject, role = %payload.role, "role denied");
            Err(AppError::Forbidden)
        }
    }
}
