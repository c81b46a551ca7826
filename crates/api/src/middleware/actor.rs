//! # Actor Extraction
//!
//! Identifies who is making a request. Session handling lives in front of this
//! service, which forwards the authenticated user as two headers:
//!
//! - `x-actor-id`: the user's UUID
//! - `x-actor-role`: one of `admin`, `staff`, `technician`, `client`
//!
//! Handlers take an [`Actor`] when the route needs a caller and a
//! [`MaybeActor`] when anonymous callers are allowed.

use std::fmt;
use std::str::FromStr;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use repairdesk_core::errors::RepairError;
use uuid::Uuid;

use super::error_handling::AppError;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRole {
    Admin,
    Staff,
    Technician,
    Client,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Admin => "admin",
            ActorRole::Staff => "staff",
            ActorRole::Technician => "technician",
            ActorRole::Client => "client",
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActorRole {
    type Err = RepairError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "admin" => Ok(ActorRole::Admin),
            "staff" => Ok(ActorRole::Staff),
            "technician" => Ok(ActorRole::Technician),
            "client" => Ok(ActorRole::Client),
            other => Err(RepairError::Authentication(format!(
                "unknown actor role '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: ActorRole,
}

impl Actor {
    pub fn require(&self, roles: &[ActorRole]) -> Result<(), RepairError> {
        if roles.contains(&self.role) {
            return Ok(());
        }
        Err(RepairError::Authorization(format!(
            "role {} may not perform this action",
            self.role
        )))
    }

    /// Passes for the technician `technician_id` themselves or any of `roles`.
    pub fn require_self_or(
        &self,
        technician_id: Uuid,
        roles: &[ActorRole],
    ) -> Result<(), RepairError> {
        if self.role == ActorRole::Technician && self.id == technician_id {
            return Ok(());
        }
        self.require(roles)
    }

    fn from_headers(headers: &HeaderMap) -> Result<Option<Self>, RepairError> {
        let id = headers.get(ACTOR_ID_HEADER);
        let role = headers.get(ACTOR_ROLE_HEADER);

        let (id, role) = match (id, role) {
            (None, None) => return Ok(None),
            (Some(id), Some(role)) => (id, role),
            _ => {
                return Err(RepairError::Authentication(format!(
                    "both {ACTOR_ID_HEADER} and {ACTOR_ROLE_HEADER} are required"
                )));
            }
        };

        let id = id
            .to_str()
            .ok()
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .ok_or_else(|| {
                RepairError::Authentication(format!("{ACTOR_ID_HEADER} must be a UUID"))
            })?;
        let role = role
            .to_str()
            .map_err(|_| RepairError::Authentication(format!("{ACTOR_ROLE_HEADER} is not text")))?
            .parse()?;

        Ok(Some(Actor { id, role }))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Actor::from_headers(&parts.headers)?.ok_or_else(|| {
            AppError(RepairError::Authentication(
                "this endpoint requires an actor".to_string(),
            ))
        })
    }
}

/// An actor if the request names one. Malformed actor headers are still rejected.
#[derive(Debug, Clone, Copy)]
pub struct MaybeActor(pub Option<Actor>);

impl MaybeActor {
    pub fn id(&self) -> Option<Uuid> {
        self.0.map(|actor| actor.id)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeActor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeActor(Actor::from_headers(&parts.headers)?))
    }
}
