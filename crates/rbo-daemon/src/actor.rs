//! Caller identity from headers set by the upstream auth layer.
//!
//! `x-actor-id` and `x-actor-role` are required. `x-franchise-id` is required
//! for every role except `super_admin`. Anything missing or malformed is a 401.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use rbo_returns::{Actor, ActorRole};
use uuid::Uuid;

use crate::error::ApiError;

pub const HEADER_ACTOR_ID: &str = "x-actor-id";
pub const HEADER_ACTOR_ROLE: &str = "x-actor-role";
pub const HEADER_FRANCHISE_ID: &str = "x-franchise-id";

/// Extractor wrapping the authenticated [`Actor`].
#[derive(Clone, Debug)]
pub struct ActorHeaders(pub Actor);

#[axum::async_trait]
impl<S> FromRequestParts<S> for ActorHeaders
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        actor_from_headers(&parts.headers)
            .map(ActorHeaders)
            .map_err(ApiError::Unauthorized)
    }
}

pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, String> {
    let user_id = header_uuid(headers, HEADER_ACTOR_ID)?
        .ok_or_else(|| format!("missing {HEADER_ACTOR_ID}"))?;

    let role_raw = header_str(headers, HEADER_ACTOR_ROLE)?
        .ok_or_else(|| format!("missing {HEADER_ACTOR_ROLE}"))?;
    let role = ActorRole::parse(role_raw).map_err(|e| format!("{HEADER_ACTOR_ROLE}: {e}"))?;

    let franchise_id = header_uuid(headers, HEADER_FRANCHISE_ID)?;
    if franchise_id.is_none() && role != ActorRole::SuperAdmin {
        return Err(format!(
            "missing {HEADER_FRANCHISE_ID} for role {}",
            role.as_str()
        ));
    }

    Ok(Actor::new(user_id, role, franchise_id))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, String> {
    match headers.get(name) {
        None => Ok(None),
        Some(v) => v
            .to_str()
            .map(|s| Some(s.trim()).filter(|s| !s.is_empty()))
            .map_err(|_| format!("{name} is not valid ascii")),
    }
}

fn header_uuid(headers: &HeaderMap, name: &str) -> Result<Option<Uuid>, String> {
    match header_str(headers, name)? {
        None => Ok(None),
        Some(s) => Uuid::parse_str(s)
            .map(Some)
            .map_err(|_| format!("{name} is not a uuid")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut h = HeaderMap::new();
        for (k, v) in pairs {
            h.insert(*k, HeaderValue::from_str(v).unwrap());
        }
        h
    }

    #[test]
    fn super_admin_needs_no_franchise() {
        let id = Uuid::new_v4();
        let a = actor_from_headers(&headers(&[
            (HEADER_ACTOR_ID, &id.to_string()),
            (HEADER_ACTOR_ROLE, "super_admin"),
        ]))
        .unwrap();
        assert_eq!(a.user_id, id);
        assert_eq!(a.franchise_id, None);
    }

    #[test]
    fn staff_without_franchise_is_rejected() {
        let err = actor_from_headers(&headers(&[
            (HEADER_ACTOR_ID, &Uuid::new_v4().to_string()),
            (HEADER_ACTOR_ROLE, "staff"),
        ]))
        .unwrap_err();
        assert!(err.contains(HEADER_FRANCHISE_ID));
    }

    #[test]
    fn malformed_ids_and_roles_are_rejected() {
        assert!(actor_from_headers(&headers(&[
            (HEADER_ACTOR_ID, "not-a-uuid"),
            (HEADER_ACTOR_ROLE, "staff"),
        ]))
        .is_err());
        assert!(actor_from_headers(&headers(&[
            (HEADER_ACTOR_ID, &Uuid::new_v4().to_string()),
            (HEADER_ACTOR_ROLE, "owner"),
        ]))
        .is_err());
    }
}
