use actix_web::{dev::Payload, http::header::HeaderMap, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::core::{AppError, Result};

/// Header carrying the tenant school, set by the authenticating gateway
pub const SCHOOL_ID_HEADER: &str = "X-School-ID";

/// Header carrying the display name or id of the admin performing the request
pub const ACTING_USER_HEADER: &str = "X-Acting-User";

/// Tenant context required by every ledger operation.
///
/// There is no default school: a request that does not name one is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchoolContext {
    pub school_id: Uuid,
    /// Recorded as `received_by` on payments
    pub acting_user: String,
}

impl SchoolContext {
    pub fn new(school_id: Uuid, acting_user: impl Into<String>) -> Self {
        Self {
            school_id,
            acting_user: acting_user.into(),
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Result<Self> {
        let school_id = headers
            .get(SCHOOL_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::unauthorized(format!("Missing {} header", SCHOOL_ID_HEADER)))?;

        let school_id = Uuid::parse_str(school_id.trim()).map_err(|_| {
            AppError::unauthorized(format!("{} must be a UUID", SCHOOL_ID_HEADER))
        })?;

        let acting_user = headers
            .get(ACTING_USER_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                AppError::unauthorized(format!("Missing {} header", ACTING_USER_HEADER))
            })?;

        Ok(Self::new(school_id, acting_user))
    }
}

impl FromRequest for SchoolContext {
    type Error = AppError;
    type Future = Ready<Result<Self>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_headers(req.headers()))
    }
}
