use axum::{
    async_trait,
    extract::{rejection::JsonRejection, rejection::QueryRejection, FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::Deserialize;
use tracing::debug;

use crate::error::AppError;

/// `Json<T>` whose rejections use the API error envelope.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                debug!(error = %rejection, "rejected json body");
                Err(AppError::BadRequest(rejection.body_text()))
            }
        }
    }
}

/// `Query<T>` whose rejections use the API error envelope.
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(QueryParams(value)),
            Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
        }
    }
}

const MAX_PAGE_SIZE: i64 = 100;

/// `limit`/`offset` query pair shared by list endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Page {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Page {
    /// Requested limit clamped to 1..=100; `None` when the client sent none.
    pub fn limit(&self) -> Option<i64> {
        self.limit.map(|l| l.clamp(1, MAX_PAGE_SIZE))
    }

    pub fn limit_or(&self, default: i64) -> i64 {
        self.limit().unwrap_or(default)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_is_clamped() {
        let p = Page { limit: Some(5000), offset: Some(-3) };
        assert_eq!((p.limit(), p.offset()), (Some(100), 0));
        let p = Page { limit: Some(0), offset: None };
        assert_eq!(p.limit(), Some(1));
    }

    #[test]
    fn absent_limit_stays_open() {
        let p = Page::default();
        assert_eq!(p.limit(), None);
        assert_eq!(p.limit_or(20), 20);
        assert_eq!(p.offset(), 0);
    }
}
