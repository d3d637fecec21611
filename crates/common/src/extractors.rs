//! Request extractors shared by the domain routers

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::Error;

/// `Json<T>` followed by `validator` checks.
///
/// Malformed bodies and failed field rules are both answered with 400 through
/// the shared error envelope.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| Error::Validation(rejection.body_text()))?;

        value
            .validate()
            .map_err(|errors| Error::Validation(errors.to_string()))?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{self, Request as HttpRequest, StatusCode};
    use axum::response::IntoResponse;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Utterance {
        #[validate(length(min = 1, max = 4096))]
        text: String,
    }

    fn json_request(body: &str) -> HttpRequest<axum::body::Body> {
        HttpRequest::builder()
            .method(http::Method::POST)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_validated_json_accepts_valid_input() {
        let req = json_request(r#"{"text": "how much is widget"}"#);
        let result = ValidatedJson::<Utterance>::from_request(req, &()).await;
        assert_eq!(result.unwrap().0.text, "how much is widget");
    }

    #[tokio::test]
    async fn test_validated_json_rejects_malformed_json() {
        let req = json_request("not json");
        let err = ValidatedJson::<Utterance>::from_request(req, &())
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_validated_json_rejects_empty_text() {
        let req = json_request(r#"{"text": ""}"#);
        let err = ValidatedJson::<Utterance>::from_request(req, &())
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
