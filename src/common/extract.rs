use axum::{
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use validator::Validate;

use crate::common::error::AppError;

/// Extractor JSON que rechaza con 400 tanto el JSON mal formado como los
/// payloads que no pasan `validator`.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::MalformedPayload(rejection.body_text()))?;

        payload.validate()?;
        Ok(ValidatedJson(payload))
    }
}

/// `Path` con el mismo cuerpo de error JSON que el resto de la API.
pub struct PathParam<T>(pub T);

impl<T, S> FromRequestParts<S> for PathParam<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::InvalidPathParam(rejection.body_text()))?;
        Ok(PathParam(value))
    }
}

/// Distingue "campo ausente" (`None`) de "campo en null" (`Some(None)`)
/// en los payloads de actualización parcial.
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "deserialize_some")]
        padre_id: Option<Option<i32>>,
    }

    #[test]
    fn absent_null_and_value_are_distinct() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        let null: Patch = serde_json::from_str(r#"{"padre_id": null}"#).unwrap();
        let value: Patch = serde_json::from_str(r#"{"padre_id": 7}"#).unwrap();

        assert_eq!(absent.padre_id, None);
        assert_eq!(null.padre_id, Some(None));
        assert_eq!(value.padre_id, Some(Some(7)));
    }
}
