/**
 * Admin Routes
 * Authenticated content management over every collection
 */
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use super::{admin_error, api_error, require_session, ApiError};
use crate::compose::Notice;
use crate::content::{
    AboutData, Certificate, Collection, ContactInfo, Education, Experience, FooterData, HeroData,
    Project, SkillCategory,
};
use crate::state::AppState;
use crate::store::Fields;

#[derive(Debug, Serialize)]
pub struct MutationResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub notice: Notice,
}

/// Runs `$body` with `$kind` bound to the list kind stored in `$collection`.
macro_rules! with_list_kind {
    ($collection:expr, $kind:ident => $body:expr) => {
        match $collection {
            Collection::Projects => {
                type $kind = Project;
                $body
            }
            Collection::Experiences => {
                type $kind = Experience;
                $body
            }
            Collection::Education => {
                type $kind = Education;
                $body
            }
            Collection::Certificates => {
                type $kind = Certificate;
                $body
            }
            Collection::Skills => {
                type $kind = SkillCategory;
                $body
            }
            other => Err(not_managed(other)),
        }
    };
}

/// Runs `$body` with `$kind` bound to the singleton kind stored in `$collection`.
macro_rules! with_singleton_kind {
    ($collection:expr, $kind:ident => $body:expr) => {
        match $collection {
            Collection::Hero => {
                type $kind = HeroData;
                $body
            }
            Collection::About => {
                type $kind = AboutData;
                $body
            }
            Collection::Contact => {
                type $kind = ContactInfo;
                $body
            }
            Collection::Footer => {
                type $kind = FooterData;
                $body
            }
            other => Err(not_managed(other)),
        }
    };
}

fn not_managed(collection: Collection) -> ApiError {
    api_error(
        StatusCode::NOT_FOUND,
        format!("Collection '{}' does not support this operation", collection),
    )
}

fn parse_collection(name: &str) -> Result<Collection, ApiError> {
    name.parse::<Collection>()
        .map_err(|e| api_error(StatusCode::NOT_FOUND, e.to_string()))
}

fn into_form(body: Value) -> Result<Fields, ApiError> {
    match body {
        Value::Object(fields) => Ok(fields),
        _ => Err(api_error(
            StatusCode::BAD_REQUEST,
            "Request body must be a JSON object",
        )),
    }
}

/// GET /api/admin/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    require_session(&state, &headers).await?;
    let dashboard = state.admin.dashboard().await.map_err(admin_error)?;
    Ok(Json(dashboard).into_response())
}

/// GET /api/admin/{collection}
/// Lists every item of a list kind, or returns the singleton document.
pub async fn read_collection(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(collection): Path<String>,
) -> Result<Response, ApiError> {
    require_session(&state, &headers).await?;
    let collection = parse_collection(&collection)?;
    if collection.is_singleton() {
        with_singleton_kind!(collection, K => {
            let entry = state.admin.singleton::<K>().await.map_err(admin_error)?;
            Ok(Json(entry).into_response())
        })
    } else {
        with_list_kind!(collection, K => {
            let entries = state.admin.list::<K>().await.map_err(admin_error)?;
            Ok(Json(entries).into_response())
        })
    }
}

/// POST /api/admin/{collection}
pub async fn create_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let session = require_session(&state, &headers).await?;
    let collection = parse_collection(&collection)?;
    let form = into_form(body)?;
    with_list_kind!(collection, K => {
        let (id, notice) = state
            .admin
            .create::<K>(session.capabilities(), form)
            .await
            .map_err(admin_error)?;
        Ok((
            StatusCode::CREATED,
            Json(MutationResponse { id: Some(id), notice }),
        )
            .into_response())
    })
}

/// PUT /api/admin/{collection}
/// Saves a singleton: updates the existing document or creates the first one.
pub async fn save_singleton(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let session = require_session(&state, &headers).await?;
    let collection = parse_collection(&collection)?;
    let form = into_form(body)?;
    with_singleton_kind!(collection, K => {
        let (id, notice) = state
            .admin
            .save_singleton::<K>(session.capabilities(), form)
            .await
            .map_err(admin_error)?;
        Ok(Json(MutationResponse { id: Some(id), notice }).into_response())
    })
}

/// PATCH /api/admin/{collection}/{id}
pub async fn update_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let session = require_session(&state, &headers).await?;
    let collection = parse_collection(&collection)?;
    let patch = into_form(body)?;
    with_list_kind!(collection, K => {
        let notice = state
            .admin
            .update::<K>(session.capabilities(), &id, patch)
            .await
            .map_err(admin_error)?;
        Ok(Json(MutationResponse { id: None, notice }).into_response())
    })
}

/// DELETE /api/admin/{collection}/{id}
pub async fn delete_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let session = require_session(&state, &headers).await?;
    let collection = parse_collection(&collection)?;
    with_list_kind!(collection, K => {
        let notice = state
            .admin
            .delete::<K>(session.capabilities(), &id)
            .await
            .map_err(admin_error)?;
        Ok(Json(MutationResponse { id: None, notice }).into_response())
    })
}
