/**
 * Public Routes
 * Read-only site content: published items only
 */
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use super::{api_error, store_error};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProjectsQuery {
    #[serde(default)]
    pub featured: Option<bool>,
}

/// GET /api/site
pub async fn get_site(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.public.site().await)
}

/// GET /api/projects?featured=true
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ProjectsQuery>,
) -> impl IntoResponse {
    match state.public.projects(query.featured.unwrap_or(false)).await {
        Ok(projects) => Json(projects).into_response(),
        Err(e) => store_error(e, "Failed to load projects").into_response(),
    }
}

/// GET /api/projects/{slug}
pub async fn get_project(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    match state.public.project(&slug).await {
        Ok(Some(project)) => Json(project).into_response(),
        Ok(None) => api_error(StatusCode::NOT_FOUND, "Project not found").into_response(),
        Err(e) => store_error(e, "Failed to load project").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use crate::routes::testing::{empty_request, send};
    use crate::state::testing::state;
    use crate::store::DocumentStore;
    use axum::http::StatusCode;
    use serde_json::json;

    async fn app_with_projects() -> axum::Router {
        let (state, store) = state().await;
        for (slug, order, published, featured) in [
            ("gamma", 3, true, false),
            ("alpha", 1, true, true),
            ("draft", 2, false, true),
        ] {
            store
                .insert(
                    "projects",
                    json!({ "slug": slug, "title": slug, "order": order, "published": published, "featured": featured })
                        .as_object()
                        .cloned()
                        .unwrap(),
                )
                .await
                .unwrap();
        }
        crate::create_app(state)
    }

    #[tokio::test]
    async fn test_site_lists_published_projects_in_order() {
        let app = app_with_projects().await;
        let (status, body) = send(&app, empty_request("GET", "/api/site", None)).await;
        assert_eq!(status, StatusCode::OK);
        let slugs: Vec<_> = body["projects"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["slug"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(slugs, vec!["alpha", "gamma"]);
        assert_eq!(body["hero"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_featured_projects() {
        let app = app_with_projects().await;
        let (status, body) =
            send(&app, empty_request("GET", "/api/projects?featured=true", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["slug"], "alpha");
    }

    #[tokio::test]
    async fn test_project_by_slug() {
        let app = app_with_projects().await;
        let (status, body) = send(&app, empty_request("GET", "/api/projects/gamma", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["slug"], "gamma");
        assert!(body["id"].is_string());

        let (status, body) = send(&app, empty_request("GET", "/api/projects/draft", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Project not found");
    }
}
