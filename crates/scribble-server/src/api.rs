use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

use crate::error::AppError;
use crate::gallery::{GalleryPage, GalleryQuery};
use crate::state::AppState;

const MAX_DRAWER_FILTER_LEN: usize = 64;

#[derive(Debug, Serialize)]
pub struct DrawersResponse {
    pub drawers: Vec<String>,
}

/// GET /api/gallery returns a newest-first page of stored drawings.
pub async fn list_gallery(
    State(state): State<AppState>,
    Query(query): Query<GalleryQuery>,
) -> Result<Json<GalleryPage>, AppError> {
    if let Some(ref drawer) = query.drawer
        && drawer.len() > MAX_DRAWER_FILTER_LEN
    {
        return Err(AppError::BadRequest(format!(
            "drawer exceeds {MAX_DRAWER_FILTER_LEN} chars"
        )));
    }
    let gallery = state.gallery.read().await;
    Ok(Json(gallery.list(&query)))
}

/// GET /api/gallery/drawers returns the distinct drawer names for filtering.
pub async fn list_drawers(State(state): State<AppState>) -> Json<DrawersResponse> {
    let gallery = state.gallery.read().await;
    Json(DrawersResponse {
        drawers: gallery.drawers(),
    })
}

/// GET /api/gallery/{id}/image returns the stored PNG.
pub async fn gallery_image(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Response, AppError> {
    let gallery = state.gallery.read().await;
    if gallery.get(id).is_none() {
        return Err(AppError::NotFound(format!("Drawing {id} not found")));
    }
    let png = gallery.image_png(id).ok_or_else(|| {
        tracing::warn!(id, "Stored drawing has an unreadable image");
        AppError::Internal("Stored image is unreadable".to_string())
    })?;
    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        png,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use tokio::sync::RwLock;

    use super::*;
    use crate::config::ServerConfig;
    use crate::gallery::Gallery;
    use scribble_core::artifact::Artifact;
    use scribble_core::test_helpers::TINY_PNG_DATA_URL;

    async fn state_with(drawings: &[(&str, &str, &str)]) -> AppState {
        let mut gallery = Gallery::in_memory();
        for (word, drawer, image) in drawings {
            gallery
                .append(
                    &Artifact {
                        word: (*word).to_string(),
                        drawer_name: (*drawer).to_string(),
                        round: 1,
                        image_data: (*image).to_string(),
                    },
                    "AB12",
                )
                .unwrap();
        }
        AppState::new(ServerConfig::default(), Arc::new(RwLock::new(gallery)))
    }

    #[tokio::test]
    async fn list_returns_page() {
        let state = state_with(&[
            ("cat", "Alice", TINY_PNG_DATA_URL),
            ("dog", "Bob", TINY_PNG_DATA_URL),
        ])
        .await;
        let Json(page) = list_gallery(State(state), Query(GalleryQuery::default()))
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].word, "dog");
    }

    #[tokio::test]
    async fn list_rejects_long_drawer_filter() {
        let state = state_with(&[]).await;
        let query = GalleryQuery {
            drawer: Some("x".repeat(100)),
            ..GalleryQuery::default()
        };
        let err = list_gallery(State(state), Query(query)).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn drawers_are_listed() {
        let state = state_with(&[
            ("cat", "bob", TINY_PNG_DATA_URL),
            ("dog", "Alice", TINY_PNG_DATA_URL),
        ])
        .await;
        let Json(resp) = list_drawers(State(state)).await;
        assert_eq!(resp.drawers, ["Alice", "bob"]);
    }

    #[tokio::test]
    async fn image_served_as_png() {
        let state = state_with(&[("cat", "Alice", TINY_PNG_DATA_URL)]).await;
        let resp = gallery_image(State(state), Path(1)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/png");
        assert!(
            resp.headers()[header::CACHE_CONTROL]
                .to_str()
                .unwrap()
                .contains("immutable")
        );
    }

    #[tokio::test]
    async fn missing_image_is_not_found() {
        let state = state_with(&[]).await;
        let err = gallery_image(State(state), Path(42)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn corrupt_image_is_internal_error() {
        let state = state_with(&[("cat", "Alice", "data:image/png;base64,!!!")]).await;
        let err = gallery_image(State(state), Path(1)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
