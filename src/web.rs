//! Browser front end: one page plus its controller script, embedded in the binary.
//!
//! The page talks only to the JSON API under `/api/users`; the server computes
//! the pagination window (`links`) so the script just renders it.

use axum::{
    http::header,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index_page))
        .route("/assets/app.js", get(app_js))
}

async fn index_page() -> impl IntoResponse {
    Html(include_str!("../assets/index.html"))
}

async fn app_js() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        include_str!("../assets/app.js"),
    )
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn script_is_served_as_javascript() {
        let app = router().with_state(AppState::fake());
        let resp = app
            .oneshot(Request::builder().uri("/assets/app.js").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let ct = resp.headers().get(header::CONTENT_TYPE).unwrap();
        assert!(ct.to_str().unwrap().starts_with("application/javascript"));
    }

    #[tokio::test]
    async fn page_loads_controller() {
        let app = router().with_state(AppState::fake());
        let resp = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(resp.into_body(), 1 << 20).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains(r#"src="/assets/app.js""#));
        assert!(html.contains(r#"id="user-form""#));
    }
}
