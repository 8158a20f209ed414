use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, patch, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use bouture_api::auth::{self, AppState, AppStateInner};
use bouture_api::middleware::require_auth;
use bouture_api::uploads::ImageStore;
use bouture_api::{ads, categories, favorites, messages, plants, users};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bouture=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("BOUTURE_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("BOUTURE_DB_PATH").unwrap_or_else(|_| "bouture.db".into());
    let images_dir = std::env::var("BOUTURE_IMAGES_DIR").unwrap_or_else(|_| "uploads".into());
    let host = std::env::var("BOUTURE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("BOUTURE_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = bouture_db::Database::open(&PathBuf::from(&db_path))?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        images: ImageStore::new(&images_dir),
    });

    let app = app_router(state, &images_dir);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Bouture server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Edit endpoints answer to both PUT and PATCH, as the legacy controllers
/// did.
fn app_router(state: AppState, images_dir: &str) -> Router {
    let public_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(users::create))
        .route("/users", post(users::create))
        .route("/ads", get(ads::browse))
        .route("/ads/{id}", get(ads::read))
        .route("/categories", get(categories::browse))
        .route("/categories/{id}", get(categories::read))
        .route("/plants", get(plants::browse))
        .route("/plants/{id}", get(plants::read))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/ads", post(ads::create))
        .route(
            "/ads/{id}",
            put(ads::update).patch(ads::update).delete(ads::delete),
        )
        .route("/ads/{id}/status", patch(ads::patch_status))
        .route("/ads/{id}/image", post(ads::upload_image))
        .route("/users", get(users::browse))
        .route("/users/current", get(users::current))
        .route("/users/{id}", get(users::read))
        .route("/users/{id}", put(users::update).patch(users::update))
        .route("/users/{id}/status", patch(users::patch_status))
        .route("/users/{id}/avatar", post(users::upload_avatar))
        .route("/categories", post(categories::create))
        .route(
            "/categories/{id}",
            put(categories::update).patch(categories::update),
        )
        .route("/categories/{id}/status", patch(categories::patch_status))
        .route("/plants", post(plants::create))
        .route("/plants/{id}", put(plants::update).patch(plants::update))
        .route("/plants/{id}/status", patch(plants::patch_status))
        .route("/plants/{id}/image", post(plants::upload_image))
        .route("/messages", get(messages::browse))
        .route("/messages", post(messages::create))
        .route("/messages/{id}", get(messages::read))
        .route("/messages/{id}/status", patch(messages::patch_status))
        .route("/favorites/{ad_id}", post(favorites::add))
        .route("/favorites/{ad_id}", delete(favorites::remove))
        .layer(middleware::from_fn(require_auth))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .nest_service("/images", ServeDir::new(images_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;

    fn test_router() -> Router {
        let dir = std::env::temp_dir().join(format!("bouture-srv-{}", uuid::Uuid::new_v4()));
        let db = bouture_db::Database::open(&dir.with_extension("db")).unwrap();
        let state: AppState = Arc::new(AppStateInner {
            db,
            jwt_secret: "test-secret".into(),
            images: ImageStore::new(&dir),
        });
        app_router(state, dir.to_str().unwrap())
    }

    async fn status_of(app: &Router, method: &str, uri: &str) -> StatusCode {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        app.clone().oneshot(req).await.unwrap().status()
    }

    #[tokio::test]
    async fn edit_routes_answer_to_put_and_patch() {
        let app = test_router();
        let id = uuid::Uuid::new_v4();
        for path in [
            format!("/ads/{id}"),
            format!("/users/{id}"),
            format!("/categories/{id}"),
            format!("/plants/{id}"),
        ] {
            for method in ["PUT", "PATCH"] {
                // Unauthenticated: the route exists (401), it is not a
                // method mismatch (405).
                assert_eq!(
                    status_of(&app, method, &path).await,
                    StatusCode::UNAUTHORIZED,
                    "{method} {path}"
                );
            }
        }
    }

    #[tokio::test]
    async fn browse_endpoints_are_public() {
        let app = test_router();
        for path in ["/ads", "/categories", "/plants"] {
            let req = Request::builder().uri(path).body(Body::empty()).unwrap();
            let status = app.clone().oneshot(req).await.unwrap().status();
            assert_eq!(status, StatusCode::OK, "GET {path}");
        }
    }
}
