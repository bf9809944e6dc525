/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use projectdesk_api::{app::AppState, config::Config};
/// use projectdesk_shared::auth::authorization::PermissionCache;
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let permissions = PermissionCache::load(&pool).await?;
/// let state = AppState::new(pool, config, permissions);
/// let app = projectdesk_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::auth::{authenticate, require_permission},
    routes,
};
use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{delete, get, post, put, MethodRouter},
    Router,
};
use projectdesk_shared::auth::authorization::{Permission, PermissionCache};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Role to permission map, loaded at startup
    pub permissions: PermissionCache,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, permissions: PermissionCache) -> Self {
        Self {
            db,
            config: Arc::new(config),
            permissions,
        }
    }
}

/// Attaches a permission check to a single method route
fn guarded(state: &AppState, permission: Permission, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.route_layer(from_fn_with_state((state.clone(), permission), require_permission))
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Routes
///
/// ```text
/// GET    /health                       public
/// POST   /login                        public
/// GET    /project[?name&status&from&to]                  public
/// POST   /project, GET|PUT|DELETE /project/:id           public
/// GET    /task[?status&priority&from&to&project_id]      public
/// POST   /task, GET|PUT|DELETE /task/:id                 public
/// POST   /logout                       bearer token
/// GET    /client                       bearer + index
/// POST   /client                       bearer + create
/// GET    /client/:id                   bearer + show
/// PUT    /client/:id                   bearer + update
/// DELETE /client/:id                   bearer + destroy
/// POST   /admin/permissions/reload     bearer + destroy
/// ```
///
/// # Middleware Stack
///
/// Outermost first: CORS, request tracing, then per route
/// authentication and the permission check.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/login", post(routes::auth::login))
        .route(
            "/project",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/project/:id",
            get(routes::projects::show_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/task",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/task/:id",
            get(routes::tasks::show_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        );

    // Bearer token required; the permission layer sits inside authentication
    let protected_routes = Router::new()
        .route("/logout", post(routes::auth::logout))
        .route(
            "/client",
            guarded(&state, Permission::Index, get(routes::clients::list_clients))
                .merge(guarded(&state, Permission::Create, post(routes::clients::create_client))),
        )
        .route(
            "/client/:id",
            guarded(&state, Permission::Show, get(routes::clients::show_client))
                .merge(guarded(&state, Permission::Update, put(routes::clients::update_client)))
                .merge(guarded(&state, Permission::Destroy, delete(routes::clients::delete_client))),
        )
        .route(
            "/admin/permissions/reload",
            guarded(&state, Permission::Destroy, post(routes::admin::reload_permissions)),
        )
        .route_layer(from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .with_state(state)
}

/// CORS: permissive when `*` is configured, otherwise the listed origins
fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(std::time::Duration::from_secs(3600))
}
