use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderName, header},
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod interactor;
pub mod models;
pub mod repository;
pub mod services;
pub mod validation;

// Routing segregated by gate (public, authenticated, admin).
pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use auth::{AuthService, PasswordHasher, RoleGate, RoutePolicy, TokenService};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use interactor::{ContentInteractor, ContentService};
pub use repository::{CredentialStoreState, PostgresRepository, RecipeStoreState};

use auth::RolePolicy;
use models::{RecipeStep, Salad};
use services::{RecipeStepService, SaladService};
use validation::{DnsResolver, HostResolver, KeywordValidator, UrlPolicy, UrlValidator, Validator};

/// ApiDoc
///
/// OpenAPI document for every handler, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::sign_up, handlers::log_in, handlers::get_me,
        handlers::create_salad, handlers::update_salad, handlers::get_salad,
        handlers::create_recipe_step, handlers::update_recipe_step, handlers::get_recipe_step,
        handlers::get_keywords, handlers::create_user
    ),
    components(
        schemas(
            models::Role, models::Salad, models::RecipeStep, models::SignUpRequest,
            models::CreateUserRequest, models::LogInRequest, models::SaladRequest,
            models::RecipeStepRequest, models::TokenResponse, models::CreatedResponse,
            models::MeResponse, models::KeywordsResponse,
        )
    ),
    tags(
        (name = "recipe-gate", description = "Recipe sharing API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, cloneable container shared by every request. Everything inside is
/// immutable after startup: the signing key lives in the token service, the keyword
/// set in the keyword validator.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub gate: RoleGate,
    pub salads: Arc<dyn ContentService<Salad>>,
    pub steps: Arc<dyn ContentService<RecipeStep>>,
    pub keywords: Arc<KeywordValidator>,
    pub config: AppConfig,
}

impl AppState {
    /// build
    ///
    /// Wires the core from configuration and the two store adapters.
    /// `stored_keywords` is merged with `config.banned_keywords`; validators run in the
    /// order keyword, then URL.
    pub fn build(
        config: AppConfig,
        credentials: CredentialStoreState,
        recipes: RecipeStoreState,
        stored_keywords: Vec<String>,
    ) -> AppResult<Self> {
        Self::build_with_resolver(config, credentials, recipes, stored_keywords, Arc::new(DnsResolver))
    }

    /// build_with_resolver
    ///
    /// As `build`, with the host lookup used by the URL validator supplied by the caller.
    pub fn build_with_resolver(
        config: AppConfig,
        credentials: CredentialStoreState,
        recipes: RecipeStoreState,
        stored_keywords: Vec<String>,
        resolver: Arc<dyn HostResolver>,
    ) -> AppResult<Self> {
        let ttl = chrono::Duration::try_hours(config.token_ttl_hours)
            .filter(|ttl| *ttl > chrono::Duration::zero())
            .ok_or_else(|| {
                AppError::Internal(format!("invalid token lifetime: {}h", config.token_ttl_hours))
            })?;
        let tokens = Arc::new(TokenService::new(config.jwt_secret.as_bytes(), ttl));
        let hasher = PasswordHasher::with_costs(config.argon2_memory_kib, config.argon2_iterations)?;
        let auth = AuthService::new(credentials, hasher, tokens.clone())?;
        let gate = RoleGate::new(tokens);

        let keywords = Arc::new(KeywordValidator::new(
            config.banned_keywords.iter().chain(stored_keywords.iter()),
        ));
        let urls: Arc<dyn Validator> = Arc::new(UrlValidator::with_resolver(
            UrlPolicy {
                blocked_hosts: config.blocked_url_hosts.clone(),
                allowed_hosts: config.allowed_url_hosts.clone(),
                resolve_hosts: config.resolve_url_hosts,
                timeout: config.url_check_timeout,
                ..UrlPolicy::default()
            },
            resolver,
        ));
        let keyword_check: Arc<dyn Validator> = keywords.clone();
        let validators = vec![keyword_check, urls];

        tracing::info!(keywords = keywords.len(), "validation pipeline ready");

        let salads = Arc::new(ContentInteractor::<Salad>::new(
            Arc::new(SaladService::new(recipes.clone())),
            validators.clone(),
        ));
        let steps = Arc::new(ContentInteractor::<RecipeStep>::new(
            Arc::new(RecipeStepService::new(recipes)),
            validators,
        ));

        Ok(Self {
            auth,
            gate,
            salads,
            steps,
            keywords,
            config,
        })
    }
}

/// gate_request
///
/// Runs the role gate on the request's `Authorization` header and, on success, stores
/// the verified `TokenPayload` in the request extensions for the `AuthUser` extractor.
fn gate_request(state: &AppState, request: &mut Request, policy: &dyn RolePolicy) -> AppResult<()> {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let payload = state.gate.authorize(authorization, policy)?;
    request.extensions_mut().insert(payload);
    Ok(())
}

/// require_user
///
/// Gate middleware for the authenticated routes: 401 without a valid token.
async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    gate_request(&state, &mut request, &RoutePolicy::AnyUser)?;
    Ok(next.run(request).await)
}

/// require_admin
///
/// Gate middleware for the admin routes: 401 without a valid token, 403 for non-admins.
async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    gate_request(&state, &mut request, &RoutePolicy::AdminOnly)?;
    Ok(next.run(request).await)
}

/// create_router
///
/// Assembles the routing structure, applies the gates and the global layers,
/// and registers the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");
    let request_timeout = state.config.request_timeout;

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), require_user)),
        )
        .nest(
            "/admin",
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), require_admin)),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id))
                // Whole-request deadline: a stalled hash or validator is abandoned here.
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span per request carrying method, uri and the `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
