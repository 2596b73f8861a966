pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod schema;
pub mod seed;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::database::models::{AssessmentResult, Notification, Skill, TrainingSession, UserSkill};
use crate::handlers::resources::{self, RestResource};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Builds the full HTTP surface over the given state.
pub fn app(state: AppState) -> Router {
    let api = &state.config.api;

    let mut router = Router::new()
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health))
        .merge(auth_routes(&state))
        .merge(user_routes(&state))
        .merge(profile_routes(&state))
        .merge(organization_routes(&state))
        .merge(module_routes(&state))
        .merge(scenario_routes(&state))
        .merge(application_routes(&state))
        .merge(owned_routes::<TrainingSession>(&state, "/api/training-sessions"))
        .merge(owned_routes::<AssessmentResult>(&state, "/api/assessment-results"))
        .merge(owned_routes::<UserSkill>(&state, "/api/user-skills"))
        .merge(owned_routes::<Notification>(&state, "/api/notifications"))
        .merge(catalog_routes::<Skill>(&state, "/api/skills"))
        .layer(DefaultBodyLimit::max(api.max_request_size_bytes));

    if state.config.security.enable_cors {
        router = router.layer(cors_layer(&state.config.security));
    }
    if api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

fn auth_routes(state: &AppState) -> Router<AppState> {
    use handlers::auth;
    let bearer = from_fn_with_state(state.clone(), jwt_auth_middleware);

    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh-token", post(auth::refresh_token))
        .route("/api/auth/verify", get(auth::verify).route_layer(bearer.clone()))
        .route("/api/auth/logout", post(auth::logout).route_layer(bearer))
}

fn user_routes(state: &AppState) -> Router<AppState> {
    use handlers::users;
    let bearer = from_fn_with_state(state.clone(), jwt_auth_middleware);

    Router::new()
        .route(
            "/api/users",
            get(users::list).merge(post(users::create).route_layer(bearer.clone())),
        )
        .route(
            "/api/users/:id",
            get(users::get).merge(put(users::update).delete(users::delete).route_layer(bearer)),
        )
}

fn profile_routes(state: &AppState) -> Router<AppState> {
    use handlers::profiles;
    let bearer = from_fn_with_state(state.clone(), jwt_auth_middleware);

    Router::new()
        .route(
            "/api/profiles",
            get(profiles::list).merge(post(profiles::create).route_layer(bearer.clone())),
        )
        .route("/api/profiles/user/:userId", get(profiles::by_user))
        .route(
            "/api/profiles/:id",
            get(profiles::get).merge(put(profiles::update).delete(profiles::delete).route_layer(bearer)),
        )
}

fn organization_routes(state: &AppState) -> Router<AppState> {
    use handlers::organizations;
    let bearer = from_fn_with_state(state.clone(), jwt_auth_middleware);

    Router::new()
        .route(
            "/api/organizations",
            get(organizations::list).merge(post(organizations::create).route_layer(bearer.clone())),
        )
        .route(
            "/api/organizations/available/all",
            get(organizations::available).route_layer(bearer.clone()),
        )
        .route(
            "/api/organizations/auth/:id",
            get(organizations::get_with_stats).route_layer(bearer.clone()),
        )
        .route(
            "/api/organizations/:id",
            get(organizations::get).merge(
                put(organizations::update)
                    .delete(organizations::delete)
                    .route_layer(bearer),
            ),
        )
}

fn module_routes(state: &AppState) -> Router<AppState> {
    use handlers::modules;
    let bearer = from_fn_with_state(state.clone(), jwt_auth_middleware);

    Router::new()
        .route(
            "/api/modules",
            get(modules::list).merge(post(modules::create).route_layer(bearer.clone())),
        )
        .route("/api/modules/random", get(modules::random))
        .route("/api/modules/by-scenario/:scenarioId", get(modules::by_scenario))
        .route(
            "/api/modules/:id",
            get(modules::get).merge(put(modules::update).delete(modules::delete).route_layer(bearer)),
        )
}

fn scenario_routes(state: &AppState) -> Router<AppState> {
    use handlers::scenarios;
    let bearer = from_fn_with_state(state.clone(), jwt_auth_middleware);

    Router::new()
        .route(
            "/api/scenarios",
            get(scenarios::list).merge(post(scenarios::create).route_layer(bearer.clone())),
        )
        .route(
            "/api/scenarios/user/:userId",
            get(scenarios::for_user)
                .post(scenarios::assign)
                .route_layer(bearer.clone()),
        )
        .route(
            "/api/scenarios/user/:userId/:scenarioId",
            axum::routing::delete(scenarios::unassign).route_layer(bearer.clone()),
        )
        .route(
            "/api/scenarios/organization/:organizationId",
            get(scenarios::for_organization).route_layer(bearer.clone()),
        )
        .route(
            "/api/scenarios/:id",
            get(scenarios::get).merge(put(scenarios::update).delete(scenarios::delete).route_layer(bearer)),
        )
}

fn application_routes(state: &AppState) -> Router<AppState> {
    use handlers::applications;

    Router::new()
        .route("/api/applications", post(applications::create))
        .route(
            "/api/applications/organization/:organizationId",
            get(applications::for_organization),
        )
        .route("/api/applications/user/:userId", get(applications::for_user))
        .route("/api/applications/:id", get(applications::get))
        .route("/api/applications/:id/approve", put(applications::approve))
        .route("/api/applications/:id/reject", put(applications::reject))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
}

/// Per-user collections: every route needs a token.
fn owned_routes<T: RestResource>(state: &AppState, base: &str) -> Router<AppState> {
    Router::new()
        .route(base, get(resources::list::<T>).post(resources::create::<T>))
        .route(
            &format!("{}/:id", base),
            get(resources::get::<T>)
                .put(resources::update::<T>)
                .delete(resources::delete::<T>),
        )
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
}

/// Public catalog: reads are open, writes need a token.
fn catalog_routes<T: RestResource>(state: &AppState, base: &str) -> Router<AppState> {
    let bearer = from_fn_with_state(state.clone(), jwt_auth_middleware);

    Router::new()
        .route(
            base,
            get(resources::list::<T>).merge(post(resources::create::<T>).route_layer(bearer.clone())),
        )
        .route(
            &format!("{}/:id", base),
            get(resources::get::<T>).merge(
                put(resources::update::<T>)
                    .delete(resources::delete::<T>)
                    .route_layer(bearer),
            ),
        )
}
