use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::auth::middleware::authenticate;
use crate::handlers::{auth, time_entries, users};
use crate::AppState;

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/users/me", get(users::me).put(users::update_me))
        .route(
            "/time-entries",
            post(time_entries::create).get(time_entries::list),
        )
        .route("/time-entries/active", get(time_entries::active))
        .route(
            "/time-entries/:id",
            get(time_entries::get_by_id).delete(time_entries::remove),
        )
        .route("/time-entries/:id/stop", put(time_entries::stop))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            authenticate,
        ));

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .merge(protected)
        .with_state(state)
}
