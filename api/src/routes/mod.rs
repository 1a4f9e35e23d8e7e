use axum::Router;

mod health;
mod players;
mod teams;

pub fn configure_routes(router: Router) -> Router {
    router
        .merge(health::configure())
        .merge(players::configure())
        .merge(teams::configure())
}
