use axum::Router;
use axum::routing::get;

use crate::app::AppState;
use crate::handlers::pages::{
    cleanup, create_pokemon, delete_pokemon, delete_pokemon_confirm, edit_pokemon_form,
    new_pokemon_form, run_cleanup, show_home, show_pokemon, show_type, update_pokemon,
};

pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(show_home))
        .route("/pokemon", get(show_home))
        .route("/pokemon/new", get(new_pokemon_form).post(create_pokemon))
        .route("/pokemon/cleanup", get(cleanup).post(run_cleanup))
        .route("/pokemon/type/{type}", get(show_type))
        .route("/pokemon/{id}", get(show_pokemon))
        .route("/pokemon/{id}/edit", get(edit_pokemon_form).post(update_pokemon))
        .route(
            "/pokemon/{id}/delete",
            get(delete_pokemon_confirm).post(delete_pokemon),
        )
}
