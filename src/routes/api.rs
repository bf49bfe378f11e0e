use axum::Router;
use axum::routing::get;

use crate::app::AppState;
use crate::handlers::api::{
    all_pokemon_json, categories_json, moves_json, pokemon_json, type_pokemon_json, types_json,
};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/pokemon/json", get(all_pokemon_json))
        .route("/pokemon/category/json", get(categories_json))
        .route("/pokemon/type/json", get(types_json))
        .route("/pokemon/move/json", get(moves_json))
        .route("/pokemon/type/{type}/json", get(type_pokemon_json))
        .route("/pokemon/{id}/json", get(pokemon_json))
}
