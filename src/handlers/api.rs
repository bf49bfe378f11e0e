//! Read-only JSON mirror of the catalog, keeping the original response key
//! casing (`Pokemon`, `Categories`, `Types`, `Moves`).

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;
use sqlx::PgPool;

use crate::helpers::{ApiResult, capwords, to_500};
use crate::models::pokemon::Pokemon;
use crate::models::refs::NamedRef;
use crate::view_model::{PokemonView, type_id};

#[derive(Serialize)]
pub struct PokemonCollection {
    #[serde(rename = "Pokemon")]
    pub pokemon: Vec<PokemonView>,
}

#[derive(Serialize)]
pub struct CategoryCollection {
    #[serde(rename = "Categories")]
    pub categories: Vec<NamedRef>,
}

#[derive(Serialize)]
pub struct TypeCollection {
    #[serde(rename = "Types")]
    pub types: Vec<NamedRef>,
}

#[derive(Serialize)]
pub struct MoveCollection {
    #[serde(rename = "Moves")]
    pub moves: Vec<NamedRef>,
}

pub async fn all_pokemon_json(State(pool): State<PgPool>) -> ApiResult<Json<PokemonCollection>> {
    let rows = sqlx::query_as::<_, Pokemon>(&format!("{} ORDER BY pokedex_id", Pokemon::SELECT))
        .fetch_all(&pool)
        .await
        .map_err(to_500)?;
    let pokemon = PokemonView::load_all(&pool, &rows).await.map_err(to_500)?;
    Ok(Json(PokemonCollection { pokemon }))
}

/// Unknown ids mirror the original behavior: an empty collection, not a 404.
pub async fn pokemon_json(
    State(pool): State<PgPool>,
    Path(id): Path<i32>,
) -> ApiResult<Json<PokemonCollection>> {
    let row = sqlx::query_as::<_, Pokemon>(&format!("{} WHERE id = $1", Pokemon::SELECT))
        .bind(id)
        .fetch_optional(&pool)
        .await
        .map_err(to_500)?;

    let pokemon = match row {
        Some(p) => vec![PokemonView::load(&pool, &p).await.map_err(to_500)?],
        None => Vec::new(),
    };
    Ok(Json(PokemonCollection { pokemon }))
}

pub async fn type_pokemon_json(
    State(pool): State<PgPool>,
    Path(type_name): Path<String>,
) -> ApiResult<Json<PokemonCollection>> {
    let rows = if type_name.eq_ignore_ascii_case("all") {
        sqlx::query_as::<_, Pokemon>(&format!("{} ORDER BY pokedex_id", Pokemon::SELECT))
            .fetch_all(&pool)
            .await
            .map_err(to_500)?
    } else {
        match type_id(&pool, &capwords(&type_name)).await.map_err(to_500)? {
            Some(id) => sqlx::query_as::<_, Pokemon>(&format!(
                "{} WHERE $1 = ANY(type_list) ORDER BY pokedex_id",
                Pokemon::SELECT
            ))
            .bind(id)
            .fetch_all(&pool)
            .await
            .map_err(to_500)?,
            None => Vec::new(),
        }
    };

    let pokemon = PokemonView::load_all(&pool, &rows).await.map_err(to_500)?;
    Ok(Json(PokemonCollection { pokemon }))
}

async fn all_refs(pool: &PgPool, table: &str) -> Result<Vec<NamedRef>, sqlx::Error> {
    let query = format!("SELECT id, name FROM {table} ORDER BY id");
    sqlx::query_as(&query).fetch_all(pool).await
}

pub async fn categories_json(State(pool): State<PgPool>) -> ApiResult<Json<CategoryCollection>> {
    let categories = all_refs(&pool, "categories").await.map_err(to_500)?;
    Ok(Json(CategoryCollection { categories }))
}

pub async fn types_json(State(pool): State<PgPool>) -> ApiResult<Json<TypeCollection>> {
    let types = all_refs(&pool, "types").await.map_err(to_500)?;
    Ok(Json(TypeCollection { types }))
}

pub async fn moves_json(State(pool): State<PgPool>) -> ApiResult<Json<MoveCollection>> {
    let moves = all_refs(&pool, "moves").await.map_err(to_500)?;
    Ok(Json(MoveCollection { moves }))
}
