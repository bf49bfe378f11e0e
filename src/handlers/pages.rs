use askama::Template;
use axum::extract::{Form, Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use sqlx::PgPool;

use crate::auth::{MaybeUser, SessionUser};
use crate::helpers::{ApiResult, capwords, flash_redirect, get_flash, not_found, render, to_500};
use crate::models::pokemon::{Pokemon, PokemonForm};
use crate::view_model::{
    PokemonView, ensure_category, move_names, parse_move_list, parse_type_list, split_ids,
    type_id, type_names,
};

/// One entry in the home-page grid.
struct HomeCard {
    id: i32,
    pokedex_id: i32,
    name: String,
    image: String,
}

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    signed_in: bool,
    flash: String,
    pokemon_list: Vec<HomeCard>,
    types: Vec<String>,
    selected_type: String,
}

#[derive(Template)]
#[template(path = "details.html")]
struct DetailsTemplate {
    signed_in: bool,
    flash: String,
    can_edit: bool,
    view: PokemonView,
}

#[derive(Template)]
#[template(path = "new.html")]
struct NewTemplate {
    signed_in: bool,
    flash: String,
}

#[derive(Template)]
#[template(path = "edit.html")]
struct EditTemplate {
    signed_in: bool,
    flash: String,
    id: i32,
    pokedex_id: i32,
    name: String,
    description: String,
    image: String,
    height_ft: i32,
    height_inch: i32,
    weight: f64,
    mythical: bool,
    legendary: bool,
    evolution_before: String,
    evolution_after: String,
    types: String,
    weaknesses: String,
    moves: String,
    category: String,
}

#[derive(Template)]
#[template(path = "delete.html")]
struct DeleteTemplate {
    signed_in: bool,
    flash: String,
    id: i32,
    name: String,
}

#[derive(Template)]
#[template(path = "cleanup.html")]
struct CleanupTemplate {
    signed_in: bool,
    flash: String,
    categories: Vec<String>,
    moves: Vec<String>,
}

async fn type_filter(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(r#"SELECT name FROM types ORDER BY name"#)
        .fetch_all(pool)
        .await
}

fn cards(rows: Vec<Pokemon>) -> Vec<HomeCard> {
    rows.into_iter()
        .map(|p| HomeCard {
            id: p.id,
            pokedex_id: p.pokedex_id,
            name: p.name,
            image: p.image,
        })
        .collect()
}

pub async fn show_home(
    headers: HeaderMap,
    MaybeUser(user): MaybeUser,
    State(pool): State<PgPool>,
) -> ApiResult<Response> {
    let rows = sqlx::query_as::<_, Pokemon>(&format!("{} ORDER BY pokedex_id", Pokemon::SELECT))
        .fetch_all(&pool)
        .await
        .map_err(to_500)?;
    let types = type_filter(&pool).await.map_err(to_500)?;

    let incoming = get_flash(&headers);
    let flash = match &incoming {
        Some(msg) => msg.clone(),
        None if rows.is_empty() => "There are currently no pokemon in the database.".to_string(),
        None => String::new(),
    };

    let tpl = HomeTemplate {
        signed_in: user.is_some(),
        flash,
        pokemon_list: cards(rows),
        types,
        selected_type: "All".to_string(),
    };
    render(&tpl, incoming.is_some())
}

pub async fn show_type(
    headers: HeaderMap,
    MaybeUser(user): MaybeUser,
    State(pool): State<PgPool>,
    Path(type_name): Path<String>,
) -> ApiResult<Response> {
    if type_name.eq_ignore_ascii_case("all") {
        return Ok(Redirect::to("/pokemon").into_response());
    }

    let selected = capwords(&type_name);
    let rows = match type_id(&pool, &selected).await.map_err(to_500)? {
        Some(id) => sqlx::query_as::<_, Pokemon>(&format!(
            "{} WHERE $1 = ANY(type_list) ORDER BY pokedex_id",
            Pokemon::SELECT
        ))
        .bind(id)
        .fetch_all(&pool)
        .await
        .map_err(to_500)?,
        None => Vec::new(),
    };
    let types = type_filter(&pool).await.map_err(to_500)?;

    let incoming = get_flash(&headers);
    let flash = match &incoming {
        Some(msg) => msg.clone(),
        None if rows.is_empty() => {
            // The notice echoes the path segment as typed, not the
            // normalized name.
            format!("There are currently no {type_name} type pokemon in the database.")
        }
        None => String::new(),
    };

    let tpl = HomeTemplate {
        signed_in: user.is_some(),
        flash,
        pokemon_list: cards(rows),
        types,
        selected_type: selected,
    };
    render(&tpl, incoming.is_some())
}

async fn pokemon_by_id(pool: &PgPool, id: i32) -> ApiResult<Pokemon> {
    sqlx::query_as::<_, Pokemon>(&format!("{} WHERE id = $1", Pokemon::SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(to_500)?
        .ok_or_else(|| not_found("Pokemon not found."))
}

pub async fn show_pokemon(
    headers: HeaderMap,
    MaybeUser(user): MaybeUser,
    State(pool): State<PgPool>,
    Path(id): Path<i32>,
) -> ApiResult<Response> {
    let pokemon = pokemon_by_id(&pool, id).await?;
    let view = PokemonView::load(&pool, &pokemon).await.map_err(to_500)?;

    let can_edit = user
        .as_ref()
        .is_some_and(|claims| claims.sub == pokemon.user_id);
    let incoming = get_flash(&headers);
    let tpl = DetailsTemplate {
        signed_in: user.is_some(),
        flash: incoming.clone().unwrap_or_default(),
        can_edit,
        view,
    };
    render(&tpl, incoming.is_some())
}

pub async fn new_pokemon_form(SessionUser(_): SessionUser, headers: HeaderMap) -> ApiResult<Response> {
    let incoming = get_flash(&headers);
    let tpl = NewTemplate {
        signed_in: true,
        flash: incoming.clone().unwrap_or_default(),
    };
    render(&tpl, incoming.is_some())
}

pub async fn create_pokemon(
    SessionUser(claims): SessionUser,
    State(pool): State<PgPool>,
    Form(form): Form<PokemonForm>,
) -> ApiResult<Response> {
    if form.name.trim().is_empty() {
        return Ok(flash_redirect("/pokemon/new", "A pokemon name is required."));
    }

    let category_id = ensure_category(&pool, &form.category).await.map_err(to_500)?;
    let type_list = parse_type_list(&pool, &form.types).await.map_err(to_500)?;
    let weakness_list = parse_type_list(&pool, &form.weakness).await.map_err(to_500)?;
    let move_list = parse_move_list(&pool, &form.moves).await.map_err(to_500)?;

    let id: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO pokemon (
            pokedex_id, name, description, image, height, weight,
            is_mythical, is_legendary, evolution_before, evolution_after_list,
            type_list, weakness_list, move_list, category_id, user_id
        )
        VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15)
        RETURNING id
        "#,
    )
    .bind(form.pokedex_id)
    .bind(form.name.trim())
    .bind(&form.description)
    .bind(&form.image)
    .bind(form.height())
    .bind(form.weight)
    .bind(form.is_mythical())
    .bind(form.is_legendary())
    .bind(form.evolution_before_id())
    .bind(split_ids(&form.evolution_after))
    .bind(&type_list)
    .bind(&weakness_list)
    .bind(&move_list)
    .bind(category_id)
    .bind(claims.sub)
    .fetch_one(&pool)
    .await
    .map_err(to_500)?;

    Ok(flash_redirect(&format!("/pokemon/{id}"), "New pokemon added"))
}

pub async fn edit_pokemon_form(
    SessionUser(claims): SessionUser,
    headers: HeaderMap,
    State(pool): State<PgPool>,
    Path(id): Path<i32>,
) -> ApiResult<Response> {
    let pokemon = pokemon_by_id(&pool, id).await?;
    if pokemon.user_id != claims.sub {
        return Ok(flash_redirect(
            "/pokemon",
            "You are not authorized to edit that pokemon entry. \
             You may only edit a pokemon entry you added.",
        ));
    }

    // The form shows display strings for the id lists; ids are re-resolved
    // on submit.
    let evolution_after = pokemon
        .evolution_after_list
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let types = type_names(&pool, &pokemon.type_list).await.map_err(to_500)?.join(", ");
    let weaknesses = type_names(&pool, &pokemon.weakness_list)
        .await
        .map_err(to_500)?
        .join(", ");
    let moves = move_names(&pool, &pokemon.move_list)
        .await
        .map_err(to_500)?
        .join(", ");
    let category: Option<String> =
        sqlx::query_scalar(r#"SELECT name FROM categories WHERE id = $1"#)
            .bind(pokemon.category_id)
            .fetch_optional(&pool)
            .await
            .map_err(to_500)?;

    let incoming = get_flash(&headers);
    let tpl = EditTemplate {
        signed_in: true,
        flash: incoming.clone().unwrap_or_default(),
        id: pokemon.id,
        pokedex_id: pokemon.pokedex_id,
        name: pokemon.name,
        description: pokemon.description,
        image: pokemon.image,
        height_ft: pokemon.height / 12,
        height_inch: pokemon.height % 12,
        weight: pokemon.weight,
        mythical: pokemon.is_mythical,
        legendary: pokemon.is_legendary,
        evolution_before: pokemon
            .evolution_before
            .map(|id| id.to_string())
            .unwrap_or_default(),
        evolution_after,
        types,
        weaknesses,
        moves,
        category: category.unwrap_or_default(),
    };
    render(&tpl, incoming.is_some())
}

pub async fn update_pokemon(
    SessionUser(claims): SessionUser,
    State(pool): State<PgPool>,
    Path(id): Path<i32>,
    Form(form): Form<PokemonForm>,
) -> ApiResult<Response> {
    let pokemon = pokemon_by_id(&pool, id).await?;
    if pokemon.user_id != claims.sub {
        return Ok(flash_redirect(
            "/pokemon",
            "You are not authorized to edit that pokemon entry. \
             You may only edit a pokemon entry you added.",
        ));
    }
    if form.name.trim().is_empty() {
        return Ok(flash_redirect(
            &format!("/pokemon/{id}/edit"),
            "A pokemon name is required.",
        ));
    }

    let category_id = ensure_category(&pool, &form.category).await.map_err(to_500)?;
    let type_list = parse_type_list(&pool, &form.types).await.map_err(to_500)?;
    let weakness_list = parse_type_list(&pool, &form.weakness).await.map_err(to_500)?;
    let move_list = parse_move_list(&pool, &form.moves).await.map_err(to_500)?;

    sqlx::query(
        r#"
        UPDATE pokemon SET
            pokedex_id = $1, name = $2, description = $3, image = $4,
            height = $5, weight = $6, is_mythical = $7, is_legendary = $8,
            evolution_before = $9, evolution_after_list = $10,
            type_list = $11, weakness_list = $12, move_list = $13,
            category_id = $14
        WHERE id = $15
        "#,
    )
    .bind(form.pokedex_id)
    .bind(form.name.trim())
    .bind(&form.description)
    .bind(&form.image)
    .bind(form.height())
    .bind(form.weight)
    .bind(form.is_mythical())
    .bind(form.is_legendary())
    .bind(form.evolution_before_id())
    .bind(split_ids(&form.evolution_after))
    .bind(&type_list)
    .bind(&weakness_list)
    .bind(&move_list)
    .bind(category_id)
    .bind(id)
    .execute(&pool)
    .await
    .map_err(to_500)?;

    Ok(flash_redirect(&format!("/pokemon/{id}"), "Pokemon details edited"))
}

pub async fn delete_pokemon_confirm(
    SessionUser(claims): SessionUser,
    headers: HeaderMap,
    State(pool): State<PgPool>,
    Path(id): Path<i32>,
) -> ApiResult<Response> {
    let pokemon = pokemon_by_id(&pool, id).await?;
    if pokemon.user_id != claims.sub {
        return Ok(flash_redirect(
            "/pokemon",
            "You are not authorized to delete that pokemon entry. \
             You may only delete a pokemon entry you added.",
        ));
    }

    let incoming = get_flash(&headers);
    let tpl = DeleteTemplate {
        signed_in: true,
        flash: incoming.clone().unwrap_or_default(),
        id: pokemon.id,
        name: pokemon.name,
    };
    render(&tpl, incoming.is_some())
}

pub async fn delete_pokemon(
    SessionUser(claims): SessionUser,
    State(pool): State<PgPool>,
    Path(id): Path<i32>,
) -> ApiResult<Response> {
    let pokemon = pokemon_by_id(&pool, id).await?;
    if pokemon.user_id != claims.sub {
        return Ok(flash_redirect(
            "/pokemon",
            "You are not authorized to delete that pokemon entry. \
             You may only delete a pokemon entry you added.",
        ));
    }

    sqlx::query(r#"DELETE FROM pokemon WHERE id = $1"#)
        .bind(id)
        .execute(&pool)
        .await
        .map_err(to_500)?;

    Ok(flash_redirect("/pokemon", "Pokemon deleted"))
}

// Moves and categories created ad hoc from form input are never removed by
// edits, so they can accumulate. Cleanup lists the ones no pokemon references
// any more and deletes them on confirmation.

async fn unused_categories(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT name FROM categories c
        WHERE NOT EXISTS (SELECT 1 FROM pokemon p WHERE p.category_id = c.id)
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await
}

async fn unused_moves(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT name FROM moves m
        WHERE NOT EXISTS (SELECT 1 FROM pokemon p WHERE m.id = ANY(p.move_list))
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn cleanup(
    SessionUser(_): SessionUser,
    headers: HeaderMap,
    State(pool): State<PgPool>,
) -> ApiResult<Response> {
    let categories = unused_categories(&pool).await.map_err(to_500)?;
    let moves = unused_moves(&pool).await.map_err(to_500)?;

    let incoming = get_flash(&headers);
    let tpl = CleanupTemplate {
        signed_in: true,
        flash: incoming.clone().unwrap_or_default(),
        categories,
        moves,
    };
    render(&tpl, incoming.is_some())
}

pub async fn run_cleanup(
    SessionUser(_): SessionUser,
    State(pool): State<PgPool>,
) -> ApiResult<Response> {
    sqlx::query(
        r#"
        DELETE FROM categories c
        WHERE NOT EXISTS (SELECT 1 FROM pokemon p WHERE p.category_id = c.id)
        "#,
    )
    .execute(&pool)
    .await
    .map_err(to_500)?;
    sqlx::query(
        r#"
        DELETE FROM moves m
        WHERE NOT EXISTS (SELECT 1 FROM pokemon p WHERE m.id = ANY(p.move_list))
        "#,
    )
    .execute(&pool)
    .await
    .map_err(to_500)?;

    Ok(flash_redirect(
        "/pokemon",
        "Unused categories and moves have been deleted",
    ))
}
