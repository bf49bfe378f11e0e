//! Maps database rows to display models: list-valued columns hold ids, pages
//! and the JSON API want name strings.

use serde::Serialize;
use sqlx::PgPool;

use crate::helpers::capwords;
use crate::models::pokemon::Pokemon;

/// Height is stored in total inches and shown as feet'inches".
pub fn height_display(height: i32) -> String {
    format!("{}'{}\"", height / 12, height % 12)
}

pub async fn type_id(pool: &PgPool, name: &str) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar(r#"SELECT id FROM types WHERE name = $1"#)
        .bind(name)
        .fetch_optional(pool)
        .await
}

pub async fn category_id(pool: &PgPool, name: &str) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar(r#"SELECT id FROM categories WHERE name = $1"#)
        .bind(name)
        .fetch_optional(pool)
        .await
}

pub async fn move_id(pool: &PgPool, name: &str) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar(r#"SELECT id FROM moves WHERE name = $1"#)
        .bind(name)
        .fetch_optional(pool)
        .await
}

pub async fn user_id_by_email(pool: &PgPool, email: &str) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar(r#"SELECT id FROM users WHERE email = $1"#)
        .bind(email)
        .fetch_optional(pool)
        .await
}

/// Resolve a pokedex id to a name. A stale reference renders as placeholder
/// text rather than failing; `None` renders empty.
pub async fn pokemon_name(pool: &PgPool, dex_id: Option<i32>) -> Result<String, sqlx::Error> {
    let Some(dex_id) = dex_id else {
        return Ok(String::new());
    };
    let name: Option<String> =
        sqlx::query_scalar(r#"SELECT name FROM pokemon WHERE pokedex_id = $1 LIMIT 1"#)
            .bind(dex_id)
            .fetch_optional(pool)
            .await?;
    Ok(name.unwrap_or_else(|| format!("Pokemon with Pokedex ID# {dex_id}")))
}

pub async fn pokemon_name_list(pool: &PgPool, dex_ids: &[i32]) -> Result<Vec<String>, sqlx::Error> {
    let mut names = Vec::with_capacity(dex_ids.len());
    for id in dex_ids {
        names.push(pokemon_name(pool, Some(*id)).await?);
    }
    Ok(names)
}

/// Names for a list of reference-table ids, in stored order, stale ids
/// silently skipped.
async fn names_for(pool: &PgPool, table: &str, ids: &[i32]) -> Result<Vec<String>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let query = format!("SELECT id, name FROM {table} WHERE id = ANY($1)");
    let rows: Vec<(i32, String)> = sqlx::query_as(&query).bind(ids).fetch_all(pool).await?;
    Ok(ids
        .iter()
        .filter_map(|id| rows.iter().find(|(rid, _)| rid == id).map(|(_, n)| n.clone()))
        .collect())
}

pub async fn type_names(pool: &PgPool, ids: &[i32]) -> Result<Vec<String>, sqlx::Error> {
    names_for(pool, "types", ids).await
}

pub async fn move_names(pool: &PgPool, ids: &[i32]) -> Result<Vec<String>, sqlx::Error> {
    names_for(pool, "moves", ids).await
}

//
// Form-input reduction: the free-text comma-separated fields become id lists.
//

/// Numeric items from comma-separated input; anything else is dropped.
pub fn split_ids(input: &str) -> Vec<i32> {
    input
        .replace(' ', "")
        .split(',')
        .filter_map(|item| item.parse().ok())
        .collect()
}

/// Types are closed-world: unknown names are dropped.
pub async fn parse_type_list(pool: &PgPool, input: &str) -> Result<Vec<i32>, sqlx::Error> {
    let mut ids = Vec::new();
    for item in input.split(',') {
        let name = capwords(item.trim());
        if name.is_empty() {
            continue;
        }
        if let Some(id) = type_id(pool, &name).await? {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Moves are open-world: unknown names are inserted on first reference.
pub async fn parse_move_list(pool: &PgPool, input: &str) -> Result<Vec<i32>, sqlx::Error> {
    let mut ids = Vec::new();
    for item in input.split(',') {
        let name = capwords(item.trim());
        if name.is_empty() {
            continue;
        }
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO moves (name) VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(&name)
        .fetch_one(pool)
        .await?;
        ids.push(id);
    }
    Ok(ids)
}

/// Look up the category, creating it on first reference.
pub async fn ensure_category(pool: &PgPool, name: &str) -> Result<i32, sqlx::Error> {
    let name = capwords(name);
    sqlx::query_scalar(
        r#"
        INSERT INTO categories (name) VALUES ($1)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(&name)
    .fetch_one(pool)
    .await
}

/// A pokemon row reduced to display strings, shared by the details page and
/// the JSON API. List attributes are comma-joined name lists.
#[derive(Debug, Clone, Serialize)]
pub struct PokemonView {
    pub id: i32,
    pub name: String,
    pub pokedex_id: i32,
    pub description: String,
    pub image: String,
    pub height: String,
    pub weight: f64,
    pub is_mythical: bool,
    pub is_legendary: bool,
    pub evolves_from: String,
    pub evolves_to: String,
    pub types: String,
    pub weaknesses: String,
    pub moves: String,
    pub category: String,
    #[serde(skip_serializing)]
    pub user: String,
    #[serde(skip_serializing)]
    pub user_id: i32,
}

impl PokemonView {
    pub async fn load(pool: &PgPool, p: &Pokemon) -> Result<Self, sqlx::Error> {
        let category: Option<String> =
            sqlx::query_scalar(r#"SELECT name FROM categories WHERE id = $1"#)
                .bind(p.category_id)
                .fetch_optional(pool)
                .await?;
        let owner: Option<(String, String)> =
            sqlx::query_as(r#"SELECT name, email FROM users WHERE id = $1"#)
                .bind(p.user_id)
                .fetch_optional(pool)
                .await?;
        let user = match owner {
            Some((name, email)) if name.is_empty() => email,
            Some((name, _)) => name,
            None => String::new(),
        };

        Ok(Self {
            id: p.id,
            name: p.name.clone(),
            pokedex_id: p.pokedex_id,
            description: p.description.clone(),
            image: p.image.clone(),
            height: height_display(p.height),
            weight: p.weight,
            is_mythical: p.is_mythical,
            is_legendary: p.is_legendary,
            evolves_from: pokemon_name(pool, p.evolution_before).await?,
            evolves_to: pokemon_name_list(pool, &p.evolution_after_list)
                .await?
                .join(", "),
            types: type_names(pool, &p.type_list).await?.join(", "),
            weaknesses: type_names(pool, &p.weakness_list).await?.join(", "),
            moves: move_names(pool, &p.move_list).await?.join(", "),
            category: category.unwrap_or_default(),
            user,
            user_id: p.user_id,
        })
    }

    pub async fn load_all(pool: &PgPool, rows: &[Pokemon]) -> Result<Vec<Self>, sqlx::Error> {
        let mut views = Vec::with_capacity(rows.len());
        for row in rows {
            views.push(Self::load(pool, row).await?);
        }
        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_formats_feet_and_inches() {
        assert_eq!(height_display(28), "2'4\"");
        assert_eq!(height_display(24), "2'0\"");
        assert_eq!(height_display(11), "0'11\"");
    }

    #[test]
    fn split_ids_drops_non_numeric_items() {
        assert_eq!(split_ids("2, 5,abc, 8"), vec![2, 5, 8]);
        assert_eq!(split_ids(""), Vec::<i32>::new());
        assert_eq!(split_ids("1 2,3"), vec![12, 3]);
    }

    #[test]
    fn view_serializes_with_original_key_names() {
        let view = PokemonView {
            id: 1,
            name: "Bulbasaur".into(),
            pokedex_id: 1,
            description: "Seed pokemon".into(),
            image: "https://example.com/001.png".into(),
            height: height_display(28),
            weight: 15.2,
            is_mythical: false,
            is_legendary: false,
            evolves_from: String::new(),
            evolves_to: "Ivysaur".into(),
            types: "Grass, Poison".into(),
            weaknesses: "Fire, Flying, Ice, Psychic".into(),
            moves: "Tackle, Growl".into(),
            category: "Seed".into(),
            user: "KantoAdmin".into(),
            user_id: 1,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["height"], "2'4\"");
        assert_eq!(json["types"], "Grass, Poison");
        assert_eq!(json["evolves_to"], "Ivysaur");
        assert!(json.get("user").is_none());
        assert!(json.get("user_id").is_none());
    }
}
