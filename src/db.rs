use serde::Deserialize;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::models::user::User;
use crate::view_model::{category_id, move_id, type_id, user_id_by_email};

async fn connect_to_db(url: &str) -> Result<PgPool, sqlx::Error> {
    let db_pool = PgPoolOptions::new()
        .max_connections(30)
        .connect(url)
        .await?;

    Ok(db_pool)
}

async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("running migrations");
    sqlx::migrate!("./migrations").run(pool).await
}

#[derive(Deserialize)]
struct SeedFile {
    user: SeedUser,
    types: Vec<String>,
    categories: Vec<String>,
    moves: Vec<String>,
    pokemon: Vec<SeedPokemon>,
}

#[derive(Deserialize)]
struct SeedUser {
    name: String,
    email: String,
}

#[derive(Deserialize)]
struct SeedPokemon {
    pokedex_id: i32,
    name: String,
    description: String,
    image: String,
    height: i32,
    weight: f64,
    is_mythical: bool,
    is_legendary: bool,
    evolution_before: Option<i32>,
    evolution_after: Vec<i32>,
    types: Vec<String>,
    weaknesses: Vec<String>,
    moves: Vec<String>,
    category: String,
}

/// First sign-in creates the user; later sign-ins find the existing row by
/// email and leave it untouched.
pub async fn find_or_create_user(
    pool: &PgPool,
    name: &str,
    email: &str,
) -> Result<User, sqlx::Error> {
    if let Some(id) = user_id_by_email(pool, email).await? {
        return sqlx::query_as::<_, User>(
            r#"SELECT id, name, email, created_at FROM users WHERE id = $1"#,
        )
        .bind(id)
        .fetch_one(pool)
        .await;
    }

    // Two callbacks can race past the lookup; the conflict clause keeps the
    // insert returning the surviving row either way.
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, email) VALUES ($1, $2)
        ON CONFLICT (email) DO UPDATE SET name = users.name
        RETURNING id, name, email, created_at
        "#,
    )
    .bind(name)
    .bind(email)
    .fetch_one(pool)
    .await
}

/// Idempotent startup seed: the 18 types, the initial categories, moves and
/// starter entries. Skipped once any pokemon exists.
async fn seed(
    pool: &PgPool,
    json_path: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pokemon")
        .fetch_one(pool)
        .await
        .map_err(|e| format!("pokemon table not ready: {e}"))?;
    if count > 0 {
        return Ok(());
    }

    let data = std::fs::read_to_string(json_path)?;
    let seed: SeedFile = serde_json::from_str(&data)?;

    let admin = find_or_create_user(pool, &seed.user.name, &seed.user.email).await?;

    for name in &seed.types {
        sqlx::query(r#"INSERT INTO types (name) VALUES ($1) ON CONFLICT (name) DO NOTHING"#)
            .bind(name)
            .execute(pool)
            .await?;
    }
    for name in &seed.categories {
        sqlx::query(r#"INSERT INTO categories (name) VALUES ($1) ON CONFLICT (name) DO NOTHING"#)
            .bind(name)
            .execute(pool)
            .await?;
    }
    for name in &seed.moves {
        sqlx::query(r#"INSERT INTO moves (name) VALUES ($1) ON CONFLICT (name) DO NOTHING"#)
            .bind(name)
            .execute(pool)
            .await?;
    }

    info!("seeding {} pokemon from {json_path}", seed.pokemon.len());
    for entry in &seed.pokemon {
        let mut type_list = Vec::new();
        for name in &entry.types {
            if let Some(id) = type_id(pool, name).await? {
                type_list.push(id);
            }
        }
        let mut weakness_list = Vec::new();
        for name in &entry.weaknesses {
            if let Some(id) = type_id(pool, name).await? {
                weakness_list.push(id);
            }
        }
        let mut move_list = Vec::new();
        for name in &entry.moves {
            if let Some(id) = move_id(pool, name).await? {
                move_list.push(id);
            }
        }
        let cat = category_id(pool, &entry.category)
            .await?
            .ok_or_else(|| format!("seed category missing: {}", entry.category))?;

        sqlx::query(
            r#"
            INSERT INTO pokemon (
                pokedex_id, name, description, image, height, weight,
                is_mythical, is_legendary, evolution_before, evolution_after_list,
                type_list, weakness_list, move_list, category_id, user_id
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15)
            "#,
        )
        .bind(entry.pokedex_id)
        .bind(&entry.name)
        .bind(&entry.description)
        .bind(&entry.image)
        .bind(entry.height)
        .bind(entry.weight)
        .bind(entry.is_mythical)
        .bind(entry.is_legendary)
        .bind(entry.evolution_before)
        .bind(&entry.evolution_after)
        .bind(&type_list)
        .bind(&weakness_list)
        .bind(&move_list)
        .bind(cat)
        .bind(admin.id)
        .execute(pool)
        .await?;
    }

    info!("seed finished");
    Ok(())
}

pub async fn init_db(url: &str) -> PgPool {
    let pool = connect_to_db(url)
        .await
        .unwrap_or_else(|e| panic!("DB connection failed: {e}"));
    if let Err(e) = run_migrations(&pool).await {
        warn!("migrations failed: {e}");
    }
    if let Err(e) = seed(&pool, "data/seed.json").await {
        warn!("seed skipped: {e}");
    }
    pool
}
