use serde::Serialize;

/// Row shape shared by the three reference tables (categories, types, moves).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct NamedRef {
    pub id: i32,
    pub name: String,
}
