use serde::Deserialize;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Pokemon {
    pub id: i32,
    pub pokedex_id: i32,
    pub name: String,
    pub description: String,
    pub image: String,
    /// Total inches; shown as feet'inches".
    pub height: i32,
    pub weight: f64,
    pub is_mythical: bool,
    pub is_legendary: bool,
    /// Pokedex id of the pre-evolution, if any.
    pub evolution_before: Option<i32>,
    /// Pokedex ids. Stale entries are rendered as placeholder text.
    pub evolution_after_list: Vec<i32>,
    pub type_list: Vec<i32>,
    pub weakness_list: Vec<i32>,
    pub move_list: Vec<i32>,
    pub category_id: i32,
    pub user_id: i32,
}

impl Pokemon {
    pub const SELECT: &'static str = "SELECT id, pokedex_id, name, description, image, \
         height, weight, is_mythical, is_legendary, evolution_before, \
         evolution_after_list, type_list, weakness_list, move_list, \
         category_id, user_id FROM pokemon";
}

/// Create/edit form fields. List-valued attributes arrive as free-text
/// comma-separated input and are resolved to ids before writing.
#[derive(Debug, Deserialize)]
pub struct PokemonForm {
    pub pokedex_id: i32,
    pub name: String,
    pub description: String,
    pub image: String,
    pub height_ft: i32,
    pub height_inch: i32,
    pub weight: f64,
    #[serde(default)]
    pub mythical: Option<String>,
    #[serde(default)]
    pub legendary: Option<String>,
    #[serde(default)]
    pub evolution_before: String,
    #[serde(default)]
    pub evolution_after: String,
    #[serde(rename = "type", default)]
    pub types: String,
    #[serde(default)]
    pub weakness: String,
    #[serde(rename = "move", default)]
    pub moves: String,
    pub category: String,
}

impl PokemonForm {
    pub fn height(&self) -> i32 {
        self.height_ft * 12 + self.height_inch
    }

    // Checkboxes are absent from the form body when unchecked.
    pub fn is_mythical(&self) -> bool {
        self.mythical.is_some()
    }

    pub fn is_legendary(&self) -> bool {
        self.legendary.is_some()
    }

    pub fn evolution_before_id(&self) -> Option<i32> {
        self.evolution_before.trim().parse().ok()
    }
}
