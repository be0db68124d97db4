use serde::{Deserialize, Serialize};

const CATALOG_JSON: &str = include_str!("../assets/catalog.json");

/// A static catalog entry: hero, location or enemy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    pub id: String,
    pub name: String,
    pub multiplier: f64,
    #[serde(default)]
    pub sprite: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub heroes: Vec<Descriptor>,
    pub locations: Vec<Descriptor>,
    pub enemies: Vec<Descriptor>,
}

impl Catalog {
    pub fn builtin() -> Self {
        serde_json::from_str(CATALOG_JSON).unwrap_or_default()
    }

    pub fn hero(&self, id: &str) -> Option<&Descriptor> {
        self.heroes.iter().find(|d| d.id == id)
    }

    pub fn location(&self, id: &str) -> Option<&Descriptor> {
        self.locations.iter().find(|d| d.id == id)
    }

    pub fn enemy(&self, id: &str) -> Option<&Descriptor> {
        self.enemies.iter().find(|d| d.id == id)
    }
}
