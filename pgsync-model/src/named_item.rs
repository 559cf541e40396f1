use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A person or genre as it is nested inside a `FilmWork` document.
///
/// Equality and hashing are by `id` only, so a `HashSet<NamedItem>` dedupes
/// the same entity even if it is folded in from multiple join rows (e.g. the
/// same actor appearing once per genre in the enrichment query's
/// cross-product).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedItem {
    pub id: Uuid,
    pub name: String,
    pub updated_at: DateTime<Utc>,
}

impl NamedItem {
    pub fn new(id: Uuid, name: impl Into<String>, updated_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            updated_at,
        }
    }
}

impl PartialEq for NamedItem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for NamedItem {}

impl Hash for NamedItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
