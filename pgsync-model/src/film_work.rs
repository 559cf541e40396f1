use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::named_item::NamedItem;

/// The `role` column on `person_film_work`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Actor,
    Writer,
    Director,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Actor => write!(f, "actor"),
            Role::Writer => write!(f, "writer"),
            Role::Director => write!(f, "director"),
        }
    }
}

impl Role {
    /// Parses the raw `role` column value from `person_film_work`.
    ///
    /// Unknown roles are tolerated (returns `None`) rather than erroring, so
    /// a future role added to the source schema doesn't fail the whole
    /// extraction batch before the index can be updated to handle it.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "actor" => Some(Role::Actor),
            "writer" => Some(Role::Writer),
            "director" => Some(Role::Director),
            _ => None,
        }
    }
}

/// A denormalized filmwork document, immutable once emitted by the
/// extraction pipeline.
///
/// `title` absent means "this document should be deleted from the index"
/// (spec.md §4.5, §8 S4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilmWork {
    pub id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    pub kind: String,
    pub rating: Option<f64>,
    pub updated_at: DateTime<Utc>,
    pub actors: HashSet<NamedItem>,
    pub writers: HashSet<NamedItem>,
    pub directors: HashSet<NamedItem>,
    pub genres: HashSet<NamedItem>,
}

impl FilmWork {
    pub fn new(
        id: Uuid,
        title: Option<String>,
        description: Option<String>,
        kind: impl Into<String>,
        rating: Option<f64>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            description,
            kind: kind.into(),
            rating,
            updated_at,
            actors: HashSet::new(),
            writers: HashSet::new(),
            directors: HashSet::new(),
            genres: HashSet::new(),
        }
    }

    /// `true` when the row's `title` is null, meaning the loader must issue a
    /// `delete` bulk action instead of `index` (spec.md §4.5).
    pub fn is_tombstone(&self) -> bool {
        self.title.is_none()
    }

    pub fn add_person(&mut self, role: Role, person: NamedItem) {
        match role {
            Role::Actor => {
                self.actors.insert(person);
            }
            Role::Writer => {
                self.writers.insert(person);
            }
            Role::Director => {
                self.directors.insert(person);
            }
        }
    }

    pub fn add_genre(&mut self, genre: NamedItem) {
        self.genres.insert(genre);
    }

    /// Maximum `updated_at` across every nested person, or `None` when the
    /// filmwork has no persons attached. Used to advance `persons_at` from
    /// the by-filmwork sub-extractor (spec.md §4.4.1).
    pub fn max_person_updated_at(&self) -> Option<DateTime<Utc>> {
        self.actors
            .iter()
            .chain(self.writers.iter())
            .chain(self.directors.iter())
            .map(|p| p.updated_at)
            .max()
    }

    /// Maximum `updated_at` across every nested genre, or `None`.
    pub fn max_genre_updated_at(&self) -> Option<DateTime<Utc>> {
        self.genres.iter().map(|g| g.updated_at).max()
    }
}
