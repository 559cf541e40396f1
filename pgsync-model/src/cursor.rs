use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `(filmworks_at, persons_at, genres_at)` — three independent watermarks
/// into the source tables (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorCursor {
    pub filmworks_at: DateTime<Utc>,
    pub persons_at: DateTime<Utc>,
    pub genres_at: DateTime<Utc>,
}

impl ExtractorCursor {
    /// The cursor an empty/never-synced state store implies: every
    /// component initialized to the timezone-aware epoch minimum.
    pub fn epoch() -> Self {
        let min = DateTime::<Utc>::MIN_UTC;
        Self {
            filmworks_at: min,
            persons_at: min,
            genres_at: min,
        }
    }

    /// Advances `filmworks_at`/`persons_at`/`genres_at` to the max of the
    /// current value and `other`, per component. Never moves a component
    /// backwards (spec.md §8 property 1).
    pub fn advanced_with(&self, other: &ExtractorCursor) -> Self {
        Self {
            filmworks_at: self.filmworks_at.max(other.filmworks_at),
            persons_at: self.persons_at.max(other.persons_at),
            genres_at: self.genres_at.max(other.genres_at),
        }
    }
}

impl Default for ExtractorCursor {
    fn default() -> Self {
        Self::epoch()
    }
}
