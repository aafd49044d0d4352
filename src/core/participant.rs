//! Participant identity shared by all games.
//!
//! ## Participant
//!
//! A display name and color. Games wrap it with their own mutable fields;
//! array position in the roster is the participant's turn order or lane.
//!
//! ## Roster helpers
//!
//! Name validation and palette-based default rosters.

use serde::{Deserialize, Serialize};

use super::error::{GameError, Result};

/// Minimum roster size for every game.
pub const MIN_PARTICIPANTS: usize = 2;

/// A named, colored competitor.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    /// Display name (never empty).
    pub name: String,
    /// Display color, e.g. `#ff6b6b`.
    pub color: String,
}

impl Participant {
    /// Create a participant.
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }

    /// Create a participant whose color is taken from `palette` by slot.
    ///
    /// Colors cycle when the roster outgrows the palette.
    pub fn from_palette(name: impl Into<String>, palette: &[&str], slot: usize) -> Self {
        let color = if palette.is_empty() {
            String::new()
        } else {
            palette[slot % palette.len()].to_string()
        };
        Self::new(name, color)
    }
}

impl std::fmt::Display for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Trim a submitted name, rejecting blank ones.
pub fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(GameError::EmptyName);
    }
    Ok(trimmed.to_string())
}

/// Build `count` participants named `{prefix} 1..=count`.
///
/// ```
/// use rust_party::core::participant::default_roster;
///
/// let roster = default_roster("Player", 3, &["#111", "#222"]);
/// assert_eq!(roster[2].name, "Player 3");
/// assert_eq!(roster[2].color, "#111");
/// ```
pub fn default_roster(prefix: &str, count: usize, palette: &[&str]) -> Vec<Participant> {
    (0..count)
        .map(|i| Participant::from_palette(format!("{} {}", prefix, i + 1), palette, i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Alice ").unwrap(), "Alice");
        assert_eq!(validate_name("   "), Err(GameError::EmptyName));
        assert_eq!(validate_name(""), Err(GameError::EmptyName));
    }

    #[test]
    fn test_palette_cycles() {
        let palette = ["#a", "#b", "#c"];
        assert_eq!(Participant::from_palette("x", &palette, 0).color, "#a");
        assert_eq!(Participant::from_palette("x", &palette, 4).color, "#b");
        assert_eq!(Participant::from_palette("x", &[], 4).color, "");
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Participant::new("Bo", "#fff")), "Bo");
    }

    #[test]
    fn test_serialization() {
        let p = Participant::new("Alice", "#ff6b6b");
        let json = serde_json::to_string(&p).unwrap();
        let back: Participant = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }
}
