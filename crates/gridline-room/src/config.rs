//! Room templates and the room state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::RoomError;

/// Cosmetic room names, handed out round-robin as rooms are created.
pub const ROOM_NAMES: [&str; 10] = [
    "Handshake",
    "Null",
    "SEGFAULT",
    "Trojans",
    "Recovery Fail!",
    "Floating Point",
    "Panic",
    "Logic Bomb",
    "Deadlock",
    "Rootkit",
];

/// Figures are stored as `u8`, so a room can't seat more players than this.
pub const MAX_CAPACITY: usize = u8::MAX as usize;

/// Largest board edge. Every move ships the whole board to each player.
pub const MAX_CELL_COUNT: usize = 64;

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

/// A named game archetype: board size, line length to win, seat count.
///
/// Templates are fixed at process start; every room keeps the template it
/// was created from for its whole life. Outside this crate a template is
/// built with [`Template::new`] or deserialized and then checked by
/// [`TemplateCatalog::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Human-readable label, used in logs.
    pub(crate) name: String,

    /// Board edge length; the board has `cell_count * cell_count` cells.
    pub(crate) cell_count: usize,

    /// How many identical figures in a line win the game.
    pub(crate) win_count: usize,

    /// Number of seats.
    pub(crate) capacity: usize,
}

impl Template {
    /// Creates a validated template.
    pub fn new(
        name: impl Into<String>,
        cell_count: usize,
        win_count: usize,
        capacity: usize,
    ) -> Result<Self, RoomError> {
        let template = Self {
            name: name.into(),
            cell_count,
            win_count,
            capacity,
        };
        template.validate()?;
        Ok(template)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    pub fn win_count(&self) -> usize {
        self.win_count
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Checks `1 <= cell_count <= 64`, `1 <= win_count <= cell_count` and
    /// `1 <= capacity <= 255`.
    pub fn validate(&self) -> Result<(), RoomError> {
        if self.cell_count == 0 || self.cell_count > MAX_CELL_COUNT {
            return Err(RoomError::InvalidTemplate(format!(
                "{}: cell_count {} must be within 1..={MAX_CELL_COUNT}",
                self.name, self.cell_count
            )));
        }
        if self.win_count == 0 || self.win_count > self.cell_count {
            return Err(RoomError::InvalidTemplate(format!(
                "{}: win_count {} must be within 1..={}",
                self.name, self.win_count, self.cell_count
            )));
        }
        if self.capacity == 0 || self.capacity > MAX_CAPACITY {
            return Err(RoomError::InvalidTemplate(format!(
                "{}: capacity {} must be within 1..={MAX_CAPACITY}",
                self.name, self.capacity
            )));
        }
        Ok(())
    }
}

/// Index of a template inside its [`TemplateCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(pub usize);

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TemplateCatalog
// ---------------------------------------------------------------------------

/// The immutable, non-empty list of templates the pool keeps rooms for.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    templates: Vec<Template>,
}

impl TemplateCatalog {
    /// Validates every template and builds the catalog.
    pub fn new(templates: Vec<Template>) -> Result<Self, RoomError> {
        if templates.is_empty() {
            return Err(RoomError::InvalidTemplate(
                "catalog must contain at least one template".into(),
            ));
        }
        for template in &templates {
            template.validate()?;
        }
        Ok(Self { templates })
    }

    /// Looks up a template by id.
    pub fn get(&self, id: TemplateId) -> Option<&Template> {
        self.templates.get(id.0)
    }

    /// Iterates templates in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (TemplateId, &Template)> {
        self.templates
            .iter()
            .enumerate()
            .map(|(idx, t)| (TemplateId(idx), t))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for TemplateCatalog {
    /// Classic 3×3 for two, 5×5 four-in-a-row for two, 5×5 three-in-a-row
    /// for three.
    fn default() -> Self {
        let template = |name: &str, cell_count, win_count, capacity| Template {
            name: name.to_string(),
            cell_count,
            win_count,
            capacity,
        };
        Self {
            templates: vec![
                template("classic", 3, 3, 2),
                template("four-in-a-row", 5, 4, 2),
                template("three-way", 5, 3, 3),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// Open ──(last seat taken)──→ Playing ──(win / draw)──→ Finished
///                                │
///                                └──(fewer than 2 left)──→ Abandoned
/// ```
///
/// - **Open**: accepting joins, no move has been made.
/// - **Playing**: every seat was filled; turns rotate through the seats.
/// - **Finished**: a line was completed or the board filled up.
/// - **Abandoned**: too many players left to continue.
///
/// `Finished` and `Abandoned` are terminal; a room in either state is
/// retired from the pool straight away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    Open,
    Playing,
    Finished,
    Abandoned,
}

impl RoomState {
    /// Returns `true` if the room is accepting new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns `true` if moves are being played.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Returns `true` for states the room never leaves.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Abandoned)
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Open, Self::Playing)
                | (Self::Playing, Self::Finished)
                | (Self::Playing, Self::Abandoned)
        )
    }
}

impl fmt::Display for RoomState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::Playing => write!(f, "Playing"),
            Self::Finished => write!(f, "Finished"),
            Self::Abandoned => write!(f, "Abandoned"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_state_can_transition_to() {
        assert!(RoomState::Open.can_transition_to(RoomState::Playing));
        assert!(RoomState::Playing.can_transition_to(RoomState::Finished));
        assert!(RoomState::Playing.can_transition_to(RoomState::Abandoned));
        assert!(!RoomState::Open.can_transition_to(RoomState::Finished));
        assert!(!RoomState::Finished.can_transition_to(RoomState::Open));
        assert!(!RoomState::Abandoned.can_transition_to(RoomState::Playing));
    }

    #[test]
    fn test_room_state_predicates() {
        assert!(RoomState::Open.is_joinable());
        assert!(!RoomState::Playing.is_joinable());
        assert!(RoomState::Playing.is_active());
        assert!(!RoomState::Open.is_active());
        assert!(RoomState::Finished.is_terminal());
        assert!(RoomState::Abandoned.is_terminal());
        assert!(!RoomState::Playing.is_terminal());
    }

    #[test]
    fn test_room_state_display() {
        assert_eq!(RoomState::Open.to_string(), "Open");
        assert_eq!(RoomState::Abandoned.to_string(), "Abandoned");
    }

    #[test]
    fn test_template_new_rejects_win_count_above_board() {
        assert!(Template::new("bad", 3, 4, 2).is_err());
        assert!(Template::new("bad", 3, 0, 2).is_err());
    }

    #[test]
    fn test_template_new_rejects_zero_or_huge_capacity() {
        assert!(Template::new("bad", 3, 3, 0).is_err());
        assert!(Template::new("bad", 3, 3, 256).is_err());
        assert!(Template::new("ok", 3, 3, 255).is_ok());
    }

    #[test]
    fn test_template_new_rejects_oversized_board() {
        assert!(Template::new("huge", usize::MAX, 1, 2).is_err());
        assert!(Template::new("wide", MAX_CELL_COUNT + 1, 3, 2).is_err());
        assert!(Template::new("max", MAX_CELL_COUNT, 5, 2).is_ok());
    }

    #[test]
    fn test_catalog_new_rejects_oversized_deserialized_template() {
        let t: Template = serde_json::from_str(
            r#"{"name":"huge","cell_count":4294967296,"win_count":1,"capacity":2}"#,
        )
        .unwrap();
        assert!(matches!(
            TemplateCatalog::new(vec![t]),
            Err(RoomError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn test_template_new_accepts_single_cell_board() {
        let t = Template::new("dot", 1, 1, 1).unwrap();
        assert_eq!(t.cell_count(), 1);
    }

    #[test]
    fn test_catalog_new_rejects_empty() {
        assert!(TemplateCatalog::new(Vec::new()).is_err());
    }

    #[test]
    fn test_catalog_new_validates_every_template() {
        let good = Template::new("ok", 3, 3, 2).unwrap();
        let bad = Template {
            name: "bad".into(),
            cell_count: 2,
            win_count: 3,
            capacity: 2,
        };
        assert!(TemplateCatalog::new(vec![good, bad]).is_err());
    }

    #[test]
    fn test_catalog_default_matches_classic_lineup() {
        let catalog = TemplateCatalog::default();
        let shapes: Vec<_> = catalog
            .iter()
            .map(|(_, t)| (t.cell_count, t.win_count, t.capacity))
            .collect();
        assert_eq!(shapes, vec![(3, 3, 2), (5, 4, 2), (5, 3, 3)]);
        for (_, t) in catalog.iter() {
            t.validate().unwrap();
        }
    }

    #[test]
    fn test_template_deserializes_from_json() {
        let t: Template = serde_json::from_str(
            r#"{"name":"big","cell_count":9,"win_count":5,"capacity":4}"#,
        )
        .unwrap();
        assert_eq!(t, Template::new("big", 9, 5, 4).unwrap());
    }
}
