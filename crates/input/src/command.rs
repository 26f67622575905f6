use glam::IVec3;
use serde::{Deserialize, Serialize};

/// One of the eight grid directions. North is towards smaller y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// Cell offset of one step; never changes the layer.
    pub fn delta(self) -> IVec3 {
        let (x, y) = match self {
            Direction::North => (0, -1),
            Direction::NorthEast => (1, -1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, 1),
            Direction::South => (0, 1),
            Direction::SouthWest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, -1),
        };
        IVec3::new(x, y, 0)
    }
}

/// A high-level request the session understands. Keys are mapped to
/// commands; the session never sees raw keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Move(Direction),
    ZoomIn,
    ZoomOut,
    ToggleOverlay,
    Save,
    Load,
}

impl Command {
    /// Whether a successful run of this command changes what is on screen.
    pub fn requires_render(self) -> bool {
        !matches!(self, Command::Save)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eight_distinct_unit_steps() {
        let deltas: std::collections::HashSet<_> =
            Direction::ALL.iter().map(|d| d.delta()).collect();
        assert_eq!(deltas.len(), 8);
        for d in deltas {
            assert!(d.x.abs() <= 1 && d.y.abs() <= 1 && d.z == 0);
            assert_ne!(d, IVec3::ZERO);
        }
    }

    #[test]
    fn only_save_leaves_the_view_alone() {
        assert!(!Command::Save.requires_render());
        assert!(Command::Load.requires_render());
        assert!(Command::ToggleOverlay.requires_render());
        assert!(Command::Move(Direction::West).requires_render());
    }

    #[test]
    fn north_is_up() {
        assert_eq!(Direction::North.delta(), IVec3::new(0, -1, 0));
        assert_eq!(Direction::SouthEast.delta(), IVec3::new(1, 1, 0));
    }
}
