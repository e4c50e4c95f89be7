//! Endpoint roles and relay directions.

use std::fmt;

use serial_bridge_core::Grammar;

/// How an endpoint obtains its connection.  Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Listens and accepts one client at a time (the field side).
    Passive,
    /// Connects out, with retry, to the controller.
    Active,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Passive => f.write_str("passive"),
            Role::Active => f.write_str("active"),
        }
    }
}

/// One of the two relay directions.
///
/// Each direction reads from one endpoint, accepts one grammar, and writes to
/// the opposite endpoint:
///
/// | Direction         | Source  | Grammar  | Destination |
/// |-------------------|---------|----------|-------------|
/// | `PassiveToActive` | passive | `>OUT:`  | active      |
/// | `ActiveToPassive` | active  | `>SW:`   | passive     |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    PassiveToActive,
    ActiveToPassive,
}

impl Direction {
    pub fn source(self) -> Role {
        match self {
            Direction::PassiveToActive => Role::Passive,
            Direction::ActiveToPassive => Role::Active,
        }
    }

    pub fn destination(self) -> Role {
        match self {
            Direction::PassiveToActive => Role::Active,
            Direction::ActiveToPassive => Role::Passive,
        }
    }

    /// Grammar accepted from this direction's source.
    pub fn grammar(self) -> Grammar {
        match self {
            Direction::PassiveToActive => Grammar::Output,
            Direction::ActiveToPassive => Grammar::Switch,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}→{}", self.source(), self.destination())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directions_are_mirror_images() {
        for dir in [Direction::PassiveToActive, Direction::ActiveToPassive] {
            assert_ne!(dir.source(), dir.destination());
        }
        assert_eq!(
            Direction::PassiveToActive.source(),
            Direction::ActiveToPassive.destination()
        );
    }

    #[test]
    fn test_passive_side_speaks_output_frames() {
        assert_eq!(Direction::PassiveToActive.grammar(), Grammar::Output);
        assert_eq!(Direction::ActiveToPassive.grammar(), Grammar::Switch);
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(Direction::PassiveToActive.to_string(), "passive→active");
        assert_eq!(Role::Active.to_string(), "active");
    }
}
