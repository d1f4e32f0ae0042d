use serde::{Deserialize, Serialize};

/// Which way a message is translated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "eng_to_doggo")]
    EngToDoggo,
    #[serde(rename = "doggo_to_eng")]
    DoggoToEng,
}

impl Direction {
    /// Wire name sent in the `direction` form field
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::EngToDoggo => "eng_to_doggo",
            Direction::DoggoToEng => "doggo_to_eng",
        }
    }

    /// Parse a wire name. Exact match only, the backend is case-sensitive.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "eng_to_doggo" => Some(Direction::EngToDoggo),
            "doggo_to_eng" => Some(Direction::DoggoToEng),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn all() -> Vec<Direction> {
        vec![Direction::EngToDoggo, Direction::DoggoToEng]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Direction::EngToDoggo => "English → Doggo",
            Direction::DoggoToEng => "Doggo → English",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Direction::EngToDoggo => Direction::DoggoToEng,
            Direction::DoggoToEng => Direction::EngToDoggo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_round_trip() {
        for direction in Direction::all() {
            assert_eq!(Direction::from_str(direction.as_str()), Some(direction));
        }
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        assert_eq!(Direction::from_str("cat_to_eng"), None);
        assert_eq!(Direction::from_str("ENG_TO_DOGGO"), None);
        assert_eq!(Direction::from_str(""), None);
    }

    #[test]
    fn test_toggle() {
        assert_eq!(Direction::EngToDoggo.toggle(), Direction::DoggoToEng);
        assert_eq!(Direction::DoggoToEng.toggle().toggle(), Direction::DoggoToEng);
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&Direction::DoggoToEng).unwrap();
        assert_eq!(json, "\"doggo_to_eng\"");
    }
}
