// 🏷️ Room-Type Classifier - Rules as Data
// Area thresholds per building type, evaluated top to bottom. The first
// bound the area falls strictly below wins.

use crate::parser::BuildingType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Square metres per pyeong
pub const SQM_PER_PYEONG: f64 = 3.3058;

// ============================================================================
// ROOM TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomType {
    MicroStudio,
    Studio,
    TwoRoom,
    ThreeRoom,
    /// Apartment size in pyeong, truncated
    Pyeong(i64),
}

impl RoomType {
    pub fn label(&self) -> String {
        match self {
            RoomType::MicroStudio => "micro-studio".to_string(),
            RoomType::Studio => "studio".to_string(),
            RoomType::TwoRoom => "two-room".to_string(),
            RoomType::ThreeRoom => "three-room".to_string(),
            RoomType::Pyeong(n) => format!("{}-pyeong", n),
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

// ============================================================================
// THRESHOLD RULES
// ============================================================================

/// One bucket: areas strictly below `below` land here
#[derive(Debug, Clone, Copy)]
struct Bound {
    below: f64,
    room_type: RoomType,
}

const DETACHED_RULES: &[Bound] = &[
    Bound { below: 30.0, room_type: RoomType::Studio },
    Bound { below: 50.0, room_type: RoomType::TwoRoom },
];

const OFFICETEL_RULES: &[Bound] = &[
    Bound { below: 20.0, room_type: RoomType::MicroStudio },
    Bound { below: 30.0, room_type: RoomType::Studio },
    Bound { below: 40.0, room_type: RoomType::TwoRoom },
];

fn cascade(area: f64, rules: &[Bound], otherwise: RoomType) -> RoomType {
    rules
        .iter()
        .find(|bound| area < bound.below)
        .map(|bound| bound.room_type)
        .unwrap_or(otherwise)
}

/// Classify a unit by exclusive area (m²) and building type.
///
/// An unparseable area arrives here as 0 and lands in the lowest bucket.
pub fn classify(area: f64, building_type: BuildingType) -> RoomType {
    match building_type {
        BuildingType::DetachedMultiUnit => cascade(area, DETACHED_RULES, RoomType::ThreeRoom),
        BuildingType::Officetel => cascade(area, OFFICETEL_RULES, RoomType::ThreeRoom),
        BuildingType::Apartment => RoomType::Pyeong((area / SQM_PER_PYEONG).trunc() as i64),
    }
}
