//! Plant / area / line / machine lookups and production units.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A plant (top of the hierarchy).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Plant {
    /// Row ID.
    pub id: i64,
    /// Short code used in PU codes.
    pub code: String,
    /// Display name.
    pub name: String,
}

/// An area inside a plant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    /// Row ID.
    pub id: i64,
    /// Parent plant.
    pub plant_id: i64,
    /// Short code.
    pub code: String,
    /// Display name.
    pub name: String,
}

/// A production line inside an area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    /// Row ID.
    pub id: i64,
    /// Parent area.
    pub area_id: i64,
    /// Short code.
    pub code: String,
    /// Display name.
    pub name: String,
}

/// A machine on a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    /// Row ID.
    pub id: i64,
    /// Parent line.
    pub line_id: i64,
    /// Short code.
    pub code: String,
    /// Display name.
    pub name: String,
}

/// A production unit, addressed by `PLANT-AREA-LINE-MACHINE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductionUnit {
    /// Row ID.
    pub id: i64,
    /// Composite code.
    pub pucode: String,
    /// Plant code.
    pub plant: String,
    /// Area code.
    pub area: String,
    /// Line code.
    pub line: String,
    /// Machine code.
    pub machine: String,
    /// Display name.
    pub name: String,
    /// Whether the unit can be selected for new tickets.
    pub is_active: bool,
}

/// Data for registering a production unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProductionUnit {
    /// Plant code.
    pub plant: String,
    /// Area code.
    pub area: String,
    /// Line code.
    pub line: String,
    /// Machine code.
    pub machine: String,
    /// Display name.
    pub name: String,
}

impl NewProductionUnit {
    /// The composite code for this unit.
    pub fn pucode(&self) -> String {
        [&self.plant, &self.area, &self.line, &self.machine]
            .iter()
            .map(|part| part.trim().to_uppercase())
            .collect::<Vec<_>>()
            .join("-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pucode_is_joined_and_normalized() {
        let unit = NewProductionUnit {
            plant: "mt1".into(),
            area: "press".into(),
            line: "L01".into(),
            machine: " m07 ".into(),
            name: "Press 7".into(),
        };
        assert_eq!(unit.pucode(), "MT1-PRESS-L01-M07");
    }
}
