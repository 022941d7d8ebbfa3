//! Input records and table loading

pub mod infomap;
pub mod tables;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Categorical observation type (the manual classification code)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(pub u32);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A labeled observation located in the network's coordinate system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationPoint {
    /// Unique row identifier
    pub id: u32,

    /// Planar x coordinate
    pub x: f64,

    /// Planar y coordinate
    pub y: f64,

    /// Manually assigned type
    pub label: Label,
}

impl ObservationPoint {
    pub fn new(id: u32, x: f64, y: f64, label: Label) -> Self {
        Self { id, x, y, label }
    }
}
