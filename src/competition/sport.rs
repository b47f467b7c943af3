use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The sports contested in the duel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sport {
    Cycling,
    Running,
    Swimming,
}

impl Sport {
    pub const ALL: [Sport; 3] = [Sport::Cycling, Sport::Running, Sport::Swimming];

    /// Map a fitness provider activity type ("Ride", "TrailRun", ...) onto a sport.
    /// Returns None for activity types that don't count toward the duel,
    /// including indoor trainer sessions (VirtualRide, VirtualRun).
    pub fn from_activity_type(sport_type: &str) -> Option<Sport> {
        match sport_type {
            "Ride" | "MountainBikeRide" | "GravelRide" => Some(Sport::Cycling),
            "Run" | "TrailRun" => Some(Sport::Running),
            "Swim" => Some(Sport::Swimming),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Sport::Cycling => "Cycling",
            Sport::Running => "Running",
            Sport::Swimming => "Swimming",
        }
    }

    /// Display unit and divisor for distances in metres.
    /// Swims read better in metres, everything else in kilometres.
    pub fn distance_unit(&self) -> (&'static str, f64) {
        match self {
            Sport::Swimming => ("m", 1.0),
            Sport::Cycling | Sport::Running => ("km", 1000.0),
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Sport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cycling" => Ok(Sport::Cycling),
            "running" => Ok(Sport::Running),
            "swimming" => Ok(Sport::Swimming),
            _ => Err(format!("Unknown sport: {}", s)),
        }
    }
}
