//! Router configuration: cost parameters, criteria and edge allowlists.

use crate::graph::EdgeClass;

/// Which edge kinds a search may traverse.
///
/// Restricted searches (walk-only transfer resolution, in-vehicle
/// sub-searches) use the same router with a narrower allowlist, so the
/// dominance and cost rules are identical everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeAllowlist(u8);

impl EdgeAllowlist {
    /// Every edge kind.
    pub fn all() -> Self {
        EdgeAllowlist(EdgeClass::ALL.iter().fold(0, |bits, c| bits | c.bit()))
    }

    /// Street, access and egress edges: walking without transit.
    pub fn walk_only() -> Self {
        Self::of(&[EdgeClass::Street, EdgeClass::Access, EdgeClass::Egress])
    }

    /// Transit edges only; access and egress are disabled entirely.
    pub fn in_vehicle_only() -> Self {
        Self::of(&[
            EdgeClass::Board,
            EdgeClass::Ride,
            EdgeClass::Dwell,
            EdgeClass::Alight,
            EdgeClass::Transfer,
        ])
    }

    pub fn of(classes: &[EdgeClass]) -> Self {
        EdgeAllowlist(classes.iter().fold(0, |bits, c| bits | c.bit()))
    }

    pub fn allows(self, class: EdgeClass) -> bool {
        self.0 & class.bit() != 0
    }

    pub fn without(self, class: EdgeClass) -> Self {
        EdgeAllowlist(self.0 & !class.bit())
    }
}

impl Default for EdgeAllowlist {
    fn default() -> Self {
        Self::all()
    }
}

/// Criteria tracked besides time and number of boardings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Criteria {
    /// Also minimise walked distance.
    pub walk_distance: bool,
}

/// Search direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Depart at the given time, minimise arrival.
    #[default]
    Forward,
    /// Arrive by the given time, maximise departure.
    Backward,
}

/// Configuration parameters for the router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Walking speed on street edges (km/h).
    pub walk_speed_kmh: f64,

    /// Seconds needed before a departure to board it.
    pub board_penalty_secs: i64,

    /// Seconds spent getting off a vehicle.
    pub alight_penalty_secs: i64,

    /// Additional criteria.
    pub criteria: Criteria,

    /// Edge kinds the search may use.
    pub allowlist: EdgeAllowlist,
}

impl RouterConfig {
    /// Create a configuration with the given cost parameters and all edges
    /// allowed.
    pub fn new(walk_speed_kmh: f64, board_penalty_secs: i64, alight_penalty_secs: i64) -> Self {
        Self {
            walk_speed_kmh,
            board_penalty_secs,
            alight_penalty_secs,
            criteria: Criteria::default(),
            allowlist: EdgeAllowlist::all(),
        }
    }

    /// The same costs restricted to walking.
    pub fn walk_only(&self) -> Self {
        Self {
            allowlist: EdgeAllowlist::walk_only(),
            ..self.clone()
        }
    }

    pub fn with_allowlist(mut self, allowlist: EdgeAllowlist) -> Self {
        self.allowlist = allowlist;
        self
    }

    pub fn with_criteria(mut self, criteria: Criteria) -> Self {
        self.criteria = criteria;
        self
    }

    /// Walking speed in millimetres per second, at least 1.
    pub fn walk_speed_mm_per_sec(&self) -> u64 {
        ((self.walk_speed_kmh * 1_000_000.0 / 3600.0).round() as u64).max(1)
    }

    /// Seconds needed to walk `length_mm`, rounded up.
    pub fn walk_secs(&self, length_mm: u64) -> i64 {
        length_mm.div_ceil(self.walk_speed_mm_per_sec()) as i64
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new(5.0, 0, 0)
    }
}
