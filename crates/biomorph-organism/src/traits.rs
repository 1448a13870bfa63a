//! World access traits for organism-world interaction
//!
//! These traits define the interface between organisms and the world,
//! allowing the organism crate to be decoupled from the World implementation.

use crate::organism::Organism;
use crate::types::{CorridorId, OrganismId, Rect};

/// Read-only access to world state
pub trait WorldAccess {
    /// World rectangle organisms must stay inside
    fn bounds(&self) -> Rect;

    /// Organisms (other than `exclude`) whose bounding box overlaps `area`
    fn occupancy_candidates(&self, area: &Rect, exclude: Option<OrganismId>) -> Vec<OrganismId>;

    /// First organism overlapping `area`, if any
    fn occupancy_test(&self, area: &Rect, exclude: Option<OrganismId>) -> Option<OrganismId> {
        self.occupancy_candidates(area, exclude).into_iter().next()
    }

    /// Look up a resident organism
    fn organism(&self, id: OrganismId) -> Option<&Organism>;

    /// Energy photosynthesis may actually take this tick, at most `requested`
    fn photosynthesis_yield(&self, requested: f64) -> f64;

    /// Corridor the organism has entered, if any
    fn corridor_check(&self, organism: &Organism) -> Option<CorridorId>;
}

/// Atmosphere gas pool transactions
pub trait AtmosphereAccess {
    /// Take up to `amount` CO2, returning what was available
    fn consume_co2(&mut self, amount: f64) -> f64;

    fn produce_o2(&mut self, amount: f64);

    /// Return energy to the atmosphere as CO2, consuming the matching O2
    fn release_co2(&mut self, amount: f64);
}

/// Mutable access to the world for organism actions
pub trait WorldMutAccess: WorldAccess + AtmosphereAccess {
    /// Issue a fresh organism id
    fn new_id(&mut self) -> OrganismId;
}
