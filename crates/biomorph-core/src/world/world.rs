//! World - organism arena, atmosphere and the tick stepper

use ahash::HashMap;
use biomorph_organism::morphology::ADULT_STAGE;
use biomorph_organism::{
    contact, AtmosphereAccess, BodyPlan, CorridorId, GeneticCode, LifeOutcome, MoveOutcome,
    Organism, OrganismConfig, OrganismId, Rect, SimContext, SimRng, TouchReport, WorldAccess,
    WorldMutAccess,
};
use biomorph_simulation::{ReactionRegistry, SegmentTypes};
use glam::DVec2;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use std::f64::consts::TAU;

use super::{Atmosphere, OccupancyIndex, PopulationStats};
use crate::config::WorldConfig;

/// Shared state organisms reach through the access traits
struct Environment {
    bounds: Rect,
    corridors: Vec<Rect>,
    atmosphere: Atmosphere,
    drain_subs_divisor: f64,
    next_id: u64,
}

impl Environment {
    fn issue_id(&mut self) -> OrganismId {
        self.next_id += 1;
        OrganismId::from_raw(self.next_id)
    }
}

/// View of the world handed to the organism currently checked out of its
/// slot. That organism is invisible to lookups through this view.
struct Surroundings<'a> {
    slots: &'a [Option<Organism>],
    index: &'a HashMap<OrganismId, usize>,
    occupancy: &'a OccupancyIndex,
    env: &'a mut Environment,
}

impl<'a> Surroundings<'a> {
    fn new(
        slots: &'a [Option<Organism>],
        index: &'a HashMap<OrganismId, usize>,
        occupancy: &'a OccupancyIndex,
        env: &'a mut Environment,
    ) -> Self {
        Self {
            slots,
            index,
            occupancy,
            env,
        }
    }
}

impl WorldAccess for Surroundings<'_> {
    fn bounds(&self) -> Rect {
        self.env.bounds
    }

    fn occupancy_candidates(&self, area: &Rect, exclude: Option<OrganismId>) -> Vec<OrganismId> {
        self.occupancy.query(area, exclude)
    }

    fn organism(&self, id: OrganismId) -> Option<&Organism> {
        self.index
            .get(&id)
            .and_then(|&i| self.slots.get(i))
            .and_then(Option::as_ref)
    }

    fn photosynthesis_yield(&self, requested: f64) -> f64 {
        let cap = self
            .env
            .atmosphere
            .photosynthesis_cap(self.env.drain_subs_divisor);
        requested.max(0.0).min(cap)
    }

    fn corridor_check(&self, organism: &Organism) -> Option<CorridorId> {
        corridor_at(&self.env.corridors, organism)
    }
}

impl AtmosphereAccess for Surroundings<'_> {
    fn consume_co2(&mut self, amount: f64) -> f64 {
        self.env.atmosphere.consume_co2(amount)
    }

    fn produce_o2(&mut self, amount: f64) {
        self.env.atmosphere.produce_o2(amount);
    }

    fn release_co2(&mut self, amount: f64) {
        self.env.atmosphere.release_co2(amount);
    }
}

impl WorldMutAccess for Surroundings<'_> {
    fn new_id(&mut self) -> OrganismId {
        self.env.issue_id()
    }
}

/// Corridor a living organism's box overlaps, if any
fn corridor_at(corridors: &[Rect], organism: &Organism) -> Option<CorridorId> {
    if !organism.is_alive() {
        return None;
    }
    let bounds = organism.bounds();
    corridors
        .iter()
        .position(|corridor| corridor.intersects(&bounds))
        .map(|i| CorridorId(i as u32))
}

fn record_touch(stats: &mut PopulationStats, report: &TouchReport) {
    for _ in &report.deaths {
        stats.record_death();
    }
    for _ in 0..report.kills {
        stats.record_kill();
    }
    for _ in 0..report.infections {
        stats.record_infection();
    }
}

/// The simulated world: every organism, the atmosphere and the rules
pub struct World {
    config: WorldConfig,
    organism_config: OrganismConfig,
    types: SegmentTypes,
    reactions: ReactionRegistry,

    /// Organism arena; a slot is empty only while its organism is being
    /// stepped or after removal until the next compaction
    slots: Vec<Option<Organism>>,
    index: HashMap<OrganismId, usize>,
    occupancy: OccupancyIndex,

    env: Environment,
    rng: Xoshiro256StarStar,
    stats: PopulationStats,
    tick: u64,
    cap_reached: bool,
}

impl World {
    /// Empty world with the built-in reaction table
    pub fn new(config: WorldConfig, organism_config: OrganismConfig, seed: u64) -> Self {
        let types = SegmentTypes::new();
        let reactions = ReactionRegistry::with_config(&types, &organism_config.reactions);
        let env = Environment {
            bounds: config.bounds(),
            corridors: config.corridors.clone(),
            atmosphere: Atmosphere::new(config.initial_o2, config.initial_co2),
            drain_subs_divisor: organism_config.life.drain_subs_divisor,
            next_id: 0,
        };

        Self {
            config,
            organism_config,
            types,
            reactions,
            slots: Vec::new(),
            index: HashMap::default(),
            occupancy: OccupancyIndex::new(),
            env,
            rng: Xoshiro256StarStar::seed_from_u64(seed),
            stats: PopulationStats::default(),
            tick: 0,
            cap_reached: false,
        }
    }

    /// Place the configured number of random founders
    pub fn populate(&mut self) -> usize {
        let placed = self.spawn_random(self.config.initial_organisms);
        log::info!(
            "World populated with {} organisms ({} x {})",
            placed,
            self.config.width,
            self.config.height
        );
        placed
    }

    /// Place up to `count` founders with random genetic codes
    pub fn spawn_random(&mut self, count: usize) -> usize {
        let energy = self.organism_config.life.initial_energy;
        let mut placed = 0;
        for _ in 0..count {
            let code =
                GeneticCode::random(&mut self.rng, &self.types, &self.organism_config.mutation);
            let Some((position, rotation)) = self.find_free_spot(&code) else {
                continue;
            };
            if self.spawn(code, position, rotation, energy).is_some() {
                placed += 1;
            }
        }
        if placed < count {
            log::warn!("Only {} of {} founders found room", placed, count);
        }
        placed
    }

    /// Place a founder with the given code.
    ///
    /// Its energy is drawn from atmospheric CO2. Returns `None` when the
    /// body would leave the world or overlap another organism.
    pub fn spawn(
        &mut self,
        code: GeneticCode,
        position: DVec2,
        rotation: f64,
        energy: f64,
    ) -> Option<OrganismId> {
        let area = BodyPlan::generate(&code, ADULT_STAGE)
            .local_bounds(rotation)
            .translated(position);
        if !self.env.bounds.contains_rect(&area) || !self.occupancy.query(&area, None).is_empty() {
            return None;
        }

        let drawn = self.env.atmosphere.consume_co2(energy);
        let id = self.env.issue_id();
        let organism = {
            let ctx = SimContext::new(&self.types, &self.reactions, &self.organism_config);
            Organism::new(id, code, position, rotation, drawn, &ctx)
        };
        self.insert(organism);
        self.stats.record_founder();
        log::debug!("{} founded at ({:.1}, {:.1})", id, position.x, position.y);
        Some(id)
    }

    fn find_free_spot(&mut self, code: &GeneticCode) -> Option<(DVec2, f64)> {
        let bounds = self.env.bounds;
        let plan = BodyPlan::generate(code, ADULT_STAGE);
        for _ in 0..self.config.spawn_attempts.max(1) {
            let position = DVec2::new(
                self.rng.range_f64(bounds.min.x, bounds.max.x),
                self.rng.range_f64(bounds.min.y, bounds.max.y),
            );
            let rotation = self.rng.range_f64(0.0, TAU);
            let area = plan.local_bounds(rotation).translated(position);
            if bounds.contains_rect(&area) && self.occupancy.query(&area, None).is_empty() {
                return Some((position, rotation));
            }
        }
        None
    }

    fn insert(&mut self, organism: Organism) {
        let id = organism.id();
        self.index.insert(id, self.slots.len());
        self.occupancy.update(id, &organism.bounds());
        self.slots.push(Some(organism));
    }

    /// Advance every organism by one tick, in arena order.
    ///
    /// Children born during the tick join the arena immediately (so later
    /// placements see them) but are first stepped on the next tick.
    pub fn step(&mut self) {
        self.tick += 1;
        let tick = self.tick;

        let Self {
            config,
            organism_config,
            types,
            reactions,
            slots,
            index,
            occupancy,
            env,
            rng,
            stats,
            cap_reached,
            ..
        } = self;
        let ctx = SimContext::new(types, reactions, organism_config);
        let living_before = stats.population;
        let mut removed = false;

        for i in 0..slots.len() {
            let Some(mut organism) = slots[i].take() else {
                continue;
            };
            let id = organism.id();

            // ===== MOVEMENT =====
            let outcome =
                organism.begin_tick(&mut Surroundings::new(slots, index, occupancy, env), &ctx);
            match outcome {
                MoveOutcome::Collided(hit) => {
                    let other_slot = index.get(&hit.other).copied();
                    if let Some(mut other) = other_slot.and_then(|j| slots[j].take()) {
                        let report = contact::collide(
                            &mut organism,
                            &mut other,
                            &hit,
                            &mut env.atmosphere,
                            rng,
                            &ctx,
                        );
                        record_touch(stats, &report);
                        if let Some(j) = other_slot {
                            slots[j] = Some(other);
                        }
                    }
                }
                MoveOutcome::Migrated(corridor) => {
                    log::info!("{} left the world through corridor {}", id, corridor.0);
                    stats.record_migration();
                    index.remove(&id);
                    occupancy.remove(id);
                    removed = true;
                    continue;
                }
                MoveOutcome::Died => {
                    log::debug!("{} died with a degenerate body", id);
                    stats.record_death();
                }
                MoveOutcome::Moved | MoveOutcome::OutOfBounds => {}
            }

            // ===== LIFECYCLE =====
            match organism.end_tick(&mut env.atmosphere, &ctx) {
                LifeOutcome::Living => {}
                LifeOutcome::Died => {
                    log::debug!(
                        "{} died at age {} (generation {})",
                        id,
                        organism.age(),
                        organism.generation()
                    );
                    stats.record_death();
                }
                LifeOutcome::Decayed => {
                    index.remove(&id);
                    occupancy.remove(id);
                    removed = true;
                    continue;
                }
                LifeOutcome::ReadyToReproduce if stats.population >= config.max_population => {
                    if !*cap_reached {
                        log::warn!(
                            "Population cap of {} reached at tick {}",
                            config.max_population,
                            tick
                        );
                        *cap_reached = true;
                    }
                }
                LifeOutcome::ReadyToReproduce => {
                    *cap_reached = false;
                    let child = organism.reproduce(
                        &mut Surroundings::new(slots, index, occupancy, env),
                        rng,
                        &ctx,
                    );
                    if let Some(child) = child {
                        stats.record_birth();
                        index.insert(child.id(), slots.len());
                        occupancy.update(child.id(), &child.bounds());
                        slots.push(Some(child));
                    }
                }
            }

            occupancy.update(id, &organism.bounds());
            slots[i] = Some(organism);
        }

        if removed {
            slots.retain(Option::is_some);
            index.clear();
            for (i, organism) in slots.iter().enumerate() {
                if let Some(organism) = organism {
                    index.insert(organism.id(), i);
                }
            }
        }

        if living_before > 0 && stats.population == 0 {
            log::info!("Population went extinct at tick {}", tick);
        }
    }

    /// Step up to `ticks` times, stopping early on extinction. Returns the
    /// number of ticks run.
    pub fn run(&mut self, ticks: u64) -> u64 {
        for done in 0..ticks {
            if self.is_extinct() {
                return done;
            }
            self.step();
        }
        ticks
    }

    // ===== ACCESSORS =====

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn stats(&self) -> &PopulationStats {
        &self.stats
    }

    /// Living organisms
    pub fn population(&self) -> usize {
        self.stats.population
    }

    pub fn is_extinct(&self) -> bool {
        self.stats.is_extinct()
    }

    pub fn atmosphere(&self) -> &Atmosphere {
        &self.env.atmosphere
    }

    pub fn bounds(&self) -> Rect {
        self.env.bounds
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn organism_config(&self) -> &OrganismConfig {
        &self.organism_config
    }

    pub fn types(&self) -> &SegmentTypes {
        &self.types
    }

    pub fn reactions(&self) -> &ReactionRegistry {
        &self.reactions
    }

    /// Replace or extend the reaction table between ticks
    pub fn reactions_mut(&mut self) -> &mut ReactionRegistry {
        &mut self.reactions
    }

    pub fn organism(&self, id: OrganismId) -> Option<&Organism> {
        self.index
            .get(&id)
            .and_then(|&i| self.slots.get(i))
            .and_then(Option::as_ref)
    }

    pub fn organism_mut(&mut self, id: OrganismId) -> Option<&mut Organism> {
        self.index
            .get(&id)
            .and_then(|&i| self.slots.get_mut(i))
            .and_then(Option::as_mut)
    }

    /// Every organism in the arena, corpses included
    pub fn organisms(&self) -> impl Iterator<Item = &Organism> {
        self.slots.iter().flatten()
    }

    /// Number of organisms in the arena, corpses included
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
