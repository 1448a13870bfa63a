//! Living organism state and per-tick lifecycle
//!
//! A tick is split in two so the world can resolve contacts in between:
//! [`Organism::begin_tick`] runs growth, timers, photosynthesis, friction and
//! the tentative move; [`Organism::end_tick`] runs respiration, ageing and
//! death. Reproduction is requested by `end_tick` and carried out by
//! [`Organism::reproduce`] once the world has checked its population cap.

use crate::config::SimContext;
use crate::genome::GeneticCode;
use crate::morphology::{BodyPlan, ADULT_STAGE, NEWBORN_STAGE};
use crate::physics::{self, Contact, Motion};
use crate::rng_trait::SimRng;
use crate::traits::{AtmosphereAccess, WorldMutAccess};
use crate::types::{CorridorId, OrganismId, Rect};
use biomorph_simulation::{OrganismFlags, Recolor, SegmentType, SegmentTypes};
use glam::DVec2;
use std::f64::consts::TAU;

/// Result of the movement half of a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveOutcome {
    /// Move committed
    Moved,
    /// Body would leave the world; velocity reflected, move rolled back
    OutOfBounds,
    /// Move rolled back because of a contact
    Collided(Contact),
    /// Entered a migration corridor and should leave the world
    Migrated(CorridorId),
    /// Killed during the move (degenerate body)
    Died,
}

/// Result of the lifecycle half of a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeOutcome {
    Living,
    /// Has enough energy to reproduce
    ReadyToReproduce,
    /// Died this tick
    Died,
    /// Corpse fully decayed and should be removed
    Decayed,
}

/// An organism living in the world
#[derive(Debug, Clone)]
pub struct Organism {
    id: OrganismId,
    parent: Option<OrganismId>,
    /// Founder of this family line
    lineage: OrganismId,
    generation: u32,

    code: GeneticCode,
    infecting_code: Option<GeneticCode>,

    body: BodyPlan,
    pub motion: Motion,
    energy: f64,

    /// Age in age units
    age: u32,
    ticks_in_age: u32,
    ticks_alive: u64,

    /// Effective type of each segment (diverges from the genes on damage)
    segment_types: Vec<SegmentType>,
    /// Transient state bits (never genetic)
    state: OrganismFlags,
    display: Option<Recolor>,
    freeze_ticks: u32,
    /// Ticks damaged regenerating segments have been growing back
    regrowth_ticks: u32,
    /// Touched another organism since the last photosynthesis
    crowded: bool,

    pub children: u32,
    pub kills: u32,
    pub infections: u32,
    /// Attacks stopped by a shield
    pub blocks: u32,

    world_segments: Vec<(DVec2, DVec2)>,
    bounds: Rect,
}

impl Organism {
    /// Founder of a new lineage
    pub fn new(
        id: OrganismId,
        code: GeneticCode,
        position: DVec2,
        rotation: f64,
        energy: f64,
        ctx: &SimContext<'_>,
    ) -> Self {
        Self::build(id, None, id, 0, code, position, rotation, energy, ADULT_STAGE, ctx)
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        id: OrganismId,
        parent: Option<OrganismId>,
        lineage: OrganismId,
        generation: u32,
        mut code: GeneticCode,
        position: DVec2,
        rotation: f64,
        energy: f64,
        growth_stage: u8,
        ctx: &SimContext<'_>,
    ) -> Self {
        let body = BodyPlan::generate(&code, growth_stage);
        let segment_types: Vec<SegmentType> =
            body.segments.iter().map(|s| s.segment_type).collect();

        let gold = segment_types
            .iter()
            .filter(|&&t| ctx.types.get(t).longevity)
            .count();
        let divisor = ctx.config.reactions.gold_divisor;
        if gold > 0 && divisor > 0.0 {
            code.extend_max_age((gold as f64 / divisor) as u32);
        }

        let mut organism = Self {
            id,
            parent,
            lineage,
            generation,
            code,
            infecting_code: None,
            body,
            motion: Motion {
                position,
                rotation,
                ..Default::default()
            },
            energy: energy.max(0.0),
            age: 0,
            ticks_in_age: 0,
            ticks_alive: 0,
            segment_types,
            state: OrganismFlags::empty(),
            display: None,
            freeze_ticks: 0,
            regrowth_ticks: 0,
            crowded: false,
            children: 0,
            kills: 0,
            infections: 0,
            blocks: 0,
            world_segments: Vec::new(),
            bounds: Rect::new(position, position),
        };
        organism.place();
        organism
    }

    /// Recompute the cached world-space segments and bounding box
    fn place(&mut self) {
        self.world_segments = self
            .body
            .world_segments(self.motion.position, self.motion.rotation);
        self.bounds = Rect::enclosing(self.world_segments.iter().flat_map(|&(a, b)| [a, b]));
    }

    // ===== ACCESSORS =====

    pub fn id(&self) -> OrganismId {
        self.id
    }

    pub fn parent(&self) -> Option<OrganismId> {
        self.parent
    }

    pub fn lineage(&self) -> OrganismId {
        self.lineage
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn code(&self) -> &GeneticCode {
        &self.code
    }

    pub fn infecting_code(&self) -> Option<&GeneticCode> {
        self.infecting_code.as_ref()
    }

    pub fn body(&self) -> &BodyPlan {
        &self.body
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn mass(&self) -> f64 {
        self.body.mass
    }

    pub fn inertia(&self) -> f64 {
        self.body.inertia
    }

    pub fn growth_stage(&self) -> u8 {
        self.body.growth_stage
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn world_segments(&self) -> &[(DVec2, DVec2)] {
        &self.world_segments
    }

    pub fn segment_count(&self) -> usize {
        self.segment_types.len()
    }

    pub fn segment_length(&self, index: usize) -> f64 {
        self.body.segments.get(index).map(|s| s.length).unwrap_or(0.0)
    }

    pub fn segment_lengths(&self) -> Vec<f64> {
        self.body.segments.iter().map(|s| s.length).collect()
    }

    /// Effective type of a segment
    pub fn segment_type(&self, index: usize) -> SegmentType {
        self.segment_types.get(index).copied().unwrap_or_default()
    }

    pub fn segment_types(&self) -> &[SegmentType] {
        &self.segment_types
    }

    /// Type the genes say a segment should have
    pub fn genetic_type(&self, index: usize) -> SegmentType {
        self.body
            .segments
            .get(index)
            .map(|s| s.segment_type)
            .unwrap_or_default()
    }

    /// Type shown for a segment, honoring a transient recolor
    pub fn display_type(&self, index: usize) -> SegmentType {
        match self.display {
            Some(recolor) => recolor.to,
            None => self.segment_type(index),
        }
    }

    /// Genetic traits and transient state together
    pub fn contact_flags(&self) -> OrganismFlags {
        self.code.traits() | self.state
    }

    pub fn state(&self) -> OrganismFlags {
        self.state
    }

    pub fn is_alive(&self) -> bool {
        !self.state.contains(OrganismFlags::DEAD)
    }

    pub fn is_frozen(&self) -> bool {
        self.state.contains(OrganismFlags::FROZEN)
    }

    pub fn is_infected(&self) -> bool {
        self.state.contains(OrganismFlags::INFECTED)
    }

    pub fn is_dodging(&self) -> bool {
        self.state.contains(OrganismFlags::DODGING)
    }

    pub fn is_crowded(&self) -> bool {
        self.crowded
    }

    /// Whether `other` shares a parent with this organism
    pub fn is_sibling_of(&self, other: &Organism) -> bool {
        self.parent.is_some() && self.parent == other.parent && self.id != other.id
    }

    /// Whether one of the two is the other's parent
    pub fn is_parent_or_child_of(&self, other: &Organism) -> bool {
        self.parent == Some(other.id) || other.parent == Some(self.id)
    }

    // ===== ENERGY =====

    /// Pay `amount` in full or not at all; paid energy returns to the
    /// atmosphere
    pub fn try_spend<A: AtmosphereAccess + ?Sized>(&mut self, amount: f64, atmosphere: &mut A) -> bool {
        if amount <= 0.0 {
            return true;
        }
        if self.energy < amount {
            return false;
        }
        self.energy -= amount;
        atmosphere.release_co2(amount);
        true
    }

    /// Remove up to `amount`, returning what was taken
    pub fn take_energy(&mut self, amount: f64) -> f64 {
        let taken = amount.clamp(0.0, self.energy);
        self.energy -= taken;
        taken
    }

    pub fn add_energy(&mut self, amount: f64) {
        self.energy += amount.max(0.0);
    }

    // ===== STATE CHANGES =====

    /// Show `recolor.to` for `recolor.ticks` ticks
    pub fn recolor(&mut self, recolor: Recolor) {
        if recolor.ticks > 0 && self.is_alive() {
            self.display = Some(recolor);
        }
    }

    /// Move a healthy segment to its damaged variant
    pub fn damage_segment(&mut self, index: usize, types: &SegmentTypes) -> bool {
        self.alter_segment(index, types.get(self.genetic_type(index)).damaged_variant)
    }

    /// Move a healthy segment to its poisoned variant, or its damaged one
    /// when the type cannot be poisoned
    pub fn poison_segment(&mut self, index: usize, types: &SegmentTypes) -> bool {
        let def = types.get(self.genetic_type(index));
        self.alter_segment(index, def.poisoned_variant.or(def.damaged_variant))
    }

    fn alter_segment(&mut self, index: usize, variant: Option<SegmentType>) -> bool {
        let Some(variant) = variant else {
            return false;
        };
        if !self.is_alive() || self.segment_type(index) != self.genetic_type(index) {
            return false;
        }
        self.segment_types[index] = variant;
        true
    }

    /// Freeze every healthy segment that has a frozen variant
    pub fn freeze(&mut self, ticks: u32, types: &SegmentTypes) -> bool {
        if !self.is_alive() || ticks == 0 {
            return false;
        }
        for i in 0..self.segment_types.len() {
            let genetic = self.genetic_type(i);
            if self.segment_types[i] == genetic {
                if let Some(frozen) = types.get(genetic).frozen_variant {
                    self.segment_types[i] = frozen;
                }
            }
        }
        self.state.insert(OrganismFlags::FROZEN);
        self.freeze_ticks = self.freeze_ticks.max(ticks);
        true
    }

    /// Return frozen segments to their genetic type
    pub fn thaw(&mut self, types: &SegmentTypes) {
        for i in 0..self.segment_types.len() {
            let genetic = self.genetic_type(i);
            if types.get(genetic).frozen_variant == Some(self.segment_types[i]) {
                self.segment_types[i] = genetic;
            }
        }
        self.state.remove(OrganismFlags::FROZEN);
        self.freeze_ticks = 0;
    }

    /// Indices of segments altered by damage or poison (not by freezing)
    fn damaged_segments<'a>(&'a self, types: &'a SegmentTypes) -> impl Iterator<Item = usize> + 'a {
        (0..self.segment_types.len()).filter(move |&i| {
            let genetic = self.genetic_type(i);
            let current = self.segment_types[i];
            current != genetic && types.get(genetic).frozen_variant != Some(current)
        })
    }

    /// Total length of damaged segments
    pub fn damaged_length(&self, types: &SegmentTypes) -> f64 {
        self.damaged_segments(types)
            .map(|i| self.segment_length(i))
            .sum()
    }

    /// Restore damaged segments to their genetic type, returning how many
    pub fn heal(&mut self, types: &SegmentTypes) -> usize {
        if !self.is_alive() {
            return 0;
        }
        let damaged: Vec<usize> = self.damaged_segments(types).collect();
        for &i in &damaged {
            self.segment_types[i] = self.genetic_type(i);
        }
        damaged.len()
    }

    /// Attach a foreign code to be expressed at the next reproduction
    pub fn infect(&mut self, payload: GeneticCode) -> bool {
        if !self.is_alive() || self.is_infected() {
            return false;
        }
        self.infecting_code = Some(payload);
        self.state.insert(OrganismFlags::INFECTED);
        true
    }

    pub fn cure(&mut self) -> bool {
        if !self.is_infected() {
            return false;
        }
        self.infecting_code = None;
        self.state.remove(OrganismFlags::INFECTED);
        true
    }

    /// Code spread by an infection from this organism
    pub fn infection_payload(&self) -> GeneticCode {
        self.infecting_code
            .clone()
            .unwrap_or_else(|| self.code.clone())
    }

    /// Deflect the next hostile contact
    pub fn arm_dodge(&mut self) {
        if self.is_alive() {
            self.state.insert(OrganismFlags::DODGING);
        }
    }

    /// Spend an armed dodge on the contact it deflected
    pub fn consume_dodge(&mut self) -> bool {
        let armed = self.is_dodging();
        self.state.remove(OrganismFlags::DODGING);
        armed
    }

    /// Note a contact, lowering crowd-sensitive photosynthesis next tick
    pub fn mark_crowded(&mut self) {
        self.crowded = true;
    }

    /// Transition to dead. Returns `true` only on the first call.
    pub fn die(&mut self) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.state = OrganismFlags::DEAD;
        self.infecting_code = None;
        self.display = None;
        self.freeze_ticks = 0;
        self.regrowth_ticks = 0;
        self.segment_types.fill(SegmentType::Brown);
        log::debug!(
            "{} died at age {} (generation {}, kills {})",
            self.id,
            self.age,
            self.generation,
            self.kills
        );
        true
    }

    // ===== TICK =====

    /// Growth, timers, photosynthesis, friction and the tentative move.
    ///
    /// On any collision the move and any growth change are rolled back
    /// before the contact is reported.
    pub fn begin_tick<W: WorldMutAccess + ?Sized>(
        &mut self,
        world: &mut W,
        ctx: &SimContext<'_>,
    ) -> MoveOutcome {
        let config = ctx.config;
        self.ticks_alive += 1;
        self.motion.growth_rate = 0.0;

        let previous_body = if self.is_alive() { self.grow(ctx) } else { None };

        if self.is_alive() {
            self.run_timers(ctx);
            self.photosynthesis(world, ctx);
        }

        physics::apply_friction(&mut self.motion, &config.physics);

        if previous_body.is_none() && self.motion.is_still() {
            return MoveOutcome::Moved;
        }

        // Tentative move
        let before = self.motion;
        let position = self.motion.position + self.motion.velocity;
        let rotation = self.motion.rotation + self.motion.angular_velocity;
        let segments = self.body.world_segments(position, rotation);
        let bounds = Rect::enclosing(segments.iter().flat_map(|&(a, b)| [a, b]));

        if !physics::reflect_out_of_bounds(&mut self.motion, &bounds, &world.bounds()) {
            if self.mass() <= 0.0 && self.motion.position == DVec2::ZERO {
                return if self.die() {
                    MoveOutcome::Died
                } else {
                    MoveOutcome::OutOfBounds
                };
            }
            self.rollback_growth(previous_body);
            return MoveOutcome::OutOfBounds;
        }

        let lengths = self.segment_lengths();
        for other_id in world.occupancy_candidates(&bounds, Some(self.id)) {
            let Some(other) = world.organism(other_id) else {
                continue;
            };
            let contact = physics::find_contact(
                &segments,
                &lengths,
                other_id,
                other.world_segments(),
                &other.segment_lengths(),
            );
            if let Some(contact) = contact {
                self.motion.position = before.position;
                self.motion.rotation = before.rotation;
                self.rollback_growth(previous_body);
                log::trace!("{} touched {} at {}", self.id, other_id, contact.point);
                return MoveOutcome::Collided(self.relocate_contact(contact, world));
            }
        }

        // Commit
        self.motion.position = position;
        self.motion.rotation = rotation % TAU;
        self.world_segments = segments;
        self.bounds = bounds;

        match world.corridor_check(self) {
            Some(corridor) => MoveOutcome::Migrated(corridor),
            None => MoveOutcome::Moved,
        }
    }

    /// Recompute the contact point against the committed segments, keeping
    /// the tentative point when they no longer cross
    fn relocate_contact<W: WorldMutAccess + ?Sized>(&self, contact: Contact, world: &W) -> Contact {
        let own = self.world_segments.get(contact.own_segment).copied();
        let other = world
            .organism(contact.other)
            .and_then(|o| o.world_segments().get(contact.other_segment).copied());
        match (own, other) {
            (Some((a0, a1)), Some((b0, b1))) => Contact {
                point: physics::segment_intersection(a0, a1, b0, b1).unwrap_or(contact.point),
                ..contact
            },
            _ => contact,
        }
    }

    /// Step the growth stage every growth interval, returning the body to
    /// restore on rollback
    fn grow(&mut self, ctx: &SimContext<'_>) -> Option<BodyPlan> {
        let interval = ctx.config.life.growth_interval.max(1) as u64;
        if self.ticks_alive % interval != 0 {
            return None;
        }
        let stage = self.body.growth_stage;
        let mass = self.body.mass;
        let target = if self.energy >= mass / 10.0 && stage > ADULT_STAGE {
            stage - 1
        } else if self.energy < mass / 12.0 && stage < NEWBORN_STAGE {
            stage + 1
        } else {
            return None;
        };

        let new_body = BodyPlan::generate(&self.code, target);
        physics::rescale_for_growth(&mut self.motion, mass, new_body.mass);
        self.motion.growth_rate = BodyPlan::stage_ratio(stage, target) - 1.0;
        let previous = std::mem::replace(&mut self.body, new_body);
        self.place();
        Some(previous)
    }

    fn rollback_growth(&mut self, previous: Option<BodyPlan>) {
        if let Some(previous) = previous {
            physics::rescale_for_growth(&mut self.motion, self.body.mass, previous.mass);
            self.body = previous;
            self.motion.growth_rate = 0.0;
            self.place();
        }
    }

    /// Count down recolor, freeze, dodge and regrowth timers
    fn run_timers(&mut self, ctx: &SimContext<'_>) {
        let types = ctx.types;
        self.state.remove(OrganismFlags::DODGING);

        if let Some(mut recolor) = self.display.take() {
            recolor.ticks = recolor.ticks.saturating_sub(1);
            if recolor.ticks > 0 {
                self.display = Some(recolor);
            }
        }

        if self.is_frozen() {
            self.freeze_ticks = self.freeze_ticks.saturating_sub(1);
            if self.freeze_ticks == 0 {
                self.thaw(types);
            }
        } else {
            self.regrow(ctx);
        }
    }

    /// Grow damaged regenerating segments back once they have waited out
    /// the regrowth delay
    fn regrow(&mut self, ctx: &SimContext<'_>) {
        let delay = ctx.config.reactions.dark_jade_delay;
        let wounded: Vec<usize> = (0..self.segment_types.len())
            .filter(|&i| {
                let def = ctx.types.get(self.genetic_type(i));
                def.regenerates && def.damaged_variant == Some(self.segment_types[i])
            })
            .collect();
        if wounded.is_empty() || delay == 0 {
            self.regrowth_ticks = 0;
            return;
        }

        self.regrowth_ticks += 1;
        if self.regrowth_ticks >= delay {
            for i in wounded {
                self.segment_types[i] = self.genetic_type(i);
            }
            self.regrowth_ticks = 0;
        }
    }

    /// Convert CO2 into energy through photosynthetic segments
    fn photosynthesis<W: WorldMutAccess + ?Sized>(&mut self, world: &mut W, ctx: &SimContext<'_>) {
        let crowded = std::mem::take(&mut self.crowded);
        let divisor = ctx.config.life.green_obtained_energy_divisor;
        if divisor <= 0.0 {
            return;
        }
        let weight: f64 = self
            .body
            .segments
            .iter()
            .zip(&self.segment_types)
            .map(|(segment, &t)| {
                let def = ctx.types.get(t);
                let multiplier = match def.crowded_photosynthesis {
                    Some(crowded_multiplier) if crowded => crowded_multiplier,
                    _ => def.photosynthesis,
                };
                segment.photosynthetic_weight * multiplier
            })
            .sum();
        if weight <= 0.0 {
            return;
        }

        let granted = world.photosynthesis_yield(weight / divisor);
        let obtained = world.consume_co2(granted);
        world.produce_o2(obtained);
        self.energy += obtained;
    }

    /// Respiration, ageing and death, or decay for a corpse
    pub fn end_tick<A: AtmosphereAccess + ?Sized>(
        &mut self,
        atmosphere: &mut A,
        ctx: &SimContext<'_>,
    ) -> LifeOutcome {
        let life = &ctx.config.life;
        let tolerance = ctx.tolerance();

        if !self.is_alive() {
            let lost = self.take_energy(life.decay_energy);
            atmosphere.release_co2(lost);
            return if self.energy <= tolerance {
                LifeOutcome::Decayed
            } else {
                LifeOutcome::Living
            };
        }

        if life.segment_cost_divisor > 0.0 {
            let spent = self.take_energy(self.mass() / life.segment_cost_divisor);
            atmosphere.release_co2(spent);
        }

        self.ticks_in_age += 1;
        if self.ticks_in_age >= life.ticks_per_age_unit.max(1) {
            self.ticks_in_age = 0;
            self.age += 1;
        }

        if self.energy <= tolerance || self.age > self.code.max_age() {
            return if self.die() {
                LifeOutcome::Died
            } else {
                LifeOutcome::Living
            };
        }

        if self.energy >= self.code.reproduce_energy() && !self.is_frozen() {
            LifeOutcome::ReadyToReproduce
        } else {
            LifeOutcome::Living
        }
    }

    // ===== REPRODUCTION =====

    /// Place a child beside this organism.
    ///
    /// The child carries the infecting code if there is one, otherwise a
    /// mutated copy of this organism's code. Returns `None` without any
    /// change to this organism when no free spot is found.
    pub fn reproduce<W: WorldMutAccess + ?Sized, R: SimRng>(
        &mut self,
        world: &mut W,
        rng: &mut R,
        ctx: &SimContext<'_>,
    ) -> Option<Organism> {
        let cost = self.code.reproduce_energy();
        if !self.is_alive() || self.is_frozen() || self.energy < cost {
            return None;
        }

        let infected = self.infecting_code.is_some();
        let child_code = match &self.infecting_code {
            Some(code) => code.clone(),
            None => GeneticCode::mutated_from(&self.code, rng, ctx.types, &ctx.config.mutation),
        };
        let child_body = BodyPlan::generate(&child_code, NEWBORN_STAGE);

        let disperse = self.code.has_trait(OrganismFlags::DISPERSE_CHILDREN);
        let spacing = if disperse { 2.0 } else { 1.0 };
        let distance = (self.body.radius + child_body.radius) * spacing + 1.0;
        let world_bounds = world.bounds();

        let mut placement = None;
        for _ in 0..ctx.config.life.placement_attempts.max(1) {
            let angle = rng.range_f64(0.0, TAU);
            let rotation = rng.range_f64(0.0, TAU);
            let direction = DVec2::from_angle(angle);
            let position = self.motion.position + direction * distance;
            let area = child_body.local_bounds(rotation).translated(position);
            if world_bounds.contains_rect(&area)
                && !area.intersects(&self.bounds)
                && world.occupancy_test(&area, Some(self.id)).is_none()
            {
                placement = Some((position, rotation, direction));
                break;
            }
        }
        let Some((position, rotation, direction)) = placement else {
            log::debug!("{} found no room for a child", self.id);
            return None;
        };

        // Commit
        let id = world.new_id();
        self.energy -= cost;
        let child_energy = ctx.config.life.initial_energy.min(cost);
        atmosphere_release(world, cost - child_energy);
        if infected {
            self.cure();
        }
        self.children += 1;

        let mut child = Organism::build(
            id,
            Some(self.id),
            self.lineage,
            self.generation + 1,
            child_code,
            position,
            rotation,
            child_energy,
            NEWBORN_STAGE,
            ctx,
        );
        if disperse {
            child.motion.velocity = direction * ctx.config.life.disperse_speed;
        }

        log::debug!(
            "{} born to {} (generation {}, {} segments{})",
            id,
            self.id,
            child.generation,
            child.code.total_segments(),
            if infected { ", infected code" } else { "" }
        );
        Some(child)
    }
}

fn atmosphere_release<A: AtmosphereAccess + ?Sized>(atmosphere: &mut A, amount: f64) {
    if amount > 0.0 {
        atmosphere.release_co2(amount);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::OrganismConfig;
    use crate::genome::{Gene, MutationConfig};
    use crate::traits::WorldAccess;
    use biomorph_simulation::ReactionRegistry;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    /// Minimal world: open space, a CO2 pool and a list of residents
    pub(crate) struct TestWorld {
        pub bounds: Rect,
        pub co2: f64,
        pub o2: f64,
        pub next_id: u64,
        pub residents: Vec<Organism>,
        pub corridor: Option<Rect>,
    }

    impl TestWorld {
        pub fn new() -> Self {
            Self {
                bounds: Rect::from_size(1000.0, 1000.0),
                co2: 100_000.0,
                o2: 0.0,
                next_id: 100,
                residents: Vec::new(),
                corridor: None,
            }
        }
    }

    impl WorldAccess for TestWorld {
        fn bounds(&self) -> Rect {
            self.bounds
        }

        fn occupancy_candidates(&self, area: &Rect, exclude: Option<OrganismId>) -> Vec<OrganismId> {
            self.residents
                .iter()
                .filter(|o| Some(o.id()) != exclude && o.bounds().intersects(area))
                .map(|o| o.id())
                .collect()
        }

        fn organism(&self, id: OrganismId) -> Option<&Organism> {
            self.residents.iter().find(|o| o.id() == id)
        }

        fn photosynthesis_yield(&self, requested: f64) -> f64 {
            requested.min(self.co2 / 5000.0)
        }

        fn corridor_check(&self, organism: &Organism) -> Option<CorridorId> {
            self.corridor
                .filter(|c| c.intersects(&organism.bounds()))
                .map(|_| CorridorId(0))
        }
    }

    impl AtmosphereAccess for TestWorld {
        fn consume_co2(&mut self, amount: f64) -> f64 {
            let taken = amount.clamp(0.0, self.co2);
            self.co2 -= taken;
            taken
        }

        fn produce_o2(&mut self, amount: f64) {
            self.o2 += amount;
        }

        fn release_co2(&mut self, amount: f64) {
            self.co2 += amount;
            self.o2 = (self.o2 - amount).max(0.0);
        }
    }

    impl WorldMutAccess for TestWorld {
        fn new_id(&mut self) -> OrganismId {
            self.next_id += 1;
            OrganismId::from_raw(self.next_id)
        }
    }

    pub(crate) struct Fixture {
        pub types: SegmentTypes,
        pub reactions: ReactionRegistry,
        pub config: OrganismConfig,
    }

    impl Fixture {
        pub fn new() -> Self {
            let config = OrganismConfig::default();
            let types = SegmentTypes::new();
            let reactions = ReactionRegistry::with_config(&types, &config.reactions);
            Self {
                types,
                reactions,
                config,
            }
        }

        pub fn ctx(&self) -> SimContext<'_> {
            SimContext::new(&self.types, &self.reactions, &self.config)
        }
    }

    /// Single-gene organism of `segment_type`
    pub(crate) fn rod(
        id: u64,
        segment_type: SegmentType,
        length: f64,
        theta: f64,
        position: DVec2,
        energy: f64,
        ctx: &SimContext<'_>,
    ) -> Organism {
        let code = GeneticCode::from_parts(
            vec![Gene::new(length, theta, -1, segment_type)],
            1,
            false,
            OrganismFlags::empty(),
            &MutationConfig::default(),
        );
        Organism::new(OrganismId::from_raw(id), code, position, 0.0, energy, ctx)
    }

    #[test]
    fn test_new_organism() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let org = rod(1, SegmentType::Green, 10.0, 0.0, DVec2::new(50.0, 50.0), 40.0, &ctx);

        assert!(org.is_alive());
        assert_eq!(org.lineage(), org.id());
        assert_eq!(org.segment_count(), 1);
        assert_eq!(org.mass(), 10.0);
        assert_eq!(org.world_segments()[0].0, DVec2::new(45.0, 50.0));
        assert_eq!(org.bounds().max, DVec2::new(55.0, 50.0));
    }

    #[test]
    fn test_gold_extends_max_age() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let code = GeneticCode::from_parts(
            vec![Gene::new(5.0, 0.3, -1, SegmentType::Gold)],
            6,
            false,
            OrganismFlags::empty(),
            &MutationConfig::default(),
        );
        let base = code.max_age();
        let org = Organism::new(OrganismId::from_raw(1), code, DVec2::ZERO, 0.0, 10.0, &ctx);
        assert_eq!(org.code().max_age(), base + 2);
    }

    #[test]
    fn test_try_spend_is_atomic() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let mut world = TestWorld::new();
        let mut org = rod(1, SegmentType::Red, 10.0, 0.0, DVec2::new(50.0, 50.0), 5.0, &ctx);

        assert!(!org.try_spend(6.0, &mut world));
        assert_eq!(org.energy(), 5.0);
        assert!(org.try_spend(2.0, &mut world));
        assert_eq!(org.energy(), 3.0);
        assert_eq!(world.co2, 100_002.0);
    }

    #[test]
    fn test_die_once() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let mut org = rod(1, SegmentType::Green, 10.0, 0.0, DVec2::new(50.0, 50.0), 5.0, &ctx);
        org.infect(org.code().clone());

        assert!(org.die());
        assert!(!org.die());
        assert!(!org.is_alive());
        assert!(!org.is_infected());
        assert!(org.segment_types().iter().all(|&t| t == SegmentType::Brown));
        assert_eq!(org.segment_count(), 1, "geometry kept");
    }

    #[test]
    fn test_freeze_and_thaw() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let mut world = TestWorld::new();
        let mut org = rod(1, SegmentType::Cyan, 10.0, 0.0, DVec2::new(50.0, 50.0), 5.0, &ctx);

        assert!(org.freeze(2, &fixture.types));
        assert_eq!(org.segment_type(0), SegmentType::Ice);
        assert!(org.is_frozen());

        org.begin_tick(&mut world, &ctx);
        assert!(org.is_frozen());
        org.begin_tick(&mut world, &ctx);
        assert!(!org.is_frozen());
        assert_eq!(org.segment_type(0), SegmentType::Cyan);
    }

    #[test]
    fn test_damage_and_heal() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let mut org = rod(1, SegmentType::Blue, 10.0, 0.0, DVec2::new(50.0, 50.0), 5.0, &ctx);

        assert!(org.damage_segment(0, &fixture.types));
        assert_eq!(org.segment_type(0), SegmentType::LightBlue);
        assert!(!org.damage_segment(0, &fixture.types), "already damaged");
        assert_eq!(org.damaged_length(&fixture.types), 10.0);

        assert_eq!(org.heal(&fixture.types), 1);
        assert_eq!(org.segment_type(0), SegmentType::Blue);
        assert_eq!(org.damaged_length(&fixture.types), 0.0);
    }

    #[test]
    fn test_photosynthesis_converts_co2() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let mut world = TestWorld::new();
        let mut org = rod(1, SegmentType::Green, 10.0, 0.0, DVec2::new(50.0, 50.0), 5.0, &ctx);

        let weight = org.body().segments[0].photosynthetic_weight;
        org.begin_tick(&mut world, &ctx);
        let expected = weight / 500.0;
        assert!((org.energy() - (5.0 + expected)).abs() < 1e-12);
        assert!((world.o2 - expected).abs() < 1e-12);
        assert!((world.co2 - (100_000.0 - expected)).abs() < 1e-9);
    }

    #[test]
    fn test_crowded_lime_photosynthesizes_less() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let mut world = TestWorld::new();
        let mut lime = rod(1, SegmentType::Lime, 10.0, 0.0, DVec2::new(50.0, 50.0), 5.0, &ctx);
        let weight = lime.body().segments[0].photosynthetic_weight;

        lime.begin_tick(&mut world, &ctx);
        assert!((lime.energy() - (5.0 + weight * 1.3 / 500.0)).abs() < 1e-12);

        lime.mark_crowded();
        let before = lime.energy();
        lime.begin_tick(&mut world, &ctx);
        assert!((lime.energy() - (before + weight * 0.6 / 500.0)).abs() < 1e-12);
        assert!(!lime.is_crowded(), "crowding lasts one photosynthesis");
    }

    #[test]
    fn test_damaged_jade_regrows_after_delay() {
        let fixture = Fixture::new();
        let mut config = fixture.config.clone();
        config.reactions.dark_jade_delay = 3;
        let ctx = SimContext::new(&fixture.types, &fixture.reactions, &config);
        let mut world = TestWorld::new();
        let mut jade = rod(1, SegmentType::Jade, 10.0, 0.0, DVec2::new(50.0, 50.0), 5.0, &ctx);

        assert!(jade.damage_segment(0, &fixture.types));
        assert_eq!(jade.segment_type(0), SegmentType::DarkJade);
        jade.begin_tick(&mut world, &ctx);
        jade.begin_tick(&mut world, &ctx);
        assert_eq!(jade.segment_type(0), SegmentType::DarkJade);
        jade.begin_tick(&mut world, &ctx);
        assert_eq!(jade.segment_type(0), SegmentType::Jade);

        // Poison is permanent
        assert!(jade.poison_segment(0, &fixture.types));
        for _ in 0..5 {
            jade.begin_tick(&mut world, &ctx);
        }
        assert_eq!(jade.segment_type(0), SegmentType::PoisonedJade);
    }

    #[test]
    fn test_respiration_and_death() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let mut world = TestWorld::new();
        let mut org = rod(1, SegmentType::Red, 10.0, 0.0, DVec2::new(50.0, 50.0), 0.003, &ctx);

        // 10 / 5000 per tick
        assert_eq!(org.end_tick(&mut world, &ctx), LifeOutcome::Living);
        assert!((org.energy() - 0.001).abs() < 1e-12);
        assert_eq!(org.end_tick(&mut world, &ctx), LifeOutcome::Died);
        assert!(!org.is_alive());

        // Corpse decays instead of dying again
        assert_eq!(org.end_tick(&mut world, &ctx), LifeOutcome::Decayed);
    }

    #[test]
    fn test_old_age_kills() {
        let fixture = Fixture::new();
        let mut config = fixture.config.clone();
        config.life.ticks_per_age_unit = 1;
        let ctx = SimContext::new(&fixture.types, &fixture.reactions, &config);
        let mut world = TestWorld::new();
        let mut org = rod(1, SegmentType::Red, 10.0, 0.0, DVec2::new(50.0, 50.0), 30.0, &ctx);

        let max_age = org.code().max_age();
        for _ in 0..max_age {
            assert_ne!(org.end_tick(&mut world, &ctx), LifeOutcome::Died);
        }
        assert_eq!(org.end_tick(&mut world, &ctx), LifeOutcome::Died);
    }

    #[test]
    fn test_bounds_reflect_and_roll_back() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let mut world = TestWorld::new();
        let mut org = rod(1, SegmentType::Red, 10.0, 0.0, DVec2::new(6.0, 50.0), 5.0, &ctx);
        org.motion.velocity = DVec2::new(-2.0, 0.0);

        assert_eq!(org.begin_tick(&mut world, &ctx), MoveOutcome::OutOfBounds);
        assert_eq!(org.motion.position, DVec2::new(6.0, 50.0));
        assert!(org.motion.velocity.x > 0.0);
    }

    #[test]
    fn test_collision_rolls_back() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let mut world = TestWorld::new();
        world.residents.push(rod(
            2,
            SegmentType::Green,
            10.0,
            std::f64::consts::FRAC_PI_2,
            DVec2::new(57.0, 50.0),
            5.0,
            &ctx,
        ));
        let mut org = rod(1, SegmentType::Red, 10.0, 0.0, DVec2::new(50.0, 50.0), 5.0, &ctx);
        org.motion.velocity = DVec2::new(3.0, 0.0);

        match org.begin_tick(&mut world, &ctx) {
            MoveOutcome::Collided(contact) => {
                assert_eq!(contact.other, OrganismId::from_raw(2));
                assert_eq!(contact.own_segment, 0);
            }
            other => panic!("expected collision, got {:?}", other),
        }
        assert_eq!(org.motion.position, DVec2::new(50.0, 50.0));
    }

    #[test]
    fn test_corridor_migration() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let mut world = TestWorld::new();
        world.corridor = Some(Rect::new(DVec2::new(58.0, 0.0), DVec2::new(70.0, 1000.0)));
        let mut org = rod(1, SegmentType::Red, 10.0, 0.0, DVec2::new(50.0, 50.0), 5.0, &ctx);
        org.motion.velocity = DVec2::new(5.0, 0.0);

        assert_eq!(
            org.begin_tick(&mut world, &ctx),
            MoveOutcome::Migrated(CorridorId(0))
        );
    }

    #[test]
    fn test_growth_toward_adult() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let mut world = TestWorld::new();
        let mut org = rod(1, SegmentType::Red, 16.0, 0.0, DVec2::new(500.0, 500.0), 40.0, &ctx);
        org.body = BodyPlan::generate(org.code(), NEWBORN_STAGE);

        for _ in 0..8 {
            org.begin_tick(&mut world, &ctx);
        }
        assert_eq!(org.growth_stage(), NEWBORN_STAGE - 1);
        assert!((org.mass() - 16.0 / 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_reproduce_pays_and_places() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let mut world = TestWorld::new();
        let mut rng = Xoshiro256StarStar::seed_from_u64(21);
        let mut org = rod(1, SegmentType::Green, 10.0, 0.0, DVec2::new(500.0, 500.0), 100.0, &ctx);
        let cost = org.code().reproduce_energy();
        let co2 = world.co2;

        let child = org
            .reproduce(&mut world, &mut rng, &ctx)
            .expect("room for a child");
        assert_eq!(org.energy(), 100.0 - cost);
        assert_eq!(child.energy(), cost.min(40.0));
        assert!((world.co2 - (co2 + cost - child.energy())).abs() < 1e-9);
        assert_eq!(child.parent(), Some(org.id()));
        assert_eq!(child.lineage(), org.lineage());
        assert_eq!(child.generation(), 1);
        assert_eq!(child.growth_stage(), NEWBORN_STAGE);
        assert_eq!(org.children, 1);
    }

    #[test]
    fn test_reproduce_expresses_infection() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let mut world = TestWorld::new();
        let mut rng = Xoshiro256StarStar::seed_from_u64(4);
        let virus = rod(9, SegmentType::White, 6.0, 1.0, DVec2::ZERO, 1.0, &ctx);
        let mut org = rod(1, SegmentType::Green, 10.0, 0.0, DVec2::new(500.0, 500.0), 100.0, &ctx);
        assert!(org.infect(virus.code().clone()));

        let child = org
            .reproduce(&mut world, &mut rng, &ctx)
            .expect("room for a child");
        assert_eq!(child.code(), virus.code());
        assert!(!org.is_infected());
    }

    #[test]
    fn test_failed_placement_commits_nothing() {
        let fixture = Fixture::new();
        let ctx = fixture.ctx();
        let mut world = TestWorld::new();
        // A strip only as tall as the parent leaves no room beside it
        world.bounds = Rect::from_size(12.0, 1.0);
        let mut rng = Xoshiro256StarStar::seed_from_u64(8);
        let mut org = rod(1, SegmentType::Green, 10.0, 0.0, DVec2::new(6.0, 0.5), 100.0, &ctx);
        let next_id = world.next_id;
        let co2 = world.co2;

        assert!(org.reproduce(&mut world, &mut rng, &ctx).is_none());
        assert_eq!(org.energy(), 100.0);
        assert_eq!(org.children, 0);
        assert_eq!(world.next_id, next_id);
        assert_eq!(world.co2, co2);
    }
}
