//! Contact resolution between two touching organisms
//!
//! A contact is resolved in both directions: each side acts on the other
//! once per contact event. Every directed action is split into a pure
//! resolve step producing an [`Effect`] and an apply step mutating both
//! organisms:
//!
//! - friendly pairs only cure, heal and share energy
//! - hostile pairs look their segment types up in the [`ReactionRegistry`]
//! - either way, motile segments may then push off what they touch

use crate::config::SimContext;
use crate::genome::ReactionCode;
use crate::organism::Organism;
use crate::physics::{self, Contact, ImpactBody};
use crate::rng_trait::SimRng;
use crate::traits::AtmosphereAccess;
use crate::types::OrganismId;
use biomorph_simulation::{
    Effect, OrganismFlags, ReactionCategory, ReactionRegistry, Recolor, SegmentType,
};
use glam::DVec2;

/// Bond between two organisms, deciding which effects a contact may have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Friendly,
    Hostile,
}

/// Kin signatures match, or both mimic everyone
fn is_kin(a: &Organism, b: &Organism) -> bool {
    if a.code().has_trait(OrganismFlags::MIMIC_ALL) && b.code().has_trait(OrganismFlags::MIMIC_ALL)
    {
        return true;
    }
    match (a.code().kin_signature(), b.code().kin_signature()) {
        (Some((len_a, theta_a)), Some((len_b, theta_b))) => len_a == len_b || theta_a == theta_b,
        _ => false,
    }
}

/// Decide whether two organisms treat each other as friends
pub fn relation(a: &Organism, b: &Organism) -> Relation {
    if !a.is_alive() || !b.is_alive() {
        return Relation::Hostile;
    }

    let both = |flag: OrganismFlags| a.code().has_trait(flag) && b.code().has_trait(flag);
    let either = |flag: OrganismFlags| a.code().has_trait(flag) || b.code().has_trait(flag);
    let same_lineage = a.lineage() == b.lineage();

    let friendly = (both(OrganismFlags::FAMILIAL) && same_lineage)
        || (a.is_parent_or_child_of(b) && !either(OrganismFlags::GENERATION_BATTLE))
        || (a.is_sibling_of(b) && !either(OrganismFlags::SIBLING_BATTLE))
        || (both(OrganismFlags::PEACEFUL) && (is_kin(a, b) || same_lineage))
        || (both(OrganismFlags::SOCIAL) && is_kin(a, b))
        || (both(OrganismFlags::ALTRUIST) && (is_kin(a, b) || same_lineage));

    if friendly {
        Relation::Friendly
    } else {
        Relation::Hostile
    }
}

/// Hostile effect of `attacker`'s segment touching `defender`'s segment
pub fn resolve(
    attacker: &Organism,
    attacker_segment: usize,
    defender: &Organism,
    defender_segment: usize,
    reactions: &ReactionRegistry,
    recolor_ticks: u32,
) -> Effect {
    if !attacker.is_alive() || attacker.code().has_trait(OrganismFlags::PASSIVE) {
        return Effect::none();
    }

    let effect = reactions
        .find_rule(
            attacker.segment_type(attacker_segment),
            attacker.contact_flags(),
            defender.segment_type(defender_segment),
            defender.contact_flags(),
        )
        .map(|rule| {
            log::trace!(
                "{} -> {}: rule {}",
                attacker.id(),
                defender.id(),
                rule.name
            );
            rule.effect.clone()
        })
        .unwrap_or_default();

    if !effect.is_none() && defender.is_dodging() {
        return Effect::deflected(SegmentType::Lilac, recolor_ticks);
    }
    effect
}

/// Cooperative effect of `giver`'s segment touching a friendly `receiver`
pub fn resolve_friendly(
    giver: &Organism,
    giver_segment: usize,
    receiver: &Organism,
    ctx: &SimContext<'_>,
) -> Effect {
    if !giver.is_alive() {
        return Effect::none();
    }
    let def = ctx.types.get(giver.segment_type(giver_segment));
    let config = &ctx.config.reactions;

    Effect {
        cure: def.curative && receiver.is_infected(),
        heal: def.healer && receiver.damaged_length(ctx.types) > 0.0,
        share: (def.sharer
            && !giver.code().has_trait(OrganismFlags::SELFISH)
            && giver.energy() > receiver.energy())
        .then_some(config.energy_share_cap),
        ..Effect::default()
    }
}

/// What one directed action did
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActionReport {
    /// Energy moved from defender to attacker
    pub drained: f64,
    pub blocked: bool,
    pub deflected: bool,
    pub infected: bool,
    pub killed: bool,
    pub cured: bool,
    pub healed: usize,
    pub shared: f64,
}

/// Mark the defender dead once its energy is spent, crediting the kill
fn finish_off(
    attacker: &mut Organism,
    defender: &mut Organism,
    report: &mut ActionReport,
    ctx: &SimContext<'_>,
) -> bool {
    if defender.energy() <= ctx.tolerance() && defender.die() {
        attacker.kills += 1;
        report.killed = true;
        log::debug!("{} killed {}", attacker.id(), defender.id());
        return true;
    }
    false
}

/// Share of a drain that gets past the defender's warding segments
fn ward_factor(defender: &Organism, ctx: &SimContext<'_>) -> f64 {
    let divisor = ctx.config.reactions.indigo_divisor;
    let wards = defender
        .segment_types()
        .iter()
        .filter(|&&t| ctx.types.get(t).warding)
        .count();
    if wards == 0 || divisor <= 0.0 {
        1.0
    } else {
        divisor / (divisor + wards as f64)
    }
}

/// Apply a hostile effect.
///
/// A deflected effect only spends the defender's dodge. A shield is tried
/// next and, when the defender can pay for it, replaces the whole effect.
/// Otherwise the attacker must pay the activation cost in full or nothing
/// happens.
#[allow(clippy::too_many_arguments)]
pub fn apply<A: AtmosphereAccess + ?Sized>(
    effect: &Effect,
    attacker: &mut Organism,
    attacker_segment: usize,
    defender: &mut Organism,
    defender_segment: usize,
    atmosphere: &mut A,
    ctx: &SimContext<'_>,
) -> ActionReport {
    let mut report = ActionReport::default();
    if effect.is_none() {
        return report;
    }
    let config = &ctx.config.reactions;

    if effect.deflected {
        if let Some(recolor) = effect.attacker_recolor {
            attacker.recolor(recolor);
        }
        defender.consume_dodge();
        report.deflected = true;
        return report;
    }

    if let Some(shield) = effect.shield {
        let cost = match shield.experienced_cost {
            Some(cost) if defender.blocks > 0 => cost,
            _ => shield.cost,
        };
        if defender.try_spend(cost, atmosphere) {
            attacker.recolor(Recolor {
                to: defender.segment_type(defender_segment),
                ticks: shield.recolor_ticks,
            });
            if shield.spends_shield {
                defender.damage_segment(defender_segment, ctx.types);
            }
            defender.blocks += 1;
            report.blocked = true;
            finish_off(attacker, defender, &mut report, ctx);
            return report;
        }
    }

    if !attacker.try_spend(effect.activation_cost, atmosphere) {
        return report;
    }

    if let Some(drain) = effect.drain {
        let length = attacker.segment_length(attacker_segment);
        let wanted =
            drain.factor * length.max(f64::MIN_POSITIVE).log10() * ward_factor(defender, ctx);
        let taken = defender.take_energy(wanted);
        attacker.add_energy(taken);
        if taken > 0.0 && drain.byproduct > 0.0 {
            atmosphere.release_co2(taken * drain.byproduct);
        }
        report.drained = taken;
    }

    if let Some(recolor) = effect.attacker_recolor {
        attacker.recolor(recolor);
    }
    if let Some(recolor) = effect.defender_recolor {
        defender.recolor(recolor);
    }

    if effect.infect && defender.infect(attacker.infection_payload()) {
        attacker.infections += 1;
        report.infected = true;
        log::debug!("{} infected {}", attacker.id(), defender.id());
    }
    if let Some(ticks) = effect.freeze {
        defender.freeze(ticks, ctx.types);
    }
    if effect.poison {
        defender.poison_segment(defender_segment, ctx.types);
    }
    if effect.damage {
        defender.damage_segment(defender_segment, ctx.types);
    }
    if effect.harm_attacker {
        attacker.damage_segment(attacker_segment, ctx.types);
    }

    if let Some(factor) = effect.push {
        let length = attacker.segment_length(attacker_segment);
        let mut direction =
            (defender.motion.position - attacker.motion.position).normalize_or_zero();
        if direction == DVec2::ZERO {
            direction = DVec2::X;
        }
        let impulse = length * length * length * factor / defender.mass().max(f64::EPSILON);
        attacker.motion.stop();
        defender.motion.velocity += direction * impulse;
        defender.motion.clamp_speed(&ctx.config.physics);
    }
    if effect.halt {
        defender.motion.stop();
    }

    if finish_off(attacker, defender, &mut report, ctx) {
        return report;
    }

    // An evasive defender arms a dodge against the next attack
    let evasive = defender
        .segment_types()
        .iter()
        .any(|&t| ctx.types.get(t).evasive);
    if evasive
        && defender.is_alive()
        && !defender.is_dodging()
        && defender.try_spend(config.dodge_energy_consumption, atmosphere)
    {
        defender.arm_dodge();
    }

    report
}

/// Apply a cooperative effect, each part gated by the giver paying for it
pub fn apply_friendly<A: AtmosphereAccess + ?Sized>(
    effect: &Effect,
    giver: &mut Organism,
    receiver: &mut Organism,
    atmosphere: &mut A,
    ctx: &SimContext<'_>,
) -> ActionReport {
    let mut report = ActionReport::default();
    let config = &ctx.config.reactions;

    if effect.cure {
        let payload_segments = receiver
            .infecting_code()
            .map(|code| code.total_segments())
            .unwrap_or(0);
        let cost = payload_segments as f64 * config.immune_system / 10_000.0;
        if giver.try_spend(cost, atmosphere) {
            report.cured = receiver.cure();
        }
    }

    if effect.heal {
        let cost = receiver.damaged_length(ctx.types) * config.healing / 100_000.0;
        if giver.try_spend(cost, atmosphere) {
            report.healed = receiver.heal(ctx.types);
        }
    }

    if let Some(cap) = effect.share {
        let amount = ((giver.energy() - receiver.energy()) / 2.0).min(cap);
        if amount > 0.0 {
            let given = giver.take_energy(amount);
            receiver.add_energy(given);
            report.shared = given;
        }
    }

    report
}

/// Push off a touched organism with a motile segment.
///
/// The gene behind the segment picks a reaction code for what it touched;
/// a coin flip and the segment's activation cost gate the push. Returns
/// whether the organism moved itself.
#[allow(clippy::too_many_arguments)]
pub fn self_propel<A: AtmosphereAccess + ?Sized, R: SimRng>(
    mover: &mut Organism,
    mover_segment: usize,
    other: &Organism,
    other_segment: usize,
    relation: Relation,
    atmosphere: &mut A,
    rng: &mut R,
    ctx: &SimContext<'_>,
) -> bool {
    if !mover.is_alive() {
        return false;
    }
    let segment_type = mover.segment_type(mover_segment);
    let def = ctx.types.get(segment_type);
    if !def.motile {
        return false;
    }

    let category = if relation == Relation::Friendly {
        ReactionCategory::Friend
    } else if other.is_infected() {
        ReactionCategory::Virus
    } else {
        other.segment_type(other_segment).category()
    };
    let Some(gene) = mover
        .body()
        .segments
        .get(mover_segment)
        .and_then(|s| mover.code().genes().get(s.gene))
    else {
        return false;
    };
    let code = gene.reaction(category);
    if code == ReactionCode::Ignore || !rng.coin_flip() {
        return false;
    }
    if !mover.try_spend(def.energy_consumption, atmosphere) {
        return false;
    }

    let Some(&(start, end)) = mover.world_segments().get(mover_segment) else {
        return false;
    };
    let along = (end - start).normalize_or_zero();
    let direction = match code {
        ReactionCode::FullStop => {
            mover.motion.stop();
            return true;
        }
        ReactionCode::Along => along,
        ReactionCode::Against => -along,
        ReactionCode::Lurch => (other.motion.position - mover.motion.position).normalize_or_zero(),
        ReactionCode::Ignore => return false,
    };

    let config = &ctx.config;
    let length = mover.segment_length(mover_segment);
    let push = config.reactions.propulsion_factor * length;
    let spin = if mover.code().has_trait(OrganismFlags::CLOCKWISE) {
        -1.0
    } else {
        1.0
    };
    mover.motion.velocity += direction * push / mover.mass().max(f64::EPSILON);
    mover.motion.angular_velocity += spin * push / mover.inertia().max(f64::EPSILON);
    mover.motion.clamp_speed(&config.physics);
    true
}

/// Summary of one full two-way contact
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TouchReport {
    /// Organisms that died from this contact
    pub deaths: Vec<OrganismId>,
    pub infections: u32,
    pub kills: u32,
    pub friendly: bool,
}

/// One directed action of `actor` on `target`
#[allow(clippy::too_many_arguments)]
fn act<A: AtmosphereAccess + ?Sized, R: SimRng>(
    actor: &mut Organism,
    actor_segment: usize,
    target: &mut Organism,
    target_segment: usize,
    relation: Relation,
    atmosphere: &mut A,
    rng: &mut R,
    ctx: &SimContext<'_>,
) -> ActionReport {
    let report = match relation {
        Relation::Friendly => {
            let effect = resolve_friendly(actor, actor_segment, target, ctx);
            apply_friendly(&effect, actor, target, atmosphere, ctx)
        }
        Relation::Hostile => {
            let effect = resolve(
                actor,
                actor_segment,
                target,
                target_segment,
                ctx.reactions,
                ctx.config.reactions.recolor_ticks,
            );
            apply(
                &effect,
                actor,
                actor_segment,
                target,
                target_segment,
                atmosphere,
                ctx,
            )
        }
    };
    self_propel(
        actor,
        actor_segment,
        target,
        target_segment,
        relation,
        atmosphere,
        rng,
        ctx,
    );
    report
}

/// Resolve all touch effects between `a` and `b` in both directions
pub fn touch<A: AtmosphereAccess + ?Sized, R: SimRng>(
    a: &mut Organism,
    a_segment: usize,
    b: &mut Organism,
    b_segment: usize,
    atmosphere: &mut A,
    rng: &mut R,
    ctx: &SimContext<'_>,
) -> TouchReport {
    let relation = relation(a, b);
    a.mark_crowded();
    b.mark_crowded();
    let forward = act(a, a_segment, b, b_segment, relation, atmosphere, rng, ctx);
    let backward = act(b, b_segment, a, a_segment, relation, atmosphere, rng, ctx);

    let mut report = TouchReport {
        friendly: relation == Relation::Friendly,
        ..Default::default()
    };
    for (action, victim) in [(forward, b.id()), (backward, a.id())] {
        if action.killed {
            report.kills += 1;
            report.deaths.push(victim);
        }
        if action.infected {
            report.infections += 1;
        }
    }
    report
}

/// Full collision between the moving organism and the one it touched:
/// impulse exchange first, then touch effects
pub fn collide<A: AtmosphereAccess + ?Sized, R: SimRng>(
    mover: &mut Organism,
    other: &mut Organism,
    contact: &Contact,
    atmosphere: &mut A,
    rng: &mut R,
    ctx: &SimContext<'_>,
) -> TouchReport {
    let mover_edge = mover
        .world_segments()
        .get(contact.own_segment)
        .copied()
        .unwrap_or((contact.point, contact.point));
    let other_edge = other
        .world_segments()
        .get(contact.other_segment)
        .copied()
        .unwrap_or((contact.point, contact.point));
    let (mover_mass, mover_inertia) = (mover.mass(), mover.inertia());
    let (other_mass, other_inertia) = (other.mass(), other.inertia());

    physics::touch_move(
        ImpactBody {
            motion: &mut mover.motion,
            mass: mover_mass,
            inertia: mover_inertia,
            edge: mover_edge,
        },
        ImpactBody {
            motion: &mut other.motion,
            mass: other_mass,
            inertia: other_inertia,
            edge: other_edge,
        },
        contact.point,
        &ctx.config.physics,
    );

    touch(
        mover,
        contact.own_segment,
        other,
        contact.other_segment,
        atmosphere,
        rng,
        ctx,
    )
}
