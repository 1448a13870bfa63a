//! Integration tests for organism-world interactions
//!
//! These tests drive organisms through the World stepper, so they live in
//! biomorph-core which has access to both.

use biomorph_core::world::World;
use biomorph_core::WorldConfig;
use biomorph_organism::{
    BodyPlan, Gene, GeneticCode, MutationConfig, OrganismConfig, OrganismId, Rect,
};
use biomorph_simulation::{OrganismFlags, ReactionRegistry, SegmentType, SegmentTypes};
use glam::DVec2;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use std::f64::consts::FRAC_PI_2;

const EPS: f64 = 1e-9;

fn rod(segment_type: SegmentType, theta: f64) -> GeneticCode {
    GeneticCode::from_parts(
        vec![Gene::new(10.0, theta, -1, segment_type)],
        1,
        false,
        OrganismFlags::empty(),
        &MutationConfig::default(),
    )
}

/// Organism rules with photosynthesis and respiration switched off so
/// energy only moves through contacts and reproduction
fn closed_energy_config() -> OrganismConfig {
    let mut config = OrganismConfig::default();
    config.life.green_obtained_energy_divisor = 0.0;
    config.life.segment_cost_divisor = 0.0;
    config
}

fn world_with(organism_config: OrganismConfig) -> World {
    let config = WorldConfig {
        width: 400.0,
        height: 400.0,
        initial_organisms: 0,
        ..Default::default()
    };
    World::new(config, organism_config, 42)
}

/// Vertical rod with 20 energy moving right into a horizontal rod.
///
/// The attacker stays below its reproduction threshold even after a drain.
fn head_on(
    world: &mut World,
    attacker: SegmentType,
    prey: SegmentType,
    prey_energy: f64,
) -> (OrganismId, OrganismId) {
    let a = world
        .spawn(rod(attacker, FRAC_PI_2), DVec2::new(98.0, 100.0), 0.0, 20.0)
        .expect("attacker placed");
    let b = world
        .spawn(rod(prey, 0.0), DVec2::new(106.0, 100.0), 0.0, prey_energy)
        .expect("prey placed");
    world.organism_mut(a).expect("attacker").motion.velocity = DVec2::new(4.0, 0.0);
    (a, b)
}

// ============================================================================
// Genetic Code Tests
// ============================================================================

#[test]
fn test_reproduce_energy_example() {
    let config = MutationConfig::default();
    let code = GeneticCode::from_parts(
        vec![
            Gene::new(5.0, 0.3, -1, SegmentType::Green),
            Gene::new(7.0, 1.1, -1, SegmentType::Red),
        ],
        4,
        false,
        OrganismFlags::empty(),
        &config,
    );
    assert_eq!(code.total_segments(), 8);
    assert_eq!(code.reproduce_energy(), 64.0);
}

#[test]
fn test_random_codes_hold_invariants() {
    let types = SegmentTypes::new();
    let config = MutationConfig::default();
    let mut rng = Xoshiro256StarStar::seed_from_u64(2024);

    let mut code = GeneticCode::random(&mut rng, &types, &config);
    let hot = MutationConfig {
        mutation_rate: 0.5,
        ..Default::default()
    };
    for _ in 0..500 {
        code = GeneticCode::mutated_from(&code, &mut rng, &types, &hot);
        assert!(code.validate().is_ok());
        let segments = code.total_segments();
        assert_eq!(segments, code.n_genes() * code.symmetry() as usize);
        assert!((1..=840).contains(&segments));
        assert_eq!(code.reproduce_energy(), 40.0 + 3.0 * segments as f64);
        for (i, gene) in code.genes().iter().enumerate() {
            assert!(gene.branch == -1 || (gene.branch >= 0 && (gene.branch as usize) < i));
        }
    }
}

#[test]
fn test_zero_rate_mutation_is_a_clone() {
    let types = SegmentTypes::new();
    let config = MutationConfig {
        mutation_rate: 0.0,
        ..Default::default()
    };
    let mut rng = Xoshiro256StarStar::seed_from_u64(5);
    for _ in 0..50 {
        let parent = GeneticCode::random(&mut rng, &types, &config);
        let child = GeneticCode::mutated_from(&parent, &mut rng, &types, &config);
        assert_eq!(child, parent);
    }
}

#[test]
fn test_branch_at_or_past_own_index_is_normalized() {
    let code = GeneticCode::from_parts(
        vec![
            Gene::new(4.0, 0.0, 0, SegmentType::Green),
            Gene::new(4.0, 0.5, 2, SegmentType::Green),
            Gene::new(4.0, 0.5, 1, SegmentType::Green),
        ],
        2,
        true,
        OrganismFlags::empty(),
        &MutationConfig::default(),
    );
    let branches: Vec<i32> = code.genes().iter().map(|g| g.branch).collect();
    assert_eq!(branches, vec![-1, -1, 1]);
}

// ============================================================================
// Body Plan Tests
// ============================================================================

#[test]
fn test_body_plan_is_idempotent() {
    let types = SegmentTypes::new();
    let mut rng = Xoshiro256StarStar::seed_from_u64(77);
    for _ in 0..20 {
        let code = GeneticCode::random(&mut rng, &types, &MutationConfig::default());
        for stage in [1, 4, 16] {
            let first = BodyPlan::generate(&code, stage);
            let second = BodyPlan::generate(&code, stage);
            let ends = |plan: &BodyPlan| {
                plan.segments
                    .iter()
                    .map(|s| (s.start, s.end))
                    .collect::<Vec<_>>()
            };
            assert_eq!(ends(&first), ends(&second));
        }
    }
}

#[test]
fn test_single_gene_mass() {
    for symmetry in 1..=8 {
        let code = GeneticCode::from_parts(
            vec![Gene::new(6.0, 0.4, -1, SegmentType::Green)],
            symmetry,
            false,
            OrganismFlags::empty(),
            &MutationConfig::default(),
        );
        let plan = BodyPlan::generate(&code, 1);
        assert!((plan.mass - symmetry as f64 * 6.0).abs() < EPS);
    }
}

// ============================================================================
// Physics Tests
// ============================================================================

#[test]
fn test_elastic_collision_swaps_velocities() {
    let mut config = closed_energy_config();
    config.physics.elasticity = 1.0;
    config.physics.rubbing = 1.0;
    let mut world = world_with(config);
    *world.reactions_mut() = ReactionRegistry::empty();
    let (a, b) = head_on(&mut world, SegmentType::Red, SegmentType::Red, 40.0);

    let kinetic = |world: &World| {
        [a, b]
            .iter()
            .filter_map(|&id| world.organism(id))
            .map(|o| 0.5 * o.mass() * o.motion.velocity.length_squared())
            .sum::<f64>()
    };
    let before = kinetic(&world);

    world.step();

    let mover = world.organism(a).expect("mover");
    let target = world.organism(b).expect("target");
    assert!(mover.motion.velocity.length() < EPS);
    assert!((target.motion.velocity - DVec2::new(4.0, 0.0)).length() < EPS);
    assert!(mover.motion.angular_velocity.abs() < EPS);
    assert!((kinetic(&world) - before).abs() < EPS);
    // The mover was rolled back to its pre-contact pose
    assert_eq!(mover.motion.position, DVec2::new(98.0, 100.0));
}

#[test]
fn test_wall_reflects_instead_of_leaving() {
    let mut world = world_with(closed_energy_config());
    let id = world
        .spawn(rod(SegmentType::Red, FRAC_PI_2), DVec2::new(395.0, 100.0), 0.0, 40.0)
        .expect("placed");
    world.organism_mut(id).expect("organism").motion.velocity = DVec2::new(8.0, 0.0);

    world.step();

    let organism = world.organism(id).expect("organism");
    assert_eq!(organism.motion.position, DVec2::new(395.0, 100.0));
    assert!(organism.motion.velocity.x < 0.0);
    assert!(world.bounds().contains_rect(&organism.bounds()));
}

// ============================================================================
// Reaction Tests
// ============================================================================

#[test]
fn test_predator_drain_through_world() {
    let mut world = world_with(closed_energy_config());
    let (a, b) = head_on(&mut world, SegmentType::Red, SegmentType::Green, 40.0);
    let k = world.organism_config().reactions.organic_obtained_energy;

    world.step();

    let drained = k * 10.0_f64.log10();
    let attacker = world.organism(a).expect("attacker");
    let prey = world.organism(b).expect("prey");
    assert!((prey.energy() - (40.0 - drained)).abs() < EPS);
    assert!((attacker.energy() - (20.0 + drained)).abs() < EPS);
    assert_eq!(world.stats().kills, 0);
}

#[test]
fn test_kill_counts_one_death() {
    let mut world = world_with(closed_energy_config());
    let (a, b) = head_on(&mut world, SegmentType::Red, SegmentType::Green, 3.0);
    assert_eq!(world.population(), 2);

    world.step();

    let stats = world.stats().clone();
    assert_eq!(stats.kills, 1);
    assert_eq!(stats.deaths, 1);
    assert_eq!(world.population(), 1);
    assert_eq!(world.organism(a).map(|o| o.kills), Some(1));
    // An empty corpse decays away within the same tick
    assert!(world.organism(b).is_none());

    for _ in 0..5 {
        world.step();
    }
    assert_eq!(world.stats().deaths, 1);
    assert_eq!(world.population(), 1);
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[test]
fn test_starvation_decrements_population_once() {
    let mut world = world_with(OrganismConfig::default());
    let id = world
        .spawn(rod(SegmentType::Red, 0.0), DVec2::new(200.0, 200.0), 0.0, 0.001)
        .expect("placed");

    world.step();
    assert_eq!(world.stats().deaths, 1);
    assert_eq!(world.population(), 0);
    assert!(world.is_extinct());
    let corpse = world.organism(id).expect("corpse stays for one tick");
    assert!(!corpse.is_alive());
    assert!(corpse
        .segment_types()
        .iter()
        .all(|&t| t == SegmentType::Brown));

    world.step();
    assert!(world.organism(id).is_none());
    assert!(world.is_empty());
    assert_eq!(world.stats().deaths, 1);
}

#[test]
fn test_reproduction_through_world() {
    let mut world = world_with(closed_energy_config());
    let parent = world
        .spawn(rod(SegmentType::Red, 0.0), DVec2::new(200.0, 200.0), 0.0, 100.0)
        .expect("placed");
    let co2 = world.atmosphere().co2;

    world.step();

    assert_eq!(world.population(), 2);
    assert_eq!(world.stats().births, 1);
    let parent_org = world.organism(parent).expect("parent");
    assert_eq!(parent_org.children, 1);
    assert!((parent_org.energy() - 57.0).abs() < EPS);

    let child = world
        .organisms()
        .find(|o| o.id() != parent)
        .expect("child");
    assert_eq!(child.parent(), Some(parent));
    assert_eq!(child.lineage(), parent_org.lineage());
    assert_eq!(child.generation(), 1);
    assert_eq!(child.energy(), 40.0);
    assert!(!child.bounds().intersects(&parent_org.bounds()));
    // The part of the cost the child did not receive went back as CO2
    assert!((world.atmosphere().co2 - (co2 + 3.0)).abs() < EPS);
}

#[test]
fn test_population_cap_blocks_reproduction() {
    let config = WorldConfig {
        width: 400.0,
        height: 400.0,
        max_population: 1,
        ..Default::default()
    };
    let mut world = World::new(config, closed_energy_config(), 1);
    world
        .spawn(rod(SegmentType::Red, 0.0), DVec2::new(200.0, 200.0), 0.0, 100.0)
        .expect("placed");

    world.run(3);

    assert_eq!(world.population(), 1);
    assert_eq!(world.stats().births, 0);
}

#[test]
fn test_corridor_migration() {
    let config = WorldConfig {
        width: 400.0,
        height: 400.0,
        corridors: vec![Rect::new(DVec2::new(350.0, 0.0), DVec2::new(400.0, 400.0))],
        ..Default::default()
    };
    let mut world = World::new(config, closed_energy_config(), 3);
    let id = world
        .spawn(rod(SegmentType::Red, FRAC_PI_2), DVec2::new(340.0, 100.0), 0.0, 40.0)
        .expect("placed");
    world.organism_mut(id).expect("organism").motion.velocity = DVec2::new(12.0, 0.0);

    world.step();

    assert!(world.organism(id).is_none());
    assert_eq!(world.stats().migrations, 1);
    assert_eq!(world.population(), 0);
    assert_eq!(world.stats().deaths, 0);
}

// ============================================================================
// Whole-World Tests
// ============================================================================

#[test]
fn test_random_world_keeps_invariants() {
    let config = WorldConfig {
        width: 1500.0,
        height: 1500.0,
        initial_organisms: 60,
        ..Default::default()
    };
    let mut world = World::new(config, OrganismConfig::default(), 11);
    let placed = world.populate();
    assert!(placed > 0);
    assert_eq!(world.population(), placed);

    let outer = world.bounds();
    let tolerance = Rect::new(outer.min - DVec2::splat(1e-6), outer.max + DVec2::splat(1e-6));
    for _ in 0..300 {
        world.step();

        let living = world.organisms().filter(|o| o.is_alive()).count();
        assert_eq!(world.population(), living);
        for organism in world.organisms() {
            assert!(organism.code().validate().is_ok());
            assert!(tolerance.contains_rect(&organism.bounds()));
            assert!(organism.energy() >= 0.0);
        }
        assert!(world.atmosphere().co2 >= 0.0);
        assert!(world.atmosphere().o2 >= 0.0);

        if world.is_extinct() {
            break;
        }
    }
}
