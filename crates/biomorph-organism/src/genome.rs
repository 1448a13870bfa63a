//! Genetic code: body-plan genes plus heritable behavior traits
//!
//! A genetic code is an ordered list of genes repeated `symmetry` times
//! (optionally mirrored) to form the body. It is created three ways:
//! - [`GeneticCode::random`] starts a new lineage
//! - [`GeneticCode::mutated_from`] copies a parent with per-field mutation
//! - [`GeneticCode::from_parts`] seeds an ecosystem with explicit genes,
//!   correcting anything invalid instead of rejecting it

use crate::rng_trait::SimRng;
use biomorph_simulation::{OrganismFlags, ReactionCategory, SegmentType, SegmentTypes};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Most segments a body can have (`genes * symmetry`)
pub const MAX_SEGMENTS: usize = 840;

/// Fewest segments a body can have
pub const MIN_SEGMENTS: usize = 1;

/// Most radial repetitions
pub const MAX_SYMMETRY: u32 = 8;

/// Fixed part of the reproduction cost
pub const BASE_REPRODUCE_ENERGY: f64 = 40.0;

/// Reproduction cost per segment
pub const REPRODUCE_ENERGY_PER_SEGMENT: f64 = 3.0;

/// Directional response of a motile segment to touching a category
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReactionCode {
    /// Stop all movement
    FullStop,
    /// Push along the segment vector
    Along,
    /// No reaction
    #[default]
    Ignore,
    /// Push against the segment vector
    Against,
    /// Lurch toward the other body's center
    Lurch,
}

impl ReactionCode {
    pub const ALL: [ReactionCode; 5] = [
        ReactionCode::FullStop,
        ReactionCode::Along,
        ReactionCode::Ignore,
        ReactionCode::Against,
        ReactionCode::Lurch,
    ];

    /// Numeric code in `-2..=2`
    pub fn value(self) -> i8 {
        match self {
            ReactionCode::FullStop => -2,
            ReactionCode::Along => -1,
            ReactionCode::Ignore => 0,
            ReactionCode::Against => 1,
            ReactionCode::Lurch => 2,
        }
    }

    pub fn from_value(value: i8) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.value() == value)
    }
}

/// Configuration for genetic code generation and mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationConfig {
    /// Probability that any single field is re-randomized on reproduction
    pub mutation_rate: f64,
    /// Largest gene count per repetition for a new lineage
    pub initial_complexity: usize,
    /// Maximum age before counting segments
    pub base_max_age: u32,
    /// Segments per extra unit of maximum age
    pub age_divisor: u32,
    /// Shortest random gene
    pub min_gene_length: f64,
    /// Longest random gene (exclusive)
    pub max_gene_length: f64,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            mutation_rate: 0.01,
            initial_complexity: 2,
            base_max_age: 6,
            age_divisor: 4,
            min_gene_length: 2.0,
            max_gene_length: 18.0,
        }
    }
}

/// One body-plan edge
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gene {
    /// Segment length at adult size
    pub length: f64,
    /// Turn relative to the running heading (radians)
    pub theta: f64,
    /// -1 continues the chain, 0 restarts at the origin, k > 0 attaches to
    /// the end of gene k-1 in the same repetition
    pub branch: i32,
    pub segment_type: SegmentType,
    /// One code per [`ReactionCategory`], indexed by category
    pub reactions: Vec<ReactionCode>,
}

impl Gene {
    /// Gene with no reactions
    pub fn new(length: f64, theta: f64, branch: i32, segment_type: SegmentType) -> Self {
        Self {
            length,
            theta,
            branch,
            segment_type,
            reactions: vec![ReactionCode::Ignore; ReactionCategory::COUNT],
        }
    }

    /// Fully random gene at `index`
    pub fn random<R: SimRng>(
        rng: &mut R,
        index: usize,
        types: &SegmentTypes,
        config: &MutationConfig,
    ) -> Self {
        let mut gene = Self::new(
            random_length(rng, config),
            random_theta(rng),
            random_branch(rng, index),
            random_segment_type(rng, types),
        );
        for code in gene.reactions.iter_mut() {
            *code = random_reaction(rng);
        }
        gene
    }

    /// Reaction code used when touching a segment of `category`
    pub fn reaction(&self, category: ReactionCategory) -> ReactionCode {
        self.reactions
            .get(category.index())
            .copied()
            .unwrap_or_default()
    }

    pub fn set_reaction(&mut self, category: ReactionCategory, code: ReactionCode) {
        if let Some(slot) = self.reactions.get_mut(category.index()) {
            *slot = code;
        }
    }

    /// Reset an out-of-range branch for a gene at `index` to -1
    fn normalize_branch(&mut self, index: usize) {
        if self.branch < -1 || self.branch >= index as i32 {
            self.branch = -1;
        }
    }
}

fn random_length<R: SimRng>(rng: &mut R, config: &MutationConfig) -> f64 {
    rng.range_f64(config.min_gene_length, config.max_gene_length)
}

fn random_theta<R: SimRng>(rng: &mut R) -> f64 {
    rng.range_f64(0.0, TAU)
}

/// First gene never branches; later genes flip between chaining and a
/// random earlier attachment
fn random_branch<R: SimRng>(rng: &mut R, index: usize) -> i32 {
    if index == 0 || rng.coin_flip() {
        -1
    } else {
        rng.below(index) as i32
    }
}

fn random_segment_type<R: SimRng>(rng: &mut R, types: &SegmentTypes) -> SegmentType {
    let roll = rng.below(types.total_spawn_weight() as usize) as u32;
    types.type_for_roll(roll)
}

fn random_reaction<R: SimRng>(rng: &mut R) -> ReactionCode {
    ReactionCode::ALL[rng.below(ReactionCode::ALL.len())]
}

/// Genes, symmetry and heritable traits of one organism
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneticCode {
    genes: Vec<Gene>,
    symmetry: u32,
    mirror: bool,
    traits: OrganismFlags,

    // Derived
    reproduce_energy: f64,
    max_age: u32,
}

impl GeneticCode {
    /// Random code for a new lineage
    pub fn random<R: SimRng>(rng: &mut R, types: &SegmentTypes, config: &MutationConfig) -> Self {
        let mirror = rng.coin_flip();
        let symmetry = 1 + rng.below(MAX_SYMMETRY as usize) as u32;

        // Gene count per repetition in [MIN_SEGMENTS, initial_complexity]
        let max_genes = config.initial_complexity.max(MIN_SEGMENTS);
        let n_genes = MIN_SEGMENTS + rng.below(max_genes - MIN_SEGMENTS + 1);

        let genes = (0..n_genes)
            .map(|i| Gene::random(rng, i, types, config))
            .collect();

        let mut traits = OrganismFlags::empty();
        for flag in OrganismFlags::genetic_traits() {
            traits.set(flag, rng.coin_flip());
        }

        let mut code = Self {
            genes,
            symmetry,
            mirror,
            traits,
            reproduce_energy: 0.0,
            max_age: 0,
        };
        code.recalculate(config);
        code
    }

    /// Child code: every field independently copied or re-randomized, plus
    /// at most one structural edit.
    ///
    /// A symmetry change is reverted if the body would exceed
    /// [`MAX_SEGMENTS`]. Only when symmetry is kept may one gene be inserted
    /// or removed.
    pub fn mutated_from<R: SimRng>(
        parent: &GeneticCode,
        rng: &mut R,
        types: &SegmentTypes,
        config: &MutationConfig,
    ) -> Self {
        let rate = config.mutation_rate;
        let parent_genes = parent.genes.len();

        let mirror = if rng.check_probability(rate) {
            rng.coin_flip()
        } else {
            parent.mirror
        };

        let mut inserted = None;
        let mut removed = None;
        let symmetry = if rng.check_probability(rate) {
            let candidate = 1 + rng.below(MAX_SYMMETRY as usize) as u32;
            if parent_genes * candidate as usize > MAX_SEGMENTS {
                parent.symmetry
            } else {
                candidate
            }
        } else {
            if rng.check_probability(rate) {
                if rng.coin_flip() {
                    if parent.total_segments() < MAX_SEGMENTS {
                        inserted = Some(rng.below(parent_genes + 1));
                    }
                } else if parent.total_segments() > MIN_SEGMENTS && parent_genes > 1 {
                    removed = Some(rng.below(parent_genes));
                }
            }
            parent.symmetry
        };

        let mut genes = Vec::with_capacity(parent_genes + 1);
        for (j, parent_gene) in parent.genes.iter().enumerate() {
            if inserted == Some(genes.len()) {
                let index = genes.len();
                genes.push(Gene::random(rng, index, types, config));
            }
            if removed == Some(j) {
                continue;
            }
            let index = genes.len();
            genes.push(mutate_gene(parent_gene, index, rng, types, config));
        }
        if inserted == Some(genes.len()) {
            let index = genes.len();
            genes.push(Gene::random(rng, index, types, config));
        }

        let mut traits = OrganismFlags::empty();
        for flag in OrganismFlags::genetic_traits() {
            let value = if rng.check_probability(rate) {
                rng.coin_flip()
            } else {
                parent.traits.contains(flag)
            };
            traits.set(flag, value);
        }

        let mut code = Self {
            genes,
            symmetry,
            mirror,
            traits,
            reproduce_energy: 0.0,
            max_age: 0,
        };
        code.recalculate(config);

        if code != *parent {
            log::trace!(
                "Mutated code: {} -> {} genes, symmetry {} -> {}",
                parent_genes,
                code.genes.len(),
                parent.symmetry,
                code.symmetry
            );
        }
        code
    }

    /// Explicitly constructed code, corrected into a valid one.
    ///
    /// Symmetry is clamped to `1..=8`, excess genes are dropped so the body
    /// fits in [`MAX_SEGMENTS`], an empty gene list gets one default gene,
    /// non-positive lengths are raised to the minimum gene length, and
    /// invalid branches become -1.
    pub fn from_parts(
        genes: Vec<Gene>,
        symmetry: u32,
        mirror: bool,
        traits: OrganismFlags,
        config: &MutationConfig,
    ) -> Self {
        let symmetry = symmetry.clamp(1, MAX_SYMMETRY);
        let mut genes = genes;
        genes.truncate(MAX_SEGMENTS / symmetry as usize);
        if genes.is_empty() {
            genes.push(Gene::new(config.min_gene_length, 0.0, -1, SegmentType::Green));
        }

        for (i, gene) in genes.iter_mut().enumerate() {
            gene.normalize_branch(i);
            if !gene.length.is_finite() || gene.length <= 0.0 {
                gene.length = config.min_gene_length;
            }
            if !gene.theta.is_finite() {
                gene.theta = 0.0;
            }
            gene.reactions
                .resize(ReactionCategory::COUNT, ReactionCode::Ignore);
        }

        let mut code = Self {
            genes,
            symmetry,
            mirror,
            traits: traits & OrganismFlags::GENETIC,
            reproduce_energy: 0.0,
            max_age: 0,
        };
        code.recalculate(config);
        code
    }

    fn recalculate(&mut self, config: &MutationConfig) {
        let segments = self.total_segments();
        self.reproduce_energy =
            BASE_REPRODUCE_ENERGY + REPRODUCE_ENERGY_PER_SEGMENT * segments as f64;
        self.max_age = config.base_max_age + segments as u32 / config.age_divisor.max(1);
    }

    /// Check every structural invariant
    pub fn validate(&self) -> Result<(), String> {
        let segments = self.total_segments();
        if !(MIN_SEGMENTS..=MAX_SEGMENTS).contains(&segments) {
            return Err(format!("Segment count {} out of range", segments));
        }
        if !(1..=MAX_SYMMETRY).contains(&self.symmetry) {
            return Err(format!("Symmetry {} out of range", self.symmetry));
        }
        for (i, gene) in self.genes.iter().enumerate() {
            if gene.branch < -1 || gene.branch >= i as i32 {
                return Err(format!("Gene {} branches to {}", i, gene.branch));
            }
            if !(gene.length > 0.0) {
                return Err(format!("Gene {} has length {}", i, gene.length));
            }
            if gene.reactions.len() != ReactionCategory::COUNT {
                return Err(format!(
                    "Gene {} has {} reaction codes",
                    i,
                    gene.reactions.len()
                ));
            }
        }
        Ok(())
    }

    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    pub fn n_genes(&self) -> usize {
        self.genes.len()
    }

    pub fn symmetry(&self) -> u32 {
        self.symmetry
    }

    pub fn mirror(&self) -> bool {
        self.mirror
    }

    pub fn traits(&self) -> OrganismFlags {
        self.traits
    }

    pub fn has_trait(&self, flag: OrganismFlags) -> bool {
        self.traits.contains(flag)
    }

    /// `genes * symmetry`
    pub fn total_segments(&self) -> usize {
        self.genes.len() * self.symmetry as usize
    }

    /// Energy needed (and paid) to reproduce: `40 + 3 * segments`
    pub fn reproduce_energy(&self) -> f64 {
        self.reproduce_energy
    }

    /// Age limit in age units
    pub fn max_age(&self) -> u32 {
        self.max_age
    }

    /// Raise the age limit at runtime
    pub fn extend_max_age(&mut self, extra: u32) {
        self.max_age = self.max_age.saturating_add(extra);
    }

    /// Length and angle of the first rose gene, used to recognize kin
    pub fn kin_signature(&self) -> Option<(f64, f64)> {
        self.genes
            .iter()
            .find(|g| g.segment_type == SegmentType::Rose)
            .map(|g| (g.length, g.theta))
    }
}

/// Copy a parent gene into position `index`, re-randomizing each field
/// independently
fn mutate_gene<R: SimRng>(
    parent: &Gene,
    index: usize,
    rng: &mut R,
    types: &SegmentTypes,
    config: &MutationConfig,
) -> Gene {
    let rate = config.mutation_rate;

    let length = if rng.check_probability(rate) {
        random_length(rng, config)
    } else {
        parent.length
    };
    let theta = if rng.check_probability(rate) {
        random_theta(rng)
    } else {
        parent.theta
    };
    let branch = if rng.check_probability(rate) {
        random_branch(rng, index)
    } else {
        parent.branch
    };
    let reactions = parent
        .reactions
        .iter()
        .map(|&code| {
            if rng.check_probability(rate) {
                random_reaction(rng)
            } else {
                code
            }
        })
        .collect();
    let segment_type = if rng.check_probability(rate) {
        random_segment_type(rng, types)
    } else {
        parent.segment_type
    };

    let mut gene = Gene {
        length,
        theta,
        branch,
        segment_type,
        reactions,
    };
    gene.normalize_branch(index);
    gene
}
