//! Body plan generation from genetic codes
//!
//! Expands a [`GeneticCode`] into concrete segments in body-local
//! coordinates. The plan is always rebuilt from scratch when the code or
//! the growth stage changes; organisms rotate and translate the cached
//! local points into world space.

use crate::genome::GeneticCode;
use crate::types::Rect;
use biomorph_simulation::SegmentType;
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// Growth stage of a newborn
pub const NEWBORN_STAGE: u8 = 16;

/// Growth stage of an adult
pub const ADULT_STAGE: u8 = 1;

/// Length scale per growth stage, indexed by `stage - 1`
const GROWTH_SCALE: [f64; NEWBORN_STAGE as usize] = [
    1.0,
    1.0 / 2.0,
    1.0 / 3.0,
    1.0 / 4.0,
    1.0 / 5.0,
    1.0 / 6.0,
    1.0 / 7.0,
    1.0 / 8.0,
    1.0 / 9.0,
    1.0 / 10.0,
    1.0 / 11.0,
    1.0 / 12.0,
    1.0 / 13.0,
    1.0 / 14.0,
    1.0 / 15.0,
    1.0 / 16.0,
];

/// Length scale for a growth stage, clamped into `1..=16`
pub fn growth_scale(stage: u8) -> f64 {
    let stage = stage.clamp(ADULT_STAGE, NEWBORN_STAGE);
    GROWTH_SCALE[(stage - 1) as usize]
}

/// One physical segment, in body-local coordinates
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodySegment {
    /// Index of the gene this segment expresses
    pub gene: usize,
    /// Radial repetition this segment belongs to
    pub repetition: u32,
    /// Genetic type (effective type is tracked by the organism)
    pub segment_type: SegmentType,
    pub start: DVec2,
    pub end: DVec2,
    /// Distance of `start` from the body origin
    pub start_distance: f64,
    /// Distance of `end` from the body origin
    pub end_distance: f64,
    /// Growth-scaled length
    pub length: f64,
    /// Photosynthetic yield weight before the per-type multiplier
    pub photosynthetic_weight: f64,
}

impl BodySegment {
    pub fn midpoint(&self) -> DVec2 {
        (self.start + self.end) * 0.5
    }

    /// Unit direction from start to end, zero for a degenerate segment
    pub fn direction(&self) -> DVec2 {
        (self.end - self.start).normalize_or_zero()
    }
}

/// Concrete body of an organism at one growth stage
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodyPlan {
    pub segments: Vec<BodySegment>,
    /// Sum of segment lengths
    pub mass: f64,
    /// Thin-rod moment of inertia about the body origin
    pub inertia: f64,
    pub growth_stage: u8,
    /// Farthest endpoint from the origin
    pub radius: f64,
}

impl BodyPlan {
    /// Expand `code` at `growth_stage`.
    ///
    /// Repetition `i` is rotated by `i * 2π / symmetry`. With mirroring,
    /// odd repetitions reuse the previous offset and reflect x, turning the
    /// body bilateral. Inside a repetition headings accumulate gene by gene.
    pub fn generate(code: &GeneticCode, growth_stage: u8) -> Self {
        let growth_stage = growth_stage.clamp(ADULT_STAGE, NEWBORN_STAGE);
        let scale = growth_scale(growth_stage);
        let symmetry = code.symmetry();
        let genes = code.genes();
        let weight_factor = 0.6 + 0.48 / genes.len() as f64 + 1.44 / symmetry as f64;
        let step = TAU / symmetry as f64;

        let mut segments = Vec::with_capacity(code.total_segments());
        for repetition in 0..symmetry {
            let mirrored = code.mirror() && repetition % 2 == 1;
            let offset = if mirrored {
                (repetition - 1) as f64 * step
            } else {
                repetition as f64 * step
            };

            let first = segments.len();
            let mut heading = offset;
            for (j, gene) in genes.iter().enumerate() {
                heading += gene.theta;
                let mut direction = DVec2::from_angle(heading);
                if mirrored {
                    direction.x = -direction.x;
                }

                let start = match gene.branch {
                    -1 if j > 0 => segments_end(&segments, first + j - 1),
                    k if k > 0 => segments_end(&segments, first + k as usize - 1),
                    _ => DVec2::ZERO,
                };
                let length = gene.length * scale;
                segments.push(BodySegment {
                    gene: j,
                    repetition,
                    segment_type: gene.segment_type,
                    start,
                    end: start + direction * length,
                    start_distance: 0.0,
                    end_distance: 0.0,
                    length,
                    photosynthetic_weight: weight_factor * length,
                });
            }
        }

        // Center on the bounding box
        let center = Rect::enclosing(segments.iter().flat_map(|s| [s.start, s.end])).center();
        let mut mass = 0.0;
        let mut inertia = 0.0;
        let mut radius: f64 = 0.0;
        for segment in segments.iter_mut() {
            segment.start -= center;
            segment.end -= center;
            segment.start_distance = segment.start.length();
            segment.end_distance = segment.end.length();

            let length = segment.length;
            mass += length;
            inertia += length * length * length / 12.0 + length * segment.midpoint().length_squared();
            radius = radius.max(segment.start_distance).max(segment.end_distance);
        }

        Self {
            segments,
            mass,
            inertia,
            growth_stage,
            radius,
        }
    }

    /// Bounding box of the body rotated by `rotation` around the origin
    pub fn local_bounds(&self, rotation: f64) -> Rect {
        let turn = DVec2::from_angle(rotation);
        Rect::enclosing(
            self.segments
                .iter()
                .flat_map(|s| [turn.rotate(s.start), turn.rotate(s.end)]),
        )
    }

    /// Segment endpoints placed at `position` and rotated by `rotation`
    pub fn world_segments(&self, position: DVec2, rotation: f64) -> Vec<(DVec2, DVec2)> {
        let turn = DVec2::from_angle(rotation);
        self.segments
            .iter()
            .map(|s| (position + turn.rotate(s.start), position + turn.rotate(s.end)))
            .collect()
    }

    /// Ratio between two growth stages applied to every length
    pub fn stage_ratio(from: u8, to: u8) -> f64 {
        growth_scale(to) / growth_scale(from)
    }
}

fn segments_end(segments: &[BodySegment], index: usize) -> DVec2 {
    segments.get(index).map(|s| s.end).unwrap_or(DVec2::ZERO)
}

/// Angle in `(-π, π]`
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}
