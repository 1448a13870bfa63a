//! Segment type definitions and registry

use serde::{Deserialize, Serialize};

/// Closed set of segment types a gene can express.
///
/// Every type has an explicit display color (see [`SegmentType::color`]) but
/// behavior is always keyed on the variant, never on the color.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum SegmentType {
    // Consumers
    Red,
    Fire,
    Orange,
    Maroon,
    Pink,
    Cream,
    Coral,

    // Photosynthetic
    Green,
    Forest,
    Spring,
    Lime,
    C4,
    Jade,
    Grass,
    Bark,

    // Defense and movement
    Blue,
    Sky,
    Olive,
    Ochre,
    Cyan,
    Teal,

    // Infection and support
    White,
    Plague,
    Mint,
    Magenta,
    Rose,
    Violet,
    Gray,
    Lilac,
    Spike,
    Silver,

    // Longevity and stealth
    Yellow,
    Auburn,
    Indigo,
    Blond,
    DarkGray,
    Dark,
    Gold,

    // Altered states (never drawn for new genes)
    OldBark,
    DarkJade,
    PoisonedJade,
    DarkFire,
    DarkLilac,
    DeepSky,
    DarkOlive,
    SpikePoint,
    Ice,
    LightBlue,
    LightBrown,
    GreenBrown,
    Broken,
    DeadBark,

    /// Decayed tag carried by every segment of a dead organism
    #[default]
    Brown,
}

impl SegmentType {
    /// Number of segment types
    pub const COUNT: usize = 53;

    /// All segment types in declaration order
    pub const ALL: [SegmentType; Self::COUNT] = [
        SegmentType::Red,
        SegmentType::Fire,
        SegmentType::Orange,
        SegmentType::Maroon,
        SegmentType::Pink,
        SegmentType::Cream,
        SegmentType::Coral,
        SegmentType::Green,
        SegmentType::Forest,
        SegmentType::Spring,
        SegmentType::Lime,
        SegmentType::C4,
        SegmentType::Jade,
        SegmentType::Grass,
        SegmentType::Bark,
        SegmentType::Blue,
        SegmentType::Sky,
        SegmentType::Olive,
        SegmentType::Ochre,
        SegmentType::Cyan,
        SegmentType::Teal,
        SegmentType::White,
        SegmentType::Plague,
        SegmentType::Mint,
        SegmentType::Magenta,
        SegmentType::Rose,
        SegmentType::Violet,
        SegmentType::Gray,
        SegmentType::Lilac,
        SegmentType::Spike,
        SegmentType::Silver,
        SegmentType::Yellow,
        SegmentType::Auburn,
        SegmentType::Indigo,
        SegmentType::Blond,
        SegmentType::DarkGray,
        SegmentType::Dark,
        SegmentType::Gold,
        SegmentType::OldBark,
        SegmentType::DarkJade,
        SegmentType::PoisonedJade,
        SegmentType::DarkFire,
        SegmentType::DarkLilac,
        SegmentType::DeepSky,
        SegmentType::DarkOlive,
        SegmentType::SpikePoint,
        SegmentType::Ice,
        SegmentType::LightBlue,
        SegmentType::LightBrown,
        SegmentType::GreenBrown,
        SegmentType::Broken,
        SegmentType::DeadBark,
        SegmentType::Brown,
    ];

    /// Photosynthetic types that herbivores and fire feed on
    pub const PLANTS: [SegmentType; 8] = [
        SegmentType::Green,
        SegmentType::Forest,
        SegmentType::Spring,
        SegmentType::Lime,
        SegmentType::C4,
        SegmentType::Jade,
        SegmentType::Grass,
        SegmentType::Bark,
    ];

    /// Position in [`SegmentType::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// RGBA display color
    pub const fn color(self) -> [u8; 4] {
        let [r, g, b] = match self {
            SegmentType::Red => [255, 0, 0],
            SegmentType::Fire => [255, 100, 0],
            SegmentType::Orange => [255, 200, 0],
            SegmentType::Maroon => [128, 0, 0],
            SegmentType::Pink => [255, 175, 175],
            SegmentType::Cream => [208, 192, 140],
            SegmentType::Coral => [255, 100, 138],
            SegmentType::Green => [0, 255, 0],
            SegmentType::Forest => [0, 128, 0],
            SegmentType::Spring => [0, 255, 128],
            SegmentType::Lime => [176, 255, 0],
            SegmentType::C4 => [96, 192, 96],
            SegmentType::Jade => [0, 168, 107],
            SegmentType::Grass => [144, 176, 64],
            SegmentType::Bark => [96, 128, 64],
            SegmentType::Blue => [0, 0, 255],
            SegmentType::Sky => [128, 192, 255],
            SegmentType::Olive => [176, 176, 0],
            SegmentType::Ochre => [204, 119, 34],
            SegmentType::Cyan => [0, 255, 255],
            SegmentType::Teal => [0, 128, 128],
            SegmentType::White => [255, 255, 255],
            SegmentType::Plague => [255, 192, 255],
            SegmentType::Mint => [160, 224, 160],
            SegmentType::Magenta => [255, 0, 255],
            SegmentType::Rose => [255, 0, 128],
            SegmentType::Violet => [128, 0, 128],
            SegmentType::Gray => [128, 128, 128],
            SegmentType::Lilac => [192, 128, 255],
            SegmentType::Spike => [164, 132, 100],
            SegmentType::Silver => [192, 192, 192],
            SegmentType::Yellow => [255, 255, 0],
            SegmentType::Auburn => [128, 48, 48],
            SegmentType::Indigo => [111, 0, 255],
            SegmentType::Blond => [255, 255, 128],
            SegmentType::DarkGray => [64, 64, 64],
            SegmentType::Dark => [32, 16, 8],
            SegmentType::Gold => [212, 175, 55],
            SegmentType::OldBark => [80, 40, 0],
            SegmentType::DarkJade => [0, 84, 54],
            SegmentType::PoisonedJade => [54, 84, 54],
            SegmentType::DarkFire => [232, 146, 70],
            SegmentType::DarkLilac => [96, 64, 96],
            SegmentType::DeepSky => [64, 96, 255],
            SegmentType::DarkOlive => [88, 88, 0],
            SegmentType::SpikePoint => [164, 132, 99],
            SegmentType::Ice => [64, 96, 128],
            SegmentType::LightBlue => [0, 0, 100],
            SegmentType::LightBrown => [128, 112, 64],
            SegmentType::GreenBrown => [128, 132, 64],
            SegmentType::Broken => [100, 132, 100],
            SegmentType::DeadBark => [128, 96, 64],
            SegmentType::Brown => [150, 75, 0],
        };
        [r, g, b, 255]
    }

    /// Which per-gene reaction code governs a segment touching this type
    pub const fn category(self) -> ReactionCategory {
        match self {
            SegmentType::Red => ReactionCategory::Red,
            SegmentType::Fire => ReactionCategory::Fire,
            SegmentType::Orange => ReactionCategory::Orange,
            SegmentType::Maroon => ReactionCategory::Maroon,
            SegmentType::Pink => ReactionCategory::Pink,
            SegmentType::Cream => ReactionCategory::Cream,
            SegmentType::Coral => ReactionCategory::Coral,
            SegmentType::Green
            | SegmentType::Forest
            | SegmentType::Spring
            | SegmentType::Lime
            | SegmentType::C4
            | SegmentType::Jade
            | SegmentType::Grass => ReactionCategory::Green,
            SegmentType::Bark => ReactionCategory::Bark,
            SegmentType::Blue => ReactionCategory::Blue,
            SegmentType::Sky => ReactionCategory::Sky,
            SegmentType::Olive => ReactionCategory::Olive,
            SegmentType::Ochre => ReactionCategory::Ochre,
            SegmentType::White => ReactionCategory::White,
            SegmentType::Plague => ReactionCategory::Plague,
            SegmentType::Mint => ReactionCategory::Mint,
            SegmentType::Magenta => ReactionCategory::Magenta,
            SegmentType::Violet => ReactionCategory::Violet,
            SegmentType::Gray => ReactionCategory::Gray,
            SegmentType::Lilac | SegmentType::DarkLilac => ReactionCategory::Lilac,
            SegmentType::Spike => ReactionCategory::Spike,
            SegmentType::SpikePoint => ReactionCategory::SpikePoint,
            SegmentType::Silver => ReactionCategory::Silver,
            SegmentType::LightBlue => ReactionCategory::LightBlue,
            SegmentType::LightBrown => ReactionCategory::LightBrown,
            SegmentType::GreenBrown => ReactionCategory::GreenBrown,
            SegmentType::Brown => ReactionCategory::Brown,
            SegmentType::Ice | SegmentType::DeepSky => ReactionCategory::Ice,
            SegmentType::OldBark
            | SegmentType::DarkJade
            | SegmentType::PoisonedJade
            | SegmentType::DarkFire
            | SegmentType::DarkOlive
            | SegmentType::Broken
            | SegmentType::DeadBark => ReactionCategory::Sick,
            SegmentType::Cyan
            | SegmentType::Teal
            | SegmentType::Rose
            | SegmentType::Yellow
            | SegmentType::Auburn
            | SegmentType::Indigo
            | SegmentType::Blond
            | SegmentType::DarkGray
            | SegmentType::Dark
            | SegmentType::Gold => ReactionCategory::Default,
        }
    }
}

impl std::fmt::Display for SegmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Category of an opposing segment, selecting one reaction code per gene
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReactionCategory {
    Red,
    Green,
    Blue,
    Plague,
    White,
    Gray,
    Default,
    Magenta,
    Pink,
    Coral,
    Orange,
    Bark,
    Violet,
    /// Opposing organism carries an infection
    Virus,
    Maroon,
    Olive,
    Mint,
    Cream,
    Spike,
    SpikePoint,
    LightBlue,
    Ochre,
    Sky,
    Lilac,
    Silver,
    Fire,
    LightBrown,
    GreenBrown,
    Brown,
    Ice,
    Sick,
    /// Opposing organism is friendly
    Friend,
}

impl ReactionCategory {
    pub const COUNT: usize = 32;

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Definition of a segment type's properties
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SegmentDef {
    pub id: SegmentType,
    pub name: String,

    /// Relative weight when drawing a random gene type (0 = never drawn)
    pub spawn_weight: u32,

    /// Energy paid each time a segment of this type triggers an effect
    pub energy_consumption: f64,

    /// Photosynthetic yield multiplier (0.0 = not photosynthetic)
    pub photosynthesis: f64,
    /// Yield multiplier while the organism is crowded by contacts
    pub crowded_photosynthesis: Option<f64>,

    // Roles
    /// Pushes off whatever it touches according to the gene's reaction code
    pub motile: bool,
    /// Lets the organism dodge the next hostile contact
    pub evasive: bool,
    /// Cures infections of friendly organisms
    pub curative: bool,
    /// Restores damaged segments of friendly organisms
    pub healer: bool,
    /// Shares energy with friendly organisms
    pub sharer: bool,
    /// Extends maximum age
    pub longevity: bool,
    /// Softens drains suffered by the organism
    pub warding: bool,
    /// Damaged segments grow back on their own
    pub regenerates: bool,

    // State transitions
    /// What this becomes while frozen
    pub frozen_variant: Option<SegmentType>,
    /// What this becomes when poisoned
    pub poisoned_variant: Option<SegmentType>,
    /// What this becomes when damaged
    pub damaged_variant: Option<SegmentType>,
}

impl Default for SegmentDef {
    fn default() -> Self {
        Self {
            id: SegmentType::Brown,
            name: "unknown".to_string(),
            spawn_weight: 0,
            energy_consumption: 0.0,
            photosynthesis: 0.0,
            crowded_photosynthesis: None,
            motile: false,
            evasive: false,
            curative: false,
            healer: false,
            sharer: false,
            longevity: false,
            warding: false,
            regenerates: false,
            frozen_variant: None,
            poisoned_variant: None,
            damaged_variant: None,
        }
    }
}

/// Registry of all segment types
pub struct SegmentTypes {
    defs: Vec<SegmentDef>,
    total_spawn_weight: u32,
}

impl SegmentTypes {
    pub fn new() -> Self {
        let mut types = Self {
            defs: SegmentType::ALL
                .iter()
                .map(|&id| SegmentDef {
                    id,
                    name: id.to_string().to_lowercase(),
                    ..Default::default()
                })
                .collect(),
            total_spawn_weight: 0,
        };
        types.register_defaults();
        types
    }

    fn register_defaults(&mut self) {
        use SegmentType as S;

        // ===== CONSUMERS =====
        self.register(SegmentDef {
            id: S::Red,
            spawn_weight: 1,
            damaged_variant: Some(S::LightBrown),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Fire,
            spawn_weight: 1,
            frozen_variant: Some(S::DarkFire),
            damaged_variant: Some(S::DarkFire),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Orange,
            spawn_weight: 1,
            damaged_variant: Some(S::LightBrown),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Maroon,
            spawn_weight: 2,
            damaged_variant: Some(S::LightBrown),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Pink,
            spawn_weight: 1,
            damaged_variant: Some(S::LightBrown),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Cream,
            spawn_weight: 1,
            damaged_variant: Some(S::LightBrown),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Coral,
            spawn_weight: 1,
            energy_consumption: 1.0,
            damaged_variant: Some(S::LightBrown),
            ..Default::default()
        });

        // ===== PHOTOSYNTHETIC =====
        self.register(SegmentDef {
            id: S::Green,
            spawn_weight: 2,
            energy_consumption: 1.1,
            photosynthesis: 1.0,
            frozen_variant: Some(S::Ice),
            poisoned_variant: Some(S::Broken),
            damaged_variant: Some(S::GreenBrown),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Forest,
            spawn_weight: 2,
            energy_consumption: 1.0,
            photosynthesis: 1.1,
            frozen_variant: Some(S::Ice),
            poisoned_variant: Some(S::Broken),
            damaged_variant: Some(S::GreenBrown),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Spring,
            spawn_weight: 2,
            energy_consumption: 1.0,
            photosynthesis: 1.1,
            frozen_variant: Some(S::Ice),
            poisoned_variant: Some(S::Broken),
            damaged_variant: Some(S::GreenBrown),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Lime,
            spawn_weight: 2,
            energy_consumption: 1.3,
            photosynthesis: 1.3,
            crowded_photosynthesis: Some(0.6),
            frozen_variant: Some(S::Ice),
            poisoned_variant: Some(S::Broken),
            damaged_variant: Some(S::GreenBrown),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::C4,
            spawn_weight: 2,
            energy_consumption: 0.6,
            photosynthesis: 1.2,
            frozen_variant: Some(S::Ice),
            poisoned_variant: Some(S::Broken),
            damaged_variant: Some(S::GreenBrown),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Jade,
            spawn_weight: 2,
            energy_consumption: 1.0,
            photosynthesis: 1.0,
            regenerates: true,
            frozen_variant: Some(S::DarkJade),
            poisoned_variant: Some(S::PoisonedJade),
            damaged_variant: Some(S::DarkJade),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Grass,
            spawn_weight: 2,
            energy_consumption: 1.0,
            photosynthesis: 1.0,
            frozen_variant: Some(S::Ice),
            poisoned_variant: Some(S::Broken),
            damaged_variant: Some(S::GreenBrown),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Bark,
            spawn_weight: 2,
            energy_consumption: 0.75,
            photosynthesis: 0.6,
            frozen_variant: Some(S::OldBark),
            poisoned_variant: Some(S::DeadBark),
            damaged_variant: Some(S::DeadBark),
            ..Default::default()
        });

        // ===== DEFENSE AND MOVEMENT =====
        self.register(SegmentDef {
            id: S::Blue,
            spawn_weight: 1,
            damaged_variant: Some(S::LightBlue),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Sky,
            spawn_weight: 1,
            energy_consumption: 0.1,
            motile: true,
            frozen_variant: Some(S::DeepSky),
            damaged_variant: Some(S::LightBrown),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Olive,
            spawn_weight: 1,
            energy_consumption: 0.1,
            curative: true,
            frozen_variant: Some(S::DarkOlive),
            damaged_variant: Some(S::DarkOlive),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Ochre,
            spawn_weight: 1,
            energy_consumption: 0.2,
            motile: true,
            frozen_variant: Some(S::Ice),
            damaged_variant: Some(S::LightBrown),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Cyan,
            spawn_weight: 7,
            motile: true,
            frozen_variant: Some(S::Ice),
            damaged_variant: Some(S::LightBrown),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Teal,
            spawn_weight: 7,
            motile: true,
            frozen_variant: Some(S::Ice),
            damaged_variant: Some(S::LightBrown),
            ..Default::default()
        });

        // ===== INFECTION AND SUPPORT =====
        self.register(SegmentDef {
            id: S::White,
            spawn_weight: 4,
            energy_consumption: 0.1,
            damaged_variant: Some(S::LightBrown),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Plague,
            spawn_weight: 1,
            energy_consumption: 5.0,
            damaged_variant: Some(S::LightBrown),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Mint,
            spawn_weight: 2,
            energy_consumption: 0.1,
            curative: true,
            damaged_variant: Some(S::LightBrown),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Magenta,
            spawn_weight: 2,
            energy_consumption: 0.1,
            curative: true,
            healer: true,
            damaged_variant: Some(S::LightBrown),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Rose,
            spawn_weight: 2,
            sharer: true,
            damaged_variant: Some(S::LightBrown),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Violet,
            spawn_weight: 1,
            energy_consumption: 0.1,
            damaged_variant: Some(S::LightBrown),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Gray,
            spawn_weight: 1,
            energy_consumption: 0.1,
            damaged_variant: Some(S::DarkGray),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Lilac,
            spawn_weight: 1,
            evasive: true,
            frozen_variant: Some(S::DarkLilac),
            damaged_variant: Some(S::DarkLilac),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Spike,
            spawn_weight: 1,
            damaged_variant: Some(S::SpikePoint),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Silver,
            spawn_weight: 1,
            energy_consumption: 0.1,
            damaged_variant: Some(S::Gray),
            ..Default::default()
        });

        // ===== LONGEVITY AND STEALTH =====
        self.register(SegmentDef {
            id: S::Yellow,
            spawn_weight: 2,
            damaged_variant: Some(S::LightBrown),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Auburn,
            spawn_weight: 2,
            energy_consumption: 0.01,
            damaged_variant: Some(S::LightBrown),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Indigo,
            spawn_weight: 2,
            warding: true,
            damaged_variant: Some(S::LightBrown),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Blond,
            spawn_weight: 2,
            energy_consumption: 0.02,
            damaged_variant: Some(S::LightBrown),
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::DarkGray,
            spawn_weight: 2,
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Dark,
            spawn_weight: 1,
            ..Default::default()
        });
        self.register(SegmentDef {
            id: S::Gold,
            spawn_weight: 2,
            longevity: true,
            damaged_variant: Some(S::LightBrown),
            ..Default::default()
        });

        // Altered states keep the blank defaults set up in new()
    }

    fn register(&mut self, def: SegmentDef) {
        let index = def.id.index();
        let name = std::mem::take(&mut self.defs[index].name);
        self.defs[index] = SegmentDef { name, ..def };
        self.total_spawn_weight = self.defs.iter().map(|d| d.spawn_weight).sum();
    }

    /// Get segment definition by type
    pub fn get(&self, id: SegmentType) -> &SegmentDef {
        &self.defs[id.index()]
    }

    /// Sum of all spawn weights
    pub fn total_spawn_weight(&self) -> u32 {
        self.total_spawn_weight
    }

    /// Map a roll in `0..total_spawn_weight()` to a segment type.
    ///
    /// Rolls past the end clamp to the last spawnable type.
    pub fn type_for_roll(&self, roll: u32) -> SegmentType {
        let mut remaining = roll;
        let mut last = SegmentType::Red;
        for def in self.defs.iter().filter(|d| d.spawn_weight > 0) {
            if remaining < def.spawn_weight {
                return def.id;
            }
            remaining -= def.spawn_weight;
            last = def.id;
        }
        last
    }
}

impl Default for SegmentTypes {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_types_listed_once() {
        for (i, t) in SegmentType::ALL.iter().enumerate() {
            assert_eq!(t.index(), i, "{} out of order", t);
        }
    }

    #[test]
    fn test_colors_are_distinct() {
        let mut colors: Vec<[u8; 4]> = SegmentType::ALL.iter().map(|t| t.color()).collect();
        colors.sort();
        colors.dedup();
        assert_eq!(colors.len(), SegmentType::COUNT);
    }

    #[test]
    fn test_spawn_weights() {
        let types = SegmentTypes::new();
        assert_eq!(types.get(SegmentType::Cyan).spawn_weight, 7);
        assert_eq!(types.get(SegmentType::White).spawn_weight, 4);
        assert_eq!(types.get(SegmentType::Brown).spawn_weight, 0);
        assert_eq!(types.get(SegmentType::Ice).spawn_weight, 0);

        let total: u32 = SegmentType::ALL
            .iter()
            .map(|&t| types.get(t).spawn_weight)
            .sum();
        assert_eq!(types.total_spawn_weight(), total);
    }

    #[test]
    fn test_type_for_roll_covers_weights() {
        let types = SegmentTypes::new();

        // Red is registered first with weight 1
        assert_eq!(types.type_for_roll(0), SegmentType::Red);
        assert_eq!(types.type_for_roll(1), SegmentType::Fire);

        // No roll ever lands on an altered state
        for roll in 0..types.total_spawn_weight() + 5 {
            let t = types.type_for_roll(roll);
            assert!(types.get(t).spawn_weight > 0, "roll {} gave {}", roll, t);
        }
    }

    #[test]
    fn test_special_roles() {
        let types = SegmentTypes::new();
        assert!(types.get(SegmentType::Indigo).warding);
        assert!(types.get(SegmentType::Jade).regenerates);
        assert_eq!(
            types.get(SegmentType::Jade).damaged_variant,
            Some(SegmentType::DarkJade)
        );
        assert_eq!(types.get(SegmentType::Lime).crowded_photosynthesis, Some(0.6));
        assert_eq!(types.get(SegmentType::Green).crowded_photosynthesis, None);
    }

    #[test]
    fn test_names_survive_registration() {
        let types = SegmentTypes::new();
        assert_eq!(types.get(SegmentType::DarkJade).name, "darkjade");
        assert_eq!(types.get(SegmentType::Green).name, "green");
    }

    #[test]
    fn test_categories() {
        assert_eq!(SegmentType::Lime.category(), ReactionCategory::Green);
        assert_eq!(SegmentType::DeepSky.category(), ReactionCategory::Ice);
        assert_eq!(SegmentType::PoisonedJade.category(), ReactionCategory::Sick);
        assert_eq!(SegmentType::Cyan.category(), ReactionCategory::Default);
        assert_eq!(ReactionCategory::Friend.index(), ReactionCategory::COUNT - 1);
    }
}
