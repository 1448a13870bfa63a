//! Contact reaction table
//!
//! Hostile contact between two segments is resolved by looking up the pair
//! (attacker type, defender type) plus both organisms' flags in a table of
//! rules. Each rule carries a composite [`Effect`]; the dispatcher never
//! branches on segment types itself.
//!
//! Lookup order: rules naming the exact defender type are tried before
//! wildcard rules, and within each group the first registered rule whose
//! flag conditions hold wins. A rule with an empty effect is a deliberate
//! "no reaction" entry that shadows any wildcard.

use crate::{OrganismFlags, SegmentType, SegmentTypes};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while loading a reaction table from RON
#[derive(Error, Debug)]
pub enum ReactionTableError {
    /// The RON text could not be parsed into a table
    #[error("Failed to parse reaction table: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Two rules in the same file share a name
    #[error("Duplicate reaction rule name: {0}")]
    DuplicateName(String),

    /// A rule has a non-finite or negative number
    #[error("Invalid value in rule {rule}: {reason}")]
    InvalidValue { rule: String, reason: String },
}

/// Tunables for contact reactions
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionConfig {
    /// Drain factor `k` of predatory segments (`k * log10(length)`)
    pub organic_obtained_energy: f64,
    /// Fraction of drained energy released to the atmosphere as CO2
    pub organic_subs_produced: f64,
    /// Byproduct fraction for cream scavengers
    pub cream_organic_subs_produced: f64,
    /// Ticks a transient recolor lasts
    pub recolor_ticks: u32,
    /// Ticks a freeze lasts
    pub freeze_ticks: u32,
    /// Push impulse per cubed unit of segment length
    pub push_factor: f64,
    /// Healing cost scale (lower heals cheaper)
    pub healing: f64,
    /// Curing cost scale (lower cures cheaper)
    pub immune_system: f64,
    /// Energy paid to arm a dodge
    pub dodge_energy_consumption: f64,
    /// Most energy a single friendly contact can share
    pub energy_share_cap: f64,
    /// Self-propulsion impulse per unit of segment length
    pub propulsion_factor: f64,
    /// Longevity segments per extra age unit
    pub gold_divisor: f64,
    /// Ticks a damaged regenerating segment needs to grow back
    pub dark_jade_delay: u32,
    /// Warding segments that halve a drain (lower wards better)
    pub indigo_divisor: f64,
    /// Cost of a white segment infecting a non-plant segment
    pub virus_energy_consumption: f64,
    /// Cost of a plague organism's white segment
    pub scourge_energy_consumption: f64,
    /// Cost of a silver block once the defender has blocked before
    pub experience_energy_consumption: f64,
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self {
            organic_obtained_energy: 7.0,
            organic_subs_produced: 0.1,
            cream_organic_subs_produced: 0.0,
            recolor_ticks: 10,
            freeze_ticks: 60,
            push_factor: 0.01,
            healing: 4500.0,
            immune_system: 4500.0,
            dodge_energy_consumption: 0.0,
            energy_share_cap: 10.0,
            propulsion_factor: 2.0,
            gold_divisor: 3.0,
            dark_jade_delay: 18,
            indigo_divisor: 9.0,
            virus_energy_consumption: 0.01,
            scourge_energy_consumption: 0.2,
            experience_energy_consumption: 0.0,
        }
    }
}

/// Energy taken from the defender: `clamp(factor * log10(length), 0, energy)`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Drain {
    pub factor: f64,
    /// Fraction released to the atmosphere
    pub byproduct: f64,
}

/// Defender-side interception of an attack
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shield {
    /// Energy the defender pays to block
    pub cost: f64,
    /// Blocking damages the shielding segment
    pub spends_shield: bool,
    /// Ticks the deflected attacker shows the shield's color
    pub recolor_ticks: u32,
    /// Cost paid instead of `cost` by a defender that has blocked before
    #[serde(default)]
    pub experienced_cost: Option<f64>,
}

/// Transient override of an organism's display type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recolor {
    pub to: SegmentType,
    pub ticks: u32,
}

/// Composite outcome of one directed contact.
///
/// Hostile rules fill the first group of fields; friendly contact fills the
/// cooperative group. An all-default effect does nothing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Effect {
    /// Attacker pays this before anything happens
    pub activation_cost: f64,
    pub drain: Option<Drain>,
    pub shield: Option<Shield>,
    pub attacker_recolor: Option<Recolor>,
    pub defender_recolor: Option<Recolor>,
    /// Attach the attacker's genetic code to the defender
    pub infect: bool,
    /// Freeze the defender for this many ticks
    pub freeze: Option<u32>,
    /// Permanently disable the touched defender segment
    pub poison: bool,
    /// Damage the touched defender segment
    pub damage: bool,
    /// Damage the attacking segment instead
    pub harm_attacker: bool,
    /// Push the defender away, scaled by length cubed
    pub push: Option<f64>,
    /// Stop the defender dead
    pub halt: bool,
    /// The defender's armed dodge absorbed this contact
    pub deflected: bool,

    // Cooperative
    /// Cure the defender's infection
    pub cure: bool,
    /// Restore the defender's damaged segments
    pub heal: bool,
    /// Share up to this much energy with the defender
    pub share: Option<f64>,
}

impl Effect {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn drain(factor: f64, byproduct: f64) -> Self {
        Self {
            drain: Some(Drain { factor, byproduct }),
            ..Self::default()
        }
    }

    pub fn push(factor: f64) -> Self {
        Self {
            push: Some(factor),
            ..Self::default()
        }
    }

    /// Replacement for a hostile effect absorbed by a dodge
    pub fn deflected(dodger: SegmentType, ticks: u32) -> Self {
        Self {
            deflected: true,
            attacker_recolor: Some(Recolor { to: dodger, ticks }),
            ..Self::default()
        }
    }

    pub fn is_none(&self) -> bool {
        *self == Self::default()
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.activation_cost = cost;
        self
    }

    pub fn with_shield(mut self, shield: Shield) -> Self {
        self.shield = Some(shield);
        self
    }

    pub fn recolor_attacker(mut self, to: SegmentType, ticks: u32) -> Self {
        self.attacker_recolor = Some(Recolor { to, ticks });
        self
    }

    pub fn recolor_defender(mut self, to: SegmentType, ticks: u32) -> Self {
        self.defender_recolor = Some(Recolor { to, ticks });
        self
    }

    pub fn with_infection(mut self) -> Self {
        self.infect = true;
        self
    }

    pub fn with_freeze(mut self, ticks: u32) -> Self {
        self.freeze = Some(ticks);
        self
    }

    pub fn with_poison(mut self) -> Self {
        self.poison = true;
        self
    }

    pub fn with_damage(mut self) -> Self {
        self.damage = true;
        self
    }

    pub fn with_attacker_harm(mut self) -> Self {
        self.harm_attacker = true;
        self
    }

    pub fn with_push(mut self, factor: f64) -> Self {
        self.push = Some(factor);
        self
    }

    pub fn with_halt(mut self) -> Self {
        self.halt = true;
        self
    }

    fn validate(&self) -> Result<(), String> {
        let mut values = vec![("activation_cost", self.activation_cost)];
        if let Some(drain) = self.drain {
            values.push(("drain.factor", drain.factor));
            values.push(("drain.byproduct", drain.byproduct));
        }
        if let Some(shield) = self.shield {
            values.push(("shield.cost", shield.cost));
            if let Some(cost) = shield.experienced_cost {
                values.push(("shield.experienced_cost", cost));
            }
        }
        if let Some(push) = self.push {
            values.push(("push", push));
        }
        if let Some(share) = self.share {
            values.push(("share", share));
        }
        for (field, value) in values {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} = {}", field, value));
            }
        }
        Ok(())
    }
}

/// One row of the reaction table
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReactionRule {
    /// Unique name, used when a loaded table overrides a built-in rule
    pub name: String,
    pub attacker: SegmentType,
    /// `None` matches any defender type
    pub defender: Option<SegmentType>,

    // Flag conditions
    #[serde(default)]
    pub attacker_requires: OrganismFlags,
    #[serde(default)]
    pub attacker_forbids: OrganismFlags,
    #[serde(default)]
    pub defender_requires: OrganismFlags,
    #[serde(default)]
    pub defender_forbids: OrganismFlags,

    pub effect: Effect,
}

impl ReactionRule {
    /// Rule against one specific defender type
    pub fn new(name: &str, attacker: SegmentType, defender: SegmentType, effect: Effect) -> Self {
        Self {
            name: name.to_string(),
            attacker,
            defender: Some(defender),
            attacker_requires: OrganismFlags::empty(),
            attacker_forbids: OrganismFlags::empty(),
            defender_requires: OrganismFlags::empty(),
            defender_forbids: OrganismFlags::empty(),
            effect,
        }
    }

    /// Rule against any living defender
    pub fn wildcard(name: &str, attacker: SegmentType, effect: Effect) -> Self {
        Self {
            defender: None,
            defender_forbids: OrganismFlags::DEAD,
            ..Self::new(name, attacker, SegmentType::Brown, effect)
        }
    }

    pub fn requires_attacker(mut self, flags: OrganismFlags) -> Self {
        self.attacker_requires |= flags;
        self
    }

    pub fn forbids_attacker(mut self, flags: OrganismFlags) -> Self {
        self.attacker_forbids |= flags;
        self
    }

    pub fn forbids_defender(mut self, flags: OrganismFlags) -> Self {
        self.defender_forbids |= flags;
        self
    }

    /// Whether both organisms' flags satisfy this rule
    pub fn matches(&self, attacker_flags: OrganismFlags, defender_flags: OrganismFlags) -> bool {
        attacker_flags.contains(self.attacker_requires)
            && !attacker_flags.intersects(self.attacker_forbids)
            && defender_flags.contains(self.defender_requires)
            && !defender_flags.intersects(self.defender_forbids)
    }

    fn key(&self) -> (SegmentType, Option<SegmentType>) {
        (self.attacker, self.defender)
    }
}

/// Serialized form of a reaction table
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReactionTable {
    /// Drop the built-in rules before applying this table
    #[serde(default)]
    pub replace: bool,
    pub rules: Vec<ReactionRule>,
}

/// Registry of all reaction rules with O(1) lookup per type pair
pub struct ReactionRegistry {
    rules: Vec<ReactionRule>,
    index: HashMap<(SegmentType, Option<SegmentType>), Vec<usize>>,
}

impl ReactionRegistry {
    /// Built-in table with default segment costs and tunables
    pub fn new() -> Self {
        Self::with_config(&SegmentTypes::new(), &ReactionConfig::default())
    }

    /// Built-in table using the given segment costs and tunables
    pub fn with_config(types: &SegmentTypes, config: &ReactionConfig) -> Self {
        let mut registry = Self::empty();
        registry.register_default_rules(types, config);
        registry
    }

    /// Registry without any rules
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Parse a standalone table; `replace` is implied
    pub fn from_ron(text: &str) -> Result<Self, ReactionTableError> {
        let mut registry = Self::empty();
        registry.apply_table(Self::parse_table(text)?);
        Ok(registry)
    }

    /// Apply a table on top of the current rules.
    ///
    /// Rules whose name matches an existing rule replace it in place; new
    /// names are appended.
    pub fn extend_from_ron(&mut self, text: &str) -> Result<(), ReactionTableError> {
        let table = Self::parse_table(text)?;
        if table.replace {
            *self = Self::empty();
        }
        self.apply_table(table);
        Ok(())
    }

    fn parse_table(text: &str) -> Result<ReactionTable, ReactionTableError> {
        let table: ReactionTable = ron::from_str(text)?;
        let mut seen = std::collections::HashSet::new();
        for rule in &table.rules {
            if !seen.insert(rule.name.as_str()) {
                return Err(ReactionTableError::DuplicateName(rule.name.clone()));
            }
            rule.effect
                .validate()
                .map_err(|reason| ReactionTableError::InvalidValue {
                    rule: rule.name.clone(),
                    reason,
                })?;
        }
        Ok(table)
    }

    fn apply_table(&mut self, table: ReactionTable) {
        for rule in table.rules {
            if let Some(pos) = self.rules.iter().position(|r| r.name == rule.name) {
                log::warn!("Reaction table overrides built-in rule '{}'", rule.name);
                self.rules[pos] = rule;
                self.rebuild_index();
            } else {
                self.register(rule);
            }
        }
    }

    /// Export the current rules
    pub fn to_table(&self) -> ReactionTable {
        ReactionTable {
            replace: true,
            rules: self.rules.clone(),
        }
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (i, rule) in self.rules.iter().enumerate() {
            self.index.entry(rule.key()).or_default().push(i);
        }
    }

    /// Register a rule after all existing ones
    pub fn register(&mut self, rule: ReactionRule) {
        self.index
            .entry(rule.key())
            .or_default()
            .push(self.rules.len());
        self.rules.push(rule);
    }

    /// Find the rule governing a directed contact, if any
    pub fn find_rule(
        &self,
        attacker: SegmentType,
        attacker_flags: OrganismFlags,
        defender: SegmentType,
        defender_flags: OrganismFlags,
    ) -> Option<&ReactionRule> {
        [Some(defender), None]
            .into_iter()
            .filter_map(|key| self.index.get(&(attacker, key)))
            .flatten()
            .map(|&i| &self.rules[i])
            .find(|rule| rule.matches(attacker_flags, defender_flags))
    }

    /// Look up a rule by name
    pub fn get(&self, name: &str) -> Option<&ReactionRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Register the built-in rule set
    fn register_default_rules(&mut self, types: &SegmentTypes, config: &ReactionConfig) {
        use SegmentType as S;

        let k = config.organic_obtained_energy;
        let by = config.organic_subs_produced;
        let ticks = config.recolor_ticks;
        let cost = |t: S| types.get(t).energy_consumption;

        // (type, blocking damages it)
        let shields = [
            (S::Blue, true),
            (S::Silver, false),
            (S::Gray, false),
            (S::DarkGray, false),
        ];
        let antivirals = [S::Olive, S::Mint];

        // ===== BASE EFFECTS OF EACH HOSTILE TYPE =====
        let red = Effect::drain(k, by)
            .with_cost(cost(S::Red))
            .recolor_attacker(S::Red, ticks);
        let fire = Effect::drain(0.5 * k, 0.5)
            .with_cost(cost(S::Fire))
            .recolor_attacker(S::Fire, ticks);
        let orange = Effect::push(config.push_factor).with_cost(cost(S::Orange));
        let coral = Effect::drain(0.3 * k, 0.0)
            .with_cost(cost(S::Coral))
            .recolor_defender(S::Coral, ticks);
        let spike = Effect::drain(0.7 * k, by)
            .with_cost(cost(S::Spike))
            .with_damage();
        let violet = Effect::default()
            .with_poison()
            .with_cost(cost(S::Violet))
            .recolor_defender(S::Violet, ticks);
        let plague = Effect::drain(0.5 * k, by)
            .with_infection()
            .with_cost(cost(S::Plague))
            .recolor_defender(S::Plague, ticks);
        let sky = Effect::default()
            .with_freeze(config.freeze_ticks)
            .with_cost(cost(S::Sky))
            .recolor_defender(S::Ice, ticks);
        let yellow = Effect::default()
            .with_halt()
            .with_cost(cost(S::Yellow))
            .recolor_defender(S::Yellow, ticks);
        let auburn = Effect::default()
            .with_damage()
            .with_cost(cost(S::Auburn))
            .recolor_attacker(S::Auburn, ticks);
        let blond = Effect::push(0.25 * config.push_factor).with_cost(cost(S::Blond));

        // ===== SHIELDS =====
        // Registered first so they shadow every wildcard below
        for (attacker, base) in [
            (S::Red, &red),
            (S::Fire, &fire),
            (S::Orange, &orange),
            (S::Coral, &coral),
            (S::Spike, &spike),
            (S::Violet, &violet),
            (S::Plague, &plague),
            (S::Yellow, &yellow),
            (S::Auburn, &auburn),
            (S::Blond, &blond),
        ] {
            for (shield, spends_shield) in shields {
                // Silver gets cheaper with practice
                let experienced_cost =
                    (shield == S::Silver).then_some(config.experience_energy_consumption);
                self.register(ReactionRule::new(
                    &format!("{}_blocked_by_{}", attacker, shield).to_lowercase(),
                    attacker,
                    shield,
                    base.clone().with_shield(Shield {
                        cost: cost(shield),
                        spends_shield,
                        recolor_ticks: ticks,
                        experienced_cost,
                    }),
                ));
            }
        }

        // ===== RED: PREDATOR =====
        self.register(ReactionRule::new("red_ignores_corpse", S::Red, S::Brown, Effect::none()));
        self.register(ReactionRule::new("red_misses_dark", S::Red, S::Dark, Effect::none()));
        self.register(ReactionRule::new(
            "red_pierced_by_spike",
            S::Red,
            S::Spike,
            Effect::default().with_attacker_harm(),
        ));
        self.register(ReactionRule::wildcard("red_feeds", S::Red, red));

        // ===== FIRE: BURNS PLANTS =====
        for plant in SegmentType::PLANTS {
            self.register(ReactionRule::new(
                &format!("fire_burns_{}", plant).to_lowercase(),
                S::Fire,
                plant,
                Effect::drain(1.5 * k, 0.5)
                    .with_damage()
                    .with_cost(cost(S::Fire))
                    .recolor_attacker(S::Fire, ticks),
            ));
        }
        for frozen in [S::Ice, S::DeepSky] {
            self.register(ReactionRule::new(
                &format!("fire_doused_by_{}", frozen).to_lowercase(),
                S::Fire,
                frozen,
                Effect::default().with_attacker_harm(),
            ));
        }
        self.register(ReactionRule::wildcard("fire_scorches", S::Fire, fire));

        // ===== ORANGE: PUSHER =====
        self.register(ReactionRule::wildcard("orange_pushes", S::Orange, orange));

        // ===== MAROON: HERBIVORE =====
        for plant in SegmentType::PLANTS {
            self.register(ReactionRule::new(
                &format!("maroon_grazes_{}", plant).to_lowercase(),
                S::Maroon,
                plant,
                Effect::drain(k, by)
                    .with_cost(cost(S::Maroon))
                    .recolor_attacker(S::Maroon, ticks),
            ));
        }

        // ===== PINK AND CREAM: SCAVENGERS =====
        self.register(ReactionRule::new(
            "pink_scavenges",
            S::Pink,
            S::Brown,
            Effect::drain(k, by).with_cost(cost(S::Pink)),
        ));
        self.register(
            ReactionRule::wildcard(
                "pink_hunts",
                S::Pink,
                Effect::drain(0.5 * k, by)
                    .with_cost(cost(S::Pink))
                    .recolor_attacker(S::Pink, ticks),
            )
            .requires_attacker(OrganismFlags::MODIFIES_PINK),
        );
        self.register(ReactionRule::new(
            "cream_scavenges",
            S::Cream,
            S::Brown,
            Effect::drain(k, config.cream_organic_subs_produced).with_cost(cost(S::Cream)),
        ));
        for plant in SegmentType::PLANTS {
            self.register(
                ReactionRule::new(
                    &format!("cream_grazes_{}", plant).to_lowercase(),
                    S::Cream,
                    plant,
                    Effect::drain(0.5 * k, config.cream_organic_subs_produced)
                        .with_cost(cost(S::Cream)),
                )
                .requires_attacker(OrganismFlags::MODIFIES_CREAM),
            );
        }

        // ===== CORAL: PARASITE =====
        self.register(ReactionRule::wildcard("coral_parasitizes", S::Coral, coral));

        // ===== WHITE AND PLAGUE: INFECTION =====
        for antiviral in antivirals {
            self.register(ReactionRule::new(
                &format!("white_resisted_by_{}", antiviral).to_lowercase(),
                S::White,
                antiviral,
                Effect::none(),
            ));
            self.register(ReactionRule::new(
                &format!("plague_resisted_by_{}", antiviral).to_lowercase(),
                S::Plague,
                antiviral,
                Effect::none(),
            ));
        }
        self.register(
            ReactionRule::wildcard(
                "white_scourge",
                S::White,
                Effect::drain(0.2 * k, by)
                    .with_infection()
                    .with_cost(config.scourge_energy_consumption)
                    .recolor_defender(S::White, ticks),
            )
            .requires_attacker(OrganismFlags::PLAGUE)
            .forbids_defender(OrganismFlags::INFECTED),
        );
        // Plants cost the full white price, anything else the virus price
        for plant in SegmentType::PLANTS {
            self.register(
                ReactionRule::new(
                    &format!("white_infects_{}", plant).to_lowercase(),
                    S::White,
                    plant,
                    Effect::default()
                        .with_infection()
                        .with_cost(cost(S::White))
                        .recolor_defender(S::White, ticks),
                )
                .forbids_attacker(OrganismFlags::PLAGUE)
                .forbids_defender(OrganismFlags::INFECTED | OrganismFlags::DEAD),
            );
        }
        self.register(
            ReactionRule::wildcard(
                "white_infects",
                S::White,
                Effect::default()
                    .with_infection()
                    .with_cost(config.virus_energy_consumption)
                    .recolor_defender(S::White, ticks),
            )
            .forbids_defender(OrganismFlags::INFECTED),
        );
        self.register(ReactionRule::wildcard("plague_spreads", S::Plague, plague));

        // ===== VIOLET: POISON =====
        self.register(ReactionRule::wildcard("violet_poisons", S::Violet, violet));

        // ===== SKY: FREEZE =====
        self.register(ReactionRule::new("sky_melted_by_fire", S::Sky, S::Fire, Effect::none()));
        self.register(
            ReactionRule::wildcard("sky_freezes", S::Sky, sky)
                .forbids_defender(OrganismFlags::FROZEN),
        );

        // ===== SPIKE =====
        self.register(ReactionRule::wildcard("spike_impales", S::Spike, spike));

        // ===== LILAC =====
        self.register(
            ReactionRule::wildcard(
                "lilac_shoves",
                S::Lilac,
                Effect::push(0.5 * config.push_factor).with_cost(cost(S::Lilac)),
            )
            .requires_attacker(OrganismFlags::MODIFIES_LILAC),
        );

        // ===== YELLOW, AUBURN AND BLOND =====
        self.register(ReactionRule::wildcard("yellow_stuns", S::Yellow, yellow));
        self.register(ReactionRule::wildcard("auburn_wounds", S::Auburn, auburn));
        self.register(ReactionRule::wildcard("blond_nudges", S::Blond, blond));

        log::debug!("Registered {} built-in reaction rules", self.rules.len());
    }
}

impl Default for ReactionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
