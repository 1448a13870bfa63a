//! Shared O2/CO2 pools

use biomorph_organism::AtmosphereAccess;
use serde::{Deserialize, Serialize};

/// Gas pools every organism draws from and releases into
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Atmosphere {
    pub o2: f64,
    pub co2: f64,
}

impl Atmosphere {
    pub fn new(o2: f64, co2: f64) -> Self {
        Self {
            o2: o2.max(0.0),
            co2: co2.max(0.0),
        }
    }

    /// Most energy a single photosynthesis draw may take
    pub fn photosynthesis_cap(&self, drain_subs_divisor: f64) -> f64 {
        if drain_subs_divisor > 0.0 {
            self.co2 / drain_subs_divisor
        } else {
            self.co2
        }
    }
}

impl AtmosphereAccess for Atmosphere {
    fn consume_co2(&mut self, amount: f64) -> f64 {
        let taken = amount.clamp(0.0, self.co2);
        self.co2 -= taken;
        taken
    }

    fn produce_o2(&mut self, amount: f64) {
        if amount > 0.0 {
            self.o2 += amount;
        }
    }

    fn release_co2(&mut self, amount: f64) {
        if amount <= 0.0 {
            return;
        }
        self.co2 += amount;
        self.o2 = (self.o2 - amount).max(0.0);
    }
}
