use crate::{clock::SimSpeed, person::LifeStage, types::{Days, SimTime}};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Annual probabilities of life events, applied per step pro rata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatesConfig {
    /// Annual mortality by life stage. Missing stages never die of old age.
    pub mortality:          BTreeMap<LifeStage, f64>,
    /// Health below `Fair` multiplies mortality by this factor.
    #[serde(default = "default_frailty_multiplier")]
    pub frailty_multiplier: f64,
    /// Annual chance a single adult forms a partnership.
    pub partnership:        f64,
    /// Annual chance an existing partnership dissolves.
    pub dissolution:        f64,
    /// Annual chance a partnered woman of fertile age gives birth.
    pub fertility:          f64,
    pub fertile_ages:       (u32, u32),
    /// Annual chance of health declining one step.
    pub health_decline:     f64,
    /// Annual chance of moving one wealth class up or down.
    pub wealth_drift:       f64,
}

fn default_frailty_multiplier() -> f64 { 3.0 }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedingConfig {
    pub initial_population: usize,
    /// Seeded people are this many years old at the start date.
    pub age_range:          (u32, u32),
    /// Fraction of seeded adults placed into partnerships at the start.
    #[serde(default)]
    pub partnered_share:    f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub seed:                u64,
    pub start_date:          SimTime,
    #[serde(default)]
    pub speed:               SimSpeed,
    /// Days between census events. Zero disables the census.
    #[serde(default = "default_census_interval")]
    pub census_interval_days: Days,
    pub seeding:             SeedingConfig,
    pub rates:               RatesConfig,
}

fn default_census_interval() -> Days { 365 }

impl SimConfig {
    /// Load from a JSON file.
    /// In tests, use SimConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let config: SimConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let (lo, hi) = self.seeding.age_range;
        if lo > hi {
            anyhow::bail!("seeding.age_range is inverted: ({lo}, {hi})");
        }
        let (flo, fhi) = self.rates.fertile_ages;
        if flo > fhi {
            anyhow::bail!("rates.fertile_ages is inverted: ({flo}, {fhi})");
        }
        let mut probabilities = vec![
            ("partnership", self.rates.partnership),
            ("dissolution", self.rates.dissolution),
            ("fertility", self.rates.fertility),
            ("health_decline", self.rates.health_decline),
            ("wealth_drift", self.rates.wealth_drift),
            ("partnered_share", self.seeding.partnered_share),
        ];
        probabilities.extend(self.rates.mortality.values().map(|p| ("mortality", *p)));
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                anyhow::bail!("{name} probability {p} outside [0, 1]");
            }
        }
        Ok(())
    }

    /// Small population with the standard rates. Used by tests and the runner.
    pub fn default_test() -> Self {
        let mortality = BTreeMap::from([
            (LifeStage::Infant,     0.005),
            (LifeStage::Child,      0.0003),
            (LifeStage::Adolescent, 0.0005),
            (LifeStage::YoungAdult, 0.001),
            (LifeStage::Adult,      0.004),
            (LifeStage::Senior,     0.03),
            (LifeStage::Elder,      0.15),
        ]);
        Self {
            seed: 42,
            start_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default(),
            speed: SimSpeed::Accelerated,
            census_interval_days: 365,
            seeding: SeedingConfig {
                initial_population: 50,
                age_range: (18, 70),
                partnered_share: 0.4,
            },
            rates: RatesConfig {
                mortality,
                frailty_multiplier: default_frailty_multiplier(),
                partnership: 0.15,
                dissolution: 0.02,
                fertility: 0.12,
                fertile_ages: (18, 44),
                health_decline: 0.05,
                wealth_drift: 0.05,
            },
        }
    }
}
