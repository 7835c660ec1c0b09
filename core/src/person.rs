//! A single member of the population.
//!
//! A `Person` owns its own status fields and relationship sets. Rules that
//! span two people (partnership, parenthood, death cascade) live on
//! `Population`, which is the only place that can borrow both sides.

use crate::{
    error::LifecycleError,
    types::{PersonId, SimTime},
};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Minimum age for forming a partnership.
pub const ADULT_AGE: u32 = 18;
/// Maximum age a person may reach at death.
pub const MAX_AGE_AT_DEATH: u32 = 125;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Female,
    Male,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl HealthStatus {
    /// One step worse, saturating at `Critical`.
    pub fn declined(&self) -> Self {
        match self {
            HealthStatus::Excellent => HealthStatus::Good,
            HealthStatus::Good      => HealthStatus::Fair,
            HealthStatus::Fair      => HealthStatus::Poor,
            HealthStatus::Poor | HealthStatus::Critical => HealthStatus::Critical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WealthClass {
    Destitute,
    Poor,
    Middle,
    Comfortable,
    Affluent,
}

impl WealthClass {
    pub const ALL: [WealthClass; 5] = [
        WealthClass::Destitute,
        WealthClass::Poor,
        WealthClass::Middle,
        WealthClass::Comfortable,
        WealthClass::Affluent,
    ];

    /// Move `steps` classes up (positive) or down (negative), clamped.
    pub fn shifted(&self, steps: i32) -> Self {
        let idx = (*self as i32 + steps).clamp(0, Self::ALL.len() as i32 - 1);
        Self::ALL[idx as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    NaturalCauses,
    Illness,
    Accident,
    Violence,
    #[default]
    Unexplained,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonalityTrait {
    Openness,
    Conscientiousness,
    Extraversion,
    Agreeableness,
    Neuroticism,
}

impl PersonalityTrait {
    pub const ALL: [PersonalityTrait; 5] = [
        PersonalityTrait::Openness,
        PersonalityTrait::Conscientiousness,
        PersonalityTrait::Extraversion,
        PersonalityTrait::Agreeableness,
        PersonalityTrait::Neuroticism,
    ];
}

/// Named age band. Always derived from age, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeStage {
    Infant,      // 0–1
    Child,       // 2–12
    Adolescent,  // 13–17
    YoungAdult,  // 18–29
    Adult,       // 30–59
    Senior,      // 60–79
    Elder,       // 80+
}

impl LifeStage {
    pub const ALL: [LifeStage; 7] = [
        LifeStage::Infant,
        LifeStage::Child,
        LifeStage::Adolescent,
        LifeStage::YoungAdult,
        LifeStage::Adult,
        LifeStage::Senior,
        LifeStage::Elder,
    ];

    pub fn from_age(age: u32) -> Self {
        match age {
            0..=1   => LifeStage::Infant,
            2..=12  => LifeStage::Child,
            13..=17 => LifeStage::Adolescent,
            18..=29 => LifeStage::YoungAdult,
            30..=59 => LifeStage::Adult,
            60..=79 => LifeStage::Senior,
            _       => LifeStage::Elder,
        }
    }

    pub fn is_adult(&self) -> bool {
        *self >= LifeStage::YoungAdult
    }
}

/// Whole years from `from` to `to`, zero if `to` precedes `from`.
pub fn years_between(from: SimTime, to: SimTime) -> u32 {
    if to <= from {
        return 0;
    }
    let mut years = to.year() - from.year();
    if (to.month(), to.day()) < (from.month(), from.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    id:              PersonId,
    name:            String,
    sex:             Sex,
    birth_date:      SimTime,
    health:          HealthStatus,
    wealth:          WealthClass,
    death_date:      Option<SimTime>,
    death_cause:     Option<DeathCause>,
    pub(crate) partner:         Option<PersonId>,
    pub(crate) children:        BTreeSet<PersonId>,
    pub(crate) parents:         BTreeSet<PersonId>,
    pub(crate) former_partners: BTreeSet<PersonId>,
    personality:     BTreeMap<PersonalityTrait, u8>,
}

impl Person {
    pub fn new(name: impl Into<String>, sex: Sex, birth_date: SimTime) -> Self {
        Self {
            id: PersonId::new(),
            name: name.into(),
            sex,
            birth_date,
            health: HealthStatus::Good,
            wealth: WealthClass::Middle,
            death_date: None,
            death_cause: None,
            partner: None,
            children: BTreeSet::new(),
            parents: BTreeSet::new(),
            former_partners: BTreeSet::new(),
            personality: BTreeMap::new(),
        }
    }

    pub fn with_health(mut self, health: HealthStatus) -> Self {
        self.health = health;
        self
    }

    pub fn with_wealth(mut self, wealth: WealthClass) -> Self {
        self.wealth = wealth;
        self
    }

    /// Builder form of `set_trait`; out-of-range intensities are clamped.
    pub fn with_trait(mut self, t: PersonalityTrait, intensity: u8) -> Self {
        self.personality.insert(t, intensity.clamp(1, 10));
        self
    }

    // ── Identity & status ──────────────────────────

    pub fn id(&self) -> PersonId { self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn sex(&self) -> Sex { self.sex }
    pub fn birth_date(&self) -> SimTime { self.birth_date }
    pub fn health(&self) -> HealthStatus { self.health }
    pub fn wealth(&self) -> WealthClass { self.wealth }
    pub fn death_date(&self) -> Option<SimTime> { self.death_date }
    pub fn death_cause(&self) -> Option<DeathCause> { self.death_cause }

    pub fn is_alive(&self) -> bool {
        self.death_date.is_none()
    }

    /// Whole years lived as of `now`, or as of the death date once deceased.
    pub fn age(&self, now: SimTime) -> u32 {
        let end = match self.death_date {
            Some(died) if died < now => died,
            _ => now,
        };
        years_between(self.birth_date, end)
    }

    pub fn life_stage(&self, now: SimTime) -> LifeStage {
        LifeStage::from_age(self.age(now))
    }

    // ── Relationship snapshots ─────────────────────

    pub fn partner(&self) -> Option<PersonId> { self.partner }

    pub fn children(&self) -> BTreeSet<PersonId> {
        self.children.clone()
    }

    pub fn parents(&self) -> BTreeSet<PersonId> {
        self.parents.clone()
    }

    pub fn former_partners(&self) -> BTreeSet<PersonId> {
        self.former_partners.clone()
    }

    pub fn personality(&self) -> BTreeMap<PersonalityTrait, u8> {
        self.personality.clone()
    }

    pub fn trait_intensity(&self, t: PersonalityTrait) -> Option<u8> {
        self.personality.get(&t).copied()
    }

    pub fn is_parent_of(&self, other: PersonId) -> bool {
        self.children.contains(&other)
    }

    pub fn is_child_of(&self, other: PersonId) -> bool {
        self.parents.contains(&other)
    }

    // ── Single-entity mutations ────────────────────

    fn ensure_alive(&self) -> Result<(), LifecycleError> {
        if self.is_alive() {
            Ok(())
        } else {
            Err(LifecycleError::AlreadyDeceased(self.id))
        }
    }

    pub fn set_health(&mut self, health: HealthStatus) -> Result<(), LifecycleError> {
        self.ensure_alive()?;
        self.health = health;
        Ok(())
    }

    pub fn set_wealth(&mut self, wealth: WealthClass) -> Result<(), LifecycleError> {
        self.ensure_alive()?;
        self.wealth = wealth;
        Ok(())
    }

    pub fn set_trait(&mut self, t: PersonalityTrait, intensity: u8) -> Result<(), LifecycleError> {
        self.ensure_alive()?;
        if !(1..=10).contains(&intensity) {
            return Err(LifecycleError::TraitIntensityOutOfRange(intensity));
        }
        self.personality.insert(t, intensity);
        Ok(())
    }

    /// Check a proposed death date without applying it.
    pub fn validate_death(&self, date: SimTime, now: SimTime) -> Result<(), LifecycleError> {
        self.ensure_alive()?;
        if date < self.birth_date {
            return Err(LifecycleError::DeathBeforeBirth { date, birth: self.birth_date });
        }
        if date > now {
            return Err(LifecycleError::DeathInFuture { date, now });
        }
        let age = years_between(self.birth_date, date);
        if age > MAX_AGE_AT_DEATH {
            return Err(LifecycleError::AgeAtDeathExceeded { age, max: MAX_AGE_AT_DEATH });
        }
        Ok(())
    }

    /// Record death. The partnership cascade is handled by `Population`.
    pub(crate) fn record_death(&mut self, date: SimTime, cause: DeathCause) {
        self.death_date = Some(date);
        self.death_cause = Some(cause);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> SimTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn age_counts_whole_years_only() {
        let p = Person::new("Ada", Sex::Female, date(1990, 6, 15));
        assert_eq!(p.age(date(2020, 6, 14)), 29);
        assert_eq!(p.age(date(2020, 6, 15)), 30);
        assert_eq!(p.age(date(1980, 1, 1)), 0);
    }

    #[test]
    fn age_freezes_at_death() {
        let mut p = Person::new("Ada", Sex::Female, date(1900, 1, 1));
        p.record_death(date(1950, 1, 1), DeathCause::Illness);
        assert_eq!(p.age(date(2000, 1, 1)), 50);
    }

    #[test]
    fn life_stage_bands() {
        assert_eq!(LifeStage::from_age(0), LifeStage::Infant);
        assert_eq!(LifeStage::from_age(1), LifeStage::Infant);
        assert_eq!(LifeStage::from_age(2), LifeStage::Child);
        assert_eq!(LifeStage::from_age(13), LifeStage::Adolescent);
        assert_eq!(LifeStage::from_age(17), LifeStage::Adolescent);
        assert_eq!(LifeStage::from_age(18), LifeStage::YoungAdult);
        assert_eq!(LifeStage::from_age(30), LifeStage::Adult);
        assert_eq!(LifeStage::from_age(60), LifeStage::Senior);
        assert_eq!(LifeStage::from_age(80), LifeStage::Elder);
        assert!(!LifeStage::Adolescent.is_adult());
        assert!(LifeStage::YoungAdult.is_adult());
    }

    #[test]
    fn trait_intensity_must_be_in_range() {
        let mut p = Person::new("Ada", Sex::Female, date(1990, 1, 1));
        assert_eq!(
            p.set_trait(PersonalityTrait::Openness, 11),
            Err(LifecycleError::TraitIntensityOutOfRange(11))
        );
        p.set_trait(PersonalityTrait::Openness, 7).unwrap();
        assert_eq!(p.trait_intensity(PersonalityTrait::Openness), Some(7));
    }

    #[test]
    fn status_changes_rejected_after_death() {
        let mut p = Person::new("Ada", Sex::Female, date(1990, 1, 1));
        p.record_death(date(2000, 1, 1), DeathCause::Accident);
        assert!(matches!(
            p.set_health(HealthStatus::Poor),
            Err(LifecycleError::AlreadyDeceased(_))
        ));
    }

    #[test]
    fn wealth_shift_clamps() {
        assert_eq!(WealthClass::Affluent.shifted(2), WealthClass::Affluent);
        assert_eq!(WealthClass::Poor.shifted(-3), WealthClass::Destitute);
        assert_eq!(WealthClass::Middle.shifted(1), WealthClass::Comfortable);
    }
}
