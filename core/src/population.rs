//! The population aggregate — every person, keyed by id.
//!
//! RULE: Relationship links are only ever written here, so both sides of a
//! link change together. After every public mutation the seven entity
//! invariants hold:
//!   1. Partnership is symmetric and exclusive.
//!   2. Partners are alive and adult when the partnership forms.
//!   3. Nobody partners a parent, child, or sibling.
//!   4. Parents are at least 12 years older than their children.
//!   5. Nobody has more than two parents.
//!   6. Life stage is derived from age, never stored.
//!   7. The dead have no partner, and a valid death date.
//!
//! There is no internal locking. The scheduler hands out `&mut Population`
//! to one processor at a time.

use crate::{
    error::{LifecycleError, RelationshipError},
    person::{years_between, DeathCause, LifeStage, Person},
    types::{PersonId, SimTime},
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Minimum age difference between a parent and a child, in years.
pub const MIN_PARENT_AGE_GAP: i64 = 12;

#[derive(Debug, Default)]
pub struct Population {
    people: HashMap<PersonId, Person>,
    /// Insertion order. Ids are random, so anything that rolls dice per
    /// person walks this list to stay deterministic.
    order:  Vec<PersonId>,
}

/// Counts by life stage at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Census {
    pub date:         Option<SimTime>,
    pub living:       usize,
    pub deceased:     usize,
    pub partnered:    usize,
    pub by_stage:     BTreeMap<LifeStage, usize>,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a person. Ids must be unique.
    pub fn insert(&mut self, person: Person) -> Result<PersonId, LifecycleError> {
        let id = person.id();
        if self.people.contains_key(&id) {
            return Err(LifecycleError::DuplicatePerson(id));
        }
        self.people.insert(id, person);
        self.order.push(id);
        Ok(id)
    }

    pub fn get(&self, id: PersonId) -> Option<&Person> {
        self.people.get(&id)
    }

    /// Mutable access for single-entity status changes (health, wealth,
    /// personality). Relationship fields are not reachable through this.
    pub fn get_mut(&mut self, id: PersonId) -> Option<&mut Person> {
        self.people.get_mut(&id)
    }

    pub fn contains(&self, id: PersonId) -> bool {
        self.people.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Person> {
        self.people.values()
    }

    /// Ids in insertion order.
    pub fn ids(&self) -> &[PersonId] {
        &self.order
    }

    pub fn living(&self) -> impl Iterator<Item = &Person> {
        self.people.values().filter(|p| p.is_alive())
    }

    fn person(&self, id: PersonId) -> Result<&Person, RelationshipError> {
        self.people.get(&id).ok_or(RelationshipError::UnknownPerson(id))
    }

    // ── Family queries ─────────────────────────────

    /// People sharing at least one parent with `id`.
    pub fn siblings(&self, id: PersonId) -> BTreeSet<PersonId> {
        let Some(person) = self.people.get(&id) else {
            return BTreeSet::new();
        };
        person
            .parents
            .iter()
            .filter_map(|parent| self.people.get(parent))
            .flat_map(|parent| parent.children.iter().copied())
            .filter(|child| *child != id)
            .collect()
    }

    /// Parent, child, or sibling.
    pub fn is_direct_family(&self, a: PersonId, b: PersonId) -> bool {
        let (Some(pa), Some(pb)) = (self.people.get(&a), self.people.get(&b)) else {
            return false;
        };
        pa.is_parent_of(b)
            || pa.is_child_of(b)
            || pb.is_parent_of(a)
            || pb.is_child_of(a)
            || pa.parents.intersection(&pb.parents).next().is_some()
    }

    // ── Partnership ────────────────────────────────

    /// Check invariants 1–3 for a proposed partnership without applying it.
    pub fn can_form_partnership(
        &self,
        a: PersonId,
        b: PersonId,
        now: SimTime,
    ) -> Result<(), RelationshipError> {
        if a == b {
            return Err(RelationshipError::SelfReference(a));
        }
        let pa = self.person(a)?;
        let pb = self.person(b)?;
        for p in [pa, pb] {
            if !p.is_alive() {
                return Err(RelationshipError::Deceased(p.id()));
            }
        }
        for p in [pa, pb] {
            if p.partner().is_some() {
                return Err(RelationshipError::AlreadyPartnered(p.id()));
            }
        }
        for p in [pa, pb] {
            let stage = p.life_stage(now);
            if !stage.is_adult() {
                return Err(RelationshipError::NotAdult { id: p.id(), stage });
            }
        }
        if self.is_direct_family(a, b) {
            return Err(RelationshipError::DirectFamily { a, b });
        }
        Ok(())
    }

    pub fn form_partnership(
        &mut self,
        a: PersonId,
        b: PersonId,
        now: SimTime,
    ) -> Result<(), RelationshipError> {
        self.can_form_partnership(a, b, now)?;
        if let Some(pa) = self.people.get_mut(&a) {
            pa.partner = Some(b);
        }
        if let Some(pb) = self.people.get_mut(&b) {
            pb.partner = Some(a);
        }
        log::debug!("date={now} partnership formed: {a} + {b}");
        Ok(())
    }

    /// Clear both sides and record each in the other's history.
    /// Returns the former partner, or `None` if there was no partnership.
    pub fn dissolve_partnership(&mut self, id: PersonId) -> Option<PersonId> {
        let partner = self.people.get_mut(&id)?.partner.take()?;
        if let Some(p) = self.people.get_mut(&id) {
            p.former_partners.insert(partner);
        }
        if let Some(other) = self.people.get_mut(&partner) {
            if other.partner == Some(id) {
                other.partner = None;
            }
            other.former_partners.insert(id);
        }
        log::debug!("partnership dissolved: {id} / {partner}");
        Some(partner)
    }

    // ── Parenthood ─────────────────────────────────

    /// Check invariants 4–5 for a proposed parent/child link, and that the
    /// link does not make the child direct family of their own partner.
    pub fn can_add_child(&self, parent: PersonId, child: PersonId) -> Result<(), RelationshipError> {
        if parent == child {
            return Err(RelationshipError::SelfReference(parent));
        }
        let p = self.person(parent)?;
        let c = self.person(child)?;
        for person in [p, c] {
            if !person.is_alive() {
                return Err(RelationshipError::Deceased(person.id()));
            }
        }
        if p.is_parent_of(child) {
            return Err(RelationshipError::AlreadyParent { parent, child });
        }
        if c.parents.len() >= 2 {
            return Err(RelationshipError::TooManyParents(child));
        }
        if c.birth_date() < p.birth_date() {
            return Err(RelationshipError::ChildOlderThanParent { parent, child });
        }
        let gap = years_between(p.birth_date(), c.birth_date()) as i64;
        if gap < MIN_PARENT_AGE_GAP {
            return Err(RelationshipError::AgeGapTooSmall {
                parent,
                child,
                gap_years: gap,
                min: MIN_PARENT_AGE_GAP,
            });
        }
        // The child's partner must not end up as their parent or sibling.
        if let Some(partner) = c.partner() {
            let partner_is_kin = partner == parent
                || self.people.get(&partner).is_some_and(|q| q.is_child_of(parent));
            if partner_is_kin {
                return Err(RelationshipError::PartnerBecomesFamily { parent, child, partner });
            }
        }
        Ok(())
    }

    /// Link `child` to `parent`, and to the parent's current partner when the
    /// partner also satisfies the parenthood rules. Returns every parent that
    /// was linked by this call.
    pub fn add_child(
        &mut self,
        parent: PersonId,
        child: PersonId,
    ) -> Result<Vec<PersonId>, RelationshipError> {
        self.can_add_child(parent, child)?;
        self.link(parent, child);
        let mut linked = vec![parent];

        if let Some(partner) = self.people.get(&parent).and_then(Person::partner) {
            match self.can_add_child(partner, child) {
                Ok(()) => {
                    self.link(partner, child);
                    linked.push(partner);
                }
                Err(RelationshipError::AlreadyParent { .. }) => {}
                Err(reason) => {
                    log::debug!("co-parent {partner} not linked to {child}: {reason}");
                }
            }
        }
        Ok(linked)
    }

    fn link(&mut self, parent: PersonId, child: PersonId) {
        if let Some(p) = self.people.get_mut(&parent) {
            p.children.insert(child);
        }
        if let Some(c) = self.people.get_mut(&child) {
            c.parents.insert(parent);
        }
    }

    // ── Death ──────────────────────────────────────

    /// Mark `id` deceased on `date` and dissolve any partnership.
    /// Returns the partner who was widowed, if any.
    pub fn mark_deceased(
        &mut self,
        id: PersonId,
        date: SimTime,
        cause: Option<DeathCause>,
        now: SimTime,
    ) -> Result<Option<PersonId>, LifecycleError> {
        let person = self
            .people
            .get_mut(&id)
            .ok_or(LifecycleError::UnknownPerson(id))?;
        person.validate_death(date, now)?;
        let cause = cause.unwrap_or_default();
        person.record_death(date, cause);
        log::debug!("date={now} {id} died on {date} ({cause:?})");
        Ok(self.dissolve_partnership(id))
    }

    // ── Reporting ──────────────────────────────────

    pub fn census(&self, now: SimTime) -> Census {
        let mut census = Census {
            date: Some(now),
            ..Census::default()
        };
        for p in self.people.values() {
            if !p.is_alive() {
                census.deceased += 1;
                continue;
            }
            census.living += 1;
            if p.partner().is_some() {
                census.partnered += 1;
            }
            *census.by_stage.entry(p.life_stage(now)).or_default() += 1;
        }
        census
    }
}
