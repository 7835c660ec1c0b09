//! Event processor tests — each default processor driven through a real
//! scheduler against a small hand-built population.

use chrono::{Duration, NaiveDate};
use lifesim_core::{
    census_processor::CensusProcessor,
    clock::{SharedClock, SimClock},
    engine::register_default_processors,
    error::{LifecycleError, RelationshipError, SimError},
    event::{Event, EventKind},
    person::{DeathCause, HealthStatus, Person, PersonalityTrait, Sex, WealthClass},
    population::Population,
    scheduler::{DeadLetterReason, EventScheduler},
    types::{PersonId, SimTime},
};
use std::sync::Arc;

fn date(y: i32, m: u32, d: u32) -> SimTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

struct Harness {
    scheduler:  EventScheduler,
    population: Population,
    census:     Arc<CensusProcessor>,
}

impl Harness {
    fn new(census_interval: i64) -> Self {
        let clock = SharedClock::new(SimClock::new(date(2020, 1, 1)));
        clock.resume();
        let scheduler = EventScheduler::new(clock);
        let census = Arc::new(CensusProcessor::new(census_interval));
        register_default_processors(&scheduler, Arc::clone(&census));
        Self { scheduler, population: Population::new(), census }
    }

    fn now(&self) -> SimTime {
        self.scheduler.clock().now()
    }

    fn add(&mut self, name: &str, sex: Sex, born: SimTime) -> PersonId {
        self.population.insert(Person::new(name, sex, born)).unwrap()
    }

    fn couple(&mut self) -> (PersonId, PersonId) {
        let mum = self.add("Mae Hale", Sex::Female, date(1990, 4, 2));
        let dad = self.add("Dan Hale", Sex::Male, date(1988, 9, 12));
        let now = self.now();
        self.population.form_partnership(mum, dad, now).unwrap();
        (mum, dad)
    }

    fn run(&mut self, event: Event) -> Result<(), SimError> {
        self.scheduler.schedule(event)?;
        let now = self.now();
        self.scheduler.process_due(now, &mut self.population).map(|_| ())
    }

    fn tick(&mut self) -> usize {
        let now = self.now();
        self.scheduler
            .process_due(now, &mut self.population)
            .unwrap()
            .dispatched
            .len()
    }
}

fn failure_source(err: SimError) -> SimError {
    match err {
        SimError::Processing { source, .. } => *source,
        other => panic!("expected a processing error, got {other:?}"),
    }
}

#[test]
fn death_widows_partner_and_books_bereavement() {
    let mut h = Harness::new(0);
    let (mum, dad) = h.couple();
    let now = h.now();

    h.run(
        Event::new(EventKind::Death, now)
            .with_target(dad)
            .with_payload("cause", "illness"),
    )
    .unwrap();

    let d = h.population.get(dad).unwrap();
    assert_eq!(d.death_date(), Some(now));
    assert_eq!(d.death_cause(), Some(DeathCause::Illness));
    assert_eq!(h.population.get(mum).unwrap().partner(), None);

    let follow_on = h.scheduler.events_at(now);
    assert_eq!(follow_on.len(), 1);
    assert_eq!(follow_on[0].kind(), EventKind::PartnershipDissolution);
    assert_eq!(follow_on[0].source(), Some(dad));
    assert_eq!(follow_on[0].target(), Some(mum));
    assert_eq!(follow_on[0].payload_str("reason"), Some("bereavement"));

    assert_eq!(h.tick(), 1);
    assert!(h.population.get(mum).unwrap().former_partners().contains(&dad));
}

#[test]
fn death_with_an_unknown_cause_is_rejected() {
    let mut h = Harness::new(0);
    let a = h.add("Ann", Sex::Female, date(1950, 1, 1));
    let now = h.now();

    for cause in [serde_json::json!("plague"), serde_json::json!(42)] {
        let err = h
            .run(Event::new(EventKind::Death, now).with_target(a).with_payload("cause", cause))
            .unwrap_err();
        assert!(matches!(failure_source(err), SimError::InvalidPayload { field: "cause", .. }));
    }
    assert!(h.population.get(a).unwrap().is_alive());

    h.run(Event::new(EventKind::Death, now).with_target(a)).unwrap();
    assert_eq!(h.population.get(a).unwrap().death_cause(), Some(DeathCause::Unexplained));
}

#[test]
fn bereavement_does_not_end_a_newer_partnership() {
    let mut h = Harness::new(0);
    let (mum, dad) = h.couple();
    let other = h.add("Ola Reed", Sex::Male, date(1985, 1, 1));
    let now = h.now();

    h.run(Event::new(EventKind::Death, now).with_target(dad)).unwrap();
    h.population.form_partnership(mum, other, now).unwrap();

    assert_eq!(h.tick(), 1);
    assert_eq!(h.population.get(mum).unwrap().partner(), Some(other));
}

#[test]
fn birth_links_both_parents() {
    let mut h = Harness::new(0);
    let (mum, dad) = h.couple();
    let now = h.now();

    h.run(
        Event::new(EventKind::Birth, now)
            .with_target(mum)
            .with_source(dad)
            .with_payload("sex", "female")
            .with_payload("name", "Kit Hale"),
    )
    .unwrap();

    assert_eq!(h.population.len(), 3);
    let kid = h.population.get(mum).unwrap().children().into_iter().next().unwrap();
    let child = h.population.get(kid).unwrap();
    assert_eq!(child.name(), "Kit Hale");
    assert_eq!(child.sex(), Sex::Female);
    assert_eq!(child.birth_date(), now);
    assert_eq!(child.parents().len(), 2);
    assert!(h.population.get(dad).unwrap().is_parent_of(kid));
}

#[test]
fn birth_without_a_partner_links_the_named_second_parent() {
    let mut h = Harness::new(0);
    let mum = h.add("Mae Hale", Sex::Female, date(1990, 4, 2));
    let father = h.add("Dan Reed", Sex::Male, date(1985, 1, 1));
    let now = h.now();

    h.run(
        Event::new(EventKind::Birth, now)
            .with_target(mum)
            .with_source(father)
            .with_payload("sex", "male"),
    )
    .unwrap();

    let kid = h.population.get(father).unwrap().children().into_iter().next().unwrap();
    let child = h.population.get(kid).unwrap();
    assert_eq!(child.name(), "Unnamed");
    assert!(child.is_child_of(mum));
}

#[test]
fn birth_to_a_deceased_mother_fails_and_is_dead_lettered() {
    let mut h = Harness::new(0);
    let mum = h.add("Mae Hale", Sex::Female, date(1990, 4, 2));
    let now = h.now();
    h.population.mark_deceased(mum, date(2019, 5, 1), None, now).unwrap();

    let birth = Event::new(EventKind::Birth, now).with_target(mum).with_payload("sex", "female");
    let id = birth.id();
    let err = h.run(birth).unwrap_err();

    assert_eq!(
        failure_source(err).to_string(),
        SimError::from(RelationshipError::Deceased(mum)).to_string()
    );
    assert_eq!(h.population.len(), 1, "no orphan is created");
    let dead = h.scheduler.dead_letters();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].event_id, id);
    assert!(matches!(dead[0].reason, DeadLetterReason::ProcessorFailed(_)));
}

#[test]
fn birth_to_a_too_young_mother_is_rejected() {
    let mut h = Harness::new(0);
    let girl = h.add("Ivy Hale", Sex::Female, date(2010, 1, 1));
    let now = h.now();

    let err = h
        .run(Event::new(EventKind::Birth, now).with_target(girl).with_payload("sex", "male"))
        .unwrap_err();

    assert!(matches!(
        failure_source(err),
        SimError::Relationship(RelationshipError::TooYoungToParent { age: 10, .. })
    ));
    assert_eq!(h.population.len(), 1);
}

#[test]
fn missing_payload_and_participants_are_reported() {
    let mut h = Harness::new(0);
    let (mum, _) = h.couple();
    let now = h.now();

    let err = h.run(Event::new(EventKind::Birth, now).with_target(mum)).unwrap_err();
    assert!(matches!(failure_source(err), SimError::InvalidPayload { field: "sex", .. }));

    let err = h
        .run(Event::new(EventKind::PartnershipFormation, now).with_target(mum))
        .unwrap_err();
    assert!(matches!(failure_source(err), SimError::MissingParticipant { role: "source", .. }));

    let err = h.run(Event::new(EventKind::Death, now)).unwrap_err();
    assert!(matches!(failure_source(err), SimError::MissingParticipant { role: "target", .. }));

    assert_eq!(h.scheduler.dead_letters().len(), 3);
}

#[test]
fn formation_and_separation_round_trip() {
    let mut h = Harness::new(0);
    let a = h.add("Ann", Sex::Female, date(1990, 1, 1));
    let b = h.add("Ben", Sex::Male, date(1991, 1, 1));
    let now = h.now();

    h.run(Event::new(EventKind::PartnershipFormation, now).with_source(a).with_target(b))
        .unwrap();
    assert_eq!(h.population.get(b).unwrap().partner(), Some(a));

    h.run(
        Event::new(EventKind::PartnershipDissolution, now)
            .with_target(b)
            .with_payload("reason", "separation"),
    )
    .unwrap();
    assert_eq!(h.population.get(a).unwrap().partner(), None);
    assert!(h.population.get(b).unwrap().former_partners().contains(&a));
}

#[test]
fn adoption_links_parent_and_partner() {
    let mut h = Harness::new(0);
    let (mum, dad) = h.couple();
    let kid = h.add("Kit", Sex::Male, date(2015, 6, 1));
    let now = h.now();

    h.run(Event::new(EventKind::Adoption, now).with_source(dad).with_target(kid))
        .unwrap();

    let parents = h.population.get(kid).unwrap().parents();
    assert!(parents.contains(&mum) && parents.contains(&dad));
}

#[test]
fn status_changes_apply_to_the_living() {
    let mut h = Harness::new(0);
    let a = h.add("Ann", Sex::Female, date(1990, 1, 1));
    let now = h.now();

    h.run(Event::new(EventKind::HealthChange, now).with_target(a).with_payload("health", "poor"))
        .unwrap();
    h.run(Event::new(EventKind::WealthChange, now).with_target(a).with_payload("wealth", "affluent"))
        .unwrap();
    h.run(
        Event::new(EventKind::PersonalityShift, now)
            .with_target(a)
            .with_payload("trait", "neuroticism")
            .with_payload("intensity", 9),
    )
    .unwrap();

    let ann = h.population.get(a).unwrap();
    assert_eq!(ann.health(), HealthStatus::Poor);
    assert_eq!(ann.wealth(), WealthClass::Affluent);
    assert_eq!(ann.trait_intensity(PersonalityTrait::Neuroticism), Some(9));

    let err = h
        .run(
            Event::new(EventKind::PersonalityShift, now)
                .with_target(a)
                .with_payload("trait", "openness")
                .with_payload("intensity", 0),
        )
        .unwrap_err();
    assert!(matches!(
        failure_source(err),
        SimError::Lifecycle(LifecycleError::TraitIntensityOutOfRange(0))
    ));
}

#[test]
fn census_records_and_rebooks_itself() {
    let mut h = Harness::new(30);
    h.couple();
    let now = h.now();

    h.run(Event::new(EventKind::Census, now).with_priority(-100)).unwrap();

    let history = h.census.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].living, 2);
    assert_eq!(history[0].partnered, 2);

    let next = h.scheduler.next_event().unwrap();
    assert_eq!(next.kind(), EventKind::Census);
    assert_eq!(next.scheduled_time(), now + Duration::days(30));
    assert_eq!(next.priority(), -100);
}
