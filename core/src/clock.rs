//! Simulation clock — owns logical time, speed control, and pause.
//!
//! The clock is the sole authority for "now". Nothing in the simulation reads
//! wall-clock time; ages and schedules are all derived from `SimTime`.

use crate::{
    error::{SimError, SimResult},
    types::{Days, SimTime},
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    pub start:   SimTime,
    pub current: SimTime,
    pub speed:   SimSpeed,
    pub paused:  bool,
}

impl SimClock {
    pub fn new(start: SimTime) -> Self {
        Self {
            start,
            current: start,
            speed: SimSpeed::Normal,
            paused: true,
        }
    }

    pub fn now(&self) -> SimTime {
        self.current
    }

    /// Advance one step at the current speed. Returns the new time.
    pub fn advance(&mut self) -> SimResult<SimTime> {
        self.advance_days(self.speed.days_per_step())
    }

    /// Advance by an explicit number of days. Fails while paused.
    pub fn advance_days(&mut self, days: Days) -> SimResult<SimTime> {
        if self.paused {
            return Err(SimError::ClockPaused);
        }
        self.current += Duration::days(days.max(0));
        Ok(self.current)
    }

    /// Days elapsed since the clock was created.
    pub fn elapsed_days(&self) -> Days {
        (self.current - self.start).num_days()
    }

    pub fn pause(&mut self)  { self.paused = true;  }
    pub fn resume(&mut self) { self.paused = false; }

    pub fn set_speed(&mut self, speed: SimSpeed) {
        self.speed = speed;
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SimSpeed {
    #[default]
    Normal,       // 1 day per step
    Accelerated,  // 1 week per step
    FastForward,  // 1 month per step
}

impl SimSpeed {
    pub fn days_per_step(&self) -> Days {
        match self {
            SimSpeed::Normal      => 1,
            SimSpeed::Accelerated => 7,
            SimSpeed::FastForward => 30,
        }
    }
}

/// Clock handle shared between the driver and the scheduler.
#[derive(Debug, Clone)]
pub struct SharedClock(Arc<RwLock<SimClock>>);

impl SharedClock {
    pub fn new(clock: SimClock) -> Self {
        Self(Arc::new(RwLock::new(clock)))
    }

    pub fn now(&self) -> SimTime {
        self.0.read().unwrap_or_else(PoisonError::into_inner).now()
    }

    pub fn advance(&self) -> SimResult<SimTime> {
        self.0.write().unwrap_or_else(PoisonError::into_inner).advance()
    }

    pub fn advance_days(&self, days: Days) -> SimResult<SimTime> {
        self.0.write().unwrap_or_else(PoisonError::into_inner).advance_days(days)
    }

    pub fn pause(&self)  { self.0.write().unwrap_or_else(PoisonError::into_inner).pause(); }
    pub fn resume(&self) { self.0.write().unwrap_or_else(PoisonError::into_inner).resume(); }

    pub fn set_speed(&self, speed: SimSpeed) {
        self.0.write().unwrap_or_else(PoisonError::into_inner).set_speed(speed);
    }

    /// Copy of the clock state at this instant.
    pub fn snapshot(&self) -> SimClock {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}
