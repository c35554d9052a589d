//! # Turn Scheduler
//!
//! An exact-tick bucket map deciding which actors act on each tick.
//!
//! Actors are filed under the absolute tick on which they next act. Actors
//! sharing a tick act in the order they were scheduled. There is no ranking
//! beyond that: this is not a priority queue.

use crate::game::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Event-time scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticker {
    ticks: u64,
    schedule: BTreeMap<u64, Vec<EntityId>>,
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current tick.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Files `actor` to act `delay` ticks from now.
    ///
    /// Any earlier entry for the same actor is dropped first, so an actor is
    /// never waiting in two buckets at once.
    ///
    /// # Examples
    ///
    /// ```
    /// use cairn::Ticker;
    /// use uuid::Uuid;
    ///
    /// let mut ticker = Ticker::new();
    /// let actor = Uuid::from_u128(1);
    /// ticker.schedule_turn(actor, 2);
    ///
    /// assert!(ticker.next_turn().is_empty());
    /// ticker.advance();
    /// assert!(ticker.next_turn().is_empty());
    /// ticker.advance();
    /// assert_eq!(ticker.next_turn(), vec![actor]);
    /// ```
    pub fn schedule_turn(&mut self, actor: EntityId, delay: u64) {
        self.unschedule(actor);
        self.schedule
            .entry(self.ticks + delay)
            .or_default()
            .push(actor);
    }

    /// Pops the bucket due at the current tick. Empty ticks yield nothing.
    pub fn next_turn(&mut self) -> Vec<EntityId> {
        self.schedule.remove(&self.ticks).unwrap_or_default()
    }

    /// Moves time forward by exactly one tick.
    pub fn advance(&mut self) {
        self.ticks += 1;
    }

    /// Removes every pending entry for `actor`.
    pub fn unschedule(&mut self, actor: EntityId) {
        self.schedule.retain(|_, bucket| {
            bucket.retain(|id| *id != actor);
            !bucket.is_empty()
        });
    }

    /// The tick `actor` is waiting for, if scheduled.
    pub fn scheduled_tick(&self, actor: EntityId) -> Option<u64> {
        self.schedule
            .iter()
            .find(|(_, bucket)| bucket.contains(&actor))
            .map(|(tick, _)| *tick)
    }

    pub fn is_scheduled(&self, actor: EntityId) -> bool {
        self.scheduled_tick(actor).is_some()
    }

    /// Number of pending entries across all buckets.
    pub fn len(&self) -> usize {
        self.schedule.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.schedule.is_empty()
    }
}
