// src/model/schedule.rs

use crate::model::plan::DosePair;
use crate::{Doses, WeekIndex};

/// Second doses due per week for one two-dose product.
///
/// Entries are append-only and keyed by week (index 0 is week 1). The entry
/// for `w + interval` is only written once week `w` has been advanced, so
/// after advancing week `w` the ledger holds exactly `w + interval` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleLedger {
    due: Vec<Doses>,
    interval: usize,
    current_week: WeekIndex,
}

impl ScheduleLedger {
    /// Builds a ledger from the obligations already due in weeks
    /// `1..=interval`. Missing trailing weeks are zero.
    pub fn new(interval: usize, seed: &[Doses]) -> Self {
        let mut due = Vec::with_capacity(interval * 2);
        due.extend_from_slice(&seed[..seed.len().min(interval)]);
        due.resize(interval, 0.0);

        Self {
            due,
            interval,
            current_week: 1,
        }
    }

    /// The week that the next call to `advance` must close.
    pub fn current_week(&self) -> WeekIndex {
        self.current_week
    }

    /// Second doses due in `week`.
    pub fn due(&self, week: WeekIndex) -> Doses {
        week.checked_sub(1)
            .and_then(|i| self.due.get(i))
            .copied()
            .unwrap_or(0.0)
    }

    /// Obligations due in `week` or later.
    pub fn outstanding_from(&self, week: WeekIndex) -> Doses {
        let start = week.saturating_sub(1).min(self.due.len());
        self.due[start..].iter().sum()
    }

    /// Obligations due strictly after `week`.
    pub fn pending_after(&self, week: WeekIndex) -> Doses {
        self.outstanding_from(week + 1)
    }

    /// Obligations that would be pending after `week` once it is advanced
    /// with `pair`.
    pub fn projected_pending(&self, week: WeekIndex, pair: &DosePair, carry_over: bool) -> Doses {
        let mut pending = self.pending_after(week) + pair.first;
        if carry_over {
            pending += self.unmet(week, pair);
        }
        pending
    }

    /// Closes `week`: the first doses given this week become due
    /// `interval` weeks later. With `carry_over`, seconds that were due but
    /// not given are moved to the following week.
    pub fn advance(&mut self, week: WeekIndex, pair: &DosePair, carry_over: bool) {
        debug_assert_eq!(week, self.current_week, "schedule advanced out of order");
        debug_assert_eq!(self.due.len(), week + self.interval - 1);

        let unmet = self.unmet(week, pair);
        self.due.push(pair.first);
        if carry_over && unmet > 0.0 {
            // week + 1 always exists once the new entry is pushed
            self.due[week] += unmet;
        }
        self.current_week = week + 1;
    }

    /// Number of weeks with an entry.
    pub fn len(&self) -> usize {
        self.due.len()
    }

    fn unmet(&self, week: WeekIndex, pair: &DosePair) -> Doses {
        (self.due(week) - pair.second).max(0.0)
    }
}
