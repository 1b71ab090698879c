// src/simulation/engine.rs

use crate::error::Result;
use crate::model::plan::{AdministrationPlan, AllocationCase};
use crate::model::population::PopulationTracker;
use crate::model::product::PerProduct;
use crate::model::schedule::ScheduleLedger;
use crate::model::stock::StockLedger;
use crate::simulation::config::SimulationInputs;
use crate::strategy::limiter::PopulationLimiter;
use crate::strategy::traits::{AllocationContext, AllocationPolicy};
use crate::{Doses, People, WeekIndex, EPSILON};
use chrono::NaiveDate;
use log::{debug, info};
use serde::Serialize;

// Serialize so rows can be written straight to CSV
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomesRow {
    pub week: WeekIndex,
    pub date: NaiveDate,
    pub allocation_case: AllocationCase,
    pub doses_administered: Doses,
    pub first_doses: Doses,
    pub second_doses: Doses,
    pub single_doses: Doses,
    pub capacity: Doses,
    pub capacity_utilization: f64,
    pub stock_total: Doses,
    pub stock_a: Doses,
    pub stock_b: Doses,
    pub stock_single: Doses,
    pub deliveries: Doses,
    pub cumulative_administered: Doses,
    pub unprotected: People,
    pub partially_protected: People,
    pub fully_protected: People,
    pub corrected: bool,
}

/// Weekly rollout loop for one capacity scenario and supplier set.
///
/// Owns all of its state; two simulations never share ledgers.
pub struct RolloutSimulation<P: AllocationPolicy> {
    inputs: SimulationInputs,
    policy: P,
    limiter: PopulationLimiter,

    // Ledgers, advanced in lockstep once per week
    pub schedule_a: ScheduleLedger,
    pub schedule_b: ScheduleLedger,
    pub stock: StockLedger,
    pub population: PopulationTracker,

    pub current_week: WeekIndex,
    cumulative_administered: Doses,
    pub history: Vec<OutcomesRow>,
}

impl<P: AllocationPolicy> RolloutSimulation<P> {
    pub fn new(inputs: SimulationInputs, policy: P) -> Result<Self> {
        inputs.validate()?;

        Ok(Self {
            schedule_a: ScheduleLedger::new(inputs.interval_a, &inputs.initial_schedule_a),
            schedule_b: ScheduleLedger::new(inputs.interval_b, &inputs.initial_schedule_b),
            stock: StockLedger::new(inputs.initial_stock),
            population: PopulationTracker::new(
                inputs.total_population,
                inputs.initial_population,
            ),
            current_week: 1,
            cumulative_administered: 0.0,
            history: Vec::with_capacity(inputs.horizon_weeks),
            limiter: PopulationLimiter::new(),
            inputs,
            policy,
        })
    }

    pub fn inputs(&self) -> &SimulationInputs {
        &self.inputs
    }

    /// Runs every remaining week of the horizon.
    pub fn run(&mut self) -> Result<()> {
        info!(
            "Running rollout for {} weeks from {}",
            self.inputs.horizon_weeks, self.inputs.start_date
        );
        while self.current_week <= self.inputs.horizon_weeks {
            self.step()?;
        }
        info!(
            "Rollout finished: {:.0} doses administered, {:.0} fully protected",
            self.cumulative_administered,
            self.population.counts().fully_protected
        );
        Ok(())
    }

    /// Simulates one week. Nothing is committed when the week fails.
    pub fn step(&mut self) -> Result<()> {
        let week = self.current_week;
        let ctx = self.context(week);

        // Decide, then check the plan against the population before any
        // ledger moves
        let mut plan = self.policy.allocate(&ctx);
        let projected = self
            .population
            .project(self.projected_pending(week, &plan), &plan);
        if projected.unprotected < -EPSILON {
            plan = self.limiter.correct(&plan, projected.unprotected, week)?;
        }

        self.commit(week, &plan, &ctx.deliveries);

        if week % 5 == 0 {
            let counts = self.population.counts();
            info!(
                "Week {}: administered {:.0}, stock {:.0}, partial {:.0}, full {:.0}",
                week,
                plan.total(),
                self.stock.total(),
                counts.partially_protected,
                counts.fully_protected
            );
        }
        self.record_history(week, &plan, &ctx);
        self.current_week += 1;
        Ok(())
    }

    fn context(&self, week: WeekIndex) -> AllocationContext {
        let (capacity_two_dose, capacity_single_dose) = self.inputs.capacity_at(week);
        AllocationContext {
            week,
            stock: *self.stock.on_hand(),
            deliveries: self.inputs.deliveries_at(week),
            capacity_two_dose,
            capacity_single_dose,
            due_a: self.schedule_a.due(week),
            due_b: self.schedule_b.due(week),
            committed_a: self.schedule_a.outstanding_from(week),
            committed_b: self.schedule_b.outstanding_from(week),
            unprotected: self.population.unprotected(),
        }
    }

    fn projected_pending(&self, week: WeekIndex, plan: &AdministrationPlan) -> People {
        let carry = self.inputs.carry_over_unmet_seconds;
        self.schedule_a.projected_pending(week, &plan.a, carry)
            + self.schedule_b.projected_pending(week, &plan.b, carry)
    }

    fn commit(
        &mut self,
        week: WeekIndex,
        plan: &AdministrationPlan,
        deliveries: &PerProduct<Doses>,
    ) {
        let carry = self.inputs.carry_over_unmet_seconds;
        self.schedule_a.advance(week, &plan.a, carry);
        self.schedule_b.advance(week, &plan.b, carry);
        self.stock.apply(plan, deliveries);

        let pending = self.schedule_a.pending_after(week) + self.schedule_b.pending_after(week);
        self.population.apply(pending, plan);
        self.cumulative_administered += plan.total();

        debug!(
            "week {} committed: {:?}, population {:?}",
            week,
            plan,
            self.population.counts()
        );
    }

    fn record_history(
        &mut self,
        week: WeekIndex,
        plan: &AdministrationPlan,
        ctx: &AllocationContext,
    ) {
        let capacity = ctx.capacity_two_dose + ctx.capacity_single_dose;
        let administered = plan.total();
        let utilization = if capacity > 0.0 {
            administered / capacity
        } else {
            0.0
        };
        let stock = self.stock.on_hand();
        let counts = self.population.counts();

        self.history.push(OutcomesRow {
            week,
            date: self.inputs.date_of(week),
            allocation_case: plan.case,
            doses_administered: administered,
            first_doses: plan.first_doses(),
            second_doses: plan.second_doses(),
            single_doses: plan.single,
            capacity,
            capacity_utilization: utilization,
            stock_total: stock.total(),
            stock_a: stock.a,
            stock_b: stock.b,
            stock_single: stock.single,
            deliveries: ctx.deliveries.total(),
            cumulative_administered: self.cumulative_administered,
            unprotected: counts.unprotected,
            partially_protected: counts.partially_protected,
            fully_protected: counts.fully_protected,
            corrected: plan.corrected,
        });
    }

    /// Total doses administered so far.
    pub fn total_administered(&self) -> Doses {
        self.cumulative_administered
    }

    /// Average share of weekly capacity that was used.
    pub fn mean_utilization(&self) -> f64 {
        mean_utilization(&self.history)
    }

    /// First week in which at least `share` of the population is fully
    /// protected.
    pub fn week_reaching_coverage(&self, share: f64) -> Option<WeekIndex> {
        week_reaching_coverage(&self.history, self.inputs.total_population, share)
    }
}

pub fn mean_utilization(history: &[OutcomesRow]) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    history.iter().map(|r| r.capacity_utilization).sum::<f64>() / history.len() as f64
}

pub fn week_reaching_coverage(
    history: &[OutcomesRow],
    total_population: People,
    share: f64,
) -> Option<WeekIndex> {
    history
        .iter()
        .find(|r| r.fully_protected >= share * total_population - EPSILON)
        .map(|r| r.week)
}
