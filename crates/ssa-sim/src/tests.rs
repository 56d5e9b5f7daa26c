//! Integration tests for ssa-sim.

use ssa_core::{SimConfig, SpeciesId};
use ssa_expr::{Constant, MevalExpression};
use ssa_reaction::Rate;
use ssa_species::Unit;

use crate::{NoopObserver, RunState, Sim, SimBuilder, SimError, SimObserver, TrajectoryRecorder};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn build_err(builder: SimBuilder) -> SimError {
    match builder.build() {
        Ok(_) => panic!("expected the model to be rejected"),
        Err(err) => err,
    }
}

fn expr(source: &str) -> MevalExpression {
    MevalExpression::parse(source).unwrap()
}

/// Pool + transformee + forwarding delay + branch + timer: exercises every
/// reaction kind and every source of randomness.
fn mixed_model(seed: u64) -> Sim {
    SimBuilder::new(SimConfig::new(seed, 0.5))
        .counter("S", 50)
        .pool("Cells", 5)
        .counter("Healthy", 0)
        .counter("Damaged", 0)
        .branch("Sort", expr("min(mods, 1)"), &[("Damaged", 1)], &[("Healthy", 1)])
        .stochastic("feed", Rate::Constant(0.02))
        .reactant("S", 1)
        .modifier("Cells", 1)
        .product("Cells", 1)
        .done()
        .stochastic("mutate", Rate::Constant(0.1))
        .transformee("Cells", 1)
        .done()
        .delay_forwarding("exit", "Cells", 3.0, &[("Sort", 1)], "mods")
        .timer("refill", 4.0, &[("S", 20)])
        .build()
        .unwrap()
}

fn branch_slots(sim: &Sim, name: &str) -> Vec<(String, f64)> {
    let id = sim.species_id(name).unwrap();
    sim.species(id).and_then(|s| s.as_branch()).unwrap().slots().to_vec()
}

#[derive(Default)]
struct RemovalLog {
    removed: Vec<(SpeciesId, f64, f64)>,
    uninitialized: usize,
}

impl SimObserver for RemovalLog {
    fn on_unit_removed(&mut self, species: SpeciesId, unit: &Unit, time: f64) {
        self.removed.push((species, unit.created_at, time));
    }

    fn uninitialize(&mut self) {
        self.uninitialized += 1;
    }
}

// ── SimBuilder validation ─────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;

    #[test]
    fn builds_with_forward_references() {
        let sim = SimBuilder::new(SimConfig::default())
            .stochastic("make", Rate::Constant(1.0))
            .product("Late", 1)
            .done()
            .counter("Late", 0)
            .build()
            .unwrap();
        assert_eq!(sim.reaction_names(), ["make"]);
        assert_eq!(sim.state(), RunState::Idle);
        assert_eq!(sim.count("Late"), Some(0));
    }

    #[test]
    fn duplicate_species_rejected() {
        let b = SimBuilder::new(SimConfig::default()).counter("X", 1).pool("X", 2);
        assert!(matches!(build_err(b), SimError::Config(_)));
    }

    #[test]
    fn duplicate_reaction_rejected() {
        let b = SimBuilder::new(SimConfig::default())
            .counter("X", 1)
            .timer("t", 1.0, &[("X", 1)])
            .timer("t", 2.0, &[("X", 1)]);
        assert!(matches!(build_err(b), SimError::Config(_)));
    }

    #[test]
    fn unknown_species_rejected() {
        let b = SimBuilder::new(SimConfig::default())
            .stochastic("r", Rate::Constant(1.0))
            .reactant("Ghost", 1)
            .done();
        let err = build_err(b);
        assert!(matches!(err, SimError::Config(ref m) if m.contains("Ghost")));
    }

    #[test]
    fn zero_stoichiometry_rejected() {
        let b = SimBuilder::new(SimConfig::default())
            .counter("X", 1)
            .stochastic("r", Rate::Constant(1.0))
            .reactant("X", 0)
            .done();
        assert!(matches!(build_err(b), SimError::Config(_)));

        let b = SimBuilder::new(SimConfig::default())
            .counter("X", 1)
            .timer("t", 1.0, &[("X", 0)]);
        assert!(matches!(build_err(b), SimError::Config(_)));
    }

    #[test]
    fn reactant_and_modifier_conflict() {
        let b = SimBuilder::new(SimConfig::default())
            .counter("X", 1)
            .stochastic("r", Rate::Constant(1.0))
            .reactant("X", 1)
            .modifier("X", 1)
            .done();
        assert!(matches!(build_err(b), SimError::Config(_)));
    }

    #[test]
    fn product_and_transformee_conflict() {
        let b = SimBuilder::new(SimConfig::default())
            .pool("P", 1)
            .stochastic("r", Rate::Constant(1.0))
            .product("P", 1)
            .transformee("P", 1)
            .done();
        assert!(matches!(build_err(b), SimError::Config(_)));
    }

    #[test]
    fn delay_on_counter_rejected() {
        let b = SimBuilder::new(SimConfig::default())
            .counter("X", 1)
            .delay("d", "X", 1.0, &[]);
        let err = build_err(b);
        assert!(matches!(err, SimError::Config(ref m) if m.contains("individual pool")));
    }

    #[test]
    fn negative_times_rejected() {
        let b = SimBuilder::new(SimConfig::default()).pool("P", 1).delay("d", "P", -1.0, &[]);
        assert!(matches!(build_err(b), SimError::Config(_)));

        let b = SimBuilder::new(SimConfig::default()).timer("t", f64::NAN, &[]);
        assert!(matches!(build_err(b), SimError::Config(_)));
    }

    #[test]
    fn branch_cycle_rejected() {
        let b = SimBuilder::new(SimConfig::default())
            .counter("Out", 0)
            .branch("A", Constant(1.0), &[("B", 1)], &[("Out", 1)])
            .branch("B", Constant(1.0), &[("Out", 1)], &[("A", 1)]);
        let err = build_err(b);
        assert!(matches!(err, SimError::Config(ref m) if m.contains("cycle")));

        let b = SimBuilder::new(SimConfig::default())
            .branch("Loop", Constant(0.0), &[], &[("Loop", 1)]);
        assert!(matches!(build_err(b), SimError::Config(_)));
    }

    #[test]
    fn branch_chain_without_cycle_accepted() {
        let sim = SimBuilder::new(SimConfig::default())
            .counter("Out", 0)
            .branch("A", Constant(1.0), &[("B", 1)], &[("Out", 1)])
            .branch("B", Constant(1.0), &[("Out", 2)], &[("Out", 1)])
            .build();
        assert!(sim.is_ok());
    }

    #[test]
    fn invalid_log_period_rejected() {
        let b = SimBuilder::new(SimConfig::new(0, 0.0));
        assert!(matches!(build_err(b), SimError::Core(_)));
    }
}

// ── End-to-end scenarios ──────────────────────────────────────────────────────

#[cfg(test)]
mod scenario_tests {
    use super::*;

    fn decay(seed: u64) -> Sim {
        SimBuilder::new(SimConfig::new(seed, 1000.0))
            .counter("X", 100)
            .stochastic("decay", Rate::Constant(1.0))
            .reactant("X", 1)
            .done()
            .build()
            .unwrap()
    }

    #[test]
    fn decay_drains_counter() {
        let mut sim = decay(3);
        let mut rec = TrajectoryRecorder::new();
        sim.run(1000.0, &mut rec).unwrap();
        assert_eq!(sim.count("X"), Some(0));
        assert_eq!(sim.fired_count("decay"), Some(100));
        assert_eq!(rec.firings.len(), 100);
        assert_eq!(sim.time(), 1000.0);
        assert_eq!(sim.state(), RunState::Finished);
    }

    #[test]
    fn decay_extinction_time_matches_harmonic_mean() {
        // Extinction time of 100 independent unit-rate decays has mean
        // H(100) ≈ 5.187 and variance Σ 1/k² ≈ 1.63.
        let runs = 200;
        let mut total = 0.0;
        for seed in 0..runs {
            let mut sim = decay(seed);
            let mut rec = TrajectoryRecorder::new();
            sim.run(1000.0, &mut rec).unwrap();
            total += rec.last_firing_time().unwrap();
        }
        let mean = total / runs as f64;
        assert!((4.7..5.7).contains(&mean), "mean extinction time {mean}");
    }

    #[test]
    fn firing_times_increase() {
        let mut sim = decay(11);
        let mut rec = TrajectoryRecorder::new();
        sim.run(1000.0, &mut rec).unwrap();
        assert!(rec.firings.windows(2).all(|w| w[0].0 <= w[1].0));
        assert!(rec.firings[0].0 > 0.0);
    }

    fn pulse() -> Sim {
        SimBuilder::new(SimConfig::new(0, 1.0))
            .counter("Y", 0)
            .timer("pulse", 5.0, &[("Y", 3)])
            .build()
            .unwrap()
    }

    #[test]
    fn timer_fires_once_inside_horizon() {
        let mut sim = pulse();
        let mut rec = TrajectoryRecorder::new();
        sim.run(10.0, &mut rec).unwrap();
        assert_eq!(sim.count("Y"), Some(3));
        assert_eq!(rec.firings, vec![(5.0, "pulse".to_owned())]);

        // The tick at 5.0 is logged before the timer fires.
        let ys: Vec<u64> = rec.snapshots.iter().map(|(_, c)| c[0]).collect();
        assert_eq!(ys, [0, 0, 0, 0, 0, 3, 3, 3, 3, 3]);
    }

    #[test]
    fn timer_after_horizon_never_fires() {
        let mut sim = pulse();
        sim.run(4.0, &mut NoopObserver).unwrap();
        assert_eq!(sim.count("Y"), Some(0));
        assert_eq!(sim.fired_count("pulse"), Some(0));
        assert_eq!(sim.time(), 4.0);
    }

    #[test]
    fn rerun_starts_from_initial_conditions() {
        let mut sim = pulse();
        sim.run(10.0, &mut NoopObserver).unwrap();
        sim.run(10.0, &mut NoopObserver).unwrap();
        assert_eq!(sim.count("Y"), Some(3));
        assert_eq!(sim.fired_count("pulse"), Some(1));
    }

    #[test]
    fn pool_drains_and_refills() {
        let mut sim = SimBuilder::new(SimConfig::new(9, 1.0))
            .pool("P", 5)
            .stochastic("kill", Rate::Constant(2.0))
            .reactant("P", 1)
            .done()
            .timer("seed", 50.0, &[("P", 1)])
            .build()
            .unwrap();
        sim.run(60.0, &mut NoopObserver).unwrap();

        let id = sim.species_id("P").unwrap();
        let pool = sim.species(id).and_then(|s| s.as_pool()).unwrap();
        // All five original units are gone long before t = 50 with
        // overwhelming probability; the seeded unit may or may not survive.
        assert!(pool.count() <= 1);
        if let Some(unit) = pool.peek_first() {
            assert_eq!(unit.created_at, 50.0);
        }
        assert_eq!(pool.iter_valid().count() as u64, pool.count());
    }
}

// ── Loop mechanics ────────────────────────────────────────────────────────────

#[cfg(test)]
mod loop_tests {
    use super::*;

    #[test]
    fn empty_model_only_logs() {
        let mut sim = SimBuilder::new(SimConfig::new(0, 1.0)).counter("X", 7).build().unwrap();
        let mut rec = TrajectoryRecorder::new();
        sim.run(3.5, &mut rec).unwrap();
        let ticks: Vec<f64> = rec.snapshots.iter().map(|(t, _)| *t).collect();
        assert_eq!(ticks, [1.0, 2.0, 3.0]);
        assert_eq!(sim.time(), 3.5);
        assert!(rec.finished);
    }

    #[test]
    fn log_ticks_caught_up_across_jump() {
        let mut sim = SimBuilder::new(SimConfig::new(0, 1.0))
            .counter("Y", 0)
            .timer("late", 7.5, &[("Y", 1)])
            .build()
            .unwrap();
        let mut rec = TrajectoryRecorder::new();
        sim.run(10.0, &mut rec).unwrap();
        let ticks: Vec<f64> = rec.snapshots.iter().map(|(t, _)| *t).collect();
        assert_eq!(ticks, (1..=10).map(f64::from).collect::<Vec<_>>());
        let ys: Vec<u64> = rec.snapshots.iter().map(|(_, c)| c[0]).collect();
        assert_eq!(ys, [0, 0, 0, 0, 0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn simultaneous_timers_fire_in_registration_order() {
        let mut sim = SimBuilder::new(SimConfig::default())
            .counter("X", 0)
            .timer("second", 2.0, &[("X", 1)])
            .timer("first", 2.0, &[("X", 1)])
            .build()
            .unwrap();
        let mut rec = TrajectoryRecorder::new();
        sim.run(5.0, &mut rec).unwrap();
        let order: Vec<&str> = rec.firings.iter().map(|(_, n)| n.as_str()).collect();
        assert_eq!(order, ["second", "first"]);
    }

    #[test]
    fn delay_and_timer_tie_goes_to_first_registered() {
        let model = |delay_first: bool| {
            let b = SimBuilder::new(SimConfig::default()).pool("P", 1).counter("X", 0);
            let b = if delay_first {
                b.delay("age", "P", 3.0, &[("X", 1)]).timer("clock", 3.0, &[("X", 1)])
            } else {
                b.timer("clock", 3.0, &[("X", 1)]).delay("age", "P", 3.0, &[("X", 1)])
            };
            b.build().unwrap()
        };

        for (delay_first, expected) in [(true, ["age", "clock"]), (false, ["clock", "age"])] {
            let mut sim = model(delay_first);
            let mut rec = TrajectoryRecorder::new();
            sim.run(5.0, &mut rec).unwrap();
            let order: Vec<&str> = rec.firings.iter().map(|(_, n)| n.as_str()).collect();
            assert_eq!(order, expected);
            assert!(rec.firings.iter().all(|(t, _)| *t == 3.0));
        }
    }

    #[test]
    fn choice_weights_rates_from_step_start() {
        // Positive at t = 0, zero by the time the (very long) wait elapses.
        let mut sim = SimBuilder::new(SimConfig::new(0, 1e8))
            .counter("Out", 0)
            .stochastic("fade", Rate::Custom(Box::new(expr("1e-6 * max(0, 1 - t)"))))
            .product("Out", 1)
            .done()
            .build()
            .unwrap();
        let mut rec = TrajectoryRecorder::new();
        sim.run(1e9, &mut rec).unwrap();
        assert_eq!(sim.count("Out"), Some(1));
        assert_eq!(rec.firings.len(), 1);
        assert!(rec.firings[0].0 > 1.0);
    }

    #[test]
    fn zero_rate_reaction_never_fires() {
        let mut sim = SimBuilder::new(SimConfig::default())
            .counter("X", 10)
            .stochastic("never", Rate::Constant(0.0))
            .reactant("X", 1)
            .done()
            .stochastic("blocked", Rate::Constant(5.0))
            .reactant("X", 11)
            .done()
            .build()
            .unwrap();
        sim.run(100.0, &mut NoopObserver).unwrap();
        assert_eq!(sim.count("X"), Some(10));
        assert_eq!(sim.fired_count("never"), Some(0));
        assert_eq!(sim.fired_count("blocked"), Some(0));
    }

    #[test]
    fn invalid_max_time_rejected_before_running() {
        let mut sim = SimBuilder::new(SimConfig::default()).build().unwrap();
        let mut log = RemovalLog::default();
        assert!(matches!(sim.run(f64::INFINITY, &mut log), Err(SimError::Config(_))));
        assert!(matches!(sim.run(-1.0, &mut log), Err(SimError::Config(_))));
        assert_eq!(sim.state(), RunState::Idle);
        assert_eq!(log.uninitialized, 0);
    }

    #[test]
    fn removals_reported_only_for_opted_in_pools() {
        let mut sim = SimBuilder::new(SimConfig::default())
            .pool_with_reports("Tracked", 3, true)
            .pool("Quiet", 2)
            .delay("leave", "Tracked", 1.0, &[])
            .delay("go", "Quiet", 1.0, &[])
            .build()
            .unwrap();
        let tracked = sim.species_id("Tracked").unwrap();
        let mut log = RemovalLog::default();
        sim.run(2.0, &mut log).unwrap();

        assert_eq!(sim.count("Tracked"), Some(0));
        assert_eq!(sim.count("Quiet"), Some(0));
        assert_eq!(log.removed, vec![(tracked, 0.0, 1.0); 3]);
        assert_eq!(log.uninitialized, 1);
    }

    #[test]
    fn stochastic_removals_from_pool_are_reported() {
        let mut sim = SimBuilder::new(SimConfig::new(4, 1.0))
            .pool_with_reports("P", 4, true)
            .stochastic("die", Rate::Constant(1.0))
            .reactant("P", 1)
            .done()
            .build()
            .unwrap();
        let mut log = RemovalLog::default();
        sim.run(500.0, &mut log).unwrap();
        assert_eq!(log.removed.len(), 4);
        assert!(log.removed.iter().all(|&(_, created, removed)| created == 0.0 && removed > 0.0));
    }
}

// ── Determinism ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod determinism_tests {
    use super::*;

    fn trajectory(sim: &mut Sim) -> Vec<(f64, String)> {
        let mut rec = TrajectoryRecorder::new();
        sim.run(20.0, &mut rec).unwrap();
        rec.firings
    }

    #[test]
    fn same_seed_same_trajectory() {
        let a = trajectory(&mut mixed_model(42));
        let b = trajectory(&mut mixed_model(42));
        assert!(!a.is_empty());
        assert_eq!(a, b);
    }

    #[test]
    fn rerunning_one_sim_reproduces_trajectory() {
        let mut sim = mixed_model(5);
        let first = trajectory(&mut sim);
        let second = trajectory(&mut sim);
        assert_eq!(first, second);
    }

    #[test]
    fn different_seed_different_trajectory() {
        let a = trajectory(&mut mixed_model(1));
        let b = trajectory(&mut mixed_model(2));
        assert_ne!(a, b);
    }

    #[test]
    fn every_cell_is_accounted_for() {
        let mut sim = mixed_model(8);
        sim.run(20.0, &mut NoopObserver).unwrap();
        let get = |name: &str| sim.count(name).unwrap();
        let born = sim.fired_count("feed").unwrap();
        assert_eq!(get("Cells") + get("Healthy") + get("Damaged"), 5 + born);
        assert_eq!(sim.fired_count("exit").unwrap(), get("Healthy") + get("Damaged"));
        assert_eq!(sim.fired_count("refill"), Some(1));
    }

    #[test]
    fn branch_slots_released_after_run() {
        let mut sim = mixed_model(8);
        sim.run(20.0, &mut NoopObserver).unwrap();
        assert!(sim.fired_count("exit").unwrap() >= 5);
        assert!(branch_slots(&sim, "Sort").is_empty());

        // A second run still forwards `mods` into a fresh table.
        sim.run(20.0, &mut NoopObserver).unwrap();
        assert_eq!(sim.count("Healthy").unwrap() + sim.count("Damaged").unwrap(), sim.fired_count("exit").unwrap());
        assert!(branch_slots(&sim, "Sort").is_empty());
    }
}

// ── Failure path ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod failure_tests {
    use super::*;
    use ssa_expr::EvalError;
    use ssa_reaction::ReactionError;
    use ssa_species::SpeciesError;

    #[test]
    fn failed_firing_is_not_rolled_back() {
        let mut sim = SimBuilder::new(SimConfig::default())
            .counter("A", 1)
            .counter("B", 0)
            .counter("C", 0)
            .branch("Broken", expr("undefined_name"), &[("C", 1)], &[("C", 1)])
            .stochastic("r", Rate::Constant(1.0))
            .reactant("A", 1)
            .product("B", 1)
            .product("Broken", 1)
            .done()
            .build()
            .unwrap();

        let mut rec = TrajectoryRecorder::new();
        let err = sim.run(100.0, &mut rec).unwrap_err();
        assert!(matches!(
            err,
            SimError::Reaction(ReactionError::Species(SpeciesError::Eval(EvalError::UnboundVariable(ref n))))
                if n == "undefined_name"
        ));

        // Reactant consumed and first product added before the branch failed.
        assert_eq!(sim.count("A"), Some(0));
        assert_eq!(sim.count("B"), Some(1));
        assert_eq!(sim.count("C"), Some(0));
        assert_eq!(sim.state(), RunState::Failed);
        assert_eq!(sim.fired_count("r"), Some(0));
        assert!(rec.firings.is_empty());
        assert!(rec.finished, "observer must be uninitialized on failure");
    }

    #[test]
    fn failing_rate_expression_aborts_run() {
        let mut sim = SimBuilder::new(SimConfig::default())
            .counter("X", 0)
            .stochastic("bad", Rate::Custom(Box::new(expr("ln(X)"))))
            .done()
            .build()
            .unwrap();
        let mut log = RemovalLog::default();
        let err = sim.run(1.0, &mut log).unwrap_err();
        assert!(matches!(err, SimError::Reaction(ReactionError::Eval(EvalError::Domain(_)))));
        assert_eq!(log.uninitialized, 1);
    }

    #[test]
    fn branch_slots_released_after_failed_run() {
        let mut sim = SimBuilder::new(SimConfig::default())
            .pool("P", 1)
            .counter("C", 0)
            .branch("Bad", expr("mods + undefined_name"), &[("C", 1)], &[("C", 1)])
            .delay_forwarding("exit", "P", 1.0, &[("Bad", 1)], "mods")
            .build()
            .unwrap();
        let mut log = RemovalLog::default();
        let err = sim.run(5.0, &mut log).unwrap_err();
        assert!(matches!(
            err,
            SimError::Reaction(ReactionError::Species(SpeciesError::Eval(EvalError::UnboundVariable(ref n))))
                if n == "undefined_name"
        ));
        assert_eq!(sim.count("P"), Some(0));
        assert!(branch_slots(&sim, "Bad").is_empty());
        assert_eq!(log.uninitialized, 1);
    }
}
