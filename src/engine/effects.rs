use rand::{Rng, RngCore};

use crate::model::{EffectSpec, ResourceLedger};

/// What one effect application did: the drawn branch's label (`None` for
/// deterministic effects) and the human-readable outcome message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffectOutcome {
    pub label: Option<String>,
    pub message: String,
}

/// Apply `effect` to the actor's ledger, and the target's where one is
/// involved.
///
/// Probabilistic effects make exactly one weighted draw per call; the chosen
/// branch's deltas are applied atomically and the draw is never re-rolled.
/// Deterministic effects apply their deltas directly.
///
/// # Panics
/// Panics on an empty or weightless probability table. Catalog validation
/// upholds this before an effect ever reaches the applier.
pub fn apply(
    effect: &EffectSpec,
    rng: &mut dyn RngCore,
    actor: &mut ResourceLedger,
    mut target: Option<&mut ResourceLedger>,
) -> EffectOutcome {
    match effect {
        EffectSpec::Deterministic {
            actor: actor_delta,
            target: target_delta,
            message,
        } => {
            actor.apply_delta(actor_delta);
            if let Some(t) = target.as_deref_mut() {
                t.apply_delta(target_delta);
            }
            EffectOutcome {
                label: None,
                message: message.clone(),
            }
        }
        EffectSpec::Probabilistic { branches } => {
            let total: u32 = branches.iter().map(|b| b.weight).sum();
            assert!(total > 0, "probability table must carry positive weight");
            let mut roll = rng.random_range(0..total);
            for branch in branches {
                if roll < branch.weight {
                    actor.apply_delta(&branch.actor);
                    if let Some(t) = target.as_deref_mut() {
                        t.apply_delta(&branch.target);
                    }
                    return EffectOutcome {
                        label: Some(branch.label.clone()),
                        message: branch.message.clone(),
                    };
                }
                roll -= branch.weight;
            }
            unreachable!("weighted draw landed outside the table");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OutcomeBranch, StatDelta};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn ledger() -> ResourceLedger {
        ResourceLedger::new(10_000, 50.0, 5, 20, 30.0, 40.0)
    }

    #[test]
    fn deterministic_applies_actor_and_target_deltas() {
        let effect = EffectSpec::Deterministic {
            actor: StatDelta {
                funds: 2_500,
                approval: 1.0,
                ..StatDelta::default()
            },
            target: StatDelta {
                approval: 3.0,
                ..StatDelta::default()
            },
            message: "done".to_string(),
        };
        let mut rng = SmallRng::seed_from_u64(0);
        let mut actor = ledger();
        let mut target = ledger();

        let outcome = apply(&effect, &mut rng, &mut actor, Some(&mut target));
        assert_eq!(outcome.label, None);
        assert_eq!(outcome.message, "done");
        assert_eq!(actor.funds(), 12_500);
        assert_eq!(actor.approval(), 51.0);
        assert_eq!(target.approval(), 53.0);
        assert_eq!(target.funds(), 10_000);
    }

    #[test]
    fn deterministic_without_target_leaves_only_actor_changed() {
        let effect = EffectSpec::Deterministic {
            actor: StatDelta {
                name_recognition: 2.0,
                ..StatDelta::default()
            },
            target: StatDelta::default(),
            message: "spoke".to_string(),
        };
        let mut rng = SmallRng::seed_from_u64(0);
        let mut actor = ledger();
        apply(&effect, &mut rng, &mut actor, None);
        assert_eq!(actor.name_recognition(), 32.0);
    }

    #[test]
    fn single_branch_table_always_fires_that_branch() {
        let effect = EffectSpec::Probabilistic {
            branches: vec![OutcomeBranch {
                weight: 1,
                label: "only".to_string(),
                actor: StatDelta {
                    approval: 1.0,
                    ..StatDelta::default()
                },
                target: StatDelta::default(),
                message: "the only branch".to_string(),
            }],
        };
        let mut rng = SmallRng::seed_from_u64(7);
        let mut actor = ledger();
        for _ in 0..50 {
            let outcome = apply(&effect, &mut rng, &mut actor, None);
            assert_eq!(outcome.label.as_deref(), Some("only"));
        }
        assert_eq!(actor.approval(), 100.0);
    }

    #[test]
    fn one_draw_applies_exactly_one_branch_pair() {
        // Branches move actor and target in opposite, recognizable ways, so a
        // mixed application would be visible.
        let effect = EffectSpec::Probabilistic {
            branches: vec![
                OutcomeBranch {
                    weight: 50,
                    label: "hit".to_string(),
                    actor: StatDelta::default(),
                    target: StatDelta {
                        approval: -4.0,
                        ..StatDelta::default()
                    },
                    message: "hit".to_string(),
                },
                OutcomeBranch {
                    weight: 50,
                    label: "backfire".to_string(),
                    actor: StatDelta {
                        approval: -2.0,
                        ..StatDelta::default()
                    },
                    target: StatDelta::default(),
                    message: "backfire".to_string(),
                },
            ],
        };
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..200 {
            let mut actor = ledger();
            let mut target = ledger();
            let outcome = apply(&effect, &mut rng, &mut actor, Some(&mut target));
            match outcome.label.as_deref() {
                Some("hit") => {
                    assert_eq!(actor.approval(), 50.0);
                    assert_eq!(target.approval(), 46.0);
                }
                Some("backfire") => {
                    assert_eq!(actor.approval(), 48.0);
                    assert_eq!(target.approval(), 50.0);
                }
                other => panic!("unexpected branch: {other:?}"),
            }
        }
    }

    #[test]
    fn draw_proportions_follow_weights() {
        let effect = EffectSpec::Probabilistic {
            branches: vec![
                OutcomeBranch {
                    weight: 70,
                    label: "success".to_string(),
                    actor: StatDelta::default(),
                    target: StatDelta::default(),
                    message: "s".to_string(),
                },
                OutcomeBranch {
                    weight: 30,
                    label: "fizzle".to_string(),
                    actor: StatDelta::default(),
                    target: StatDelta::default(),
                    message: "f".to_string(),
                },
            ],
        };
        let mut rng = SmallRng::seed_from_u64(42);
        let mut actor = ledger();
        let mut successes = 0u32;
        const TRIALS: u32 = 2_000;
        for _ in 0..TRIALS {
            let outcome = apply(&effect, &mut rng, &mut actor, None);
            if outcome.label.as_deref() == Some("success") {
                successes += 1;
            }
        }
        let proportion = f64::from(successes) / f64::from(TRIALS);
        assert!(
            (0.65..=0.75).contains(&proportion),
            "success proportion {proportion} strayed from 0.70"
        );
    }

    #[test]
    #[should_panic(expected = "positive weight")]
    fn weightless_table_panics() {
        let effect = EffectSpec::Probabilistic {
            branches: vec![OutcomeBranch {
                weight: 0,
                label: "never".to_string(),
                actor: StatDelta::default(),
                target: StatDelta::default(),
                message: "never".to_string(),
            }],
        };
        let mut rng = SmallRng::seed_from_u64(0);
        let mut actor = ledger();
        apply(&effect, &mut rng, &mut actor, None);
    }
}
