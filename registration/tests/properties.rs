//! Property tests: arbitrary operation sequences checked against a plain model

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use activity_registration::{
    ActivityCatalog, ActivityDefinition, RegistrationEngine, RegistrationError, RosterEnvironment,
};
use activity_registration_testing::properties::{capacity, participant_pool};
use activity_registration_testing::test_clock;
use futures::future::join_all;
use proptest::prelude::*;
use std::sync::Arc;

const ACTIVITY: &str = "Model Club";

#[derive(Debug, Clone)]
enum Op {
    Register(usize),
    Withdraw(usize),
}

fn scenario() -> impl Strategy<Value = (u32, Vec<String>, Vec<Op>)> {
    (capacity(), participant_pool(8)).prop_flat_map(|(capacity, pool)| {
        let len = pool.len();
        let op = prop_oneof![
            (0..len).prop_map(Op::Register),
            (0..len).prop_map(Op::Withdraw),
        ];
        (Just(capacity), Just(pool), proptest::collection::vec(op, 0..60))
    })
}

fn engine(capacity: u32) -> RegistrationEngine {
    RegistrationEngine::new(
        ActivityCatalog::from_definitions([ActivityDefinition::new(ACTIVITY, "", "", capacity)])
            .unwrap(),
        RosterEnvironment::new(Arc::new(test_clock())),
    )
}

/// Expected outcome of a register on the model roster
fn model_register(
    model: &mut Vec<String>,
    capacity: usize,
    participant: &str,
) -> Result<usize, &'static str> {
    if model.iter().any(|p| p == participant) {
        Err("already_registered")
    } else if model.len() >= capacity {
        Err("capacity_exceeded")
    } else {
        model.push(participant.to_string());
        Ok(model.len())
    }
}

/// Expected outcome of a withdraw on the model roster
fn model_withdraw(model: &mut Vec<String>, participant: &str) -> Result<usize, &'static str> {
    match model.iter().position(|p| p == participant) {
        Some(index) => {
            model.remove(index);
            Ok(model.len())
        }
        None => Err("not_registered"),
    }
}

fn outcome<T>(result: Result<T, RegistrationError>, count: impl FnOnce(T) -> usize) -> Result<usize, &'static str> {
    result.map(count).map_err(|error| error.kind())
}

proptest! {
    /// Property: the engine agrees with the model after every operation
    #[test]
    fn prop_engine_matches_model((capacity, pool, ops) in scenario()) {
        let engine = engine(capacity);
        let limit = capacity as usize;
        let mut model = Vec::new();

        for op in ops {
            let (actual, expected) = tokio_test::block_on(async {
                match op {
                    Op::Register(i) => (
                        outcome(engine.register(ACTIVITY, &pool[i]).await, |r| r.participant_count),
                        model_register(&mut model, limit, &pool[i]),
                    ),
                    Op::Withdraw(i) => (
                        outcome(engine.withdraw(ACTIVITY, &pool[i]).await, |r| r.participant_count),
                        model_withdraw(&mut model, &pool[i]),
                    ),
                }
            });
            prop_assert_eq!(actual, expected);
        }

        let view = tokio_test::block_on(engine.activity(ACTIVITY)).unwrap();
        let roster: Vec<String> = view.participants.iter().map(ToString::to_string).collect();
        prop_assert_eq!(roster, model);
    }

    /// Property: `capacity + extra` concurrent registrations admit exactly `capacity`
    #[test]
    fn prop_capacity_never_exceeded(capacity in capacity(), extra in 0usize..10) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .enable_all()
            .build()
            .unwrap();
        let engine = engine(capacity);
        let attempts = capacity as usize + extra;

        let accepted = runtime.block_on(async {
            let handles: Vec<_> = (0..attempts)
                .map(|i| {
                    let engine = engine.clone();
                    tokio::spawn(async move {
                        engine.register(ACTIVITY, &format!("p{i}@x.com")).await.is_ok()
                    })
                })
                .collect();
            join_all(handles)
                .await
                .into_iter()
                .filter(|joined| *joined.as_ref().unwrap())
                .count()
        });

        prop_assert_eq!(accepted, capacity as usize);
        let view = runtime.block_on(engine.activity(ACTIVITY)).unwrap();
        prop_assert_eq!(view.participant_count, capacity as usize);
        prop_assert_eq!(view.spots_left(), 0);
    }
}
