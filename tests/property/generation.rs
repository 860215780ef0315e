//! Property-based tests for generation routing
//!
//! Random interleavings of emits, derivations, reloads and freezes are replayed
//! against a model that only tracks which generation is current. Every record
//! must land in that generation's sink, whichever handle wrote it.

use hotroute::pipeline::{MemorySink, RoutingBuilder};
use hotroute::{Extension, Facade, FacadeError, Level, Logger, Record, RootFacade};
use proptest::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Op {
    Emit(usize),
    Derive(usize),
    Reload,
    Freeze,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => any::<usize>().prop_map(Op::Emit),
        3 => any::<usize>().prop_map(Op::Derive),
        2 => Just(Op::Reload),
        1 => Just(Op::Freeze),
    ]
}

#[derive(Default)]
struct Model {
    current: usize,
    frozen: bool,
    expected: Vec<u64>,
}

fn replay(ops: &[Op]) -> Result<(), TestCaseError> {
    let mut sinks = vec![Arc::new(MemorySink::new())];
    let first = Arc::clone(&sinks[0]);
    let root = RootFacade::build(move |b: RoutingBuilder| {
        b.minimum_level(Level::Trace).write_to(first)
    })
    .unwrap();
    let mut handles: Vec<Logger> = vec![root.logger()];
    let mut model = Model {
        expected: vec![0],
        ..Model::default()
    };

    for op in ops {
        match op {
            Op::Emit(i) => {
                let handle = &handles[i % handles.len()];
                handle.emit(Record::from_text(Level::Info, "op")).unwrap();
                model.expected[model.current] += 1;
            }
            Op::Derive(i) => {
                let parent = &handles[i % handles.len()];
                let child = parent
                    .derive(Extension::property("Depth", handles.len() as u64).unwrap())
                    .unwrap();
                prop_assert_eq!(child.is_frozen(), model.frozen);
                handles.push(child);
            }
            Op::Reload => {
                let sink = Arc::new(MemorySink::new());
                let writes = Arc::clone(&sink);
                let result = root.reload(move |b: RoutingBuilder| {
                    b.minimum_level(Level::Trace).write_to(writes)
                });
                if model.frozen {
                    prop_assert!(matches!(result, Err(FacadeError::AlreadyFrozen)));
                    prop_assert_eq!(sink.dispose_calls(), 0);
                } else {
                    let generation = result.unwrap();
                    sinks.push(sink);
                    model.expected.push(0);
                    model.current = sinks.len() - 1;
                    prop_assert_eq!(generation.value() as usize, model.current);
                }
            }
            Op::Freeze => {
                let result = root.freeze();
                prop_assert_eq!(result.is_ok(), !model.frozen);
                model.frozen = true;
            }
        }
    }

    for (index, sink) in sinks.iter().enumerate() {
        prop_assert_eq!(sink.received(), model.expected[index]);
        let retired = index != model.current;
        prop_assert_eq!(sink.is_disposed(), retired);
    }

    root.dispose();
    for sink in &sinks {
        prop_assert_eq!(sink.dispose_calls(), 1);
        prop_assert_eq!(sink.received_after_dispose(), 0);
    }
    for handle in &handles {
        prop_assert!(matches!(
            handle.emit(Record::from_text(Level::Info, "late")),
            Err(FacadeError::Disposed)
        ));
    }
    Ok(())
}

/// Records always reach the generation that was current when they were written.
#[test]
fn test_records_follow_current_generation() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&proptest::collection::vec(op_strategy(), 1..80), |ops| {
            replay(&ops)
        })
        .unwrap();
}

/// A freshly derived handle resolves lazily: at most one derivation per
/// generation it is used in, and none until first use.
#[test]
fn test_derivation_is_lazy() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(0usize..5, 1usize..5), |(reloads, emits_per_generation)| {
            let root = RootFacade::build(|b: RoutingBuilder| {
                b.write_to(Arc::new(MemorySink::new()))
            })
            .unwrap();
            let child = root
                .logger()
                .derive(Extension::property("Lazy", true).unwrap())
                .unwrap();
            prop_assert_eq!(child.derivation_count(), 0);

            for round in 0..=reloads {
                if round > 0 {
                    root.reload(|b: RoutingBuilder| b.write_to(Arc::new(MemorySink::new())))
                        .unwrap();
                }
                for _ in 0..emits_per_generation {
                    child.emit(Record::from_text(Level::Info, "lazy")).unwrap();
                }
            }
            prop_assert_eq!(child.derivation_count(), reloads as u64 + 1);
            Ok(())
        })
        .unwrap();
}
