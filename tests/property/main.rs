// tests/property/main.rs

use std::collections::HashMap;

use proptest::prelude::*;

use assetpipe::engine::{
    CoreCommand, CoreRuntime, OverlapBehaviour, RuntimeEvent, RuntimeOptions, ScheduledTask,
    SlotState, TaskOutcome, TriggerReason,
};

const TASKS: [&str; 3] = ["a", "b", "c"];

#[derive(Debug, Clone)]
enum Op {
    Trigger(usize),
    /// Complete the n-th in-flight invocation (modulo the in-flight count).
    Complete(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..TASKS.len()).prop_map(Op::Trigger),
        any::<usize>().prop_map(Op::Complete),
    ]
}

fn overlap_strategy() -> impl Strategy<Value = OverlapBehaviour> {
    prop_oneof![
        Just(OverlapBehaviour::Queue),
        Just(OverlapBehaviour::Cancel),
        Just(OverlapBehaviour::Overlap),
    ]
}

/// Mirrors the executor: tracks invocations that would still report back.
#[derive(Default)]
struct Harness {
    in_flight: Vec<ScheduledTask>,
    dispatched: HashMap<String, usize>,
}

impl Harness {
    fn apply(&mut self, core: &mut CoreRuntime, event: RuntimeEvent) {
        let step = core.step(event);
        for command in step.commands {
            if let CoreCommand::DispatchTasks(tasks) = command {
                for task in tasks {
                    if task.cancel_previous {
                        self.in_flight.retain(|t| t.name != task.name);
                    }
                    *self.dispatched.entry(task.name.clone()).or_default() += 1;
                    self.in_flight.push(task);
                }
            }
        }
    }

    fn complete(&mut self, core: &mut CoreRuntime, idx: usize) {
        if self.in_flight.is_empty() {
            return;
        }
        let task = self.in_flight.remove(idx % self.in_flight.len());
        self.apply(
            core,
            RuntimeEvent::TaskCompleted {
                task: task.name,
                run_id: task.run_id,
                outcome: TaskOutcome::Success,
            },
        );
    }

    fn in_flight_of(&self, task: &str) -> usize {
        self.in_flight.iter().filter(|t| t.name == task).count()
    }
}

fn instances(core: &CoreRuntime, task: &str) -> (usize, bool) {
    match core.state_of(task) {
        SlotState::Running { instances, pending } => (instances, pending),
        _ => (0, false),
    }
}

proptest! {
    #[test]
    fn slots_respect_the_overlap_policy(
        overlap in overlap_strategy(),
        ops in proptest::collection::vec(op_strategy(), 1..60),
    ) {
        let options = RuntimeOptions { overlap, exit_when_idle: false };
        let mut core = CoreRuntime::new(TASKS, options);
        let mut harness = Harness::default();
        let mut triggers: HashMap<&str, usize> = HashMap::new();

        for op in ops {
            match op {
                Op::Trigger(i) => {
                    *triggers.entry(TASKS[i]).or_default() += 1;
                    harness.apply(&mut core, RuntimeEvent::TaskTriggered {
                        task: TASKS[i].to_string(),
                        reason: TriggerReason::FileWatch,
                    });
                }
                Op::Complete(n) => harness.complete(&mut core, n),
            }

            for task in TASKS {
                let (running, pending) = instances(&core, task);
                prop_assert_eq!(running, harness.in_flight_of(task));
                match overlap {
                    OverlapBehaviour::Queue | OverlapBehaviour::Cancel => {
                        prop_assert!(running <= 1, "{} has {} instances", task, running);
                    }
                    OverlapBehaviour::Overlap => prop_assert!(!pending),
                }
                let dispatched = harness.dispatched.get(task).copied().unwrap_or(0);
                prop_assert!(dispatched <= triggers.get(task).copied().unwrap_or(0));
            }
        }

        // Draining every in-flight invocation always reaches idle.
        let mut steps = 0;
        while !harness.in_flight.is_empty() {
            harness.complete(&mut core, 0);
            steps += 1;
            prop_assert!(steps < 1000, "runtime never drained");
        }
        prop_assert!(core.is_idle());
    }
}
