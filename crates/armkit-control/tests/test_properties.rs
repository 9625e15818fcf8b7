//! Property tests for the jog registry and gesture normalizer

use armkit_control::{
    GestureEvent, GestureNormalizer, JogRegistry, JogSink, RawInput, StepOutcome,
};
use armkit_core::{JogDirection, JogIntent};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

const PERIOD: Duration = Duration::from_millis(100);

#[derive(Default)]
struct Counting {
    steps: Mutex<usize>,
}

impl JogSink for Counting {
    fn step(&self, _intent: JogIntent) -> StepOutcome {
        *self.steps.lock() += 1;
        StepOutcome::Dispatched
    }
}

#[derive(Debug, Clone)]
enum Op {
    Start(JogIntent),
    Stop(JogIntent),
    CancelAll,
    Wait(u64),
}

fn intent() -> impl Strategy<Value = JogIntent> {
    (0usize..3, any::<bool>()).prop_map(|(axis, up)| {
        let direction = if up {
            JogDirection::Increase
        } else {
            JogDirection::Decrease
        };
        JogIntent::new(axis, direction)
    })
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => intent().prop_map(Op::Start),
        3 => intent().prop_map(Op::Stop),
        1 => Just(Op::CancelAll),
        2 => (1u64..250).prop_map(Op::Wait),
    ]
}

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_at_most_one_timer_per_intent(ops in prop::collection::vec(op(), 1..40)) {
        paused_runtime().block_on(async {
            let sink = Arc::new(Counting::default());
            let registry = JogRegistry::new(sink.clone(), PERIOD);

            for op in ops {
                match op {
                    Op::Start(intent) => registry.start(intent),
                    Op::Stop(intent) => {
                        registry.stop(intent);
                    }
                    Op::CancelAll => {
                        registry.cancel_all();
                    }
                    Op::Wait(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
                }

                for intent in registry.active() {
                    prop_assert!(!registry.is_active(intent.opposite()));
                }
            }

            // Over ten periods each live timer ticks nine to eleven times
            // depending on phase; one duplicate timer would add nine more.
            let live = registry.len();
            let before = *sink.steps.lock();
            tokio::time::sleep(PERIOD * 10).await;
            let ticks = *sink.steps.lock() - before;
            prop_assert!(
                ticks >= live * 9 && ticks <= live * 11,
                "{} ticks for {} timers",
                ticks,
                live
            );

            registry.cancel_all();
            let after_cancel = *sink.steps.lock();
            tokio::time::sleep(PERIOD * 5).await;
            prop_assert_eq!(*sink.steps.lock(), after_cancel);
            Ok::<(), TestCaseError>(())
        })?;
    }

    #[test]
    fn test_gestures_pair_start_and_end(
        inputs in prop::collection::vec(
            (
                prop_oneof![
                    Just(RawInput::MouseDown),
                    Just(RawInput::MouseUp),
                    Just(RawInput::MouseLeave),
                    Just(RawInput::TouchStart),
                    Just(RawInput::TouchEnd),
                    Just(RawInput::TouchCancel),
                ],
                0u64..1500,
            ),
            0..60,
        )
    ) {
        let mut gesture = GestureNormalizer::new(Duration::from_millis(700));
        let mut at = tokio::time::Instant::now();
        let mut expected = GestureEvent::Start;

        for (input, gap) in inputs {
            at += Duration::from_millis(gap);
            if let Some(event) = gesture.handle(input, at) {
                prop_assert_eq!(event, expected);
                expected = match event {
                    GestureEvent::Start => GestureEvent::End,
                    GestureEvent::End => GestureEvent::Start,
                };
            }
            prop_assert_eq!(gesture.is_held(), expected == GestureEvent::End);
        }
    }
}
