use rand::Rng;

use crate::capture::CaptureDispatcher;
use crate::closure::{ApiArgs, ApiTag, ExtraPayload};
use crate::instantiate::{instantiate, GraphInstantiateSettings};
use crate::tests::support::MockBackend;

/// A linear (fork-free) capture of a random length replays every command it
/// captured, in the order it captured them, regardless of how many there
/// were.
#[test]
fn random_length_linear_capture_replays_in_order() {
    let mut rng = rand::thread_rng();

    for _ in 0..20 {
        let length: usize = rng.gen_range(0, 25);

        let mut dispatcher = CaptureDispatcher::new(MockBackend::new());
        let root = dispatcher.start_capturing_from(1, 0).unwrap();

        for i in 0..length {
            let event = i as i32;
            dispatcher
                .capture(
                    1,
                    ApiTag::SignalEvent,
                    ApiArgs::SignalEvent { event },
                    &[],
                    Some(event),
                    ExtraPayload::None,
                )
                .unwrap();
        }

        let unjoined = dispatcher.stop_capturing(1).unwrap();
        assert!(unjoined.is_empty());

        let exec = instantiate(&root, &unjoined, GraphInstantiateSettings::default()).unwrap();
        exec.execute(dispatcher.backend(), 1, &[], None).unwrap();

        let log = dispatcher.backend().log.borrow();
        assert_eq!(log.len(), length);
        for (i, call) in log.iter().enumerate() {
            assert_eq!(call.signal, Some(i as i32));
        }
    }
}
