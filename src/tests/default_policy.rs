use crate::capture::CaptureDispatcher;
use crate::closure::{ApiArgs, ApiTag, ExtraPayload};
use crate::instantiate::{instantiate, GraphInstantiateSettings};
use crate::tests::support::MockBackend;

fn capture_forked_and_joined(
    dispatcher: &mut CaptureDispatcher<MockBackend>,
    device: i32,
) -> (
    std::rc::Rc<std::cell::RefCell<crate::graph::Graph<MockBackend>>>,
    Vec<crate::segments::CapturedCommandId>,
) {
    let root = dispatcher.start_capturing_from(1, device).unwrap();
    dispatcher
        .capture(1, ApiTag::SignalEvent, ApiArgs::SignalEvent { event: 3 }, &[], Some(3), ExtraPayload::None)
        .unwrap();
    dispatcher
        .capture(2, ApiTag::SignalEvent, ApiArgs::SignalEvent { event: 7 }, &[3], Some(7), ExtraPayload::None)
        .unwrap();
    dispatcher
        .capture(1, ApiTag::Barrier, ApiArgs::Barrier, &[7], None, ExtraPayload::None)
        .unwrap();
    let unjoined = dispatcher.stop_capturing(1).unwrap();
    (root, unjoined)
}

#[test]
fn single_queue_device_defaults_to_split_levels() {
    let mut dispatcher = CaptureDispatcher::new(MockBackend::new());
    let (root, unjoined) = capture_forked_and_joined(&mut dispatcher, 1);
    let exec = instantiate(&root, &unjoined, GraphInstantiateSettings::default()).unwrap();
    // A single physical command list per graph node, i.e. one per fork.
    assert_eq!(exec.segments().len(), 2);
}

#[test]
fn multi_queue_device_defaults_to_monolithic_levels() {
    let mut dispatcher = CaptureDispatcher::new(MockBackend::new());
    let (root, unjoined) = capture_forked_and_joined(&mut dispatcher, 5);
    let exec = instantiate(&root, &unjoined, GraphInstantiateSettings::default()).unwrap();
    // Everything merged onto the root's command list, ordered globally.
    assert_eq!(exec.segments().len(), 1);
    assert_eq!(exec.segments()[0].commands.len(), 3);
}
