use crate::capture::CaptureDispatcher;
use crate::closure::ApiTag;
use crate::instantiate::{instantiate, GraphInstantiateSettings};
use crate::tests::support::MockBackend;

#[test]
fn empty_graph_behaves_as_a_bare_wait_then_signal() {
    let mut dispatcher = CaptureDispatcher::new(MockBackend::new());
    let root = dispatcher.start_capturing_from(1, 0).unwrap();
    let unjoined = dispatcher.stop_capturing(1).unwrap();
    assert!(unjoined.is_empty());

    let exec = instantiate(&root, &unjoined, GraphInstantiateSettings::default()).unwrap();
    exec.execute(dispatcher.backend(), 1, &[10, 20], Some(30)).unwrap();

    let log = dispatcher.backend().log.borrow();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].tag, ApiTag::WaitOnEvents);
    assert_eq!(log[0].waits, vec![10, 20]);
    assert_eq!(log[1].tag, ApiTag::SignalEvent);
    assert_eq!(log[1].signal, Some(30));
}

#[test]
fn empty_graph_with_no_waits_or_signal_replays_nothing() {
    let mut dispatcher = CaptureDispatcher::new(MockBackend::new());
    let root = dispatcher.start_capturing_from(1, 0).unwrap();
    let unjoined = dispatcher.stop_capturing(1).unwrap();

    let exec = instantiate(&root, &unjoined, GraphInstantiateSettings::default()).unwrap();
    exec.execute(dispatcher.backend(), 1, &[], None).unwrap();

    assert!(dispatcher.backend().log.borrow().is_empty());
}
