use crate::capture::CaptureDispatcher;
use crate::closure::{ApiArgs, ApiTag, ExtraPayload};
use crate::tests::support::MockBackend;

#[test]
fn identical_wait_lists_share_one_storage_slot() {
    let mut dispatcher = CaptureDispatcher::new(MockBackend::new());
    let root = dispatcher.start_capturing_from(1, 0).unwrap();

    dispatcher
        .capture(1, ApiTag::Barrier, ApiArgs::Barrier, &[10, 20], None, ExtraPayload::None)
        .unwrap();
    dispatcher
        .capture(1, ApiTag::Barrier, ApiArgs::Barrier, &[10, 20], None, ExtraPayload::None)
        .unwrap();

    let (first_waits, second_waits) = {
        let graph = root.borrow();
        let registry = graph.registry();
        registry.with_segment(graph.segment_idx(), |seg| {
            (seg.commands[0].waits, seg.commands[1].waits)
        })
    };

    assert_eq!(first_waits, second_waits);
    assert!(!first_waits.is_none());
}

#[test]
fn empty_wait_list_never_allocates_storage() {
    let mut dispatcher = CaptureDispatcher::new(MockBackend::new());
    let root = dispatcher.start_capturing_from(1, 0).unwrap();

    dispatcher
        .capture(1, ApiTag::Barrier, ApiArgs::Barrier, &[], None, ExtraPayload::None)
        .unwrap();

    let waits = {
        let graph = root.borrow();
        let registry = graph.registry();
        registry.with_segment(graph.segment_idx(), |seg| seg.commands[0].waits)
    };
    assert!(waits.is_none());
}
