use crate::capture::CaptureDispatcher;
use crate::closure::{ApiArgs, ApiTag, ExtraPayload};
use crate::instantiate::{instantiate, GraphInstantiateSettings};
use crate::tests::support::MockBackend;

#[test]
fn command_list_stops_capturing_once_stopped() {
    let mut dispatcher = CaptureDispatcher::new(MockBackend::new());
    dispatcher.start_capturing_from(1, 0).unwrap();

    dispatcher
        .capture(1, ApiTag::WriteGlobalTimestamp, ApiArgs::WriteGlobalTimestamp { dst_ptr: 0x10 }, &[], None, ExtraPayload::None)
        .unwrap();
    dispatcher
        .capture(
            1,
            ApiTag::MemoryCopy,
            ApiArgs::MemoryCopy { dst_ptr: 0x20, src_ptr: 0x30, size: 64 },
            &[],
            None,
            ExtraPayload::None,
        )
        .unwrap();
    dispatcher
        .capture(1, ApiTag::Barrier, ApiArgs::Barrier, &[], None, ExtraPayload::None)
        .unwrap();

    let unjoined = dispatcher.stop_capturing(1).unwrap();
    assert!(unjoined.is_empty());
    assert!(!dispatcher.is_capturing(1));
}

#[test]
fn executable_graph_replays_every_captured_call() {
    let mut dispatcher = CaptureDispatcher::new(MockBackend::new());
    let root = dispatcher.start_capturing_from(1, 0).unwrap();

    for _ in 0..3 {
        dispatcher
            .capture(1, ApiTag::Barrier, ApiArgs::Barrier, &[], None, ExtraPayload::None)
            .unwrap();
    }

    let unjoined = dispatcher.stop_capturing(1).unwrap();
    let exec = instantiate(&root, &unjoined, GraphInstantiateSettings::default()).unwrap();
    assert_eq!(exec.segments().iter().map(|s| s.commands.len()).sum::<usize>(), 3);

    exec.execute(dispatcher.backend(), 1, &[], None).unwrap();
    assert_eq!(dispatcher.backend().log.borrow().len(), 3);
}
