//! A minimal in-memory `Backend` used only by this crate's own tests.

use std::cell::RefCell;

use crate::backend::Backend;
use crate::closure::{ApiArgs, ApiTag, Closure};
use crate::storage::StorageId;

#[derive(Debug, thiserror::Error)]
pub enum MockError {
    #[error("mock backend failure: {0}")]
    Failed(String),
}

/// One observed replay, recorded so tests can assert on what actually got
/// submitted rather than just that `execute` returned `Ok`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayedCall {
    pub target: i32,
    pub tag: ApiTag,
    pub waits: Vec<i32>,
    pub signal: Option<i32>,
}

/// Turns on `env_logger` for whichever test calls it, so `RUST_LOG=trace`
/// surfaces the dispatcher's fork/join tracing during a single test run.
/// Safe to call from more than one test; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::try_init();
}

/// Command lists, events, and devices are all plain `i32` tokens; kernels
/// are plain `String` names. Good enough to exercise ordering and
/// fork/join bookkeeping without modeling real GPU state.
#[derive(Default)]
pub struct MockBackend {
    pub log: RefCell<Vec<ReplayedCall>>,
}

impl MockBackend {
    pub fn new() -> Self {
        MockBackend { log: RefCell::new(Vec::new()) }
    }
}

impl Backend for MockBackend {
    type CommandListId = i32;
    type Event = i32;
    type DeviceId = i32;
    type Kernel = String;
    type Error = MockError;

    fn multi_queue_capable(&self, device: i32) -> bool {
        device > 1
    }

    fn replay_closure(
        &self,
        target: i32,
        tag: ApiTag,
        _args: &ApiArgs<Self>,
        _extra_bytes: &[u8],
        _extra_kernels: &[String],
        waits: &[i32],
        signal: Option<i32>,
    ) -> Result<(), MockError> {
        self.log.borrow_mut().push(ReplayedCall {
            target,
            tag,
            waits: waits.to_vec(),
            signal,
        });
        Ok(())
    }
}

// Keeps captured arguments inline-sized rather than silently growing into
// something that would rather live in `ExternalStorage`.
crate::assert_api_args_fits_budget!(MockBackend);

pub fn barrier_closure() -> Closure<MockBackend> {
    Closure::new(ApiTag::Barrier, ApiArgs::Barrier, StorageId::NONE, None)
}

pub fn signal_closure(event: i32) -> Closure<MockBackend> {
    Closure::new(
        ApiTag::SignalEvent,
        ApiArgs::SignalEvent { event },
        StorageId::NONE,
        Some(event),
    )
}

pub fn wait_closure(waits: StorageId) -> Closure<MockBackend> {
    Closure::new(ApiTag::WaitOnEvents, ApiArgs::WaitOnEvents, waits, None)
}

pub fn kernel_closure(kernel: &str) -> Closure<MockBackend> {
    Closure::new(
        ApiTag::LaunchKernel,
        ApiArgs::LaunchKernel { kernel: kernel.to_string(), group_count: [1, 1, 1] },
        StorageId::NONE,
        None,
    )
}
