//! The instantiated, replayable result of [`crate::instantiate::instantiate`].

use crate::backend::Backend;
use crate::closure::{ApiArgs, ApiTag};
use crate::instantiate::ForkPolicy;

/// A closure with all of its out-of-line data resolved into owned vectors,
/// detached from the [`crate::storage::ExternalStorage`] it was captured
/// into. Safe to hold across many `execute()` calls and across further
/// captures on the same backend.
pub struct ResolvedClosure<B: Backend> {
    pub tag: ApiTag,
    pub args: ApiArgs<B>,
    pub waits: Vec<B::Event>,
    pub signal: Option<B::Event>,
    pub extra_bytes: Vec<u8>,
    pub extra_kernels: Vec<B::Kernel>,
}

/// One physical command list's worth of resolved commands.
pub struct ExecutableSegment<B: Backend> {
    pub target: B::CommandListId,
    pub commands: Vec<ResolvedClosure<B>>,
}

/// A fully instantiated graph, ready to be replayed any number of times via
/// [`ExecutableGraph::execute`].
pub struct ExecutableGraph<B: Backend> {
    pub policy: ForkPolicy,
    pub segments: Vec<ExecutableSegment<B>>,
    /// Signal events produced by kernel-launch-family closures, rebound via
    /// [`Backend::rebind_callback_event`] once per segment after that
    /// segment finishes replaying.
    pub callback_bindings: Vec<B::Event>,
}

impl<B: Backend> ExecutableGraph<B> {
    pub fn segments(&self) -> &[ExecutableSegment<B>] {
        &self.segments
    }
}
