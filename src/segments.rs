//! The sole synchronization point shared by a root graph and every subgraph
//! forked from it: a monotonic command counter and the ordered segments of
//! captured calls that counter indexes into.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use crate::backend::Backend;
use crate::closure::Closure;

/// A position in the global capture order, shared across a root graph and
/// every graph forked from it. Comparable and totally ordered regardless of
/// which subgraph actually recorded the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CapturedCommandId(pub u32);

/// One contiguous run of commands captured by a single graph (root or
/// forked) between two fork/join boundaries.
pub struct OrderedCommandsSegment<B: Backend> {
    pub first: CapturedCommandId,
    pub commands: Vec<Closure<B>>,
}

impl<B: Backend> OrderedCommandsSegment<B> {
    fn new(first: CapturedCommandId) -> Self {
        OrderedCommandsSegment { first, commands: Vec::new() }
    }

    /// The id of the last command in this segment, if any have been
    /// recorded yet.
    pub fn last_command_id(&self) -> Option<CapturedCommandId> {
        if self.commands.is_empty() {
            None
        } else {
            Some(CapturedCommandId(self.first.0 + self.commands.len() as u32 - 1))
        }
    }
}

struct Inner<B: Backend> {
    segments: Vec<OrderedCommandsSegment<B>>,
}

/// Thread-shared counter and segment table. Every call append, across every
/// thread driving a subgraph of the same capture, goes through here to get
/// its global ordering. This is deliberately the only piece of the engine
/// using interior locking: everything downstream of an assigned
/// `CapturedCommandId` (the graphs themselves) is single-threaded per
/// recorder.
pub struct OrderedSegmentsRegistry<B: Backend> {
    next_id: AtomicU32,
    inner: Mutex<Inner<B>>,
}

impl<B: Backend> OrderedSegmentsRegistry<B> {
    pub fn new() -> Self {
        OrderedSegmentsRegistry {
            next_id: AtomicU32::new(0),
            inner: Mutex::new(Inner { segments: Vec::new() }),
        }
    }

    /// Starts a new segment and returns the id its first command will have
    /// once appended. Call this whenever a graph begins recording into a
    /// fresh run (capture start, or immediately after a fork).
    pub fn open_segment(&self) -> usize {
        let first = CapturedCommandId(self.next_id.load(Ordering::SeqCst));
        let mut inner = self.inner.lock().expect("segment registry poisoned");
        inner.segments.push(OrderedCommandsSegment::new(first));
        inner.segments.len() - 1
    }

    /// Appends a closure to `segment_idx`, assigning it the next globally
    /// monotonic id.
    pub fn append(&self, segment_idx: usize, closure: Closure<B>) -> CapturedCommandId {
        let id = CapturedCommandId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let mut inner = self.inner.lock().expect("segment registry poisoned");
        inner.segments[segment_idx].commands.push(closure);
        id
    }

    pub fn last_command_id(&self, segment_idx: usize) -> Option<CapturedCommandId> {
        let inner = self.inner.lock().expect("segment registry poisoned");
        inner.segments[segment_idx].last_command_id()
    }

    pub fn with_segment<R>(&self, segment_idx: usize, f: impl FnOnce(&OrderedCommandsSegment<B>) -> R) -> R {
        let inner = self.inner.lock().expect("segment registry poisoned");
        f(&inner.segments[segment_idx])
    }

    pub fn with_segment_mut<R>(
        &self,
        segment_idx: usize,
        f: impl FnOnce(&mut OrderedCommandsSegment<B>) -> R,
    ) -> R {
        let mut inner = self.inner.lock().expect("segment registry poisoned");
        f(&mut inner.segments[segment_idx])
    }
}

impl<B: Backend> Default for OrderedSegmentsRegistry<B> {
    fn default() -> Self {
        Self::new()
    }
}
