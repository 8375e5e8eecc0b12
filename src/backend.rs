//! The trait boundary between the capture engine and the rest of the driver.
//!
//! Command list submission, event signaling, kernel state, and device
//! introspection are all out of scope for this crate (see the crate-level
//! docs). `Backend` is the seam: an implementor supplies opaque handles for
//! the pieces the engine must track (command lists, events) and a single
//! dispatch point, [`Backend::replay_closure`], through which every captured
//! API call is eventually replayed.

use std::fmt::Debug;
use std::hash::Hash;

use crate::closure::{ApiArgs, ApiTag};

/// Opaque collaborator types and the one operation the engine needs from
/// each: replaying a previously captured call.
pub trait Backend: Sized {
    /// Identifies a command list. Command lists are never dereferenced by
    /// the engine; they are only compared, hashed, and handed back to the
    /// backend.
    type CommandListId: Copy + Eq + Hash + Debug;

    /// Identifies an event. Same treatment as `CommandListId`.
    type Event: Copy + Eq + Hash + Debug;

    /// Identifies a device, used only to decide a default fork policy.
    type DeviceId: Copy + Eq + Hash + Debug;

    /// Opaque kernel state captured by a launch-kernel call. Cloned once per
    /// instantiation so a graph may be instantiated more than once without
    /// the later instantiations observing mutations made to the kernel
    /// object after capture.
    type Kernel: Clone + Debug;

    /// Surfaced verbatim by [`crate::error::GraphError::Backend`] when replay
    /// fails.
    type Error: std::error::Error;

    /// True if `device` can run more than one command list concurrently.
    /// Consulted once, at `start_capturing_from` time, to pick the default
    /// [`crate::instantiate::ForkPolicy`] when the caller does not specify
    /// one explicitly.
    fn multi_queue_capable(&self, device: Self::DeviceId) -> bool;

    /// Replay one captured call into `target`, waiting on `waits` and
    /// signaling `signal` if present.
    ///
    /// `extra_bytes`/`extra_kernels` are the resolved, deep-copied contents
    /// of whatever out-of-line data the closure's tag needed (fill
    /// patterns, packed regions, cloned kernel extension chains) — already
    /// detached from capture-time storage by the time replay sees them.
    ///
    /// The backend alone understands the real per-`tag` argument layout;
    /// the engine only forwards `args`/`extra_*` opaquely.
    fn replay_closure(
        &self,
        target: Self::CommandListId,
        tag: ApiTag,
        args: &ApiArgs<Self>,
        extra_bytes: &[u8],
        extra_kernels: &[Self::Kernel],
        waits: &[Self::Event],
        signal: Option<Self::Event>,
    ) -> Result<(), Self::Error>;

    /// Re-attaches an external callback event to whatever it was bound to
    /// at capture time. Called once per segment replay, after all of that
    /// segment's commands have been submitted, for every signal event
    /// produced by a kernel-launch-family closure — mirroring the source
    /// driver's batched `ExternalCbEventInfoContainer` rebind rather than a
    /// rebind per individual closure. Most backends have nothing to do
    /// here; the default implementation is a no-op.
    fn rebind_callback_event(&self, _event: Self::Event) -> Result<(), Self::Error> {
        Ok(())
    }
}
