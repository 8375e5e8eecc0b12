//! Recorded calls: what was captured, not how it is replayed.

use crate::backend::Backend;
use crate::storage::StorageId;

/// Asserts, at compile time, that `ApiArgs<$backend>` stays within the
/// closure size budget a command-list recorder is expected to hold inline.
/// The bound only becomes a concrete number once a `Backend`'s associated
/// types are known, so the engine cannot check it once for every
/// implementor; each one should invoke this macro for itself, typically
/// next to its `impl Backend` block.
#[macro_export]
macro_rules! assert_api_args_fits_budget {
    ($backend:ty) => {
        $crate::__static_assertions::const_assert!(
            ::std::mem::size_of::<$crate::ApiArgs<$backend>>() <= 128
        );
    };
}

/// Identifies which captured API a [`Closure`] stands for. Mirrors the
/// append family a command list exposes; the backend alone knows the real
/// wire layout for each tag (see [`crate::backend::Backend::replay_closure`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiTag {
    WriteGlobalTimestamp,
    MemoryCopy,
    MemoryCopyRegion,
    MemoryCopyFromContext,
    MemoryFill,
    MemoryPrefetch,
    MemoryRangesBarrier,
    MemAdvise,
    Barrier,
    SignalEvent,
    WaitOnEvents,
    EventReset,
    QueryKernelTimestamps,
    LaunchKernel,
    LaunchKernelIndirect,
    LaunchKernelWithParameters,
    LaunchKernelWithArguments,
    LaunchMultipleKernelsIndirect,
    LaunchCooperativeKernel,
    LaunchHostFunction,
    SignalExternalSemaphoreExt,
    WaitExternalSemaphoreExt,
    ImageCopy,
    ImageCopyRegion,
    ImageCopyToMemory,
    ImageCopyFromMemory,
    ImageCopyToMemoryExt,
    ImageCopyFromMemoryExt,
}

/// The small, fixed-shape part of a captured call's arguments. Pointers are
/// stored as raw `usize` addresses: dereferencing them is the backend's
/// problem at replay time, not the engine's.
///
/// `Debug`/`Clone` are implemented by hand below rather than derived: a
/// derive would add a blanket `B: Debug`/`B: Clone` bound even though only
/// `B::Event`/`B::Kernel` are ever stored, forcing every backend
/// implementor to also derive those traits for no reason.
pub enum ApiArgs<B: Backend> {
    WriteGlobalTimestamp { dst_ptr: usize },
    MemoryCopy { dst_ptr: usize, src_ptr: usize, size: usize },
    MemoryCopyRegion { dst_ptr: usize, src_ptr: usize },
    /// A copy whose source buffer lives in a different context/device than
    /// the command list doing the copy.
    MemoryCopyFromContext { dst_ptr: usize, src_ptr: usize, size: usize, src_device: B::DeviceId },
    MemoryFill { dst_ptr: usize, size: usize },
    MemoryPrefetch { ptr: usize, size: usize, device: B::DeviceId },
    MemoryRangesBarrier,
    MemAdvise { ptr: usize, size: usize },
    Barrier,
    SignalEvent { event: B::Event },
    WaitOnEvents,
    EventReset { event: B::Event },
    QueryKernelTimestamps,
    LaunchKernel { kernel: B::Kernel, group_count: [u32; 3] },
    LaunchKernelIndirect { kernel: B::Kernel },
    LaunchCooperativeKernel { kernel: B::Kernel, group_count: [u32; 3] },
    /// A host-side callback invoked as part of replay. `user_data_ptr` is
    /// opaque to the engine, same treatment as the memory pointers above.
    LaunchHostFunction { user_data_ptr: usize },
    /// `semaphore_count` is the fixed part; the packed semaphore handles and
    /// their wait/signal values live out of line in the closure's
    /// [`ExtraPayload::ExternalSemaphores`].
    SignalExternalSemaphoreExt { semaphore_count: u32 },
    WaitExternalSemaphoreExt { semaphore_count: u32 },
    ImageCopy { dst_ptr: usize, src_ptr: usize },
}

impl<B: Backend> Clone for ApiArgs<B> {
    fn clone(&self) -> Self {
        match self {
            ApiArgs::WriteGlobalTimestamp { dst_ptr } => {
                ApiArgs::WriteGlobalTimestamp { dst_ptr: *dst_ptr }
            }
            ApiArgs::MemoryCopy { dst_ptr, src_ptr, size } => ApiArgs::MemoryCopy {
                dst_ptr: *dst_ptr,
                src_ptr: *src_ptr,
                size: *size,
            },
            ApiArgs::MemoryCopyRegion { dst_ptr, src_ptr } => ApiArgs::MemoryCopyRegion {
                dst_ptr: *dst_ptr,
                src_ptr: *src_ptr,
            },
            ApiArgs::MemoryCopyFromContext { dst_ptr, src_ptr, size, src_device } => {
                ApiArgs::MemoryCopyFromContext {
                    dst_ptr: *dst_ptr,
                    src_ptr: *src_ptr,
                    size: *size,
                    src_device: *src_device,
                }
            }
            ApiArgs::MemoryFill { dst_ptr, size } => ApiArgs::MemoryFill {
                dst_ptr: *dst_ptr,
                size: *size,
            },
            ApiArgs::MemoryPrefetch { ptr, size, device } => {
                ApiArgs::MemoryPrefetch { ptr: *ptr, size: *size, device: *device }
            }
            ApiArgs::MemoryRangesBarrier => ApiArgs::MemoryRangesBarrier,
            ApiArgs::MemAdvise { ptr, size } => ApiArgs::MemAdvise { ptr: *ptr, size: *size },
            ApiArgs::Barrier => ApiArgs::Barrier,
            ApiArgs::SignalEvent { event } => ApiArgs::SignalEvent { event: *event },
            ApiArgs::WaitOnEvents => ApiArgs::WaitOnEvents,
            ApiArgs::EventReset { event } => ApiArgs::EventReset { event: *event },
            ApiArgs::QueryKernelTimestamps => ApiArgs::QueryKernelTimestamps,
            ApiArgs::LaunchKernel { kernel, group_count } => ApiArgs::LaunchKernel {
                kernel: kernel.clone(),
                group_count: *group_count,
            },
            ApiArgs::LaunchKernelIndirect { kernel } => {
                ApiArgs::LaunchKernelIndirect { kernel: kernel.clone() }
            }
            ApiArgs::LaunchCooperativeKernel { kernel, group_count } => {
                ApiArgs::LaunchCooperativeKernel {
                    kernel: kernel.clone(),
                    group_count: *group_count,
                }
            }
            ApiArgs::LaunchHostFunction { user_data_ptr } => {
                ApiArgs::LaunchHostFunction { user_data_ptr: *user_data_ptr }
            }
            ApiArgs::SignalExternalSemaphoreExt { semaphore_count } => {
                ApiArgs::SignalExternalSemaphoreExt { semaphore_count: *semaphore_count }
            }
            ApiArgs::WaitExternalSemaphoreExt { semaphore_count } => {
                ApiArgs::WaitExternalSemaphoreExt { semaphore_count: *semaphore_count }
            }
            ApiArgs::ImageCopy { dst_ptr, src_ptr } => ApiArgs::ImageCopy {
                dst_ptr: *dst_ptr,
                src_ptr: *src_ptr,
            },
        }
    }
}

impl<B: Backend> std::fmt::Debug for ApiArgs<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiArgs::WriteGlobalTimestamp { dst_ptr } => {
                f.debug_struct("WriteGlobalTimestamp").field("dst_ptr", dst_ptr).finish()
            }
            ApiArgs::MemoryCopy { dst_ptr, src_ptr, size } => f
                .debug_struct("MemoryCopy")
                .field("dst_ptr", dst_ptr)
                .field("src_ptr", src_ptr)
                .field("size", size)
                .finish(),
            ApiArgs::MemoryCopyRegion { dst_ptr, src_ptr } => f
                .debug_struct("MemoryCopyRegion")
                .field("dst_ptr", dst_ptr)
                .field("src_ptr", src_ptr)
                .finish(),
            ApiArgs::MemoryCopyFromContext { dst_ptr, src_ptr, size, src_device } => f
                .debug_struct("MemoryCopyFromContext")
                .field("dst_ptr", dst_ptr)
                .field("src_ptr", src_ptr)
                .field("size", size)
                .field("src_device", src_device)
                .finish(),
            ApiArgs::MemoryFill { dst_ptr, size } => {
                f.debug_struct("MemoryFill").field("dst_ptr", dst_ptr).field("size", size).finish()
            }
            ApiArgs::MemoryPrefetch { ptr, size, device } => f
                .debug_struct("MemoryPrefetch")
                .field("ptr", ptr)
                .field("size", size)
                .field("device", device)
                .finish(),
            ApiArgs::MemoryRangesBarrier => write!(f, "MemoryRangesBarrier"),
            ApiArgs::MemAdvise { ptr, size } => {
                f.debug_struct("MemAdvise").field("ptr", ptr).field("size", size).finish()
            }
            ApiArgs::Barrier => write!(f, "Barrier"),
            ApiArgs::SignalEvent { event } => {
                f.debug_struct("SignalEvent").field("event", event).finish()
            }
            ApiArgs::WaitOnEvents => write!(f, "WaitOnEvents"),
            ApiArgs::EventReset { event } => {
                f.debug_struct("EventReset").field("event", event).finish()
            }
            ApiArgs::QueryKernelTimestamps => write!(f, "QueryKernelTimestamps"),
            ApiArgs::LaunchKernel { kernel, group_count } => f
                .debug_struct("LaunchKernel")
                .field("kernel", kernel)
                .field("group_count", group_count)
                .finish(),
            ApiArgs::LaunchKernelIndirect { kernel } => {
                f.debug_struct("LaunchKernelIndirect").field("kernel", kernel).finish()
            }
            ApiArgs::LaunchCooperativeKernel { kernel, group_count } => f
                .debug_struct("LaunchCooperativeKernel")
                .field("kernel", kernel)
                .field("group_count", group_count)
                .finish(),
            ApiArgs::LaunchHostFunction { user_data_ptr } => {
                f.debug_struct("LaunchHostFunction").field("user_data_ptr", user_data_ptr).finish()
            }
            ApiArgs::SignalExternalSemaphoreExt { semaphore_count } => f
                .debug_struct("SignalExternalSemaphoreExt")
                .field("semaphore_count", semaphore_count)
                .finish(),
            ApiArgs::WaitExternalSemaphoreExt { semaphore_count } => f
                .debug_struct("WaitExternalSemaphoreExt")
                .field("semaphore_count", semaphore_count)
                .finish(),
            ApiArgs::ImageCopy { dst_ptr, src_ptr } => f
                .debug_struct("ImageCopy")
                .field("dst_ptr", dst_ptr)
                .field("src_ptr", src_ptr)
                .finish(),
        }
    }
}

/// Variable-length data a closure needs beyond its `ApiArgs`, always held
/// out of line in an [`crate::storage::ExternalStorage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraPayload {
    None,
    FillPattern(StorageId),
    CopyRegion(StorageId),
    KernelExtensions(StorageId),
    IndirectKernels(StorageId),
    /// Packed semaphore handles and their wait/signal values for
    /// [`ApiTag::SignalExternalSemaphoreExt`]/[`ApiTag::WaitExternalSemaphoreExt`].
    ExternalSemaphores(StorageId),
}

impl ExtraPayload {
    pub fn is_none(&self) -> bool {
        matches!(self, ExtraPayload::None)
    }
}

/// A single recorded call: the tag, its fixed arguments, the deduplicated
/// wait list it depended on, the event it signals (if any), and whatever
/// out-of-line extra data its tag requires.
pub struct Closure<B: Backend> {
    pub tag: ApiTag,
    pub args: ApiArgs<B>,
    pub waits: StorageId,
    pub signal: Option<B::Event>,
    pub extra: ExtraPayload,
}

impl<B: Backend> Clone for Closure<B> {
    fn clone(&self) -> Self {
        Closure {
            tag: self.tag,
            args: self.args.clone(),
            waits: self.waits,
            signal: self.signal,
            extra: self.extra,
        }
    }
}

impl<B: Backend> std::fmt::Debug for Closure<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Closure")
            .field("tag", &self.tag)
            .field("args", &self.args)
            .field("waits", &self.waits)
            .field("signal", &self.signal)
            .field("extra", &self.extra)
            .finish()
    }
}

impl<B: Backend> Closure<B> {
    pub fn new(tag: ApiTag, args: ApiArgs<B>, waits: StorageId, signal: Option<B::Event>) -> Self {
        Closure {
            tag,
            args,
            waits,
            signal,
            extra: ExtraPayload::None,
        }
    }

    pub fn with_extra(mut self, extra: ExtraPayload) -> Self {
        self.extra = extra;
        self
    }
}
