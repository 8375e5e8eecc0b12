//! A command-list graph capture and instantiation engine.
//!
//! GPU compute drivers let callers record a sequence of append calls onto a
//! command list, then replay that recording as many times as they like
//! without re-incurring the per-call recording cost. This crate implements
//! that capture/instantiate/replay pipeline as a backend-agnostic engine:
//! it never talks to a device itself, only to whatever implements
//! [`Backend`].
//!
//! ## Pipeline
//!
//! - [`CaptureDispatcher`] intercepts appends on any command list, turning
//!   each into a [`Closure`] and detecting both fork and join structure
//!   purely from the signal/wait traffic between a graph and its forked
//!   subgraphs (there is no explicit "this is a fork" or "this is a join"
//!   call).
//! - [`Graph`] is the recording target: a DAG node holding its own ordered
//!   segment of commands plus bookkeeping for any subgraphs forked from it.
//! - [`instantiate::instantiate`] resolves a stopped graph's captured data
//!   into an [`ExecutableGraph`], deep-copying everything out of
//!   [`ExternalStorage`] so later mutation of caller-owned buffers cannot
//!   affect an already-instantiated graph.
//! - [`ExecutableGraph::execute`] replays the result through a `Backend`.
//!
//! ## Out of scope
//!
//! Command list submission, event waiting, kernel argument binding, and
//! device introspection beyond a single multi-queue capability check are
//! all the responsibility of the `Backend` implementor, not this crate.

mod backend;
mod capture;
mod closure;
pub mod error;
mod executable;
mod graph;
mod instantiate;
mod replay;
mod segments;
mod storage;

#[cfg(test)]
mod tests;

pub use crate::backend::Backend;
pub use crate::capture::CaptureDispatcher;
pub use crate::closure::{ApiArgs, ApiTag, Closure, ExtraPayload};
pub use crate::error::{GraphError, Result};
pub use crate::executable::{ExecutableGraph, ExecutableSegment, ResolvedClosure};
pub use crate::graph::{ForkInfo, ForkJoinInfo, Graph, GraphState, SubgraphHandle};
pub use crate::instantiate::{instantiate, ForkPolicy, GraphInstantiateSettings};
pub use crate::segments::{CapturedCommandId, OrderedCommandsSegment, OrderedSegmentsRegistry};
pub use crate::storage::{ExternalStorage, StorageId};

#[doc(hidden)]
pub use static_assertions as __static_assertions;
