//! Turns a stopped [`Graph`] into a replayable [`ExecutableGraph`]: resolves
//! every closure's out-of-line storage references into owned data (a deep
//! copy, so later mutation of the caller's buffers cannot affect an already
//! instantiated graph) and lays the result out across physical command
//! lists according to a [`ForkPolicy`].

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::backend::Backend;
use crate::closure::ExtraPayload;
use crate::error::GraphError;
use crate::executable::{ExecutableGraph, ExecutableSegment, ResolvedClosure};
use crate::graph::Graph;
use crate::segments::CapturedCommandId;

/// How a graph with forked subgraphs is laid out across physical command
/// lists at instantiation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForkPolicy {
    /// Every command recorded anywhere in the capture (root and every
    /// forked subgraph) is merged into a single physical command list,
    /// ordered by its global [`CapturedCommandId`]. Chosen by default for
    /// devices that can only usefully drive one queue at a time.
    MonolithicLevels,
    /// Each graph node keeps its own physical command list, replayed in its
    /// own recording order. Chosen by default for devices that can run
    /// multiple command lists concurrently.
    SplitLevels,
}

/// Caller-facing knobs for [`instantiate`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphInstantiateSettings {
    pub fork_policy: Option<ForkPolicy>,
}

fn effective_policy<B: Backend>(root: &Graph<B>, settings: GraphInstantiateSettings) -> ForkPolicy {
    settings.fork_policy.unwrap_or(if root.multi_queue {
        ForkPolicy::MonolithicLevels
    } else {
        ForkPolicy::SplitLevels
    })
}

fn resolve_closures<B: Backend>(
    graph: &Rc<RefCell<Graph<B>>>,
) -> Vec<(CapturedCommandId, B::CommandListId, ResolvedClosure<B>)> {
    let graph_ref = graph.borrow();
    let storage = graph_ref.storage().borrow();
    let target = graph_ref.command_list;
    let first = graph_ref
        .registry()
        .with_segment(graph_ref.segment_idx(), |seg| seg.first);

    let mut out = Vec::new();
    graph_ref.registry().with_segment(graph_ref.segment_idx(), |seg| {
        for (offset, closure) in seg.commands.iter().enumerate() {
            let id = CapturedCommandId(first.0 + offset as u32);
            let waits = storage.wait_events(closure.waits).to_vec();
            let (extra_bytes, extra_kernels) = match closure.extra {
                ExtraPayload::None => (Vec::new(), Vec::new()),
                ExtraPayload::FillPattern(sid)
                | ExtraPayload::CopyRegion(sid)
                | ExtraPayload::ExternalSemaphores(sid) => (storage.bytes(sid).to_vec(), Vec::new()),
                ExtraPayload::KernelExtensions(sid) | ExtraPayload::IndirectKernels(sid) => {
                    (Vec::new(), storage.kernel_clones(sid).to_vec())
                }
            };
            out.push((
                id,
                target,
                ResolvedClosure {
                    tag: closure.tag,
                    args: closure.args.clone(),
                    waits,
                    signal: closure.signal,
                    extra_bytes,
                    extra_kernels,
                },
            ));
        }
    });
    out
}

fn collect_family<B: Backend>(
    graph: &Rc<RefCell<Graph<B>>>,
    out: &mut Vec<(CapturedCommandId, B::CommandListId, ResolvedClosure<B>)>,
) {
    out.extend(resolve_closures(graph));
    let forks: Vec<_> = graph.borrow().forks().iter().filter_map(|f| f.subgraph.upgrade()).collect();
    for sub in forks {
        collect_family(&sub, out);
    }
}

/// Builds an [`ExecutableGraph`] from `root`, which must already have had
/// [`Graph::stop_capturing`] called on it. `unjoined` is that call's
/// return value: any non-empty set fails instantiation immediately, since a
/// dangling fork has no well-defined place in a physical command-list
/// layout.
pub fn instantiate<B: Backend>(
    root: &Rc<RefCell<Graph<B>>>,
    unjoined: &[CapturedCommandId],
    settings: GraphInstantiateSettings,
) -> Result<ExecutableGraph<B>, GraphError<B>> {
    if !unjoined.is_empty() {
        // A dangling fork has no well-defined place in a physical
        // command-list layout; surfaced to the caller as a plain invalid
        // argument rather than a dedicated error code.
        return Err(GraphError::InvalidArgument);
    }

    let policy = effective_policy(&root.borrow(), settings);
    debug!("instantiate: using {:?}", policy);

    let mut all = Vec::new();
    collect_family(root, &mut all);

    let callback_bindings: Vec<B::Event> = all
        .iter()
        .filter(|(_, _, c)| {
            matches!(
                c.tag,
                crate::closure::ApiTag::LaunchKernel
                    | crate::closure::ApiTag::LaunchKernelIndirect
                    | crate::closure::ApiTag::LaunchCooperativeKernel
            )
        })
        .filter_map(|(_, _, c)| c.signal)
        .collect();

    let segments = match policy {
        ForkPolicy::SplitLevels => {
            let mut by_target: Vec<(B::CommandListId, Vec<(CapturedCommandId, ResolvedClosure<B>)>)> =
                Vec::new();
            for (id, target, closure) in all {
                match by_target.iter_mut().find(|(t, _)| *t == target) {
                    Some((_, cmds)) => cmds.push((id, closure)),
                    None => by_target.push((target, vec![(id, closure)])),
                }
            }
            by_target
                .into_iter()
                .map(|(target, mut cmds)| {
                    cmds.sort_by_key(|(id, _)| *id);
                    ExecutableSegment {
                        target,
                        commands: cmds.into_iter().map(|(_, c)| c).collect(),
                    }
                })
                .collect()
        }
        ForkPolicy::MonolithicLevels => {
            let mut all = all;
            all.sort_by_key(|(id, _, _)| *id);
            let target = root.borrow().command_list;
            vec![ExecutableSegment {
                target,
                commands: all.into_iter().map(|(_, _, c)| c).collect(),
            }]
        }
    };

    Ok(ExecutableGraph { policy, segments, callback_bindings })
}
