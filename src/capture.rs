//! Intercepts append calls on command lists, turns them into [`Closure`]s,
//! and infers both fork and join structure purely from the signal/wait
//! traffic between a graph and its forked subgraphs. There is no dedicated
//! fork entry point: a command list becomes a capture target the moment it
//! waits on an event some other tracked graph signaled.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use log::trace;

use crate::backend::Backend;
use crate::closure::{ApiArgs, ApiTag, Closure, ExtraPayload};
use crate::error::GraphError;
use crate::graph::Graph;
use crate::segments::{CapturedCommandId, OrderedSegmentsRegistry};
use crate::storage::ExternalStorage;

/// Dispatches captured calls to the right [`Graph`] and keeps the two
/// engine-owned side tables the spec describes as properties of the
/// external command list/event objects: which graph a command list is
/// currently recording into, and which graph (and command) last signaled a
/// given event.
pub struct CaptureDispatcher<B: Backend> {
    backend: B,
    graphs_by_command_list: HashMap<B::CommandListId, Rc<RefCell<Graph<B>>>>,
    signal_sources: HashMap<B::Event, (Weak<RefCell<Graph<B>>>, CapturedCommandId)>,
}

impl<B: Backend> CaptureDispatcher<B> {
    pub fn new(backend: B) -> Self {
        CaptureDispatcher {
            backend,
            graphs_by_command_list: HashMap::new(),
            signal_sources: HashMap::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_capturing(&self, command_list: B::CommandListId) -> bool {
        self.graphs_by_command_list.contains_key(&command_list)
    }

    pub fn graph_for(&self, command_list: B::CommandListId) -> Option<Rc<RefCell<Graph<B>>>> {
        self.graphs_by_command_list.get(&command_list).cloned()
    }

    /// Starts a new root graph capturing on `command_list`.
    pub fn start_capturing_from(
        &mut self,
        command_list: B::CommandListId,
        device: B::DeviceId,
    ) -> Result<Rc<RefCell<Graph<B>>>, GraphError<B>> {
        if self.is_capturing(command_list) {
            return Err(GraphError::InvalidCommandListType);
        }
        let registry = Rc::new(OrderedSegmentsRegistry::new());
        let storage = Rc::new(RefCell::new(ExternalStorage::new()));
        let multi_queue = self.backend.multi_queue_capable(device);
        let graph = Rc::new(RefCell::new(Graph::start_capturing_from(
            command_list,
            registry,
            storage,
            multi_queue,
        )));
        self.graphs_by_command_list.insert(command_list, Rc::clone(&graph));
        Ok(graph)
    }

    /// Looks for a fork to infer when `command_list` has no capture target
    /// of its own yet: if any event in `waits` was last signaled by some
    /// other tracked graph, that graph is asked to fork onto
    /// `command_list` at the point it raised that signal. There is no
    /// separate "this is a fork" call; a command list becomes a capture
    /// target purely by waiting on an event produced by one that already is.
    fn fork_from_wait(
        &mut self,
        command_list: B::CommandListId,
        waits: &[B::Event],
    ) -> Option<Rc<RefCell<Graph<B>>>> {
        for &event in waits {
            if let Some((source_weak, signal_id)) = self.signal_sources.get(&event).cloned() {
                if let Some(source_graph) = source_weak.upgrade() {
                    trace!(
                        "capture: inferred fork onto {:?} from wait on {:?}",
                        command_list, event
                    );
                    let subgraph = Graph::fork_to(&source_graph, command_list, signal_id);
                    self.graphs_by_command_list.insert(command_list, Rc::clone(&subgraph));
                    return Some(subgraph);
                }
            }
        }
        None
    }

    /// Records one captured call on `command_list`. `waits` and `signal`
    /// drive both fork and join detection: a wait on an event previously
    /// signaled by some other tracked graph either starts a new fork (if
    /// `command_list` has no capture target of its own yet) or, if
    /// `command_list` is already capturing, resolves that event's source
    /// fork as joined. `signal` (if present) becomes the new candidate
    /// signal source for this command.
    #[allow(clippy::too_many_arguments)]
    pub fn capture(
        &mut self,
        command_list: B::CommandListId,
        tag: ApiTag,
        args: ApiArgs<B>,
        waits: &[B::Event],
        signal: Option<B::Event>,
        extra: ExtraPayload,
    ) -> Result<CapturedCommandId, GraphError<B>> {
        let (graph, just_forked) = match self.graph_for(command_list) {
            Some(g) => (g, false),
            None => match self.fork_from_wait(command_list, waits) {
                Some(g) => (g, true),
                None => return Err(GraphError::NotAvailable),
            },
        };

        if !just_forked {
            for &event in waits {
                if let Some((source_weak, signal_id)) = self.signal_sources.get(&event).cloned() {
                    if let Some(source_graph) = source_weak.upgrade() {
                        if let Some(parent) = source_graph.borrow().parent() {
                            trace!(
                                "capture: observed wait on {:?}, notifying fork parent",
                                event
                            );
                            parent.borrow_mut().try_join_on_next_command(event, signal_id);
                        }
                    }
                }
            }
        }

        let waits_id = {
            let storage = Rc::clone(graph.borrow().storage());
            storage.borrow_mut().register_wait_events(waits)
        };

        let closure = Closure::new(tag, args, waits_id, signal).with_extra(extra);
        let id = graph.borrow_mut().record(closure);

        if let Some(event) = signal {
            self.signal_sources.insert(event, (Rc::downgrade(&graph), id));
        }

        Ok(id)
    }

    /// Stops recording on `command_list` and returns the unjoined forks
    /// discovered by the sweep. Also drops any `signal_sources` entries
    /// belonging to this capture family, matching the bounded lifetime of
    /// the recorded-signal-from back-pointer in the source driver.
    pub fn stop_capturing(
        &mut self,
        command_list: B::CommandListId,
    ) -> Result<Vec<CapturedCommandId>, GraphError<B>> {
        let graph = self.graph_for(command_list).ok_or(GraphError::NotAvailable)?;
        let registry = Rc::clone(graph.borrow().registry());
        let unjoined = graph.borrow_mut().stop_capturing();

        self.signal_sources.retain(|_, (weak, _)| match weak.upgrade() {
            Some(g) => !Rc::ptr_eq(g.borrow().registry(), &registry),
            None => false,
        });
        self.graphs_by_command_list
            .retain(|_, g| !Rc::ptr_eq(g.borrow().registry(), &registry));

        Ok(unjoined)
    }
}
