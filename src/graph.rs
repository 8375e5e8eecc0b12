//! The recording target itself: a DAG of forked subgraphs built up purely
//! from the event signal/wait traffic observed between them, with no
//! explicit "fork here" API.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use log::{debug, trace};

use crate::backend::Backend;
use crate::closure::Closure;
use crate::segments::{CapturedCommandId, OrderedSegmentsRegistry};
use crate::storage::ExternalStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphState {
    Recording,
    Stopped,
    Instantiated,
}

/// A forked subgraph may be auto-allocated by the engine (owned, torn down
/// with its parent) or pre-allocated by the caller and merely referenced
/// (non-owned, outliving any one capture).
pub enum SubgraphHandle<B: Backend> {
    Owned(Rc<RefCell<Graph<B>>>),
    Shared(Weak<RefCell<Graph<B>>>),
}

impl<B: Backend> SubgraphHandle<B> {
    pub fn upgrade(&self) -> Option<Rc<RefCell<Graph<B>>>> {
        match self {
            SubgraphHandle::Owned(rc) => Some(Rc::clone(rc)),
            SubgraphHandle::Shared(weak) => weak.upgrade(),
        }
    }
}

/// Records that a fork happened at `fork_command_id` in the parent and
/// continued recording into `subgraph`.
pub struct ForkInfo<B: Backend> {
    pub fork_command_id: CapturedCommandId,
    pub subgraph: SubgraphHandle<B>,
}

/// A plausible join: `fork_command_id`'s subgraph appears to have signaled
/// `join_event` from its last command, which some other command list then
/// waited on.
#[derive(Debug, Clone)]
pub struct ForkJoinInfo<B: Backend> {
    pub fork_command_id: CapturedCommandId,
    pub join_event: B::Event,
    pub signal_id: CapturedCommandId,
}

/// A single capture target: the root command list or one of its forked
/// subgraphs. All graphs belonging to one capture share an
/// [`OrderedSegmentsRegistry`], which is what lets ids be compared across
/// them.
pub struct Graph<B: Backend> {
    pub command_list: B::CommandListId,
    pub state: GraphState,
    pub multi_queue: bool,
    registry: Rc<OrderedSegmentsRegistry<B>>,
    storage: Rc<RefCell<ExternalStorage<B>>>,
    segment_idx: usize,
    forks: Vec<ForkInfo<B>>,
    potential_joins: HashMap<CapturedCommandId, ForkJoinInfo<B>>,
    parent: Option<Weak<RefCell<Graph<B>>>>,
}

impl<B: Backend> Graph<B> {
    pub fn start_capturing_from(
        command_list: B::CommandListId,
        registry: Rc<OrderedSegmentsRegistry<B>>,
        storage: Rc<RefCell<ExternalStorage<B>>>,
        multi_queue: bool,
    ) -> Self {
        let segment_idx = registry.open_segment();
        trace!("graph: started capturing on {:?}", command_list);
        Graph {
            command_list,
            state: GraphState::Recording,
            multi_queue,
            registry,
            storage,
            segment_idx,
            forks: Vec::new(),
            potential_joins: HashMap::new(),
            parent: None,
        }
    }

    pub fn registry(&self) -> &Rc<OrderedSegmentsRegistry<B>> {
        &self.registry
    }

    pub fn storage(&self) -> &Rc<RefCell<ExternalStorage<B>>> {
        &self.storage
    }

    pub fn parent(&self) -> Option<Rc<RefCell<Graph<B>>>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    pub fn segment_idx(&self) -> usize {
        self.segment_idx
    }

    pub fn is_recording(&self) -> bool {
        self.state == GraphState::Recording
    }

    /// Appends a captured call to this graph's own segment.
    pub fn record(&mut self, closure: Closure<B>) -> CapturedCommandId {
        self.registry.append(self.segment_idx, closure)
    }

    pub fn last_command_id(&self) -> Option<CapturedCommandId> {
        self.registry.last_command_id(self.segment_idx)
    }

    /// True if `id` is the most recent command recorded into this graph's
    /// own segment. Used by the join sweep: a subgraph only counts as
    /// joined if the event it signaled was raised by its *last* command,
    /// not merely some earlier one.
    pub fn is_last_command(&self, id: CapturedCommandId) -> bool {
        self.last_command_id() == Some(id)
    }

    /// Begins a new subgraph forked from this one, recorded as having
    /// diverged at `fork_command_id` (the parent command whose signal the
    /// new command list's first wait referenced). There is no caller-facing
    /// "fork here" call: this is only ever invoked by
    /// [`crate::capture::CaptureDispatcher`] once it has inferred a fork
    /// from observed wait traffic.
    pub fn fork_to(
        parent: &Rc<RefCell<Graph<B>>>,
        target: B::CommandListId,
        fork_command_id: CapturedCommandId,
    ) -> Rc<RefCell<Graph<B>>> {
        let (registry, storage, multi_queue) = {
            let parent_ref = parent.borrow();
            (
                Rc::clone(&parent_ref.registry),
                Rc::clone(&parent_ref.storage),
                parent_ref.multi_queue,
            )
        };

        let mut subgraph = Graph::start_capturing_from(target, registry, storage, multi_queue);
        subgraph.parent = Some(Rc::downgrade(parent));
        let subgraph = Rc::new(RefCell::new(subgraph));

        parent.borrow_mut().forks.push(ForkInfo {
            fork_command_id,
            subgraph: SubgraphHandle::Owned(Rc::clone(&subgraph)),
        });
        debug!(
            "graph: forked at command {:?} onto {:?}",
            fork_command_id, target
        );
        subgraph
    }

    /// Called whenever a command list appends a wait on `event`. Checks
    /// whether `event` matches the last-signaled command of any fork still
    /// without a recorded join; if so, records (or overwrites) a join
    /// candidate for that fork. A fork with more than one matching wait
    /// observed over the capture keeps only the most recently observed
    /// candidate, matching the underlying driver's behavior of overwriting
    /// on every call rather than keeping the first.
    pub fn try_join_on_next_command(&mut self, event: B::Event, signal_id: CapturedCommandId) {
        for fork in &self.forks {
            if let Some(subgraph) = fork.subgraph.upgrade() {
                let is_join = {
                    let sub = subgraph.borrow();
                    sub.is_last_command(signal_id)
                };
                if is_join {
                    trace!(
                        "graph: join candidate for fork {:?}: event {:?} at {:?}",
                        fork.fork_command_id, event, signal_id
                    );
                    self.potential_joins.insert(
                        fork.fork_command_id,
                        ForkJoinInfo { fork_command_id: fork.fork_command_id, join_event: event, signal_id },
                    );
                }
            }
        }
    }

    /// Stops recording and returns the set of forks that never observed a
    /// matching join by the time capture ended.
    pub fn stop_capturing(&mut self) -> Vec<CapturedCommandId> {
        self.state = GraphState::Stopped;
        let unjoined: Vec<CapturedCommandId> = self
            .forks
            .iter()
            .map(|f| f.fork_command_id)
            .filter(|id| !self.potential_joins.contains_key(id))
            .collect();
        if !unjoined.is_empty() {
            debug!("graph: {} fork(s) left unjoined at stop", unjoined.len());
        }
        unjoined
    }

    pub fn forks(&self) -> &[ForkInfo<B>] {
        &self.forks
    }

    pub fn potential_joins(&self) -> &HashMap<CapturedCommandId, ForkJoinInfo<B>> {
        &self.potential_joins
    }
}
