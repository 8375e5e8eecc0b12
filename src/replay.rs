//! Drives an [`ExecutableGraph`] back through a [`Backend`], one segment at
//! a time.

use log::warn;

use crate::backend::Backend;
use crate::closure::{ApiArgs, ApiTag};
use crate::error::GraphError;
use crate::executable::{ExecutableGraph, ExecutableSegment};

impl<B: Backend> ExecutableGraph<B> {
    /// Replays this graph onto `execution_target`. `wait_events` is applied
    /// before the first replayed command and `signal_event` (if present)
    /// after the last, exactly as if `execution_target` had itself appended
    /// a wait-on-events followed eventually by a signal-event around the
    /// whole replay. A graph with no commands at all degenerates to that
    /// bare wait/signal pair, with nothing else submitted.
    ///
    /// Segments do not run concurrently: physical ordering across forked
    /// command lists beyond the first/last wrapping above is the caller's
    /// responsibility, same as for any other pair of command lists
    /// submitted independently.
    pub fn execute(
        &self,
        backend: &B,
        execution_target: B::CommandListId,
        wait_events: &[B::Event],
        signal_event: Option<B::Event>,
    ) -> Result<(), GraphError<B>> {
        if self.segments.iter().all(|s| s.commands.is_empty()) {
            if !wait_events.is_empty() {
                self.append_wait(backend, execution_target, wait_events)?;
            }
            if let Some(event) = signal_event {
                self.append_signal(backend, execution_target, event)?;
            }
            return Ok(());
        }

        let last_idx = self.segments.len() - 1;
        for (idx, segment) in self.segments.iter().enumerate() {
            let prelude_waits: &[B::Event] = if idx == 0 { wait_events } else { &[] };
            let postlude_signal = if idx == last_idx { signal_event } else { None };
            self.execute_segment(backend, segment, prelude_waits, postlude_signal)?;
        }
        Ok(())
    }

    fn append_wait(
        &self,
        backend: &B,
        target: B::CommandListId,
        waits: &[B::Event],
    ) -> Result<(), GraphError<B>> {
        backend
            .replay_closure(target, ApiTag::WaitOnEvents, &ApiArgs::WaitOnEvents, &[], &[], waits, None)
            .map_err(GraphError::Backend)
    }

    fn append_signal(
        &self,
        backend: &B,
        target: B::CommandListId,
        event: B::Event,
    ) -> Result<(), GraphError<B>> {
        backend
            .replay_closure(
                target,
                ApiTag::SignalEvent,
                &ApiArgs::SignalEvent { event },
                &[],
                &[],
                &[],
                Some(event),
            )
            .map_err(GraphError::Backend)
    }

    /// Replays a single segment's own commands (optionally preceded by a
    /// wait-on-events prelude and followed by a signal-event postlude), then
    /// rebinds every callback event this graph collected whose signal
    /// belongs to this segment.
    fn execute_segment(
        &self,
        backend: &B,
        segment: &ExecutableSegment<B>,
        prelude_waits: &[B::Event],
        postlude_signal: Option<B::Event>,
    ) -> Result<(), GraphError<B>> {
        if !prelude_waits.is_empty() {
            self.append_wait(backend, segment.target, prelude_waits)?;
        }

        for command in &segment.commands {
            backend
                .replay_closure(
                    segment.target,
                    command.tag,
                    &command.args,
                    &command.extra_bytes,
                    &command.extra_kernels,
                    &command.waits,
                    command.signal,
                )
                .map_err(|err| {
                    warn!("replay: command {:?} on {:?} failed", command.tag, segment.target);
                    GraphError::Backend(err)
                })?;
        }

        for &event in &self.callback_bindings {
            if segment.commands.iter().any(|c| c.signal == Some(event)) {
                backend.rebind_callback_event(event).map_err(GraphError::Backend)?;
            }
        }

        if let Some(event) = postlude_signal {
            self.append_signal(backend, segment.target, event)?;
        }

        Ok(())
    }
}
