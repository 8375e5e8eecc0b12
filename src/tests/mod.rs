//! Scenario tests for the capture/instantiate/replay pipeline, run against
//! an in-memory mock backend rather than real hardware.

pub mod support;

pub mod single_copy;
pub mod wait_event_dedup;
pub mod default_policy;
pub mod empty_graph_execute;
pub mod randomized_linear_capture;
