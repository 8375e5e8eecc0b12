//! Error type for the graph capture and instantiation engine.

use std;

use crate::backend::Backend;
use crate::closure::ApiTag;

pub type Result<T, B> = std::result::Result<T, GraphError<B>>;

/// Failures produced while capturing, instantiating, or replaying a graph.
#[derive(thiserror::Error)]
pub enum GraphError<B: Backend> {
    #[error("command list is not currently capturing a graph")]
    NotAvailable,
    #[error("command list type does not support graph capture")]
    InvalidCommandListType,
    #[error("'{0:?}' cannot be captured")]
    UnsupportedFeature(ApiTag),
    #[error("invalid argument passed to a captured call")]
    InvalidArgument,
    #[error("graph is not in a valid state for this operation")]
    InvalidGraph,
    #[error("{0}")]
    Backend(#[source] B::Error),
}

// Derived `Debug` would add an unneeded `B: Debug` bound since the derive
// macro can't see through the associated type; write it out instead.
impl<B: Backend> std::fmt::Debug for GraphError<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::NotAvailable => write!(f, "NotAvailable"),
            GraphError::InvalidCommandListType => write!(f, "InvalidCommandListType"),
            GraphError::UnsupportedFeature(tag) => {
                write!(f, "UnsupportedFeature({:?})", tag)
            }
            GraphError::InvalidArgument => write!(f, "InvalidArgument"),
            GraphError::InvalidGraph => write!(f, "InvalidGraph"),
            GraphError::Backend(err) => write!(f, "Backend({:?})", err),
        }
    }
}

impl<B: Backend> From<B::Error> for GraphError<B> {
    fn from(err: B::Error) -> Self {
        GraphError::Backend(err)
    }
}
