use futures::future::BoxFuture;

use trellis_core::error::Result;
use trellis_core::state::{PartialResult, State};

/// One step of work in a graph: state in, partial result out.
///
/// Executors receive the shared state read-only and return the messages to
/// append plus an optional routing hint; the engine owns the merge. A failure
/// aborts the run wrapped as `NodeExecution` with this node's id.
pub trait NodeExecutor: Send + Sync + 'static {
    fn run<'a>(&'a self, state: &'a State) -> BoxFuture<'a, Result<PartialResult>>;
}

impl std::fmt::Debug for dyn NodeExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<dyn NodeExecutor>")
    }
}

/// Plain functions with the right signature are executors, which keeps
/// small nodes and test fixtures free of wrapper structs.
impl<F> NodeExecutor for F
where
    F: for<'a> Fn(&'a State) -> BoxFuture<'a, Result<PartialResult>> + Send + Sync + 'static,
{
    fn run<'a>(&'a self, state: &'a State) -> BoxFuture<'a, Result<PartialResult>> {
        self(state)
    }
}
