pub mod executor;
pub mod pipeline;

pub use executor::{Builtin, CommandOutcome, ExecutionOutcome, Executor};
pub use pipeline::{build_stages, RedirectionSpec, Stage};
