//! Pipeline config writer: blocks in, staged build-step configuration out.

mod context;
mod flow;
mod merge;
mod post;
mod steps;
mod writer;

pub use context::{PipelineContext, PostContext, StepFragment, TaskConfig};
pub use flow::{Flow, FlowOptions};
pub use merge::deep_merge;
pub use post::{PostFn, PostProcessor, PostRegistry, RequireJs};
pub use steps::{Concat, PassThrough, StepConfigurator, StepFn, StepRegistry};
pub use writer::{ConfigDirs, ConfigWriter};
