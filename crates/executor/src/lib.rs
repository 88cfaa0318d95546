pub mod command_executor;
pub mod limits;

pub use command_executor::{
    CommandRunner, ExecutionOutcome, Executor, ExecutorError, ExitInfo, ShellCommand,
};
pub use limits::ResourceLimits;
