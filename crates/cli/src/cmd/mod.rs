mod args;
mod hook;
mod info;
mod run;

pub use args::{ConfigArgs, HookName, PipelineArgs};
pub use hook::cmd_hook;
pub use info::cmd_info;
pub use run::cmd_run;
