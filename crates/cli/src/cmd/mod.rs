mod cache;
mod info;
mod run;

pub use cache::cmd_cache;
pub use info::cmd_info;
pub use run::{RunArgs, cmd_run};
