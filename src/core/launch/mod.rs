pub mod classpath;
pub mod command;
pub mod task;

pub use classpath::build_classpath;
pub use command::{build_launch_spec, client_spec, render_template, server_spec, LaunchSpec};
pub use task::run;
