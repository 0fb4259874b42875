use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    hearth_lib::run().await
}
