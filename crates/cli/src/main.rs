use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    salesradar_cli::run().await
}
