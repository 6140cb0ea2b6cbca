use std::process;

#[tokio::main]
async fn main() {
    if let Err(e) = devops::cli::run().await {
        eprintln!("Error: {:#}", e);
        process::exit(devops::cli::exit_code_for(&e));
    }
}
