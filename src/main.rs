use netassist::cli;

#[tokio::main]
async fn main() {
    if let Err(err) = cli::run().await {
        eprintln!("\n{err}");
        std::process::exit(1);
    }
}
