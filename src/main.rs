#[tokio::main]
async fn main() {
    if let Err(e) = healthspeak_lib::run().await {
        eprintln!("healthspeak: {e}");
        std::process::exit(1);
    }
}
