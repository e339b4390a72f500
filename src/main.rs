//! Billing API test client
//!
//! Exercises the customer and invoice endpoints in order and exits 0 when the
//! run completes, 1 when a step fails.

use billing_harness::api::HttpClient;
use billing_harness::common::logging;
use billing_harness::presenter::Presenter;
use billing_harness::{run_suite, Config};

#[tokio::main]
async fn main() {
    logging::init_cli();

    let client = match Config::from_env().and_then(|config| HttpClient::new(&config)) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let mut presenter = Presenter::stdout();
    let result = run_suite(&client, &mut presenter).await;

    tracing::debug!(
        state = ?result.state,
        steps_run = result.steps_run,
        "run finished"
    );
    std::process::exit(result.exit_code());
}
