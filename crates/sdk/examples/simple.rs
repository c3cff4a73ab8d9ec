//! Minimal SDK example: walk one caller through the order queue.
//!
//! Requires a running daemon: `cargo run --bin turnstiled`

use turnstile_sdk::TurnstileClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = TurnstileClient::connect("http://127.0.0.1:9640").await?;

    client.register_order("example-user").await?;
    println!("registered for the order queue");

    loop {
        let status = client.order_status("example-user").await?;
        if status.allowed {
            println!("admitted");
            break;
        }
        println!("waiting at position {}", status.rank);
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    }

    // The protected action would run here.

    client.release_order("example-user").await?;
    println!("slot released");

    Ok(())
}
