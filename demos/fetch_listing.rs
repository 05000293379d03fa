//! Fetch a whole listing into a local directory
//!
//! This example demonstrates:
//! - Loading configuration from JSON
//! - Subscribing to run events
//! - Running the probe and fan-out phases for one listing
//!
//! ```bash
//! cargo run --example fetch_listing -- store-products game
//! ```

use paged_fetch::{Config, Event, MediaKind, Paginator, ResourceKind};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let kind: ResourceKind = args.next().as_deref().unwrap_or("store-products").parse()?;
    let media: MediaKind = args.next().as_deref().unwrap_or("game").parse()?;

    let config = Config::from_json_str(
        r#"{
            "concurrency": 4,
            "store_root": "pages"
        }"#,
    )?;
    let paginator = Paginator::new(config)?;

    let mut events = paginator.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::TotalPagesDiscovered { total, .. } => println!("{total} pages to fetch"),
                Event::PageStored { page, bytes, .. } => println!("page {page}: {bytes} bytes"),
                Event::PageFailed { page, error, .. } => {
                    eprintln!("page {page:?} failed: {error}")
                }
                _ => {}
            }
        }
    });

    let summary = paginator.fetch_all_pages(kind, media).await?;
    println!(
        "Stored {} pages of {} ({}) with {} requests",
        summary.total_pages, summary.kind, summary.media, summary.requests
    );
    Ok(())
}
