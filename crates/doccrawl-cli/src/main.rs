//! doccrawl CLI - crawl documentation sites into markdown and detect drift
//!
//! All command implementations live in the library crate so integration
//! tests can exercise them.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    doccrawl_cli::run().await
}
