//! Claim a lease, hold it until Ctrl-C, then release it by letting the
//! manager shut down.
//!
//! ```text
//! cargo run -p lease-manager --example demo -- db node1
//! ```

use std::sync::Arc;
use std::time::Duration;

use lease_manager::store::MemoryStore;
use lease_manager::{ConfigBuilder, LeaseKey, Manager, NonEmptySecretary, SystemClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let lease = args.next().unwrap_or_else(|| "demo-lease".to_string());
    let holder = args.next().unwrap_or_else(|| "demo-node".to_string());

    let config = ConfigBuilder::new()
        .store(Arc::new(MemoryStore::new()))
        .clock(Arc::new(SystemClock))
        .secretary(Arc::new(NonEmptySecretary))
        .max_sleep(Duration::from_secs(30))
        .entity_uuid("demo-entity-uuid")
        .finish()?;
    let manager = Manager::spawn(config);

    let key = LeaseKey::new("default", "demo-model", lease);
    manager.claim(key.clone(), holder.clone(), Duration::from_secs(15)).await?;
    tracing::info!(%holder, "lease claimed, renewing every 5s until Ctrl-C");

    loop {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(5)) => {
                manager.claim(key.clone(), holder.clone(), Duration::from_secs(15)).await?;
                tracing::info!("lease renewed");
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    manager.kill();
    let err = manager.wait().await;
    tracing::info!(%err, "manager stopped");
    Ok(())
}
