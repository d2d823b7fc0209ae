//! Command execution: build a `Ring`/`Coordinator` from the `--node` list,
//! then run the requested operation against it.

use crate::config::{CliConfig, Command};
use kvring_core::{NodeId, Ring};
use kvring_coordinator::Coordinator;
use kvring_transport::remote::connect;

fn build_ring(cli: &CliConfig) -> anyhow::Result<Ring> {
    if cli.nodes.is_empty() {
        anyhow::bail!("at least one --node name=host:port is required");
    }

    let ring = Ring::new(cli.replication_factor);
    for spec in &cli.nodes {
        let (name, addr) = spec
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("--node must be name=host:port, got {spec:?}"))?;
        let socket_addr = addr
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid address {addr:?} for node {name:?}: {e}"))?;
        let transport = connect(socket_addr, name.to_string())
            .map_err(|e| anyhow::anyhow!("failed to create transport for {name:?}: {e}"))?;
        ring.add_node(NodeId::from(name), transport)?;
    }
    Ok(ring)
}

pub async fn run(cli: CliConfig) -> anyhow::Result<()> {
    let ring = build_ring(&cli)?;

    match cli.command {
        Command::Describe => {
            println!("Ring: {} node(s), replication factor N={}", ring.node_count(), ring.replication_factor());
            for id in ring.node_ids() {
                let Some(client) = ring.client_for(&id) else { continue };
                match client.describe().await {
                    Ok(info) => println!("  - {id}: {} key(s)", info.key_count),
                    Err(e) => println!("  - {id}: unreachable ({e})"),
                }
            }
        }
        Command::Put { key, value, w } => {
            let coordinator = Coordinator::new(ring);
            coordinator.put(&key, value.into_bytes(), w).await?;
            println!("OK");
        }
        Command::Get { key, r } => {
            let coordinator = Coordinator::new(ring);
            let values = coordinator.get(&key, r).await?;
            for (node, value) in values {
                println!("{node}: {}", String::from_utf8_lossy(&value));
            }
        }
        Command::Delete { key, w } => {
            let coordinator = Coordinator::new(ring);
            coordinator.delete(&key, w).await?;
            println!("OK");
        }
    }
    Ok(())
}
