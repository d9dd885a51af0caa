use dys_scheduler::latest_block;
use dys_types::ScheduledRun;

use crate::bridge_builder::Endpoints;

pub(crate) async fn run_block_mode(endpoints: &Endpoints) -> anyhow::Result<()> {
    let Some(block) = latest_block(endpoints.bridge.as_ref()).await? else {
        anyhow::bail!("latest block response carried no header");
    };
    println!(
        "chain_id={} height={} time={}",
        block.chain_id, block.height, block.time
    );
    Ok(())
}

pub(crate) fn run_wire_schema_mode() -> anyhow::Result<()> {
    let schema = schemars::schema_for!(ScheduledRun);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
