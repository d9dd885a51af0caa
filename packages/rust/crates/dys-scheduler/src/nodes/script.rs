use std::sync::Arc;

use dys_scheduler::{RunDraft, SchemaResolver, estimate_gas, function_options, query_script};
use dys_types::schema_has_arguments;
use serde_json::json;

use crate::bridge_builder::Endpoints;
use crate::cli::DraftArgs;

pub(crate) async fn run_functions_mode(
    address: String,
    json: bool,
    endpoints: &Endpoints,
) -> anyhow::Result<()> {
    let resolver = SchemaResolver::new(Arc::clone(&endpoints.bridge));
    let functions = resolver.list_functions(&address).await?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&function_options(&functions))?
        );
    } else {
        for function in functions {
            println!("{function}");
        }
    }
    Ok(())
}

pub(crate) async fn run_schema_mode(
    address: String,
    function: String,
    endpoints: &Endpoints,
) -> anyhow::Result<()> {
    let resolver = SchemaResolver::new(Arc::clone(&endpoints.bridge));
    let schema = resolver.get_schema(&address, &function).await?;
    if !schema_has_arguments(&schema) {
        eprintln!("{function} takes no keyword arguments");
    }
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

pub(crate) async fn run_query_mode(draft: DraftArgs, endpoints: &Endpoints) -> anyhow::Result<()> {
    let draft = standalone_draft(&draft)?;
    let response = query_script(endpoints.bridge.as_ref(), draft.msg_value()).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

pub(crate) async fn run_estimate_gas_mode(
    draft: DraftArgs,
    endpoints: &Endpoints,
) -> anyhow::Result<()> {
    let draft = standalone_draft(&draft)?;
    let estimate = estimate_gas(endpoints.bridge.as_ref(), draft.msg_value()).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "suggested_gas": estimate.suggested_gas,
            "response": estimate.response,
        }))?
    );
    Ok(())
}

/// Overlay CLI fields onto a draft. Selecting another function clears kwargs first, so
/// `--kwargs` is applied after `--function`.
pub(crate) fn apply_draft_args(draft: &mut RunDraft, args: &DraftArgs) {
    let fields = [
        (&args.creator, &mut draft.creator),
        (&args.height, &mut draft.height),
        (&args.gas, &mut draft.gas),
        (&args.msg_creator, &mut draft.msg_creator),
        (&args.address, &mut draft.msg_address),
        (&args.extra_lines, &mut draft.msg_extra_lines),
        (&args.args, &mut draft.msg_args),
        (&args.coins, &mut draft.msg_coins),
    ];
    for (source, target) in fields {
        if let Some(value) = source {
            target.clone_from(value);
        }
    }
    if let Some(function) = args.function.as_deref() {
        draft.select_function(function);
    }
    if let Some(kwargs) = args.kwargs.as_deref() {
        draft.msg_kwargs = kwargs.to_string();
    }
}

fn standalone_draft(args: &DraftArgs) -> anyhow::Result<RunDraft> {
    let mut draft = RunDraft::default();
    apply_draft_args(&mut draft, args);
    if draft.msg_address.trim().is_empty() {
        anyhow::bail!("--address is required");
    }
    if draft.msg_creator.is_empty() {
        draft.msg_creator.clone_from(&draft.msg_address);
    }
    Ok(draft)
}
