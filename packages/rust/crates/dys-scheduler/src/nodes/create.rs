use std::sync::Arc;

use dys_scheduler::{
    AutoConfirmPrompt, Dashboard, OperatorPrompt, RuntimeSettings, ViewState, latest_block,
};
use serde_json::json;

use crate::bridge_builder::{Endpoints, dashboard_options};
use crate::cli::DraftArgs;
use crate::nodes::script::apply_draft_args;
use crate::prompt::StdinPrompt;

pub(crate) async fn run_create_mode(
    draft_args: DraftArgs,
    fee: Option<u64>,
    yes: bool,
    endpoints: &Endpoints,
    runtime_settings: &RuntimeSettings,
) -> anyhow::Result<()> {
    let prompt: Arc<dyn OperatorPrompt> = if yes {
        Arc::new(AutoConfirmPrompt::new(
            runtime_settings.auto_confirm_max_prompts(),
        ))
    } else {
        Arc::new(StdinPrompt)
    };
    let head = match latest_block(endpoints.bridge.as_ref()).await {
        Ok(head) => head,
        Err(error) => {
            tracing::warn!(
                event = "dys.cli.head_unavailable",
                error = %error,
                "could not read chain head; height must be given explicitly"
            );
            None
        }
    };

    let mut options = dashboard_options(runtime_settings, ViewState::default());
    if let Some(fee) = fee.filter(|fee| *fee > 0) {
        options.default_fee = fee;
    }
    let mut dashboard = Dashboard::connect(
        Arc::clone(&endpoints.bridge),
        &endpoints.wallet,
        prompt,
        options,
    )
    .await?;

    let mut draft = dashboard.draft(head.as_ref().map(|block| block.height.as_str()));
    apply_draft_args(&mut draft, &draft_args);
    if draft.height.trim().is_empty() {
        anyhow::bail!("--height is required when the chain head is unavailable");
    }
    if draft.gas.trim().is_empty() {
        let estimate = dashboard.estimate_gas(&mut draft).await?;
        if estimate.suggested_gas.is_none() {
            anyhow::bail!("dry run reported no gas consumption; pass --gas explicitly");
        }
        eprintln!("using estimated gas {}", draft.gas);
    }

    let result = dashboard.create_run(&draft).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "fee": result.fee,
            "gas": result.gas,
            "attempts": result.attempts,
            "response": result.response,
        }))?
    );
    Ok(())
}
