//! Terminal fee prompt.

use std::io::{BufRead, Write};

use async_trait::async_trait;
use dys_scheduler::OperatorPrompt;

/// Asks for the fee on stderr and reads the answer from stdin.
///
/// An empty answer accepts the suggestion; `n`, `no` or EOF declines.
pub(crate) struct StdinPrompt;

#[async_trait]
impl OperatorPrompt for StdinPrompt {
    async fn confirm_fee(&self, suggested: u64, retrying: bool) -> Option<u64> {
        let answer = tokio::task::spawn_blocking(move || read_fee_answer(suggested, retrying))
            .await
            .ok()
            .flatten()?;
        parse_fee_answer(&answer, suggested)
    }

    fn report_failure(&self, message: &str) {
        eprintln!("error: {message}");
    }
}

fn read_fee_answer(suggested: u64, retrying: bool) -> Option<String> {
    let mut stderr = std::io::stderr().lock();
    if retrying {
        let _ = write!(stderr, "Out of gas. Fee to retry with [{suggested}]: ");
    } else {
        let _ = write!(stderr, "Fee [{suggested}]: ");
    }
    let _ = stderr.flush();
    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line),
    }
}

fn parse_fee_answer(answer: &str, suggested: u64) -> Option<u64> {
    let answer = answer.trim();
    if answer.is_empty() {
        return Some(suggested);
    }
    if matches!(answer.to_ascii_lowercase().as_str(), "n" | "no" | "q" | "quit") {
        return None;
    }
    match answer.parse::<u64>() {
        Ok(fee) => Some(fee),
        Err(_) => {
            tracing::warn!(answer, "fee is not a whole number; submission declined");
            None
        }
    }
}
