use std::fmt;
use std::sync::Arc;
use tracing::{error, info};

pub mod extract;
pub mod load;
pub mod transform;

use crate::config::Config;
use crate::error::Result;
use crate::storage::ApodStorage;
use extract::ExtractSummary;
use load::LoadSummary;
use transform::TransformSummary;

/// Lifecycle of one pipeline run. There is no automatic resume; a failed run
/// is re-invoked from the stage that failed, against whatever artifacts are
/// already on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Extracting,
    Extracted,
    Transforming,
    Transformed,
    Loading,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::Extracting => "extracting",
            RunState::Extracted => "extracted",
            RunState::Transforming => "transforming",
            RunState::Transformed => "transformed",
            RunState::Loading => "loading",
            RunState::Done => "done",
            RunState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct FullRunSummary {
    pub extract: ExtractSummary,
    pub transform: TransformSummary,
    pub load: LoadSummary,
}

fn advance(state: &mut RunState, next: RunState) {
    info!("Pipeline state: {} -> {}", state, next);
    *state = next;
}

/// Run extract, transform and load in order, stopping at the first stage
/// that fails.
pub async fn run_full(
    config: &Config,
    api_key: &str,
    storage: Arc<dyn ApodStorage>,
    keep_going: bool,
) -> Result<FullRunSummary> {
    let mut state = RunState::Idle;

    advance(&mut state, RunState::Extracting);
    let extract_summary = match extract::run(config, api_key).await {
        Ok(summary) => summary,
        Err(e) => {
            advance(&mut state, RunState::Failed);
            error!("Extract stage failed: {e}");
            return Err(e);
        }
    };
    advance(&mut state, RunState::Extracted);

    advance(&mut state, RunState::Transforming);
    let transform_summary = match transform::run(config) {
        Ok(summary) => summary,
        Err(e) => {
            advance(&mut state, RunState::Failed);
            error!("Transform stage failed: {e}");
            return Err(e);
        }
    };
    advance(&mut state, RunState::Transformed);

    advance(&mut state, RunState::Loading);
    let load_summary = match load::run(config, storage, keep_going).await {
        Ok(summary) => summary,
        Err(e) => {
            advance(&mut state, RunState::Failed);
            error!("Load stage failed: {e}");
            return Err(e);
        }
    };
    advance(&mut state, RunState::Done);

    Ok(FullRunSummary {
        extract: extract_summary,
        transform: transform_summary,
        load: load_summary,
    })
}
