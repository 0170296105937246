//! Follow the DragonScales service logs, printing only chat request lines.

use std::process::ExitCode;

use dragonscales::{
    logtail::{self, LogTailError},
    telemetry::init_tracing,
};
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match logtail::run().await {
        Ok(status) => match status.code() {
            Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
            None => ExitCode::FAILURE,
        },
        Err(err @ LogTailError::ToolMissing { .. }) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
        Err(err) => {
            error!(error = %err, "log follow failed");
            ExitCode::FAILURE
        }
    }
}
