//! Dispatch a single hook event.

use std::sync::Arc;

use clap::Args;
use tokio_util::sync::CancellationToken;

use tushub_core::config::AppConfig;
use tushub_core::error::AppError;
use tushub_core::{FileInfo, HookEvent, HookType};
use tushub_hooks::HookManager;

use crate::output;

/// Arguments for `fire`
#[derive(Debug, Args)]
pub struct FireArgs {
    /// Hook to fire, e.g. `pre-create` or `post-finish`
    pub hook: HookType,

    /// Upload ID (random when omitted)
    #[arg(long)]
    pub id: Option<String>,

    /// Upload size in bytes
    #[arg(long, default_value_t = 0)]
    pub size: u64,

    /// Upload offset in bytes
    #[arg(long, default_value_t = 0)]
    pub offset: u64,

    /// Metadata entry, repeatable
    #[arg(long = "meta", value_name = "KEY=VALUE", value_parser = parse_meta)]
    pub meta: Vec<(String, String)>,
}

fn parse_meta(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))
}

impl FireArgs {
    /// Build the event snapshot described by the arguments
    pub fn to_event(&self) -> HookEvent {
        let id = self
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());

        let upload = self
            .meta
            .iter()
            .fold(FileInfo::new(id, self.size).with_offset(self.offset), |info, (k, v)| {
                info.with_meta(k, v)
            });

        HookEvent::new(upload)
    }
}

/// Execute the fire command
pub async fn execute(args: &FireArgs, config: &AppConfig) -> Result<(), AppError> {
    let manager = HookManager::from_config(config).await?;
    let event = args.to_event();

    if args.hook == HookType::PreCreate {
        let Some(gate) = manager.pre_create_gate() else {
            output::print_warning("No hook backend configured; upload admitted");
            return Ok(());
        };

        return match gate.check(&event).await {
            Ok(()) => {
                output::print_success(&format!("Upload '{}' admitted", event.id()));
                Ok(())
            }
            Err(e) => {
                output::print_field("Status", e.status_code());
                output::print_output(&e.body());
                Err(AppError::hook(format!("Upload rejected: {e}")))
            }
        };
    }

    let stop = CancellationToken::new();
    let event = event.with_stop_handle(Arc::new(stop.clone()));

    let result = manager.dispatcher().invoke(args.hook, &event, true).await;
    if stop.is_cancelled() {
        output::print_warning(&format!("Hook requested to stop upload '{}'", event.id()));
    }

    match result {
        Ok(out) => {
            output::print_output(&out);
            output::print_success(&format!("Fired {} for upload '{}'", args.hook, event.id()));
            Ok(())
        }
        Err(e) => {
            output::print_output(&e.output);
            Err(AppError::hook(format!("{} hook failed: {}", args.hook, e)))
        }
    }
}
