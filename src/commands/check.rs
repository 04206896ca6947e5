//! Backend setup check.

use tushub_core::config::AppConfig;
use tushub_core::error::AppError;
use tushub_hooks::HookManager;

use crate::output;

/// Execute the check command
pub async fn execute(config: &AppConfig) -> Result<(), AppError> {
    let manager = HookManager::from_config(config).await?;
    let dispatcher = manager.dispatcher();

    match dispatcher.backend_name() {
        Some(name) => {
            output::print_field("Backend", name);
            output::print_field("Target", config.hooks.backend.target().unwrap_or_default());
        }
        None => {
            output::print_warning("No hook backend configured; uploads are admitted unconditionally")
        }
    }

    output::print_field("Enabled hooks", dispatcher.enabled_hooks().describe());
    output::print_field("Stop code", config.hooks.stop_upload_code);
    output::print_field("Upload dir", &config.storage.upload_dir);
    println!();
    print!("{}", manager.metrics().render_prometheus()?);

    output::print_success("Hook configuration is valid");
    Ok(())
}
