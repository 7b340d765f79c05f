//! `potency config` command implementation

use crate::error::{CliError, Result};
use colored::Colorize;
use potency_pipeline::config::ENV_VARS;
use potency_pipeline::PipelineConfig;

/// Show the effective configuration
pub async fn show() -> Result<()> {
    let config = PipelineConfig::load();
    config
        .validate()
        .map_err(|e| CliError::config(e.to_string()))?;
    print!("{}", format_config(&config));
    Ok(())
}

fn format_config(config: &PipelineConfig) -> String {
    let work_dir = config
        .work_dir
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| format!("{} (system default)", std::env::temp_dir().display()));

    let rows = [
        ("java:", config.java.display().to_string()),
        ("padel_jar:", config.padel_jar.display().to_string()),
        ("descriptor_types:", config.descriptor_types.display().to_string()),
        ("java_heap:", config.java_heap.clone()),
        ("engine_timeout:", format!("{}s", config.engine_timeout_secs)),
        ("model_path:", config.model_path.display().to_string()),
        ("schema_path:", config.schema_path.display().to_string()),
        ("work_dir:", work_dir),
    ];

    let mut out = format!("{}\n\n", "Potency Configuration:".cyan().bold());
    for (key, value) in rows {
        out.push_str(&format!("{:<18} {}\n", key, value));
    }
    out.push_str(&format!("\n{}\n", "Environment Variables:".cyan()));
    for var in ENV_VARS {
        out.push_str(&format!("  {}\n", var));
    }
    out
}
