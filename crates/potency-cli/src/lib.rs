//! Potency CLI Library
//!
//! Command-line interface for ranking candidate compounds by predicted pIC50.
//!
//! # Overview
//!
//! - **Prediction**: score a CSV or SMILES file and write a ranked report (`potency predict`)
//! - **Configuration**: show the effective pipeline settings (`potency config show`)
//!
//! Failures exit with a code identifying their category: 2 for bad input,
//! 3 for descriptor engine failures, 4 for a feature schema mismatch,
//! 5 for model problems and 6 for anything else.

pub mod commands;
pub mod display;
pub mod error;
pub mod progress;

// Re-export commonly used types
pub use error::{CliError, Result};

use clap::{Args, Parser, Subcommand};
use potency_pipeline::{InputFormat, PipelineConfig, REPORT_FILE_NAME};
use std::path::PathBuf;

/// Potency - bioactivity (pIC50) prediction for candidate compounds
#[derive(Parser, Debug)]
#[command(name = "potency")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Predict pIC50 for every molecule in a file
    Predict(PredictArgs),

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
}

/// Arguments for `potency predict`
#[derive(Args, Debug, Clone)]
pub struct PredictArgs {
    /// Molecule file: .csv with a header row, or .smi/.txt with one "SMILES ID" pair per line
    pub input: PathBuf,

    /// Input layout, overriding inference from the file extension
    #[arg(short, long, value_name = "csv|smi")]
    pub format: Option<InputFormat>,

    /// Where to write the ranked report
    #[arg(short, long, default_value = REPORT_FILE_NAME)]
    pub output: PathBuf,

    /// Also save the raw descriptor table
    #[arg(long, value_name = "PATH")]
    pub descriptors: Option<PathBuf>,

    /// Print an HTML download link for the report
    #[arg(long)]
    pub link: bool,

    /// Descriptor engine timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Model artifact (JSON)
    #[arg(long, value_name = "PATH")]
    pub model: Option<PathBuf>,

    /// Feature schema (CSV whose header lists the model's descriptors)
    #[arg(long, value_name = "PATH")]
    pub schema: Option<PathBuf>,

    /// PaDEL-Descriptor jar
    #[arg(long, value_name = "PATH")]
    pub padel_jar: Option<PathBuf>,

    /// PaDEL descriptor type configuration
    #[arg(long, value_name = "PATH")]
    pub descriptor_types: Option<PathBuf>,

    /// Java launcher
    #[arg(long, value_name = "PATH")]
    pub java: Option<PathBuf>,
}

impl PredictArgs {
    /// Apply command-line overrides on top of `config`
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(timeout) = self.timeout {
            config.engine_timeout_secs = timeout;
        }
        if let Some(ref model) = self.model {
            config.model_path = model.clone();
        }
        if let Some(ref schema) = self.schema {
            config.schema_path = schema.clone();
        }
        if let Some(ref jar) = self.padel_jar {
            config.padel_jar = jar.clone();
        }
        if let Some(ref types) = self.descriptor_types {
            config.descriptor_types = types.clone();
        }
        if let Some(ref java) = self.java {
            config.java = java.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_predict_overrides() {
        let cli = Cli::try_parse_from([
            "potency",
            "predict",
            "molecules.smi",
            "--format",
            "smi",
            "--timeout",
            "42",
            "--model",
            "/srv/model.json",
            "--java",
            "/opt/java/bin/java",
        ])
        .unwrap();

        let Commands::Predict(args) = cli.command else {
            panic!("expected predict");
        };
        assert_eq!(args.format, Some(InputFormat::Whitespace));
        assert_eq!(args.output, PathBuf::from("prediction.csv"));

        let mut config = PipelineConfig::default();
        args.apply(&mut config);
        assert_eq!(config.engine_timeout_secs, 42);
        assert_eq!(config.model_path, PathBuf::from("/srv/model.json"));
        assert_eq!(config.java, PathBuf::from("/opt/java/bin/java"));
        assert_eq!(config.schema_path, PipelineConfig::default().schema_path);
    }

    #[test]
    fn test_timeout_flag_replaces_zero_from_environment() {
        let cli = Cli::try_parse_from(["potency", "predict", "m.smi", "--timeout", "30"]).unwrap();
        let Commands::Predict(args) = cli.command else {
            panic!("expected predict");
        };

        let mut config = PipelineConfig::default();
        config.engine_timeout_secs = 0;
        assert!(config.validate().is_err());

        args.apply(&mut config);
        assert_eq!(config.engine_timeout_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(Cli::try_parse_from(["potency", "predict", "x.csv", "--format", "xlsx"]).is_err());
    }
}
