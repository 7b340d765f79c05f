//! `potency predict` command implementation
//!
//! Runs one molecule file through the pipeline, prints the ranked table and
//! writes the report (and optionally the raw descriptors) to disk.

use crate::display::{format_molecules, format_report};
use crate::error::{CliError, Result};
use crate::progress::{create_spinner, stage_message};
use crate::PredictArgs;
use colored::Colorize;
use potency_pipeline::{Pipeline, PipelineConfig, PredictionRun, Stage};
use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;
use tracing::info;

/// Predict pIC50 for every molecule in `args.input`
pub async fn run(args: &PredictArgs, verbose: bool) -> Result<()> {
    let mut config = PipelineConfig::load();
    args.apply(&mut config);
    config
        .validate()
        .map_err(|e| CliError::config(e.to_string()))?;

    let spinner = create_spinner(stage_message(Stage::Validating));
    let progress = spinner.clone();
    let pipeline = Pipeline::from_config(&config)
        .with_stage_hook(Arc::new(move |stage: Stage| progress.set_message(stage_message(stage))));

    let outcome = pipeline.run_file(&args.input, args.format).await;
    spinner.finish_and_clear();
    let run = outcome?;

    print_summary(&run, verbose);
    println!("{}", format_report(&run.report));

    export(&run, args)?;
    println!(
        "{} Wrote {} prediction(s) to {}",
        "✓".green(),
        run.report.len(),
        args.output.display()
    );

    if args.link {
        let link = run
            .report
            .download_link()
            .map_err(|e| CliError::export(e.to_string()))?;
        println!("{}", link);
    }

    Ok(())
}

fn print_summary(run: &PredictionRun, verbose: bool) {
    println!("{} molecule(s) read", run.molecules.len());
    if verbose {
        println!("{}", format_molecules(&run.molecules));
    }

    let (rows, columns) = run.descriptors.shape();
    let (feature_rows, features) = run.feature_shape;
    println!("Calculated descriptors: {} x {}", rows, columns);
    println!("Model features:         {} x {}", feature_rows, features);
    if verbose {
        if let Some(ref sha) = run.model_sha256 {
            println!("Model sha256:           {}", sha);
        }
        println!("Request:                {}", run.request_id);
    }
    println!();
}

fn export(run: &PredictionRun, args: &PredictArgs) -> Result<()> {
    let csv = run
        .report
        .to_csv()
        .map_err(|e| CliError::export(e.to_string()))?;
    std::fs::write(&args.output, csv)
        .map_err(|e| CliError::export(format!("{}: {}", args.output.display(), e)))?;

    if let Some(ref path) = args.descriptors {
        let file = File::create(path)
            .map_err(|e| CliError::export(format!("{}: {}", path.display(), e)))?;
        run.descriptors
            .write_csv(BufWriter::new(file))
            .map_err(|e| CliError::export(e.to_string()))?;
        info!(path = %path.display(), "Saved descriptor table");
    }

    info!(
        path = %args.output.display(),
        predictions = run.report.len(),
        "Saved prediction report"
    );
    Ok(())
}
