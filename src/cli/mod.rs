// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap and hands everything else to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`    — trains the autoencoder and writes the artifacts
//   2. `evaluate` — reloads a checkpoint and rescores it

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, TrainArgs};

use crate::application::{evaluate_use_case::EvaluateUseCase, train_use_case::TrainUseCase};

#[derive(Parser, Debug)]
#[command(
    name = "conv-autoencoder",
    version,
    about = "Train a convolutional autoencoder on MNIST and plot its reconstructions."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Routes the subcommand; never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    tracing::info!("Starting training, outputs go to: {}", args.job_dir);

    let summary = TrainUseCase::new(args.into()).execute()?;

    match summary.fit.stopped_epoch {
        Some(epoch) => println!("Early stopping at epoch {epoch}."),
        None        => println!("Ran the full epoch budget."),
    }
    if let Some(best) = summary.fit.best_epoch {
        println!("Best epoch: {best}");
    }
    println!("Checkpoint: {}", summary.checkpoint.display());
    println!("Artifacts:  {}", summary.artifacts.join(", "));
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    let summary = EvaluateUseCase::new(args.into()).execute()?;

    println!(
        "Test score of best epoch {}: [loss={:.6}, metric={:.6}]",
        summary.best_epoch, summary.test_score.loss, summary.test_score.metric
    );
    println!("Reconstructions: {}", summary.figure.display());
    Ok(())
}
