// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `learn`    — active learning over an SGML corpus
//   2. `evaluate` — re-score a saved tagger on held-out data
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, LearnArgs};

#[derive(Parser, Debug)]
#[command(
    name = "ner-active-learner",
    version = "0.1.0",
    about = "Train a named-entity tagger by active learning, annotating only the sentences it is least sure about."
)]
pub struct Cli {
    /// The subcommand to run (learn or evaluate)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Learn(args)    => run_learn(args),
            Commands::Evaluate(args) => run_evaluate(args),
        }
    }
}

fn run_learn(args: LearnArgs) -> Result<()> {
    use crate::application::learn_use_case::LearnUseCase;

    tracing::info!("Starting active learning on documents in: {}", args.corpus_dir);
    let output_dir = args.output_dir.clone();
    let summary    = LearnUseCase::new(args.into()).execute()?;

    println!(
        "Stopped after {} sweep(s) ({:?}); {} sentence(s) annotated.",
        summary.sweeps, summary.stop_reason, summary.sentences_annotated
    );
    if let Some(score) = summary.last_score {
        println!(
            "Held-out attribute recall {:.4}, precision {:.4}",
            score.attr_recall(),
            score.attr_precision()
        );
    }
    println!("Results saved to '{}'.", output_dir);
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let counts = EvaluateUseCase::new(&args.output_dir)?.execute()?;
    println!("Type Recall:          {:.4}", counts.type_recall());
    println!("Type Precision:       {:.4}", counts.type_precision());
    println!("Attribute Recall:     {:.4}", counts.attr_recall());
    println!("Attribute Precision:  {:.4}", counts.attr_precision());
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::active_learner::SelectionStrategy;
    use crate::application::learn_use_case::{LabelingMode, LearnConfig};

    #[test]
    fn test_learn_defaults() {
        let cli = Cli::try_parse_from(["ner-active-learner", "learn"]).unwrap();
        let Commands::Learn(args) = cli.command else {
            panic!("expected learn");
        };
        let cfg: LearnConfig = args.into();
        assert_eq!(cfg.batch_size, 5);
        assert_eq!(cfg.max_sweeps, 21);
        assert_eq!(cfg.strategy, SelectionStrategy::Uncertainty);
        assert_eq!(cfg.labeling, LabelingMode::Simulated);
        assert!(!cfg.overlapped);
        assert_eq!(cfg.random_seed, None);
    }

    #[test]
    fn test_learn_flags() {
        let cli = Cli::try_parse_from([
            "ner-active-learner", "learn",
            "--batch-size", "3",
            "--strategy", "random",
            "--labeling", "interactive",
            "--overlapped",
            "--random-seed", "9",
        ])
        .unwrap();
        let Commands::Learn(args) = cli.command else {
            panic!("expected learn");
        };
        let cfg: LearnConfig = args.into();
        assert_eq!(cfg.batch_size, 3);
        assert_eq!(cfg.strategy, SelectionStrategy::Random);
        assert_eq!(cfg.labeling, LabelingMode::Interactive);
        assert!(cfg.overlapped);
        assert_eq!(cfg.random_seed, Some(9));
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        assert!(Cli::try_parse_from(["ner-active-learner", "learn", "--strategy", "best"]).is_err());
    }
}
