// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `learn` and `evaluate`
// and all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::active_learner::SelectionStrategy;
use crate::application::learn_use_case::{LabelingMode, LearnConfig};

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a name tagger by active learning over a corpus
    Learn(LearnArgs),

    /// Score a saved tagger on its run's held-out documents
    Evaluate(EvaluateArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum StrategyArg {
    /// Annotate the sentences the tagger is least sure about
    Uncertainty,
    /// Annotate sentences drawn at random (baseline)
    Random,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum LabelingArg {
    /// Reveal the corpus's own gold names
    Simulated,
    /// Ask a human at the terminal
    Interactive,
}

/// All arguments for the `learn` command.
#[derive(Args, Debug)]
pub struct LearnArgs {
    /// Directory of SGML-tagged documents (*.sgm, *.sgml, *.txt)
    #[arg(long, default_value = "data/corpus")]
    pub corpus_dir: String,

    /// Where the config, progress CSV and tagger are written
    #[arg(long, default_value = "runs")]
    pub output_dir: String,

    /// Leading documents used as the fully labeled seed set
    #[arg(long, default_value_t = 10)]
    pub seed_docs: usize,

    /// Trailing documents reserved for scoring
    #[arg(long, default_value_t = 10)]
    pub held_out_docs: usize,

    /// Sentences annotated per sweep
    #[arg(long, default_value_t = 5)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 21)]
    pub max_sweeps: usize,

    #[arg(long, value_enum, default_value_t = StrategyArg::Uncertainty)]
    pub strategy: StrategyArg,

    #[arg(long, value_enum, default_value_t = LabelingArg::Simulated)]
    pub labeling: LabelingArg,

    /// Label each batch in the background while the next sweep runs
    #[arg(long)]
    pub overlapped: bool,

    /// Seed for random selection, for reproducible runs
    #[arg(long)]
    pub random_seed: Option<u64>,
}

/// Convert CLI LearnArgs into the application-layer LearnConfig.
/// The application layer never sees clap types.
impl From<LearnArgs> for LearnConfig {
    fn from(a: LearnArgs) -> Self {
        LearnConfig {
            corpus_dir:    a.corpus_dir,
            output_dir:    a.output_dir,
            seed_docs:     a.seed_docs,
            held_out_docs: a.held_out_docs,
            batch_size:    a.batch_size,
            max_sweeps:    a.max_sweeps,
            strategy:      match a.strategy {
                StrategyArg::Uncertainty => SelectionStrategy::Uncertainty,
                StrategyArg::Random => SelectionStrategy::Random,
            },
            labeling:      match a.labeling {
                LabelingArg::Simulated => LabelingMode::Simulated,
                LabelingArg::Interactive => LabelingMode::Interactive,
            },
            overlapped:    a.overlapped,
            random_seed:   a.random_seed,
        }
    }
}

/// All arguments for the `evaluate` command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Output directory of a finished `learn` run
    #[arg(long, default_value = "runs")]
    pub output_dir: String,
}
