// ============================================================
// Layer 6 — Progress Log
// ============================================================
// Records held-out scores to a CSV file after each sweep.
//
// One row per sweep:
//   - sentences_annotated: pool sentences folded into training
//                          so far in this run
//   - attr_recall:         held-out attribute recall
//   - attr_precision:      held-out attribute precision
//
// Output file: <output_dir>/active.csv
//
// Example CSV output:
//   sentences_annotated,attr_recall,attr_precision
//   0,0.412000,0.530000
//   5,0.447000,0.561000
//   ...
//
// Rows are appended, so consecutive runs into the same output
// directory produce one continuous file (the header is only
// written when the file is new). A learning curve is read off
// by plotting recall against sentences_annotated.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

const HEADER: &str = "sentences_annotated,attr_recall,attr_precision";

/// Appends per-sweep scores to a CSV file.
pub struct ProgressLog {
    /// Full path to the CSV file
    csv_path: PathBuf,
}

impl ProgressLog {
    /// Open `<dir>/active.csv`, creating the directory and the
    /// header row if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;

        let csv_path = dir.join("active.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created progress CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one sweep's scores
    pub fn log(&self, sentences_annotated: usize, attr_recall: f64, attr_precision: f64) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(f, "{},{:.6},{:.6}", sentences_annotated, attr_recall, attr_precision)?;

        tracing::debug!(
            "Logged progress: {} sentence(s), recall={:.4}, precision={:.4}",
            sentences_annotated,
            attr_recall,
            attr_precision,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
