// ============================================================
// Layer 6 — Run Store
// ============================================================
// Everything a learning run leaves behind in its output
// directory:
//
//   <output_dir>/
//     learn_config.json   ← the resolved LearnConfig
//     tagger.json         ← trained tagger counts
//     active.csv          ← progress log (see metrics.rs)
//
// Why save the config?
//   `evaluate` must rebuild the exact same corpus partition
//   (same corpus directory, same seed/held-out sizes) to score
//   the saved tagger on the documents it never trained on.

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::learn_use_case::LearnConfig;
use crate::domain::traits::Persistable;

const CONFIG_FILE: &str = "learn_config.json";
const TAGGER_FILE: &str = "tagger.json";

/// Reads and writes the files of one output directory.
pub struct RunStore {
    dir: PathBuf,
}

impl RunStore {
    /// Open `dir`, creating it if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save the learning configuration as pretty JSON.
    pub fn save_config(&self, cfg: &LearnConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved learning config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<LearnConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. \
                 Make sure you have run 'learn' before 'evaluate'.",
                path.display()
            )
        })?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config in '{}'", path.display()))
    }

    pub fn save_tagger<T: Persistable>(&self, tagger: &T) -> Result<()> {
        let path = self.tagger_path();
        tagger.save(&path)?;
        tracing::info!("Saved tagger to '{}'", path);
        Ok(())
    }

    pub fn load_tagger<T: Persistable>(&self) -> Result<T> {
        T::load(&self.tagger_path())
    }

    fn tagger_path(&self) -> String {
        self.dir.join(TAGGER_FILE).to_string_lossy().into_owned()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::active_learner::SelectionStrategy;
    use crate::ml::tagger::LexiconTagger;

    #[test]
    fn test_config_round_trip() {
        let dir   = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path()).unwrap();

        let cfg = LearnConfig {
            batch_size:  3,
            strategy:    SelectionStrategy::Random,
            random_seed: Some(42),
            ..LearnConfig::default()
        };
        store.save_config(&cfg).unwrap();

        let back = store.load_config().unwrap();
        assert_eq!(back.batch_size, 3);
        assert_eq!(back.strategy, SelectionStrategy::Random);
        assert_eq!(back.random_seed, Some(42));
    }

    #[test]
    fn test_missing_config_mentions_learn() {
        let dir   = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path()).unwrap();
        let err   = store.load_config().unwrap_err();
        assert!(format!("{err:#}").contains("learn"));
    }

    #[test]
    fn test_tagger_saved_under_output_dir() {
        let dir   = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path()).unwrap();
        store.save_tagger(&LexiconTagger::new()).unwrap();
        assert!(dir.path().join(TAGGER_FILE).exists());

        let loaded: LexiconTagger = store.load_tagger().unwrap();
        assert_eq!(loaded.tokens_trained(), 0);
    }
}
