//! Session store and pipeline driver
//!
//! A session holds the artifacts of one dataset as it moves through the
//! stages: the raw table, the preprocessed table with its transform log, the
//! split, and the trained model. The store is injected into [`Pipeline`]
//! rather than living in a process-wide global, so independent sessions
//! never share mutable state.

use crate::config::PipelineConfig;
use crate::data::Table;
use crate::error::{Result, TabulaError};
use crate::preprocessing::{PreprocessingConfig, PreprocessingSummary, Preprocessor, TransformRecord};
use crate::profiling::{profile_table, ColumnProfile};
use crate::split::{split, SplitConfig, SplitSummary, Split};
use crate::training::{TrainEngine, TrainingConfig, TrainingOutcome, TrainingSummary};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// A preprocessed table together with the log that produced it
#[derive(Debug, Clone)]
pub struct PreprocessedTable {
    pub table: Arc<Table>,
    pub log: Vec<TransformRecord>,
}

/// Storage for per-session pipeline artifacts.
///
/// Writing an artifact invalidates everything downstream of it: a new raw
/// table clears the preprocessed table, split and model; a new preprocessed
/// table clears the split and model; a new split clears the model.
pub trait SessionStore: Send + Sync {
    fn set_raw_table(&self, id: &str, table: Table);

    fn raw_table(&self, id: &str) -> Result<Arc<Table>>;

    fn set_preprocessed(&self, id: &str, table: Table, log: Vec<TransformRecord>) -> Result<()>;

    fn preprocessed(&self, id: &str) -> Result<Option<PreprocessedTable>>;

    /// Drop the preprocessed table so the raw table becomes the working table
    fn clear_preprocessed(&self, id: &str) -> Result<()>;

    fn set_split(&self, id: &str, split: Split) -> Result<()>;

    fn split(&self, id: &str) -> Result<Arc<Split>>;

    fn set_trained_model(&self, id: &str, outcome: TrainingOutcome) -> Result<()>;

    fn trained_model(&self, id: &str) -> Result<Arc<TrainingOutcome>>;

    fn remove(&self, id: &str) -> bool;

    /// The preprocessed table if there is one, else the raw table
    fn working_table(&self, id: &str) -> Result<Arc<Table>> {
        match self.preprocessed(id)? {
            Some(p) => Ok(p.table),
            None => self.raw_table(id),
        }
    }
}

#[derive(Debug, Default)]
struct Session {
    raw: Option<Arc<Table>>,
    preprocessed: Option<PreprocessedTable>,
    split: Option<Arc<Split>>,
    trained: Option<Arc<TrainingOutcome>>,
}

/// In-process [`SessionStore`] backed by a locked map
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    fn with_session<T>(&self, id: &str, f: impl FnOnce(&Session) -> Option<T>, missing: &str) -> Result<T> {
        let sessions = self.sessions.read();
        let session = sessions
            .get(id)
            .ok_or_else(|| TabulaError::SessionNotFound(id.to_string()))?;
        f(session).ok_or_else(|| {
            TabulaError::DataError(format!("Session '{}' has no {} yet", id, missing))
        })
    }

    fn update(&self, id: &str, f: impl FnOnce(&mut Session)) -> Result<()> {
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| TabulaError::SessionNotFound(id.to_string()))?;
        f(session);
        Ok(())
    }
}

impl SessionStore for InMemorySessionStore {
    fn set_raw_table(&self, id: &str, table: Table) {
        let session = Session {
            raw: Some(Arc::new(table)),
            ..Default::default()
        };
        self.sessions.write().insert(id.to_string(), session);
    }

    fn raw_table(&self, id: &str) -> Result<Arc<Table>> {
        self.with_session(id, |s| s.raw.clone(), "raw table")
    }

    fn set_preprocessed(&self, id: &str, table: Table, log: Vec<TransformRecord>) -> Result<()> {
        self.update(id, |s| {
            s.preprocessed = Some(PreprocessedTable {
                table: Arc::new(table),
                log,
            });
            s.split = None;
            s.trained = None;
        })
    }

    fn preprocessed(&self, id: &str) -> Result<Option<PreprocessedTable>> {
        self.with_session(id, |s| Some(s.preprocessed.clone()), "preprocessed table")
    }

    fn clear_preprocessed(&self, id: &str) -> Result<()> {
        self.update(id, |s| {
            s.preprocessed = None;
            s.split = None;
            s.trained = None;
        })
    }

    fn set_split(&self, id: &str, split: Split) -> Result<()> {
        self.update(id, |s| {
            s.split = Some(Arc::new(split));
            s.trained = None;
        })
    }

    fn split(&self, id: &str) -> Result<Arc<Split>> {
        self.with_session(id, |s| s.split.clone(), "split")
    }

    fn set_trained_model(&self, id: &str, outcome: TrainingOutcome) -> Result<()> {
        self.update(id, |s| s.trained = Some(Arc::new(outcome)))
    }

    fn trained_model(&self, id: &str) -> Result<Arc<TrainingOutcome>> {
        self.with_session(id, |s| s.trained.clone(), "trained model")
    }

    fn remove(&self, id: &str) -> bool {
        self.sessions.write().remove(id).is_some()
    }
}

/// Outputs of a full preprocess → split → train run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub profiles: Vec<ColumnProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preprocessing: Option<PreprocessingSummary>,
    pub split: SplitSummary,
    pub training: TrainingSummary,
}

/// Drives the pipeline stages against a session store
#[derive(Debug, Clone)]
pub struct Pipeline<S: SessionStore> {
    store: Arc<S>,
}

impl<S: SessionStore> Pipeline<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Profile the session's working table
    pub fn profile(&self, id: &str) -> Result<Vec<ColumnProfile>> {
        let table = self.store.working_table(id)?;
        Ok(profile_table(&table))
    }

    /// Preprocess the raw table and store the result with its log
    pub fn preprocess(&self, id: &str, config: &PreprocessingConfig) -> Result<PreprocessingSummary> {
        let raw = self.store.raw_table(id)?;
        let profiles = profile_table(&raw);
        let outcome = Preprocessor::with_config(config.clone()).apply(&raw, &profiles)?;
        let summary = outcome.summary();
        self.store
            .set_preprocessed(id, outcome.table, outcome.transformations)?;
        debug!(session = id, "Stored preprocessed table");
        Ok(summary)
    }

    /// Split the working table and store the partition
    pub fn split(&self, id: &str, config: &SplitConfig) -> Result<SplitSummary> {
        let table = self.store.working_table(id)?;
        let s = split(&table, config.test_fraction, config.seed)?;
        let summary = s.summary();
        self.store.set_split(id, s)?;
        Ok(summary)
    }

    /// Train on the stored split and store the model with its metrics
    pub fn train(&self, id: &str, config: &TrainingConfig) -> Result<TrainingSummary> {
        let s = self.store.split(id)?;
        let outcome = TrainEngine::new(config.clone()).train(&s)?;
        let summary = outcome.summary();
        self.store.set_trained_model(id, outcome)?;
        Ok(summary)
    }

    /// Validate `config`, then run every stage in order.
    ///
    /// With no preprocessing steps the run works on the raw table; a
    /// preprocessed table left by an earlier call is discarded.
    pub fn run(&self, id: &str, config: &PipelineConfig) -> Result<PipelineReport> {
        config.validate()?;

        let preprocessing = if config.preprocessing.steps.is_empty() {
            self.store.clear_preprocessed(id)?;
            None
        } else {
            Some(self.preprocess(id, &config.preprocessing)?)
        };
        let profiles = self.profile(id)?;
        let split = self.split(id, &config.split)?;
        let training = self.train(id, &config.training)?;

        info!(session = id, model = %config.training.model_type, "Pipeline run complete");

        Ok(PipelineReport {
            profiles,
            preprocessing,
            split,
            training,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;
    use crate::preprocessing::PreprocessingStep;
    use crate::training::ModelType;

    fn table() -> Table {
        let rows = (0..40)
            .map(|i| {
                let x = i as f64;
                vec![Value::Number(x), Value::Number(3.0 * x - 1.0)]
            })
            .collect();
        Table::new(vec!["x".into(), "y".into()], rows).unwrap()
    }

    #[test]
    fn test_unknown_session() {
        let store = InMemorySessionStore::new();
        assert!(matches!(store.raw_table("nope"), Err(TabulaError::SessionNotFound(_))));
    }

    #[test]
    fn test_writes_invalidate_downstream() {
        let store = InMemorySessionStore::new();
        store.set_raw_table("s", table());
        let s = split(&table(), 0.2, 1).unwrap();
        store.set_split("s", s).unwrap();
        assert!(store.split("s").is_ok());

        store.set_preprocessed("s", table(), Vec::new()).unwrap();
        assert!(matches!(store.split("s"), Err(TabulaError::DataError(_))));
        assert!(store.working_table("s").is_ok());
    }

    #[test]
    fn test_pipeline_run() {
        let store = Arc::new(InMemorySessionStore::new());
        store.set_raw_table("s", table());
        let pipeline = Pipeline::new(store.clone());

        let config = PipelineConfig::new(
            TrainingConfig::new(ModelType::LinearRegression, "y").with_features(["x_scaled"]),
        )
        .with_preprocessing(PreprocessingConfig::new().with_step(PreprocessingStep::standardize(["x"])));

        let report = pipeline.run("s", &config).unwrap();
        assert_eq!(report.split.train_count, 32);
        assert_eq!(report.split.test_count, 8);
        assert!(report.profiles.iter().any(|p| p.name == "x_scaled"));

        let r2 = report.training.test_metrics.as_regression().unwrap().r2.unwrap();
        assert!((r2 - 1.0).abs() < 1e-9);
        assert!(store.trained_model("s").is_ok());
    }

    #[test]
    fn test_run_without_steps_uses_raw_table() {
        let store = Arc::new(InMemorySessionStore::new());
        store.set_raw_table("s", table());
        let pipeline = Pipeline::new(store.clone());

        pipeline
            .preprocess("s", &PreprocessingConfig::new().with_step(PreprocessingStep::remove_columns(["y"])))
            .unwrap();
        assert!(!store.working_table("s").unwrap().has_column("y"));

        let config = PipelineConfig::new(
            TrainingConfig::new(ModelType::LinearRegression, "y").with_features(["x"]),
        );
        let report = pipeline.run("s", &config).unwrap();

        assert!(report.preprocessing.is_none());
        assert!(store.preprocessed("s").unwrap().is_none());
        assert!(report.profiles.iter().any(|p| p.name == "y"));
        assert_eq!(report.split.train_count + report.split.test_count, 40);
    }

    #[test]
    fn test_sessions_are_independent() {
        let store = Arc::new(InMemorySessionStore::new());
        store.set_raw_table("a", table());
        store.set_raw_table("b", table());
        let pipeline = Pipeline::new(store.clone());

        pipeline.split("a", &SplitConfig::default()).unwrap();
        assert!(store.split("a").is_ok());
        assert!(store.split("b").is_err());
        assert!(store.remove("a"));
        assert_eq!(store.len(), 1);
    }
}
