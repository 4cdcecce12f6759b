/// The engine facade: owns the tables and configuration, and runs
/// parse → evaluate → article fix-up for each `generate` call.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::evaluator::{strip_literal_quotes, EvaluationSession, Evaluator};
use crate::core::loader::{self, LoadError};
use crate::core::markov::MarkovOptions;
use crate::core::modifiers;
use crate::core::parser;
use crate::core::tokens::{self, TablePath, TokenDescriptor, ValidationReport};
use crate::core::weighted;
use crate::schema::ast::Node;
use crate::schema::config::{seed_from_str, ConfigError, EngineConfig};
use crate::schema::table::{TableStore, TableValue};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("table load error: {0}")]
    Load(#[from] LoadError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// The top-level template engine. Built via `SigilEngine::builder()`.
pub struct SigilEngine {
    tables: TableStore,
    config: EngineConfig,
    markov: MarkovOptions,
    rng: StdRng,
}

/// Builder for constructing a `SigilEngine`.
pub struct SigilEngineBuilder {
    tables_paths: Vec<PathBuf>,
    config_path: Option<PathBuf>,
    config: EngineConfig,
    /// Explicit settings; these win over `config` and the config file.
    max_depth: Option<usize>,
    debug: Option<bool>,
    seed: Option<String>,
    markov: MarkovOptions,
    /// Directly provided tables (for use without files).
    tables: Option<TableStore>,
}

impl SigilEngine {
    pub fn builder() -> SigilEngineBuilder {
        SigilEngineBuilder {
            tables_paths: Vec::new(),
            config_path: None,
            config: EngineConfig::default(),
            max_depth: None,
            debug: None,
            seed: None,
            markov: MarkovOptions::default(),
            tables: None,
        }
    }

    /// Build an engine directly from loaded tables and a config.
    pub fn new(tables: TableStore, config: EngineConfig) -> SigilEngine {
        let rng = rng_for(&config);
        SigilEngine {
            tables,
            config,
            markov: MarkovOptions::default(),
            rng,
        }
    }

    pub fn tables(&self) -> &TableStore {
        &self.tables
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Re-pin the engine's random source.
    pub fn reseed(&mut self, seed: &str) {
        self.config.seed = Some(seed.to_string());
        self.rng = StdRng::seed_from_u64(seed_from_str(seed));
    }

    /// Expand a template using the engine's own random source.
    ///
    /// Never fails: malformed syntax degrades to literal text and missing
    /// data to empty strings.
    pub fn generate(&mut self, template: &str) -> String {
        let mut rng = std::mem::replace(&mut self.rng, StdRng::seed_from_u64(0));
        let output = self.generate_with_rng(template, &mut rng);
        self.rng = rng;
        output
    }

    /// Expand a template with a caller-supplied random source. Takes
    /// `&self`, so one engine can serve several threads.
    pub fn generate_with_rng(&self, template: &str, rng: &mut dyn RngCore) -> String {
        if let Some(literal) = strip_literal_quotes(template) {
            return literal.to_string();
        }

        let node = parser::parse(template);
        if self.config.debug {
            tracing::debug!(template, ?node, "parsed template");
        }

        let mut session = EvaluationSession::new(self.config.max_depth, rng);
        let output = self.evaluator().evaluate(&node, &mut session);
        if self.config.debug {
            tracing::debug!(
                template,
                expansions = session.depth(),
                output = %output,
                "generated"
            );
        }
        modifiers::resolve_articles(&output)
    }

    /// Generate `count` independent outputs for the same template.
    pub fn generate_many(&mut self, template: &str, count: usize) -> Vec<String> {
        (0..count).map(|_| self.generate(template)).collect()
    }

    /// Parse without evaluating.
    pub fn parse(&self, template: &str) -> Node {
        parser::parse(template)
    }

    /// Report structural problems in a template without evaluating it.
    pub fn validate_template(&self, template: &str) -> ValidationReport {
        tokens::validate_template(template)
    }

    /// List every table reference in a template with its source span.
    pub fn parse_tokens(&self, template: &str) -> Vec<TokenDescriptor> {
        tokens::parse_tokens(template)
    }

    /// The stored value at a path, unevaluated.
    pub fn resolve_raw<P: TablePath + ?Sized>(&self, target: &P) -> Option<&TableValue> {
        self.tables.resolve_raw(target.table_path())
    }

    /// One weighted pick from a list (weight suffix stripped, not
    /// evaluated), or a scalar's text.
    pub fn resolve_selected<P: TablePath + ?Sized>(&mut self, target: &P) -> Option<String> {
        match self.tables.resolve_raw(target.table_path())? {
            TableValue::List(items) => {
                weighted::choose_weighted(items, &mut self.rng).map(str::to_string)
            }
            TableValue::Scalar(text) => Some(text.clone()),
            TableValue::Map(_) => None,
        }
    }

    fn evaluator(&self) -> Evaluator<'_> {
        Evaluator::new(&self.tables)
            .with_debug(self.config.debug)
            .with_markov_options(self.markov)
    }
}

impl SigilEngineBuilder {
    /// Load tables from a YAML file or a directory of YAML files. May be
    /// called repeatedly; later sources merge over earlier ones.
    pub fn tables_path(mut self, path: impl AsRef<Path>) -> Self {
        self.tables_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Load configuration from a RON file instead of using `config()`.
    /// `max_depth`, `debug` and `seed` still take precedence.
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    pub fn seed(mut self, seed: &str) -> Self {
        self.seed = Some(seed.to_string());
        self
    }

    pub fn markov_options(mut self, options: MarkovOptions) -> Self {
        self.markov = options;
        self
    }

    /// Provide tables directly (for use without files).
    pub fn with_tables(mut self, tables: TableStore) -> Self {
        self.tables = Some(tables);
        self
    }

    pub fn build(self) -> Result<SigilEngine, EngineError> {
        let mut tables = self.tables.unwrap_or_default();
        for path in &self.tables_paths {
            tables.merge(loader::load_tables_path(path)?);
        }

        let mut config = match self.config_path {
            Some(ref path) => EngineConfig::load_from_ron(path)?,
            None => self.config,
        };
        if let Some(max_depth) = self.max_depth {
            config.max_depth = max_depth;
        }
        if let Some(debug) = self.debug {
            config.debug = debug;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }

        let rng = rng_for(&config);
        Ok(SigilEngine {
            tables,
            config,
            markov: self.markov,
            rng,
        })
    }
}

fn rng_for(config: &EngineConfig) -> StdRng {
    match config.rng_seed() {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
