//! Backend operation registry.
//!
//! Folding dispatches dynamically over operation kinds: each prepack kind
//! maps to its input arity, the static type of the packed result, and an
//! evaluator closure turning constant inputs into a [`PackedConstant`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use splice_ir::{AttrValue, PackedConstant, Symbol, TypeAnn};

use crate::error::{PrepackAritySnafu, Result, UnknownPrepackOpSnafu, UnsupportedConfigurationSnafu};

type Evaluator = Arc<dyn Fn(&[AttrValue]) -> Result<PackedConstant> + Send + Sync>;

pub struct OpEntry {
    pub arity: usize,
    pub result_type: TypeAnn,
    eval: Evaluator,
}

pub struct OpRegistry {
    backend: String,
    entries: HashMap<Symbol, OpEntry>,
    run_ops: HashSet<Symbol>,
}

impl OpRegistry {
    pub fn new(backend: impl Into<String>) -> Self {
        Self { backend: backend.into(), entries: HashMap::new(), run_ops: HashSet::new() }
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn register<F>(&mut self, kind: &str, arity: usize, result_type: TypeAnn, eval: F)
    where
        F: Fn(&[AttrValue]) -> Result<PackedConstant> + Send + Sync + 'static,
    {
        self.entries.insert(Symbol::new(kind), OpEntry { arity, result_type, eval: Arc::new(eval) });
    }

    /// Declare a runtime-only kind. Run kinds are never folded; they are
    /// recorded so the entry gate can verify the backend carries them.
    pub fn register_run(&mut self, kind: &str) {
        self.run_ops.insert(Symbol::new(kind));
    }

    pub fn is_prepack(&self, kind: &Symbol) -> bool {
        self.entries.contains_key(kind)
    }

    pub fn entry(&self, kind: &Symbol) -> Option<&OpEntry> {
        self.entries.get(kind)
    }

    pub fn evaluate(&self, kind: &Symbol, inputs: &[AttrValue]) -> Result<PackedConstant> {
        let Some(entry) = self.entries.get(kind) else {
            return UnknownPrepackOpSnafu { kind: kind.to_string() }.fail();
        };
        snafu::ensure!(
            inputs.len() == entry.arity,
            PrepackAritySnafu { kind: kind.to_string(), expected: entry.arity, actual: inputs.len() }
        );
        (entry.eval)(inputs)
    }

    /// Entry gate for the pipeline: every kind it may rewrite into must be
    /// registered, otherwise nothing is touched.
    pub fn ensure_ops(&self, required: &[&str]) -> Result<()> {
        for &op in required {
            let kind = Symbol::new(op);
            snafu::ensure!(
                self.entries.contains_key(&kind) || self.run_ops.contains(&kind),
                UnsupportedConfigurationSnafu { backend: self.backend.clone(), op }
            );
        }
        Ok(())
    }
}
