//! Registry of solver backends, looked up by name.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::SolverBackend;
use crate::error::{ModelError, Result};

/// Create with `SolverRegistry::new()` for an empty registry or
/// `SolverRegistry::with_defaults()` for the built-in backends.
#[derive(Clone, Default)]
pub struct SolverRegistry {
    backends: HashMap<String, Arc<dyn SolverBackend>>,
}

impl SolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every backend compiled in through cargo features.
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();
        #[cfg(feature = "clarabel")]
        registry.register(Arc::new(super::ClarabelBackend));
        #[cfg(feature = "microlp")]
        registry.register(Arc::new(super::MicrolpBackend));
        registry
    }

    /// Adds `backend`, replacing any backend of the same name.
    pub fn register(&mut self, backend: Arc<dyn SolverBackend>) {
        self.backends.insert(backend.name().to_string(), backend);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn SolverBackend>> {
        self.backends
            .get(name)
            .cloned()
            .ok_or_else(|| ModelError::UnknownSolver(name.to_string()))
    }

    /// Registered backend names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for SolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolverRegistry")
            .field("backends", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{MockSolverBackend, SolverCapabilities};

    #[test]
    fn test_unknown_solver() {
        let err = SolverRegistry::new().get("glpk").err().unwrap();
        assert!(matches!(err, ModelError::UnknownSolver(ref name) if name == "glpk"));
        assert_eq!(err.class(), crate::error::ErrorClass::Solver);
    }

    #[test]
    fn test_register_custom_backend() {
        let mut mock = MockSolverBackend::new();
        mock.expect_name().return_const("mock");
        mock.expect_capabilities().return_const(SolverCapabilities::default());
        let mut registry = SolverRegistry::new();
        registry.register(Arc::new(mock));
        assert_eq!(registry.names(), ["mock"]);
        assert_eq!(registry.get("mock").unwrap().capabilities(), SolverCapabilities::default());
    }

    #[cfg(all(feature = "clarabel", feature = "microlp"))]
    #[test]
    fn test_defaults() {
        assert_eq!(SolverRegistry::with_defaults().names(), ["clarabel", "microlp"]);
    }
}
