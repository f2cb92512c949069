//! # Harness Registration
//!
//! Explicit per-test lifecycle registration and a registry of backends that
//! generic tests are parameterized over.

use super::{HarnessState, ProviderHarness};
use crate::error::HarnessError;
use tracing::debug;

/// A harness registered for one test
///
/// `before_each` runs the harness setup exactly once and hands back the
/// declared harness. The "once per test" contract is visible at the call site.
#[derive(Debug)]
pub struct Registration<H> {
    harness: H,
}

impl<H: ProviderHarness> Registration<H> {
    pub fn register(harness: H) -> Self {
        debug!(
            "Registered {} harness for namespace {}",
            harness.name(),
            harness.namespace()
        );
        Self { harness }
    }

    /// Run setup; fails if it already ran for this registration
    pub async fn before_each(&mut self) -> Result<&mut H, HarnessError> {
        self.harness.setup().await?;
        Ok(&mut self.harness)
    }

    pub fn harness(&self) -> &H {
        &self.harness
    }

    pub fn is_declared(&self) -> bool {
        self.harness.state() == HarnessState::Declared
    }

    pub fn into_inner(self) -> H {
        self.harness
    }
}

/// Harnesses for several backends, one namespace each
#[derive(Default)]
pub struct HarnessRegistry {
    entries: Vec<Box<dyn ProviderHarness>>,
}

impl std::fmt::Debug for HarnessRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|h| (h.name(), h.namespace())))
            .finish()
    }
}

impl HarnessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a harness
    /// # Errors
    /// Two harnesses in one namespace would collide on object names
    pub fn register(&mut self, harness: Box<dyn ProviderHarness>) -> Result<(), HarnessError> {
        if self
            .entries
            .iter()
            .any(|h| h.namespace() == harness.namespace())
        {
            return Err(HarnessError::Config(format!(
                "namespace {} is already used by another harness",
                harness.namespace()
            )));
        }
        self.entries.push(harness);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn ProviderHarness>> {
        self.entries.iter_mut()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|h| format!("{}/{}", h.name(), h.namespace()))
            .collect()
    }

    /// Run setup on every registered harness, stopping at the first failure
    pub async fn setup_all(&mut self) -> Result<(), HarnessError> {
        for harness in &mut self.entries {
            harness.setup().await?;
        }
        Ok(())
    }
}
