//! Transition mechanisms.
//!
//! A mechanism wraps the swap operation so work can happen around the
//! DOM mutation (settling, staged reveals). The mechanism must call
//! the operation exactly once and propagate its error.

use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;

use crate::error::FxError;

/// The swap operation handed to a mechanism.
pub type SwapOp<'a> = dyn FnMut() -> Result<(), FxError> + 'a;

/// Wraps one swap. Implementations decide what happens before and
/// after the DOM changes.
#[async_trait(?Send)]
pub trait SwapMechanism {
    async fn run(&self, op: &mut SwapOp<'_>) -> Result<(), FxError>;
}

/// Runs the swap with no ceremony.
#[derive(Debug, Default)]
pub struct ImmediateMechanism;

#[async_trait(?Send)]
impl SwapMechanism for ImmediateMechanism {
    async fn run(&self, op: &mut SwapOp<'_>) -> Result<(), FxError> {
        op()
    }
}

/// Yields to the executor on both sides of the swap, giving other
/// tasks a chance to observe the document before and after.
#[derive(Debug, Default)]
pub struct FadeMechanism;

#[async_trait(?Send)]
impl SwapMechanism for FadeMechanism {
    async fn run(&self, op: &mut SwapOp<'_>) -> Result<(), FxError> {
        smol::future::yield_now().await;
        op()?;
        smol::future::yield_now().await;
        Ok(())
    }
}

/// Named mechanisms available to engine options and config listeners.
pub struct MechanismRegistry {
    mechanisms: HashMap<String, Rc<dyn SwapMechanism>>,
}

impl MechanismRegistry {
    /// A registry with the two built-in mechanisms.
    pub fn new() -> Self {
        let mut registry = Self {
            mechanisms: HashMap::new(),
        };
        registry.register("immediate", Rc::new(ImmediateMechanism));
        registry.register("fade", Rc::new(FadeMechanism));
        registry
    }

    pub fn register(&mut self, name: &str, mechanism: Rc<dyn SwapMechanism>) {
        tracing::debug!("registering swap mechanism {name:?}");
        self.mechanisms.insert(name.to_string(), mechanism);
    }

    pub fn get(&self, name: &str) -> Option<Rc<dyn SwapMechanism>> {
        self.mechanisms.get(name).cloned()
    }

    /// Registered names, sorted for stable output.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.mechanisms.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for MechanismRegistry {
    fn default() -> Self {
        Self::new()
    }
}
