//! Policy abstractions for action selection
//!
//! A policy is any control-signal source: a trained agent, a scripted
//! controller or a human at the keyboard all sit behind the same trait.

use async_trait::async_trait;
use std::marker::PhantomData;

use crate::{ActionSpace, ContinuousAction, Observation};

/// Core policy trait for selecting actions
#[async_trait]
pub trait Policy: Send + Sync {
    /// Observation type
    type Observation: Observation;
    /// Action type
    type Action: crate::Action;

    /// Select an action given an observation
    async fn act(&self, observation: &Self::Observation) -> crate::Result<Self::Action>;

    /// Update the policy (for learnable policies)
    async fn update(&mut self) -> crate::Result<()> {
        Ok(())
    }
}

/// Random policy that always selects random actions
pub struct RandomPolicy<O, A> {
    /// Action space
    pub action_space: A,
    _observation: PhantomData<fn() -> O>,
}

impl<O, A> RandomPolicy<O, A> {
    /// Create a new random policy
    pub fn new(action_space: A) -> Self {
        Self {
            action_space,
            _observation: PhantomData,
        }
    }
}

#[async_trait]
impl<O, A> Policy for RandomPolicy<O, A>
where
    O: Observation,
    A: ActionSpace + Send + Sync,
{
    type Observation = O;
    type Action = A::Action;

    async fn act(&self, _observation: &Self::Observation) -> crate::Result<Self::Action> {
        Ok(self.action_space.sample())
    }
}

/// Policy that holds every signal at zero
pub struct ZeroPolicy<O> {
    dim: usize,
    _observation: PhantomData<fn() -> O>,
}

impl<O> ZeroPolicy<O> {
    /// Zero policy emitting `dim` signals
    #[must_use]
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            _observation: PhantomData,
        }
    }
}

#[async_trait]
impl<O: Observation> Policy for ZeroPolicy<O> {
    type Observation = O;
    type Action = ContinuousAction;

    async fn act(&self, _observation: &Self::Observation) -> crate::Result<Self::Action> {
        Ok(ContinuousAction::zeros(self.dim))
    }
}
