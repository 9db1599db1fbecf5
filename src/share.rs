//! Sharing acknowledgment.
//!
//! When a task gains users in `shared_with`, each newly proposed user
//! resolves once to accepted or rejected. Only accepted users are stored.
//! Rejected users are never retried; proposing them again starts over.
//!
//! There is no remote party yet: [`SimulatedAcknowledger`] answers locally
//! from an [`AcceptanceSource`], behind the same async seam a network
//! round trip would use.

use std::collections::BTreeSet;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::SharingConfig;

/// Probability that a simulated user accepts a share invitation.
pub const DEFAULT_ACCEPTANCE_PROBABILITY: f64 = 0.8;

/// Decides, per proposed user, whether the invitation is accepted.
pub trait AcceptanceSource: Send {
    fn accepts(&mut self, user: &str) -> bool;
}

/// Independent Bernoulli trial per user.
#[derive(Debug)]
pub struct BernoulliAcceptance {
    probability: f64,
    rng: StdRng,
}

impl BernoulliAcceptance {
    pub fn new(probability: f64) -> Self {
        Self {
            probability: probability.clamp(0.0, 1.0),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(probability: f64, seed: u64) -> Self {
        Self {
            probability: probability.clamp(0.0, 1.0),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }
}

impl Default for BernoulliAcceptance {
    fn default() -> Self {
        Self::new(DEFAULT_ACCEPTANCE_PROBABILITY)
    }
}

impl AcceptanceSource for BernoulliAcceptance {
    fn accepts(&mut self, _user: &str) -> bool {
        self.rng.gen_bool(self.probability)
    }
}

/// Every user gives the same answer.
#[derive(Debug, Clone, Copy)]
pub struct FixedAcceptance(pub bool);

impl AcceptanceSource for FixedAcceptance {
    fn accepts(&mut self, _user: &str) -> bool {
        self.0
    }
}

/// Users in the set accept, everyone else rejects.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAcceptance {
    accepting: BTreeSet<String>,
}

impl ScriptedAcceptance {
    pub fn accepting<I, S>(users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            accepting: users.into_iter().map(Into::into).collect(),
        }
    }
}

impl AcceptanceSource for ScriptedAcceptance {
    fn accepts(&mut self, user: &str) -> bool {
        self.accepting.contains(user)
    }
}

/// Resolved answers for one batch of proposed users.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShareOutcome {
    pub accepted: BTreeSet<String>,
    pub rejected: BTreeSet<String>,
}

impl ShareOutcome {
    /// One notice per resolved user, accepted users first.
    pub fn notices(&self, task_name: &str) -> Vec<ShareNotice> {
        let accepted = self.accepted.iter().map(|user| ShareNotice::Accepted {
            user: user.clone(),
            task: task_name.to_string(),
        });
        let rejected = self.rejected.iter().map(|user| ShareNotice::Rejected {
            user: user.clone(),
            task: task_name.to_string(),
        });
        accepted.chain(rejected).collect()
    }
}

/// Resolves share invitations for newly proposed users.
#[async_trait]
pub trait Acknowledger: Send + Sync {
    async fn resolve(&self, task_name: &str, users: &BTreeSet<String>) -> ShareOutcome;
}

/// Local stand-in for remote acknowledgment.
pub struct SimulatedAcknowledger {
    source: Mutex<Box<dyn AcceptanceSource>>,
}

impl SimulatedAcknowledger {
    pub fn new(source: impl AcceptanceSource + 'static) -> Self {
        Self {
            source: Mutex::new(Box::new(source)),
        }
    }

    pub fn from_config(config: &SharingConfig) -> Self {
        match config.seed {
            Some(seed) => Self::new(BernoulliAcceptance::seeded(
                config.acceptance_probability,
                seed,
            )),
            None => Self::new(BernoulliAcceptance::new(config.acceptance_probability)),
        }
    }
}

impl Default for SimulatedAcknowledger {
    fn default() -> Self {
        Self::new(BernoulliAcceptance::default())
    }
}

#[async_trait]
impl Acknowledger for SimulatedAcknowledger {
    async fn resolve(&self, task_name: &str, users: &BTreeSet<String>) -> ShareOutcome {
        let mut source = self.source.lock().await;
        let mut outcome = ShareOutcome::default();
        for user in users {
            if source.accepts(user) {
                outcome.accepted.insert(user.clone());
            } else {
                outcome.rejected.insert(user.clone());
            }
        }
        debug!(
            task = task_name,
            accepted = outcome.accepted.len(),
            rejected = outcome.rejected.len(),
            "resolved share invitations"
        );
        outcome
    }
}

/// User-facing message about a sharing change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ShareNotice {
    Accepted { user: String, task: String },
    Rejected { user: String, task: String },
    Removed { user: String, task: String },
}

impl ShareNotice {
    pub fn title(&self) -> &'static str {
        match self {
            ShareNotice::Accepted { .. } => "Task Sharing Accepted",
            ShareNotice::Rejected { .. } => "Task Sharing Rejected",
            ShareNotice::Removed { .. } => "Task Unshared",
        }
    }

    pub fn body(&self) -> String {
        match self {
            ShareNotice::Accepted { user, task } => format!("{user} accepted the task \"{task}\"."),
            ShareNotice::Rejected { user, task } => format!("{user} rejected the task \"{task}\"."),
            ShareNotice::Removed { user, task } => {
                format!("{user} was removed from the shared list of task \"{task}\".")
            }
        }
    }
}
