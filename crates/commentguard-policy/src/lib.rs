//! CommentGuard Policy Engine
//!
//! Declarative override policy that reconciles lexicon evidence with the
//! statistical model's label, and the [`HybridDecisionEngine`] that runs a
//! comment through the full classification core.
//!
//! Policies are ordered decision lists, defined in code or YAML:
//! - Triggers (rule score bounds, confidence tier, model label, AND/OR/NOT)
//! - Actions (follow the model, accept, block)

pub mod action;
pub mod engine;
pub mod rule;
pub mod trigger;

pub use action::Action;
pub use engine::{describe_metrics, Decision, HybridDecisionEngine, Inspection};
pub use rule::{OverridePolicy, Rule, Verdict};
pub use trigger::{CompositeOperator, Evidence, Trigger};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::action::Action;
    pub use crate::engine::{Decision, HybridDecisionEngine};
    pub use crate::rule::{OverridePolicy, Rule};
    pub use crate::trigger::{Evidence, Trigger};
}
