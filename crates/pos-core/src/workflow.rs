//! Vertical workflow dispatch.
//!
//! A vertical's config names an ordered list of workflow steps. The registry
//! resolves those names to handlers and the resulting [`Chain`] runs them in
//! continuation-passing style: each step receives a [`Next`] and decides
//! whether to continue. A step that returns without calling `next.run`
//! stops the chain.

use crate::error::{PosError, Result};
use crate::types::BusinessType;
use std::collections::BTreeMap;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Request facts a workflow step may inspect.
#[derive(Debug, Clone)]
pub struct WorkflowContext {
    pub business_type: BusinessType,
    pub user_id: Option<String>,
    pub method: String,
    pub route: String,
    executed: Vec<String>,
}

impl WorkflowContext {
    pub fn new(business_type: BusinessType, method: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            business_type,
            user_id: None,
            method: method.into(),
            route: route.into(),
            executed: Vec::new(),
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Names of the steps entered so far, in order.
    pub fn executed(&self) -> &[String] {
        &self.executed
    }
}

// ---------------------------------------------------------------------------
// Step trait + continuation
// ---------------------------------------------------------------------------

pub trait WorkflowStep: Send + Sync {
    fn name(&self) -> &str;

    fn handle(&self, ctx: &mut WorkflowContext, next: Next<'_>) -> Result<()>;
}

/// The remainder of a chain, handed to each step.
pub struct Next<'a> {
    rest: &'a [Arc<dyn WorkflowStep>],
}

impl Next<'_> {
    pub fn run(self, ctx: &mut WorkflowContext) -> Result<()> {
        match self.rest.split_first() {
            Some((step, rest)) => {
                ctx.executed.push(step.name().to_string());
                step.handle(ctx, Next { rest })
            }
            None => Ok(()),
        }
    }
}

/// Built-in step: records a structured log line and continues.
pub struct LoggingStep {
    name: String,
    summary: String,
}

impl LoggingStep {
    pub fn new(name: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            summary: summary.into(),
        }
    }
}

impl WorkflowStep for LoggingStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, ctx: &mut WorkflowContext, next: Next<'_>) -> Result<()> {
        tracing::info!(
            workflow = %self.name,
            business_type = %ctx.business_type,
            method = %ctx.method,
            route = %ctx.route,
            user_id = ctx.user_id.as_deref().unwrap_or("-"),
            "{}",
            self.summary
        );
        next.run(ctx)
    }
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct Chain {
    steps: Vec<Arc<dyn WorkflowStep>>,
}

impl Chain {
    pub fn names(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run the chain and return the names of the steps this run entered.
    /// Names already recorded on `ctx` by earlier chains are not repeated.
    pub fn run(&self, ctx: &mut WorkflowContext) -> Result<Vec<String>> {
        let start = ctx.executed.len();
        Next { rest: &self.steps }.run(ctx)?;
        Ok(ctx.executed[start..].to_vec())
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

const BUILTIN_STEPS: &[(&str, &str)] = &[
    // pharmacy
    ("expiry_alerts", "checking batches nearing expiry"),
    ("deduct_stock_by_batch", "deducting stock first-expiry-first-out"),
    ("controlled_substance_logs", "recording controlled substance access"),
    ("prescription_validation", "validating prescription requirements"),
    // restaurant
    ("recipe_deduction", "deducting recipe ingredients"),
    ("kitchen_ticket_routing", "routing ticket to kitchen stations"),
    ("waste_tracking", "recording waste adjustments"),
    // rental
    ("availability_check", "checking rental availability"),
    ("deposit_hold", "placing deposit hold"),
    ("return_inspection", "scheduling return inspection"),
    // retail
    ("barcode_lookup", "resolving barcode"),
    ("deduct_stock", "deducting stock"),
    ("low_stock_alerts", "checking low stock thresholds"),
];

#[derive(Clone, Default)]
pub struct WorkflowRegistry {
    steps: BTreeMap<String, Arc<dyn WorkflowStep>>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding a [`LoggingStep`] for every workflow the built-in
    /// verticals reference.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for (name, summary) in BUILTIN_STEPS {
            registry.register(Arc::new(LoggingStep::new(*name, *summary)));
        }
        registry
    }

    /// Insert or replace a step under its own name.
    pub fn register(&mut self, step: Arc<dyn WorkflowStep>) {
        self.steps.insert(step.name().to_string(), step);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.steps.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.steps.keys().cloned().collect()
    }

    pub fn chain<S: AsRef<str>>(&self, names: &[S]) -> Result<Chain> {
        let steps = names
            .iter()
            .map(|n| {
                let n = n.as_ref();
                self.steps
                    .get(n)
                    .cloned()
                    .ok_or_else(|| PosError::UnknownWorkflow(n.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Chain { steps })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verticals;

    struct Halt;

    impl WorkflowStep for Halt {
        fn name(&self) -> &str {
            "halt"
        }

        fn handle(&self, _ctx: &mut WorkflowContext, _next: Next<'_>) -> Result<()> {
            Ok(())
        }
    }

    struct Reject;

    impl WorkflowStep for Reject {
        fn name(&self) -> &str {
            "reject"
        }

        fn handle(&self, _ctx: &mut WorkflowContext, _next: Next<'_>) -> Result<()> {
            Err(PosError::Validation("rejected".into()))
        }
    }

    fn ctx() -> WorkflowContext {
        WorkflowContext::new(BusinessType::Pharmacy, "GET", "/api/inventory")
    }

    #[test]
    fn builtin_registry_resolves_every_vertical() {
        let registry = WorkflowRegistry::builtin();
        for (bt, cfg) in verticals::builtin_all() {
            let chain = registry.chain(&cfg.workflows).unwrap_or_else(|e| panic!("{bt}: {e}"));
            assert_eq!(chain.names(), cfg.workflows);
        }
    }

    #[test]
    fn chain_runs_in_order() {
        let registry = WorkflowRegistry::builtin();
        let cfg = verticals::builtin(BusinessType::Pharmacy);
        let chain = registry.chain(&cfg.workflows).unwrap();

        let mut c = ctx();
        let ran = chain.run(&mut c).unwrap();
        assert_eq!(ran, cfg.workflows);
    }

    #[test]
    fn second_chain_on_same_context_reports_only_its_own_steps() {
        let registry = WorkflowRegistry::builtin();
        let pharmacy = registry.chain(&["expiry_alerts"]).unwrap();
        let retail = registry.chain(&["barcode_lookup", "deduct_stock"]).unwrap();

        let mut c = ctx();
        assert_eq!(pharmacy.run(&mut c).unwrap(), vec!["expiry_alerts"]);
        assert_eq!(retail.run(&mut c).unwrap(), vec!["barcode_lookup", "deduct_stock"]);
        assert_eq!(c.executed.len(), 3);
    }

    #[test]
    fn unknown_workflow_is_an_error() {
        let registry = WorkflowRegistry::builtin();
        let err = registry.chain(&["expiry_alerts", "teleport"]).err().unwrap();
        assert!(matches!(err, PosError::UnknownWorkflow(n) if n == "teleport"));
    }

    #[test]
    fn step_without_next_stops_chain() {
        let mut registry = WorkflowRegistry::builtin();
        registry.register(Arc::new(Halt));
        let chain = registry
            .chain(&["expiry_alerts", "halt", "deduct_stock_by_batch"])
            .unwrap();

        let mut c = ctx();
        let ran = chain.run(&mut c).unwrap();
        assert_eq!(ran, vec!["expiry_alerts", "halt"]);
    }

    #[test]
    fn step_error_propagates() {
        let mut registry = WorkflowRegistry::builtin();
        registry.register(Arc::new(Reject));
        let chain = registry.chain(&["expiry_alerts", "reject"]).unwrap();

        let mut c = ctx();
        assert!(chain.run(&mut c).is_err());
        assert_eq!(c.executed().to_vec(), vec!["expiry_alerts", "reject"]);
    }

    #[test]
    fn empty_chain_is_noop() {
        let chain = WorkflowRegistry::builtin().chain::<&str>(&[]).unwrap();
        assert!(chain.is_empty());
        assert!(chain.run(&mut ctx()).unwrap().is_empty());
    }
}
