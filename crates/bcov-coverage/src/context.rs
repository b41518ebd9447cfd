//! Coverage contexts: a change type bound to an owning entity.

use std::fmt;
use std::sync::Arc;

use bcov_rules::ChangeTypeProcessor;
use bcov_types::Approver;

/// A change type in the context of its usage: bound to the entity (e.g. a
/// role) that owns the covered documents, with the approvers defined
/// there.
///
/// Created once per (change type, owning entity) pair discovered during
/// matching and shared by reference across every delta it covers.
pub struct ChangeTypeContext {
    processor: Arc<ChangeTypeProcessor>,
    context: String,
    approvers: Vec<Arc<dyn Approver>>,
}

impl ChangeTypeContext {
    /// Create a context from a compiled change type, a scope description,
    /// and the approvers bound in that scope.
    pub fn new(
        processor: Arc<ChangeTypeProcessor>,
        context: impl Into<String>,
        approvers: Vec<Arc<dyn Approver>>,
    ) -> Self {
        Self {
            processor,
            context: context.into(),
            approvers,
        }
    }

    /// The compiled change type.
    pub fn processor(&self) -> &ChangeTypeProcessor {
        &self.processor
    }

    /// Name of the change type.
    pub fn change_type_name(&self) -> &str {
        self.processor.name()
    }

    /// Human-readable description of the owning scope.
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Approvers bound in this scope.
    pub fn approvers(&self) -> &[Arc<dyn Approver>] {
        &self.approvers
    }

    /// Usernames of the bound approvers.
    pub fn approver_usernames(&self) -> Vec<&str> {
        self.approvers.iter().map(|a| a.org_username()).collect()
    }

    /// Two contexts cover the same logical scope when they agree on the
    /// change type and the scope description.
    pub fn same_scope(&self, other: &ChangeTypeContext) -> bool {
        self.change_type_name() == other.change_type_name() && self.context == other.context
    }
}

impl fmt::Debug for ChangeTypeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeTypeContext")
            .field("change_type", &self.change_type_name())
            .field("context", &self.context)
            .field("approvers", &self.approver_usernames())
            .finish()
    }
}
