//! Context describing the mutating call whose failure is being classified.

/// The reconciliation operation that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// A create call.
    Create,
    /// A read or existence lookup.
    Read,
    /// An update call.
    Update,
    /// A delete call.
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// Context handed to [`FailureClassifier::classify`](super::FailureClassifier::classify).
///
/// `new_resource` is the explicit is-brand-new flag: transient faults are
/// retryable only while creating an instance that never existed, never
/// when reconciling a known-good one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifyContext {
    /// The operation that failed.
    pub operation: Operation,
    /// Whether the target is a brand-new resource (first creation).
    pub new_resource: bool,
}

impl ClassifyContext {
    /// Context for a create call, with the brand-new flag made explicit.
    pub fn create(new_resource: bool) -> Self {
        Self { operation: Operation::Create, new_resource }
    }

    /// Context for a read or existence lookup.
    pub fn read() -> Self {
        Self { operation: Operation::Read, new_resource: false }
    }

    /// Context for an update of an existing resource.
    pub fn update() -> Self {
        Self { operation: Operation::Update, new_resource: false }
    }

    /// Context for a delete.
    pub fn delete() -> Self {
        Self { operation: Operation::Delete, new_resource: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert_eq!(ClassifyContext::create(true).operation, Operation::Create);
        assert!(ClassifyContext::create(true).new_resource);
        assert!(!ClassifyContext::create(false).new_resource);
        assert!(!ClassifyContext::read().new_resource);
        assert_eq!(ClassifyContext::update().operation, Operation::Update);
        assert_eq!(ClassifyContext::delete().operation, Operation::Delete);
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::Create.to_string(), "create");
        assert_eq!(Operation::Read.to_string(), "read");
        assert_eq!(Operation::Update.to_string(), "update");
        assert_eq!(Operation::Delete.to_string(), "delete");
    }
}
