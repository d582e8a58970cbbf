//! Known concept types
//!
//! Script-visible type names for elements and relationships. Nodes can only be
//! created with a type listed here, and selectors only accept these names.

/// Element types, kebab case as seen by scripts
pub const ELEMENT_TYPES: &[&str] = &[
    // Strategy
    "resource",
    "capability",
    "value-stream",
    "course-of-action",
    // Business
    "business-actor",
    "business-role",
    "business-collaboration",
    "business-interface",
    "business-process",
    "business-function",
    "business-interaction",
    "business-event",
    "business-service",
    "business-object",
    "contract",
    "representation",
    "product",
    // Application
    "application-component",
    "application-collaboration",
    "application-interface",
    "application-function",
    "application-interaction",
    "application-process",
    "application-event",
    "application-service",
    "data-object",
    // Technology & Physical
    "node",
    "device",
    "system-software",
    "technology-collaboration",
    "technology-interface",
    "path",
    "communication-network",
    "technology-function",
    "technology-process",
    "technology-interaction",
    "technology-event",
    "technology-service",
    "artifact",
    "equipment",
    "facility",
    "distribution-network",
    "material",
    // Motivation
    "stakeholder",
    "driver",
    "assessment",
    "goal",
    "outcome",
    "principle",
    "requirement",
    "constraint",
    "meaning",
    "value",
    // Implementation & Migration
    "work-package",
    "deliverable",
    "implementation-event",
    "plateau",
    "gap",
    // Other
    "grouping",
    "location",
    "junction",
];

/// Relationship types
pub const RELATIONSHIP_TYPES: &[&str] = &[
    "composition-relationship",
    "aggregation-relationship",
    "assignment-relationship",
    "realization-relationship",
    "serving-relationship",
    "access-relationship",
    "influence-relationship",
    "triggering-relationship",
    "flow-relationship",
    "specialization-relationship",
    "association-relationship",
];

pub fn is_element_type(type_name: &str) -> bool {
    ELEMENT_TYPES.contains(&type_name)
}

pub fn is_relationship_type(type_name: &str) -> bool {
    RELATIONSHIP_TYPES.contains(&type_name)
}
