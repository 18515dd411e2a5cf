//! Role alias resolution.
//!
//! Membership rows and request headers carry free-form role strings
//! ("Technician", "lab-tech", "QUALITY_ASSURANCE"). Mechanical
//! canonicalization (case, separators) happens in [`Role::new`]; this
//! module applies the alias table on top so permission checks compare
//! canonical codes only.

use limsflow_types::Role;

const ALIASES: &[(&str, &str)] = &[
    ("TECHNICIAN", "LAB_TECH"),
    ("LAB_TECHNICIAN", "LAB_TECH"),
    ("LABTECH", "LAB_TECH"),
    ("LAB_TECHNOLOGIST", "LAB_TECH"),
    ("RESEARCHER", "SCIENTIST"),
    ("PI", "SCIENTIST"),
    ("QUALITY_ASSURANCE", "QA"),
    ("Q_A", "QA"),
    ("SUPERUSER", "ADMIN"),
    ("SYSTEM_ADMIN", "ADMIN"),
    ("MANAGER", "LAB_MANAGER"),
    ("VIEWER", "READONLY"),
];

/// Canonicalize a raw role string, resolving known aliases.
pub fn normalize_role(raw: impl AsRef<str>) -> Role {
    let canonical = Role::new(raw);
    for (alias, target) in ALIASES {
        if canonical.as_str() == *alias {
            return Role::new(*target);
        }
    }
    canonical
}
