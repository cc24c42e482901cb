//! Class-name resolution for a child.

/// Label shown when a child is not linked to any class.
pub const UNASSIGNED_CLASS: &str = "unassigned";

/// A child's link to a class, as far as name resolution cares.
pub trait ClassLink {
    fn class_name(&self) -> &str;
    fn is_current(&self) -> bool;
}

/// Prefer the class flagged current, then the first linked class, then
/// [`UNASSIGNED_CLASS`].
pub fn resolve_class_name<L: ClassLink>(links: &[L]) -> String {
    links
        .iter()
        .find(|l| l.is_current())
        .or_else(|| links.first())
        .map(|l| l.class_name().to_string())
        .unwrap_or_else(|| UNASSIGNED_CLASS.to_string())
}
