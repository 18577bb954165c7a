/// Seeded permission catalog entry served to role editors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionCatalogEntry {
    /// Stable `<module>.<action>` permission key.
    pub key: String,
    /// Human-readable capability description.
    pub description: String,
    /// Catalog group label.
    pub module_label: String,
}
