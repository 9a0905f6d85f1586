//! Application-wide constants
//!
//! Single source of truth for configuration defaults.

/// Default values for configuration
pub mod defaults {
    /// Location new nodes are created under when a script omits one
    pub const LOCATION: &str = "/obj/geo1";
    /// Node type catalog file
    pub const CATALOG_FILE: &str = "node_types.json";
}

/// File names
pub mod files {
    /// Configuration file looked up in the working directory
    pub const CONFIG: &str = "procgraph.json";
}
