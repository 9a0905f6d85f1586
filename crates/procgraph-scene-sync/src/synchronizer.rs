//! Scene synchronizer
//!
//! Owns a scene host for the duration of a build and translates between
//! node graph snapshots and the live scene in both directions:
//!
//! - [`SceneSynchronizer::materialize`] creates, parameterizes and wires
//!   host nodes from a snapshot
//! - [`SceneSynchronizer::extract`] reads the host scene back into a
//!   snapshot
//!
//! Both calls are blocking and take `&mut self`, so one host never sees two
//! synchronizations at once.

use serde::{Deserialize, Serialize};

use crate::host::SceneHost;

/// Default location extraction starts from
pub const DEFAULT_EXTRACT_ROOT: &str = "/obj";

/// Options for a synchronizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOptions {
    /// Refuse to materialize graphs whose wiring contains a cycle
    #[serde(default = "default_check_cycles")]
    pub check_cycles: bool,
    /// Host path extraction walks
    #[serde(default = "default_extract_root")]
    pub extract_root: String,
    /// Levels below the root that hold containers rather than graph nodes
    #[serde(default = "default_container_depth")]
    pub container_depth: usize,
}

fn default_check_cycles() -> bool {
    true
}

fn default_extract_root() -> String {
    DEFAULT_EXTRACT_ROOT.to_string()
}

fn default_container_depth() -> usize {
    1
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            check_cycles: default_check_cycles(),
            extract_root: default_extract_root(),
            container_depth: default_container_depth(),
        }
    }
}

/// Bidirectional translator between snapshots and a scene host
pub struct SceneSynchronizer<H: SceneHost> {
    pub(crate) host: H,
    pub(crate) options: SyncOptions,
}

impl<H: SceneHost> SceneSynchronizer<H> {
    pub fn new(host: H) -> Self {
        Self::with_options(host, SyncOptions::default())
    }

    pub fn with_options(host: H, options: SyncOptions) -> Self {
        Self { host, options }
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Release the host
    pub fn into_host(self) -> H {
        self.host
    }
}
