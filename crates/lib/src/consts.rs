pub const APP_NAME: &str = "artreg";

/// Namespace used when a declaration does not name one.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Versioned prefix of the registry's REST API.
pub const API_VERSION: &str = "v3";

pub const HEADER_ARTIFACT_VERSION: &str = "Artifact-Version";
pub const HEADER_ARTIFACT_EXTENDS: &str = "Artifact-Extends";

/// Separator used to join parent artifacts into the `Artifact-Extends` header.
pub const PARENTS_SEPARATOR: &str = "/";

pub const DECLARATIONS_FILENAME: &str = "artifacts.json";
pub const STATE_FILENAME: &str = "state.json";
