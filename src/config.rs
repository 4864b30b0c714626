use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Static configuration as written in the YAML file. Holds no secrets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub drive: DriveConfig,
    pub notion: NotionConfig,
}

impl Config {
    pub fn trace_loaded(&self) {
        info!(
            folder_id = %self.drive.folder_id,
            recursive = self.drive.recursive,
            database_id = %self.notion.database_id,
            "Loaded Config"
        );
        debug!(?self, "Config loaded (full debug)");
    }
}

/// Where documents are discovered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    pub folder_id: String,
    /// Descend into sub-folders.
    #[serde(default = "default_recursive")]
    pub recursive: bool,
}

fn default_recursive() -> bool {
    true
}

/// Where converted documents are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    pub database_id: String,
    #[serde(default)]
    pub properties: PropertyNames,
}

/// Database property names the synchroniser reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyNames {
    /// Title property, set from the file name.
    pub title: String,
    /// Rich-text property holding the drive file id; the lookup key.
    pub file_id: String,
    /// Rich-text property holding the file's modification time.
    pub last_modified: String,
}

impl Default for PropertyNames {
    fn default() -> Self {
        Self {
            title: "Name".to_string(),
            file_id: "File ID".to_string(),
            last_modified: "Last Modified".to_string(),
        }
    }
}

/// Access tokens read from the environment.
#[derive(Clone)]
pub struct Secrets {
    pub google_access_token: String,
    pub notion_token: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("google_access_token_len", &self.google_access_token.len())
            .field("notion_token_len", &self.notion_token.len())
            .finish()
    }
}

/// Everything `sync` needs: the static file plus secrets.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub config: Config,
    pub secrets: Secrets,
}
