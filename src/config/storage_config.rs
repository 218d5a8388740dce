use crate::config::root_dir;
use crate::database::IN_MEMORY;
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct StorageConfig {
    /// SQLite file, or `:memory:`.
    pub storage_path: String,
}

impl StorageConfig {
    pub fn database_location(&self) -> String {
        if self.storage_path == IN_MEMORY {
            return IN_MEMORY.to_string();
        }
        let path = std::path::Path::new(&self.storage_path).to_path_buf();
        let path = if path.is_absolute() {
            path
        } else {
            root_dir().join(path)
        };
        path.to_string_lossy().into_owned()
    }
}
