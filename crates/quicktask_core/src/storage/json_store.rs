use crate::config::app_dir;
use crate::error::AppError;
use crate::model::StoredTask;
use crate::storage::StorageGateway;
use crate::store::Category;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const SCHEMA_VERSION: u32 = 1;
const STORE_DIR_ENV: &str = "QUICKTASK_STORE_DIR";

#[derive(Debug, Serialize, Deserialize)]
struct StoredList {
    schema_version: u32,
    category: Category,
    tasks: Vec<StoredTask>,
}

/// One `<category>.json` file per list inside a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self::new(store_dir()?))
    }

    pub fn path_for(&self, category: Category) -> PathBuf {
        self.dir.join(format!("{}.json", category.key()))
    }
}

impl StorageGateway for JsonStore {
    fn save_list(&mut self, category: Category, items: &[StoredTask]) -> Result<(), AppError> {
        save_list(&self.path_for(category), category, items)
    }

    fn load_list(&self, category: Category) -> Result<Vec<StoredTask>, AppError> {
        load_list(&self.path_for(category), category)
    }
}

pub fn store_dir() -> Result<PathBuf, AppError> {
    match std::env::var(STORE_DIR_ENV) {
        Ok(path) if !path.trim().is_empty() => Ok(PathBuf::from(path)),
        _ => app_dir(),
    }
}

pub fn load_list(path: &Path, category: Category) -> Result<Vec<StoredTask>, AppError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("reading {}: {err}", path.display())))?;
    let stored: StoredList = serde_json::from_str(&raw).map_err(|err| {
        AppError::invalid_data(format!("{} is not a task list: {err}", path.display()))
    })?;

    if !(1..=SCHEMA_VERSION).contains(&stored.schema_version) {
        return Err(AppError::invalid_data(format!(
            "{} has unsupported schema_version {}",
            path.display(),
            stored.schema_version
        )));
    }
    if stored.category != category {
        return Err(AppError::invalid_data(format!(
            "{} holds the {} list, expected {}",
            path.display(),
            stored.category,
            category
        )));
    }

    Ok(stored.tasks)
}

pub fn save_list(path: &Path, category: Category, tasks: &[StoredTask]) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;
    }

    let stored = StoredList {
        schema_version: SCHEMA_VERSION,
        category,
        tasks: tasks.to_vec(),
    };
    let content = serde_json::to_string_pretty(&stored)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;
    std::fs::write(path, content).map_err(|err| AppError::io(err.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions).map_err(|err| AppError::io(err.to_string()))?;
    }

    debug!(category = %category, count = tasks.len(), "saved list");
    Ok(())
}
