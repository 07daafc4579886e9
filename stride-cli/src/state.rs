use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use stride_core::{Task, User};

/// One user's aggregate, exactly what the engine operates on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserState {
    pub user: User,
    pub tasks: Vec<Task>,
}

impl UserState {
    pub fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }
}

pub fn stride_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".stride"))
}

pub fn ensure_stride_home() -> Result<PathBuf> {
    let dir = stride_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn default_state_path() -> Result<PathBuf> {
    Ok(ensure_stride_home()?.join("state.json"))
}

pub fn write_state(path: &Path, state: &UserState) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(state)?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn read_state(path: &Path) -> Result<UserState> {
    let s = fs::read_to_string(path)
        .with_context(|| format!("read {} (run `stride init` first?)", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))
}
