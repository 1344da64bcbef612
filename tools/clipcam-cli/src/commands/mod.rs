pub mod config;
pub mod detect;
pub mod info;
pub mod layout;
pub mod path;

use std::path::Path;

use clipcam_project_model::event::{parse_events, InputEvent};
use clipcam_project_model::project::Project;

pub fn load_project(path: &Path) -> anyhow::Result<Project> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read project {}: {e}", path.display()))?;
    Project::from_json(&json).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))
}

pub fn load_events(path: &Path) -> anyhow::Result<Vec<InputEvent>> {
    let content = std::fs::read_to_string(path)
        .map_err(|_| anyhow::anyhow!("Events file not found: {}", path.display()))?;
    parse_events(&content).map_err(|e| anyhow::anyhow!("Failed to parse events: {e}"))
}
