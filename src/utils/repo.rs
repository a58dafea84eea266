use crate::errors::Result;
use std::path::{Path, PathBuf};

/// Repository analysis information
pub struct RepoContext {
    pub is_git_repo: bool,
    pub project_summary: String,
    pub recent_files: Vec<String>,
    pub important_files: Vec<String>,
    pub project_files: Vec<String>,
}

/// Simple repository analyzer
pub struct RepoContextAnalyzer;

impl RepoContextAnalyzer {
    /// Basic workspace analysis
    pub fn analyze(path: &Path) -> Result<RepoContext> {
        let is_git_repo = path.join(".git").exists();
        Ok(RepoContext {
            is_git_repo,
            project_summary: "Optimized MCP Workspace".to_string(),
            recent_files: vec![],
            important_files: vec![],
            project_files: vec![],
        })
    }
}

/// Compatibility function for repository context
pub fn get_repo_context(_path: &Path) -> Result<(String, Vec<String>)> {
    let context = "Project: Winx MCP Core\nStatus: Optimized".to_string();
    Ok((context, vec![]))
}
