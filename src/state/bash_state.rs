#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
use anyhow::Result;
use lazy_static::lazy_static;
use rand::RngCore;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::state::persistence::{
    load_bash_state as load_state_file, save_bash_state as save_state_file, BashStateSnapshot,
};
use crate::state::pty::PtyShell;
use crate::state::terminal::{incremental_text, TerminalEmulator};
use crate::types::{
    AllowedCommands, AllowedGlobs, BashCommandMode, BashMode, FileEditMode, Modes, WriteIfEmptyMode,
};
use crate::utils::error_predictor::SharedErrorPredictor;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileWhitelistData {
    pub file_hash: String,
    pub line_ranges_read: Vec<(usize, usize)>,
    pub total_lines: usize,
}

impl FileWhitelistData {
    pub fn new(
        file_hash: String,
        line_ranges_read: Vec<(usize, usize)>,
        total_lines: usize,
    ) -> Self {
        Self { file_hash, line_ranges_read, total_lines }
    }

    pub fn is_read_enough(&self) -> bool {
        self.get_percentage_read() >= 99.0
    }

    pub fn get_percentage_read(&self) -> f64 {
        if self.total_lines == 0 {
            return 100.0;
        }
        let mut lines_read = std::collections::HashSet::new();
        for (start, end) in &self.line_ranges_read {
            for line in *start..=*end {
                lines_read.insert(line);
            }
        }
        (lines_read.len() as f64 / self.total_lines as f64) * 100.0
    }

    pub fn get_unread_ranges(&self) -> Vec<(usize, usize)> {
        if self.total_lines == 0 {
            return vec![];
        }
        let mut lines_read = std::collections::HashSet::new();
        for (start, end) in &self.line_ranges_read {
            for line in *start..=*end {
                lines_read.insert(line);
            }
        }
        let mut unread = vec![];
        let mut start_range = None;
        for i in 1..=self.total_lines {
            if !lines_read.contains(&i) {
                if start_range.is_none() {
                    start_range = Some(i);
                }
            } else if let Some(start) = start_range {
                unread.push((start, i - 1));
                start_range = None;
            }
        }
        if let Some(start) = start_range {
            unread.push((start, self.total_lines));
        }
        unread
    }

    pub fn add_range(&mut self, start: usize, end: usize) {
        self.line_ranges_read.push((start, end));
    }

    pub fn get_read_error_message(&self, file_path: &Path) -> String {
        format!(
            "File {} needs more reading. Coverage: {:.1}%",
            file_path.display(),
            self.get_percentage_read()
        )
    }

    pub fn needs_more_reading(&self) -> bool {
        !self.is_read_enough()
    }
}

#[derive(Debug, Clone)]
pub struct TerminalState {
    pub last_command: String,
    pub last_pending_output: String,
    pub command_running: bool,
    pub terminal_emulator: Arc<Mutex<TerminalEmulator>>,
}

impl Default for TerminalState {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalState {
    pub fn new() -> Self {
        Self {
            last_command: String::new(),
            last_pending_output: String::new(),
            command_running: false,
            terminal_emulator: Arc::new(Mutex::new(TerminalEmulator::new(160))),
        }
    }

    pub fn process_output(&mut self, output: &str) -> String {
        self.last_pending_output = output.to_string();
        if let Ok(mut emulator) = self.terminal_emulator.lock() {
            emulator.process(output);
            emulator.display().join("\n")
        } else {
            output.to_string()
        }
    }

    pub fn get_incremental_output(&mut self, output: &str) -> String {
        let result = incremental_text(output, &self.last_pending_output);
        self.last_pending_output = output.to_string();
        result
    }

}

const WCGW_PROMPT_PATTERN: &str = r"◉ ([^\n]*)──➤";
const WCGW_PROMPT_COMMAND: &str = r#"printf '◉ "$(pwd)"──➤ '"#;
const BASH_PROMPT_STATEMENT: &str =
    r#"export GIT_PAGER=cat PAGER=cat PROMPT_COMMAND='printf \"◉ $(pwd)──➤ \"'"#;

lazy_static! {
    static ref PROMPT_REGEX: Regex = Regex::new(WCGW_PROMPT_PATTERN).expect("Invalid prompt regex");
}

fn contains_wcgw_prompt(text: &str) -> bool {
    PROMPT_REGEX.is_match(text)
}

const MAX_OUTPUT_SIZE: usize = 100_000;

/// One running shell: a real PTY-backed bash process plus the terminal
/// emulator state used to render and diff its output. A `BashState` keeps
/// one of these per foreground chat and any number backgrounded by
/// `bg_command_id`.
#[derive(Debug)]
pub struct ShellInstance {
    pub pty: PtyShell,
    pub terminal: TerminalState,
    pub restricted_mode: bool,
    initial_dir: PathBuf,
}

impl ShellInstance {
    pub fn new(initial_dir: &Path, restricted_mode: bool) -> Result<Self> {
        let pty = PtyShell::new(initial_dir, restricted_mode)?;
        Ok(Self {
            pty,
            terminal: TerminalState::new(),
            restricted_mode,
            initial_dir: initial_dir.to_path_buf(),
        })
    }

    /// Respawns the underlying PTY in place if the bash process has died,
    /// e.g. after the user ran `exit` or the shell was killed.
    pub fn ensure_alive(&mut self) -> Result<()> {
        if !self.pty.is_alive() {
            self.pty = PtyShell::new(&self.initial_dir, self.restricted_mode)?;
            self.terminal = TerminalState::new();
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct BashState {
    pub cwd: PathBuf,
    pub workspace_root: PathBuf,
    pub current_chat_id: String,
    pub mode: Modes,
    pub bash_command_mode: BashCommandMode,
    pub file_edit_mode: FileEditMode,
    pub write_if_empty_mode: WriteIfEmptyMode,
    pub whitelist_for_overwrite: HashMap<String, FileWhitelistData>,
    /// Foreground shell for this chat, keyed by `chat_id`. Only one entry:
    /// the session's own shell. Kept as a map (rather than a bare field) so
    /// it shares the `Arc<Mutex<_>>` shape of `background`.
    pub foreground: Arc<Mutex<HashMap<String, ShellInstance>>>,
    /// Background shells, keyed by the `bg_command_id` the caller chose when
    /// it issued the backgrounding command.
    pub background: Arc<Mutex<HashMap<String, ShellInstance>>>,
    pub initialized: bool,
    /// Tracks recent command/file errors to warn callers before they repeat them.
    pub error_predictor: SharedErrorPredictor,
}

impl Default for BashState {
    fn default() -> Self {
        Self::new()
    }
}

impl BashState {
    pub fn new() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/tmp"));
        Self {
            cwd: cwd.clone(),
            workspace_root: cwd,
            current_chat_id: generate_thread_id(),
            mode: Modes::Wcgw,
            bash_command_mode: BashCommandMode {
                bash_mode: BashMode::NormalMode,
                allowed_commands: AllowedCommands::All("all".to_string()),
            },
            file_edit_mode: FileEditMode { allowed_globs: AllowedGlobs::All("all".to_string()) },
            write_if_empty_mode: WriteIfEmptyMode {
                allowed_globs: AllowedGlobs::All("all".to_string()),
            },
            whitelist_for_overwrite: HashMap::new(),
            foreground: Arc::new(Mutex::new(HashMap::new())),
            background: Arc::new(Mutex::new(HashMap::new())),
            initialized: false,
            error_predictor: SharedErrorPredictor::new(),
        }
    }

    /// Creates the foreground shell for this chat if it doesn't exist yet.
    pub fn ensure_foreground_shell(&mut self) -> Result<()> {
        let mut guard = self.foreground.lock().unwrap();
        if let Some(instance) = guard.get_mut(&self.current_chat_id) {
            instance.ensure_alive()?;
        } else {
            let restricted = self.bash_command_mode.bash_mode == BashMode::RestrictedMode;
            guard.insert(self.current_chat_id.clone(), ShellInstance::new(&self.cwd, restricted)?);
        }
        Ok(())
    }

    /// Spawns and registers a new background shell under `bg_command_id`.
    pub fn spawn_background_shell(&mut self, bg_command_id: &str) -> Result<()> {
        let restricted = self.bash_command_mode.bash_mode == BashMode::RestrictedMode;
        let instance = ShellInstance::new(&self.cwd, restricted)?;
        self.background.lock().unwrap().insert(bg_command_id.to_string(), instance);
        Ok(())
    }

    pub fn update_cwd(&mut self, path: &Path) -> Result<()> {
        self.cwd = path.to_path_buf();
        Ok(())
    }

    pub fn update_workspace_root(&mut self, path: &Path) -> Result<()> {
        self.workspace_root = path.to_path_buf();
        Ok(())
    }

    /// Returns the allow-list consulted for bash commands under the current mode.
    pub fn is_command_allowed(&self, command: &str) -> bool {
        match self.mode {
            Modes::Architect => false,
            Modes::Wcgw => self.bash_command_mode.allowed_commands.is_allowed(command),
            Modes::CodeWriter => self.bash_command_mode.allowed_commands.is_allowed(command),
        }
    }

    /// Returns whether `path` (workspace-relative or absolute) may be edited
    /// under the current mode's file-edit allow-list.
    pub fn is_file_edit_allowed(&self, path: &str) -> bool {
        match self.mode {
            Modes::Architect => false,
            Modes::Wcgw | Modes::CodeWriter => self.file_edit_mode.allowed_globs.is_allowed(path),
        }
    }

    /// Returns whether a brand-new (currently empty or nonexistent) file may
    /// be written at `path` under the current mode's write-if-empty allow-list.
    pub fn is_file_write_allowed(&self, path: &str) -> bool {
        match self.mode {
            Modes::Architect => false,
            Modes::Wcgw | Modes::CodeWriter => {
                self.write_if_empty_mode.allowed_globs.is_allowed(path)
            }
        }
    }

    pub fn get_mode_violation_message(&self, op: &str, target: &str) -> String {
        let mode = match self.mode {
            Modes::Wcgw => "wcgw",
            Modes::Architect => "architect",
            Modes::CodeWriter => "code_writer",
        };
        format!("Operation '{op}' on '{target}' is not permitted in {mode} mode")
    }

    pub fn save_state_to_disk(&self) -> Result<()> {
        let snapshot = BashStateSnapshot::from_state(
            &self.cwd.to_string_lossy(),
            &self.workspace_root.to_string_lossy(),
            &self.mode,
            &self.bash_command_mode,
            &self.file_edit_mode,
            &self.write_if_empty_mode,
            &self.whitelist_for_overwrite,
            &self.current_chat_id,
        );
        save_state_file(&self.current_chat_id, &snapshot)?;
        Ok(())
    }

    pub fn load_state_from_disk(&mut self, chat_id: &str) -> Result<bool> {
        if let Some(snapshot) = load_state_file(chat_id)? {
            let (cwd, root, mode, bmode, emode, wmode, whitelist, tid) =
                snapshot.to_state_components();
            self.cwd = PathBuf::from(cwd);
            self.workspace_root = PathBuf::from(root);
            self.mode = mode;
            self.bash_command_mode = bmode;
            self.file_edit_mode = emode;
            self.write_if_empty_mode = wmode;
            self.whitelist_for_overwrite = whitelist;
            self.current_chat_id = tid;
            self.initialized = true;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

pub fn generate_thread_id() -> String {
    let mut rng = rand::rng();
    format!("tid_{:x}", rng.next_u64())
}
