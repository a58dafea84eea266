use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing;

#[derive(Debug, Serialize, Deserialize, JsonSchema, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum InitializeType {
    FirstCall,
    UserAskedModeChange,
    ResetShell,
    UserAskedChangeWorkspace,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModeName {
    Wcgw,
    Architect,
    CodeWriter,
}

// Custom serializer implementation to ensure values are properly quoted in JSON
impl Serialize for ModeName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            ModeName::Wcgw => serializer.serialize_str("wcgw"),
            ModeName::Architect => serializer.serialize_str("architect"),
            ModeName::CodeWriter => serializer.serialize_str("code_writer"),
        }
    }
}

// Custom deserializer to support multiple aliases
impl<'de> Deserialize<'de> for ModeName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "wcgw" => Ok(ModeName::Wcgw),
            "architect" => Ok(ModeName::Architect),
            "code_writer" | "code_write" | "code-writer" => Ok(ModeName::CodeWriter),
            _ => Err(serde::de::Error::custom(format!(
                "Unknown mode name: {}",
                s
            ))),
        }
    }
}

// Implement schema generation for JSON schema since we removed the derive
impl JsonSchema for ModeName {
    fn schema_name() -> String {
        "ModeName".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        let mut schema = schemars::schema::SchemaObject::default();
        schema.metadata().description = Some("The mode name for initialization".to_string());
        let enum_values = vec![
            serde_json::Value::String("wcgw".to_string()),
            serde_json::Value::String("architect".to_string()),
            serde_json::Value::String("code_writer".to_string()),
        ];
        schema.enum_values = Some(enum_values);
        schema.into()
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, Clone, PartialEq)]
pub struct CodeWriterConfig {
    #[serde(default)]
    pub allowed_globs: AllowedGlobs,
    #[serde(default)]
    pub allowed_commands: AllowedCommands,
}

impl Default for CodeWriterConfig {
    fn default() -> Self {
        Self {
            allowed_globs: AllowedGlobs::default(),
            allowed_commands: AllowedCommands::default(),
        }
    }
}

impl CodeWriterConfig {
    pub fn update_relative_globs(&mut self, workspace_root: &str) {
        // Only process if we have a list of globs
        if let AllowedGlobs::List(globs) = &self.allowed_globs {
            let updated_globs = globs
                .iter()
                .map(|glob| {
                    if std::path::Path::new(glob).is_absolute() {
                        glob.clone()
                    } else {
                        format!("{}/{}", workspace_root, glob)
                    }
                })
                .collect();

            self.allowed_globs = AllowedGlobs::List(updated_globs);
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, Clone, PartialEq)]
#[serde(untagged)]
pub enum AllowedGlobs {
    All(String),
    List(Vec<String>),
}

impl Default for AllowedGlobs {
    fn default() -> Self {
        AllowedGlobs::All("all".to_string())
    }
}

impl AllowedGlobs {
    /// Checks whether `path` matches one of the configured glob patterns.
    /// `path` is expected to already be an absolute, workspace-relative path
    /// (see `CodeWriterConfig::update_relative_globs`).
    pub fn is_allowed(&self, path: &str) -> bool {
        match self {
            AllowedGlobs::All(s) if s == "all" => true,
            AllowedGlobs::List(globs) => globs.iter().any(|pattern| {
                glob::Pattern::new(pattern).map(|p| p.matches(path)).unwrap_or(false)
                    || pattern == path
            }),
            _ => false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, Clone, PartialEq)]
#[serde(untagged)]
pub enum AllowedCommands {
    All(String),
    List(Vec<String>),
}

impl Default for AllowedCommands {
    fn default() -> Self {
        AllowedCommands::All("all".to_string())
    }
}

impl AllowedCommands {
    /// Checks whether `command` (the first whitespace-separated token of the
    /// bash command line, e.g. `"git"` out of `"git status"`) is permitted.
    pub fn is_allowed(&self, command: &str) -> bool {
        let head = command.trim().split_whitespace().next().unwrap_or(command);
        match self {
            AllowedCommands::All(s) if s == "all" => true,
            AllowedCommands::List(commands) => {
                commands.iter().any(|c| c == command || c == head)
            }
            _ => false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema, Clone)]
pub struct Initialize {
    #[serde(rename = "type")]
    #[serde(default = "default_init_type")]
    pub init_type: InitializeType,
    pub any_workspace_path: String,
    #[serde(default)]
    pub initial_files_to_read: Vec<String>,
    #[serde(default = "String::new")]
    #[serde(deserialize_with = "deserialize_string_or_null")]
    pub task_id_to_resume: String,
    #[serde(default = "default_mode_name")]
    pub mode_name: ModeName,
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_string_or_null")]
    pub chat_id: String,
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_code_writer_config")]
    pub code_writer_config: Option<CodeWriterConfig>,
}

// Custom deserializer for strings that might be null
fn deserialize_string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    // First try to deserialize as a string
    let result = serde_json::Value::deserialize(deserializer)?;

    match result {
        // Return empty string for null values
        serde_json::Value::Null => Ok(String::new()),
        // If it's a string, use that
        serde_json::Value::String(s) => {
            // Handle "null" string specially
            if s == "null" {
                Ok(String::new())
            } else {
                Ok(s)
            }
        }
        // Otherwise try to convert to a string
        _ => match serde_json::to_string(&result) {
            Ok(s) => Ok(s),
            Err(_) => Ok(String::new()),
        },
    }
}

// Custom deserializer for code_writer_config that handles the "null" string case
fn deserialize_code_writer_config<'de, D>(
    deserializer: D,
) -> Result<Option<CodeWriterConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    // This handles multiple possible input types
    let value = serde_json::Value::deserialize(deserializer)?;

    match value {
        // If it's explicitly null or the string "null", return None
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) if s == "null" => Ok(None),
        // Otherwise try to parse it as CodeWriterConfig
        _ => {
            match serde_json::from_value::<CodeWriterConfig>(value.clone()) {
                Ok(config) => {
                    tracing::debug!("Successfully parsed CodeWriterConfig: {:?}", config);
                    Ok(Some(config))
                }
                Err(e) => {
                    // Log the error and the value for debugging
                    tracing::error!("Failed to parse CodeWriterConfig: {}. Value: {}", e, value);
                    Ok(None) // Fall back to None on parse error
                }
            }
        }
    }
}

/// Default mode_name for Initialize
fn default_mode_name() -> ModeName {
    ModeName::Wcgw
}

/// Default init_type for Initialize
fn default_init_type() -> InitializeType {
    InitializeType::FirstCall
}

// Mode types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Modes {
    Wcgw,
    Architect,
    CodeWriter,
}

// Implement schema generation for Modes
impl JsonSchema for Modes {
    fn schema_name() -> String {
        "Modes".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        let mut schema = schemars::schema::SchemaObject::default();
        schema.metadata().description = Some("Internal representation of modes".to_string());
        let enum_values = vec![
            serde_json::Value::String("wcgw".to_string()),
            serde_json::Value::String("architect".to_string()),
            serde_json::Value::String("code_writer".to_string()),
        ];
        schema.enum_values = Some(enum_values);
        schema.into()
    }
}

// Bash command mode
#[derive(Debug, Clone, JsonSchema, PartialEq)]
pub struct BashCommandMode {
    pub bash_mode: BashMode,
    pub allowed_commands: AllowedCommands,
}

#[derive(Debug, Clone, Copy, JsonSchema, PartialEq)]
pub enum BashMode {
    NormalMode,
    RestrictedMode,
}

// File edit mode
#[derive(Debug, Clone, JsonSchema, PartialEq)]
pub struct FileEditMode {
    pub allowed_globs: AllowedGlobs,
}

// Write if empty mode
#[derive(Debug, Clone, JsonSchema, PartialEq)]
pub struct WriteIfEmptyMode {
    pub allowed_globs: AllowedGlobs,
}

/// A non-printable key or control sequence that `SendSpecials` can deliver to
/// the terminal in place of literal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
pub enum Special {
    Enter,
    KeyUp,
    KeyDown,
    KeyLeft,
    KeyRight,
    CtrlC,
    CtrlD,
    CtrlZ,
    Tab,
}

impl Special {
    /// The spelling `state::pty::PtyShell::send_special_key` expects.
    pub fn as_pty_key(self) -> &'static str {
        match self {
            Special::Enter => "Enter",
            Special::KeyUp => "ArrowUp",
            Special::KeyDown => "ArrowDown",
            Special::KeyLeft => "ArrowLeft",
            Special::KeyRight => "ArrowRight",
            Special::CtrlC => "CtrlC",
            Special::CtrlD => "CtrlD",
            Special::CtrlZ => "CtrlZ",
            Special::Tab => "Tab",
        }
    }
}

impl Serialize for Special {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(match self {
            Special::Enter => "enter",
            Special::KeyUp => "key_up",
            Special::KeyDown => "key_down",
            Special::KeyLeft => "key_left",
            Special::KeyRight => "key_right",
            Special::CtrlC => "ctrl_c",
            Special::CtrlD => "ctrl_d",
            Special::CtrlZ => "ctrl_z",
            Special::Tab => "tab",
        })
    }
}

// Accepts both the original snake_case spelling and the "Ctrl-C"/"CtrlC" style
// aliases the original Python client's SendSpecials payloads used.
impl<'de> Deserialize<'de> for Special {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "enter" | "Enter" => Ok(Special::Enter),
            "key_up" | "KeyUp" | "ArrowUp" => Ok(Special::KeyUp),
            "key_down" | "KeyDown" | "ArrowDown" => Ok(Special::KeyDown),
            "key_left" | "KeyLeft" | "ArrowLeft" => Ok(Special::KeyLeft),
            "key_right" | "KeyRight" | "ArrowRight" => Ok(Special::KeyRight),
            "ctrl_c" | "CtrlC" | "Ctrl-C" => Ok(Special::CtrlC),
            "ctrl_d" | "CtrlD" | "Ctrl-D" => Ok(Special::CtrlD),
            "ctrl_z" | "CtrlZ" | "Ctrl-Z" => Ok(Special::CtrlZ),
            "tab" | "Tab" => Ok(Special::Tab),
            other => Err(serde::de::Error::custom(format!("Unknown special key: {other}"))),
        }
    }
}

/// The action a `BashCommand` call requests. Exactly one variant is carried
/// per call; all are addressable at a background shell via `bg_command_id`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(untagged)]
pub enum BashAction {
    Command {
        command: String,
    },
    StatusCheck {
        #[serde(default)]
        status_check: bool,
    },
    SendText {
        send_text: String,
    },
    SendSpecials {
        send_specials: Vec<Special>,
    },
    SendAscii {
        send_ascii: Vec<u8>,
    },
}

/// Request payload for the `BashCommand` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BashCommand {
    pub chat_id: String,
    pub action_json: BashAction,
    #[serde(default)]
    pub wait_for_seconds: Option<f32>,
    /// Targets a previously-backgrounded shell instead of the foreground one.
    #[serde(default)]
    pub bg_command_id: Option<String>,
    #[serde(default)]
    pub is_background: bool,
}

/// Request payload for the `FileWriteOrEdit` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FileWriteOrEdit {
    pub chat_id: String,
    pub file_path: String,
    /// Estimated percentage of the file's lines the edit touches; guides
    /// whether the read-coverage whitelist is required for this write.
    pub percentage_to_change: u8,
    pub file_content_or_search_replace_blocks: String,
}

/// Request payload for the `ReadFiles` tool. Each entry of `file_paths` may
/// carry a `:start-end`, `:N`, `:-N` or `:N-` line-range suffix.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReadFiles {
    pub chat_id: String,
    pub file_paths: Vec<String>,
    #[serde(default)]
    pub show_line_numbers_reason: Option<String>,
}

/// Request payload for the `ReadImage` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReadImage {
    pub chat_id: String,
    pub file_path: String,
}

/// Request payload for the `ContextSave` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ContextSave {
    pub id: String,
    pub project_root_path: String,
    pub description: String,
    pub relevant_file_globs: Vec<String>,
}
