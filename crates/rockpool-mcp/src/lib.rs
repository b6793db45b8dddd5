//! Rockpool MCP Server
//!
//! An MCP server that exposes rockpool's sandboxed filesystem operations
//! as tools. Every tool argument path is validated against the allowed
//! root directories before any filesystem access, so AI agents can be
//! given file access confined to an explicit sandbox.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    model::*,
    schemars::{self, JsonSchema},
    service::{RequestContext, RoleServer},
};
use rockpool::{AllowedRoots, Edit, OpError};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

/// Parameters for the `list_directory` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListDirectoryParams {
    /// The path of the directory to list.
    pub dir_path: PathBuf,
}

/// Parameters for the `read_file` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadFileParams {
    /// The path of the file to read.
    pub file_path: PathBuf,
}

/// Parameters for the `write_file` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WriteFileParams {
    /// The path of the file to create or overwrite.
    pub file_path: PathBuf,
    /// The text content to write.
    pub content: String,
}

/// Parameters for the `read_multiple_files` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadMultipleFilesParams {
    /// The paths of the files to read, in the order results should come back.
    pub file_paths: Vec<PathBuf>,
}

/// One edit for the `edit_file` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileEdit {
    /// The exact text to find.
    pub old_text: String,
    /// The replacement text.
    pub new_text: String,
}

impl From<FileEdit> for Edit {
    fn from(edit: FileEdit) -> Self {
        Edit {
            old_text: edit.old_text,
            new_text: edit.new_text,
        }
    }
}

/// Parameters for the `edit_file` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EditFileParams {
    /// The path of the file to edit.
    pub file_path: PathBuf,
    /// The edits to apply, in order.
    pub edits: Vec<FileEdit>,
    /// If true, return the diff without changing the file (default: false).
    #[serde(default)]
    pub dry_run: bool,
}

/// Parameters for the `create_directory` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDirectoryParams {
    /// The path of the directory to create.
    pub dir_path: PathBuf,
}

/// Parameters for the `move_file` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoveFileParams {
    /// The path of the file or directory to move.
    pub source_path: PathBuf,
    /// The destination path; must not already exist.
    pub destination_path: PathBuf,
}

/// Parameters for the `get_file_info` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetFileInfoParams {
    /// The path of the file or directory to stat.
    pub path: PathBuf,
}

/// Parameters for the `list_allowed_directories` tool (none).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ListAllowedDirectoriesParams {}

/// MCP server exposing sandboxed filesystem operations.
#[derive(Clone)]
pub struct RockpoolServer {
    roots: Arc<AllowedRoots>,
}

impl std::fmt::Debug for RockpoolServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RockpoolServer").finish_non_exhaustive()
    }
}

fn map_op_error(e: OpError) -> McpError {
    match e {
        OpError::Io(_) => McpError::internal_error(e.to_string(), None),
        _ => McpError::invalid_params(e.to_string(), None),
    }
}

fn text_result(text: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text.into())])
}

impl RockpoolServer {
    /// Create a server operating within the given allowed roots.
    pub fn new(roots: AllowedRoots) -> Self {
        Self {
            roots: Arc::new(roots),
        }
    }

    fn list_directory(&self, params: ListDirectoryParams) -> Result<CallToolResult, McpError> {
        let entries = rockpool::ops::list_directory(&self.roots, &params.dir_path)
            .map_err(map_op_error)?;
        let formatted: Vec<String> = entries
            .iter()
            .map(|entry| match entry.kind {
                rockpool::EntryKind::Directory => format!("[DIR] {}", entry.name),
                rockpool::EntryKind::File => format!("[FILE] {}", entry.name),
            })
            .collect();
        Ok(text_result(formatted.join("\n")))
    }

    fn read_file(&self, params: ReadFileParams) -> Result<CallToolResult, McpError> {
        let content =
            rockpool::ops::read_file(&self.roots, &params.file_path).map_err(map_op_error)?;
        Ok(text_result(content))
    }

    fn write_file(&self, params: WriteFileParams) -> Result<CallToolResult, McpError> {
        rockpool::ops::write_file(&self.roots, &params.file_path, &params.content)
            .map_err(map_op_error)?;
        Ok(text_result(format!(
            "Successfully wrote to {}",
            params.file_path.display()
        )))
    }

    fn read_multiple_files(
        &self,
        params: ReadMultipleFilesParams,
    ) -> Result<CallToolResult, McpError> {
        let outcomes = rockpool::ops::read_multiple_files(&self.roots, &params.file_paths);
        let rendered: Vec<String> = outcomes
            .into_iter()
            .map(|outcome| match outcome.result {
                Ok(content) => format!("{}:\n{}", outcome.path.display(), content),
                Err(message) => format!("{}: Error - {}", outcome.path.display(), message),
            })
            .collect();
        Ok(text_result(rendered.join("\n---\n")))
    }

    fn edit_file(&self, params: EditFileParams) -> Result<CallToolResult, McpError> {
        let edits: Vec<Edit> = params.edits.into_iter().map(Into::into).collect();
        let diff = rockpool::edit_file(&self.roots, &params.file_path, &edits, params.dry_run)
            .map_err(map_op_error)?;
        Ok(text_result(diff))
    }

    fn create_directory(&self, params: CreateDirectoryParams) -> Result<CallToolResult, McpError> {
        rockpool::ops::create_directory(&self.roots, &params.dir_path).map_err(map_op_error)?;
        Ok(text_result(format!(
            "Directory created or already exists: {}",
            params.dir_path.display()
        )))
    }

    fn move_file(&self, params: MoveFileParams) -> Result<CallToolResult, McpError> {
        rockpool::ops::move_file(&self.roots, &params.source_path, &params.destination_path)
            .map_err(map_op_error)?;
        Ok(text_result(format!(
            "Successfully moved {} to {}",
            params.source_path.display(),
            params.destination_path.display()
        )))
    }

    fn get_file_info(&self, params: GetFileInfoParams) -> Result<CallToolResult, McpError> {
        let info =
            rockpool::ops::get_file_info(&self.roots, &params.path).map_err(map_op_error)?;
        let rendered = serde_json::to_string_pretty(&info)
            .map_err(|e| McpError::internal_error(format!("serialization error: {e}"), None))?;
        Ok(text_result(rendered))
    }

    fn list_allowed_directories(&self) -> CallToolResult {
        let listed: Vec<String> = self
            .roots
            .iter()
            .map(|root| root.display().to_string())
            .collect();
        text_result(listed.join("\n"))
    }
}

fn make_tool(
    name: &'static str,
    title: &'static str,
    description: &'static str,
    schema: serde_json::Value,
) -> Tool {
    let input_schema = match schema {
        serde_json::Value::Object(map) => Arc::new(map),
        _ => Arc::new(serde_json::Map::new()),
    };
    Tool {
        name: name.into(),
        title: Some(title.into()),
        description: Some(description.into()),
        input_schema,
        output_schema: None,
        annotations: None,
        icons: None,
        meta: None,
    }
}

fn schema_json<P: JsonSchema>() -> serde_json::Value {
    let schema = schemars::schema_for!(P);
    serde_json::to_value(schema).unwrap_or_default()
}

fn all_tools() -> Vec<Tool> {
    vec![
        make_tool(
            "list_directory",
            "List Directory",
            "Get a detailed listing of all files and directories in a specified path. \
            Results clearly distinguish between files and directories with [DIR] and \
            [FILE] prefixes. Only works within allowed directories.",
            schema_json::<ListDirectoryParams>(),
        ),
        make_tool(
            "read_file",
            "Read File",
            "Read the complete contents of a file from the file system as UTF-8 text. \
            Only works within allowed directories.",
            schema_json::<ReadFileParams>(),
        ),
        make_tool(
            "write_file",
            "Write File",
            "Create a new file or completely overwrite an existing file with new content. \
            Use with caution as it will overwrite existing files without warning. \
            Only works within allowed directories.",
            schema_json::<WriteFileParams>(),
        ),
        make_tool(
            "read_multiple_files",
            "Read Multiple Files",
            "Read the contents of multiple files in one call. Each file's content is \
            returned with its path as a reference, and failed reads for individual \
            files won't stop the entire operation. Only works within allowed directories.",
            schema_json::<ReadMultipleFilesParams>(),
        ),
        make_tool(
            "edit_file",
            "Edit File",
            "Make edits to a text file by replacing exact text sequences with new \
            content. Returns a unified diff of the changes. If dryRun is true, returns \
            the diff without modifying the file. Only works within allowed directories.",
            schema_json::<EditFileParams>(),
        ),
        make_tool(
            "create_directory",
            "Create Directory",
            "Create a new directory or ensure a directory exists, creating any missing \
            parent directories. Succeeds silently if the directory already exists. \
            Only works within allowed directories.",
            schema_json::<CreateDirectoryParams>(),
        ),
        make_tool(
            "move_file",
            "Move File",
            "Move or rename files and directories. Fails if the destination already \
            exists. Both source and destination must be within allowed directories.",
            schema_json::<MoveFileParams>(),
        ),
        make_tool(
            "get_file_info",
            "Get File Info",
            "Retrieve detailed metadata about a file or directory: size, timestamps, \
            type flags, and permissions. Only works within allowed directories.",
            schema_json::<GetFileInfoParams>(),
        ),
        make_tool(
            "list_allowed_directories",
            "List Allowed Directories",
            "Returns the list of root directories that this server is allowed to \
            access. Use this to understand the sandbox boundary before trying to \
            access files.",
            schema_json::<ListAllowedDirectoriesParams>(),
        ),
    ]
}

fn parse_params<P: DeserializeOwned>(request: &CallToolRequestParam) -> Result<P, McpError> {
    match &request.arguments {
        Some(args) => serde_json::from_value(serde_json::Value::Object(args.clone()))
            .map_err(|e| McpError::invalid_params(format!("Invalid parameters: {e}"), None)),
        None => Err(McpError::invalid_params("Missing parameters", None)),
    }
}

impl ServerHandler for RockpoolServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Rockpool provides filesystem access confined to a set of allowed root \
                directories. Use 'list_allowed_directories' to discover the sandbox \
                boundary, then list, read, write, edit, and move files within it. \
                Every path is validated against the allowed roots; operations on paths \
                outside them are rejected."
                    .into(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: all_tools(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = %request.name, "tool call");
        match request.name.as_ref() {
            "list_directory" => self.list_directory(parse_params(&request)?),
            "read_file" => self.read_file(parse_params(&request)?),
            "write_file" => self.write_file(parse_params(&request)?),
            "read_multiple_files" => self.read_multiple_files(parse_params(&request)?),
            "edit_file" => self.edit_file(parse_params(&request)?),
            "create_directory" => self.create_directory(parse_params(&request)?),
            "move_file" => self.move_file(parse_params(&request)?),
            "get_file_info" => self.get_file_info(parse_params(&request)?),
            "list_allowed_directories" => Ok(self.list_allowed_directories()),
            _ => Err(McpError::invalid_params(
                format!("Unknown tool: {}", request.name),
                None,
            )),
        }
    }
}
