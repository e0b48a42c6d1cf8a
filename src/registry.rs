use crate::client::GitlabClient;
use crate::naming;
use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, JsonObject, Tool};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<CallToolResult, McpError>> + Send>>;

/// Tool handlers are plain function pointers so the registry stays `'static`
/// and cheap to share. Each one receives the shared client and the raw
/// arguments object from the request.
pub type Handler = fn(Arc<GitlabClient>, JsonObject) -> HandlerFuture;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    pub fn is_read_only(self) -> bool {
        matches!(self, Method::Get)
    }
}

/// A REST endpoint in the upstream API. The tool name is derived from it,
/// so the registry never carries hand-written names that could drift.
#[derive(Debug, Clone, Copy)]
pub struct Endpoint {
    pub method: Method,
    pub path: &'static str,
}

impl Endpoint {
    pub const fn new(method: Method, path: &'static str) -> Self {
        Self { method, path }
    }

    pub fn tool_name(&self) -> String {
        naming::tool_name(self.method.as_str(), self.path)
    }
}

/// Builder for the `inputSchema` object of a tool. Parameter names keep the
/// upstream API spelling even where the tool name abbreviates path segments.
#[derive(Debug, Default)]
pub struct Schema {
    properties: Map<String, Value>,
    required: Vec<String>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    fn property(mut self, name: &str, value: Value) -> Self {
        self.properties.insert(name.to_string(), value);
        self
    }

    fn require(mut self, name: &str) -> Self {
        self.required.push(name.to_string());
        self
    }

    pub fn string(self, name: &str, description: &str) -> Self {
        self.property(name, json!({"type": "string", "description": description}))
    }

    pub fn string_required(self, name: &str, description: &str) -> Self {
        self.string(name, description).require(name)
    }

    pub fn string_default(self, name: &str, description: &str, default: &str) -> Self {
        self.property(
            name,
            json!({"type": "string", "description": description, "default": default}),
        )
    }

    pub fn string_enum(self, name: &str, description: &str, values: &[&str]) -> Self {
        self.property(
            name,
            json!({"type": "string", "description": description, "enum": values}),
        )
    }

    pub fn string_enum_required(self, name: &str, description: &str, values: &[&str]) -> Self {
        self.string_enum(name, description, values).require(name)
    }

    pub fn string_enum_default(
        self,
        name: &str,
        description: &str,
        values: &[&str],
        default: &str,
    ) -> Self {
        self.property(
            name,
            json!({
                "type": "string",
                "description": description,
                "enum": values,
                "default": default,
            }),
        )
    }

    pub fn integer(self, name: &str, description: &str) -> Self {
        self.property(name, json!({"type": "integer", "description": description}))
    }

    pub fn integer_required(self, name: &str, description: &str) -> Self {
        self.integer(name, description).require(name)
    }

    pub fn integer_default(self, name: &str, description: &str, default: i64) -> Self {
        self.property(
            name,
            json!({"type": "integer", "description": description, "default": default}),
        )
    }

    pub fn boolean(self, name: &str, description: &str) -> Self {
        self.property(name, json!({"type": "boolean", "description": description}))
    }

    pub fn boolean_required(self, name: &str, description: &str) -> Self {
        self.boolean(name, description).require(name)
    }

    pub fn boolean_default(self, name: &str, description: &str, default: bool) -> Self {
        self.property(
            name,
            json!({"type": "boolean", "description": description, "default": default}),
        )
    }

    pub fn into_object(self) -> JsonObject {
        let mut object = Map::new();
        object.insert("type".to_string(), json!("object"));
        object.insert("properties".to_string(), Value::Object(self.properties));
        if !self.required.is_empty() {
            object.insert("required".to_string(), json!(self.required));
        }
        object
    }
}

pub struct RegisteredTool {
    pub tool: Tool,
    pub handler: Handler,
    pub read_only: bool,
}

impl RegisteredTool {
    pub fn name(&self) -> &str {
        self.tool.name.as_ref()
    }
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        endpoint: Endpoint,
        description: &str,
        schema: Schema,
        handler: Handler,
    ) {
        let name = endpoint.tool_name();
        debug_assert!(
            name.len() <= naming::MAX_TOOL_NAME_LEN,
            "tool name '{name}' exceeds {} characters",
            naming::MAX_TOOL_NAME_LEN
        );
        debug_assert!(
            !self.index.contains_key(&name),
            "tool '{name}' registered twice"
        );

        let tool = Tool::new(name.clone(), description.to_string(), schema.into_object());
        self.index.insert(name, self.tools.len());
        self.tools.push(RegisteredTool {
            tool,
            handler,
            read_only: endpoint.method.is_read_only(),
        });
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredTool> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::Content;

    fn noop_handler(_client: Arc<GitlabClient>, _args: JsonObject) -> HandlerFuture {
        Box::pin(async { Ok(CallToolResult::success(vec![Content::text("ok")])) })
    }

    #[test]
    fn test_schema_builder_shapes_properties_and_required() {
        let schema = Schema::new()
            .string_required("id", "The project ID or URL-encoded path")
            .string("labels", "Comma-separated label names")
            .integer_default("page", "Page number", 1)
            .boolean("remove_source_branch", "Delete the branch after merging")
            .string_enum_default("state", "Filter by state", &["opened", "closed"], "opened")
            .into_object();

        assert_eq!(schema["type"], "object");
        let properties = schema["properties"].as_object().unwrap();
        assert_eq!(properties["id"]["type"], "string");
        assert_eq!(properties["page"]["type"], "integer");
        assert_eq!(properties["page"]["default"], 1);
        assert_eq!(properties["remove_source_branch"]["type"], "boolean");
        assert_eq!(
            properties["state"]["enum"],
            serde_json::json!(["opened", "closed"])
        );
        assert_eq!(properties["state"]["default"], "opened");
        assert_eq!(schema["required"], serde_json::json!(["id"]));
    }

    #[test]
    fn test_schema_without_required_omits_the_key() {
        let schema = Schema::new().string("search", "Search term").into_object();
        assert!(!schema.contains_key("required"));
    }

    #[test]
    fn test_registry_lookup_and_read_only_classification() {
        let mut registry = ToolRegistry::new();
        registry.register(
            Endpoint::new(Method::Get, "/projects"),
            "List projects",
            Schema::new(),
            noop_handler,
        );
        registry.register(
            Endpoint::new(Method::Post, "/projects/{id}/issues"),
            "Create an issue",
            Schema::new().string_required("id", "Project ID"),
            noop_handler,
        );

        assert_eq!(registry.len(), 2);

        let list = registry.get("get_pjs").expect("get_pjs should exist");
        assert!(list.read_only);
        assert_eq!(list.tool.description.as_deref(), Some("List projects"));

        let create = registry
            .get("post_pjs_id_issues")
            .expect("post_pjs_id_issues should exist");
        assert!(!create.read_only);

        assert!(registry.get("get_missing").is_none());
    }

    #[test]
    fn test_endpoint_names_follow_abbreviation_rules() {
        let endpoint = Endpoint::new(
            Method::Put,
            "/projects/{id}/merge_requests/{merge_request_iid}",
        );
        assert_eq!(endpoint.tool_name(), "put_pjs_id_mrs_mr_iid");
    }
}
