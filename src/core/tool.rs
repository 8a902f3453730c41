use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use super::error::LlmError;
use super::types::{BoxFuture, Tool, ToolCall};

/// A function the model can call. Usually generated by `#[tool]`.
pub trait ToolFunction: Send + Sync {
    fn schema(&self) -> Tool;

    fn execute<'a>(&'a self, params: Value) -> BoxFuture<'a, Result<Value, LlmError>>;
}

/// Thread-safe name to tool map.
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<dyn ToolFunction>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: RwLock::new(HashMap::new()),
        }
    }

    /// Register a tool. Fails if a tool with the same name is already present.
    pub fn register(&self, tool: Arc<dyn ToolFunction>) -> Result<(), LlmError> {
        let name = tool.schema().name;
        let mut tools = self.write_lock(&name)?;

        if tools.contains_key(&name) {
            return Err(LlmError::ToolRegistration {
                message: format!("Tool '{name}' is already registered"),
                tool_name: name,
            });
        }

        tools.insert(name, tool);
        Ok(())
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn overwrite(&self, tool: Arc<dyn ToolFunction>) -> Result<(), LlmError> {
        let name = tool.schema().name;
        self.write_lock(&name)?.insert(name, tool);
        Ok(())
    }

    /// Schemas of all registered tools, sorted by name.
    pub fn get_schemas(&self) -> Result<Vec<Tool>, LlmError> {
        let tools = self.tools.read().map_err(|_| LlmError::ToolExecution {
            message: "Tool registry lock poisoned".to_string(),
            source: None,
        })?;

        let mut schemas: Vec<Tool> = tools.values().map(|tool| tool.schema()).collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(schemas)
    }

    #[tracing::instrument(name = "tool_execute", skip(self, tool_call), fields(tool = %tool_call.name), err)]
    pub async fn execute(&self, tool_call: &ToolCall) -> Result<Value, LlmError> {
        let tool = {
            let tools = self.tools.read().map_err(|_| LlmError::ToolExecution {
                message: "Tool registry lock poisoned".to_string(),
                source: None,
            })?;
            tools.get(&tool_call.name).cloned()
        };

        match tool {
            Some(tool) => tool.execute(tool_call.arguments.clone()).await,
            None => Err(LlmError::ToolNotFound(tool_call.name.clone())),
        }
    }

    fn write_lock(
        &self,
        name: &str,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<dyn ToolFunction>>>, LlmError>
    {
        self.tools.write().map_err(|_| LlmError::ToolRegistration {
            tool_name: name.to_string(),
            message: "Tool registry lock poisoned".to_string(),
        })
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A registry built by `toolset![]`.
pub struct ToolSet {
    pub registry: ToolRegistry,
}

impl ToolSet {
    pub fn tools(&self) -> Result<Vec<Tool>, LlmError> {
        self.registry.get_schemas()
    }
}
