use serde_json::{Map, Value};

use super::router::{HttpError, INTERNAL_ERROR};

/// A named template and the data it is rendered with.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    name: &'static str,
    model: Map<String, Value>,
}

impl View {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            model: Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.model.insert(key.to_string(), value);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn model(&self) -> &Map<String, Value> {
        &self.model
    }
}

/// What a handler answers with, before it becomes an HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    View(View),
    Json(Value),
    NoContent,
    Redirect(String),
}

pub trait ViewRenderer: Send + Sync {
    fn content_type(&self) -> &'static str;
    fn render(&self, view: &View) -> Result<String, HttpError<'static>>;
}

/// Renders a view as `{"view": <name>, "model": {...}}` for clients that
/// do their own templating.
pub struct JsonViewRenderer;

impl ViewRenderer for JsonViewRenderer {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn render(&self, view: &View) -> Result<String, HttpError<'static>> {
        let body = serde_json::json!({
            "view": view.name(),
            "model": view.model(),
        });
        serde_json::to_string(&body).map_err(|e| {
            tracing::error!("Cannot render view {}: {}", view.name(), e);
            INTERNAL_ERROR
        })
    }
}
