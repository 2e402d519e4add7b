//! Embeddable widget and the two HTML pages served next to it
//!
//! The payloads are rendered once at startup from the configured assistant
//! name, fallback endpoint and storage key, then served as-is.

use serde_json::Value;

use crate::config::Config;

const WIDGET_TEMPLATE: &str = include_str!("assets/widget.js");
const TEST_PAGE_TEMPLATE: &str = include_str!("assets/test.html");
const DEMO_PAGE_TEMPLATE: &str = include_str!("assets/demo.html");

const NAME_SLOT: &str = "__ASSISTANT_NAME__";
const ENDPOINT_SLOT: &str = "__FALLBACK_ENDPOINT__";
const STORAGE_SLOT: &str = "__STORAGE_KEY__";

pub const JAVASCRIPT_CONTENT_TYPE: &str = "application/javascript; charset=utf-8";
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Rendered widget payloads
#[derive(Debug, Clone)]
pub struct WidgetAssets {
    script: String,
    test_page: String,
    demo_page: String,
}

impl WidgetAssets {
    /// Render all payloads for the given configuration
    pub fn render(config: &Config) -> Self {
        let script = WIDGET_TEMPLATE
            .replace(NAME_SLOT, &js_string(&config.assistant.name))
            .replace(ENDPOINT_SLOT, &js_string(&config.widget.fallback_endpoint))
            .replace(STORAGE_SLOT, &js_string(&config.widget.storage_key));

        let name = escape_html(&config.assistant.name);

        Self {
            script,
            test_page: TEST_PAGE_TEMPLATE.replace(NAME_SLOT, &name),
            demo_page: DEMO_PAGE_TEMPLATE.replace(NAME_SLOT, &name),
        }
    }

    /// The `/widget.js` payload
    pub fn script(&self) -> &str {
        &self.script
    }

    /// The `/test` page
    pub fn test_page(&self) -> &str {
        &self.test_page
    }

    /// The `/widget-demo` page
    pub fn demo_page(&self) -> &str {
        &self.demo_page
    }
}

/// Quote a value as a JavaScript string literal
fn js_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
