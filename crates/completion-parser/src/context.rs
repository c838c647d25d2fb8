use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i-u:startup name:)[ \t]*([^\n]+)").expect("valid regex"));
static DESCRIPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i-u:description:)[ \t]*([^\n]+)").expect("valid regex"));

/// Startup details pulled out of a free-form context block such as
///
/// ```text
/// Startup Name: Acme
/// Description: Rockets for coyotes
/// Founder: W. E. Coyote
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StartupContext {
    pub name: String,
    pub description: String,
}

impl StartupContext {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.description.is_empty()
    }
}

pub fn parse_startup_context(context: &str) -> StartupContext {
    StartupContext {
        name: first_value(&NAME_RE, context),
        description: first_value(&DESCRIPTION_RE, context),
    }
}

fn first_value(re: &Regex, text: &str) -> String {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}
