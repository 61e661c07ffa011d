//! YAML rendering for template bodies
//!
//! Processors build a JSON tree where templated fields carry the encoding
//! produced by [`Templated::to_json`](crate::template::Templated::to_json).
//! [`render`] serializes the tree and rewrites those encodings into Helm
//! template syntax:
//!
//! - inline markers lose the marker and the YAML quotes around them
//! - block markers become `key: {{- toYaml .Values.x | nindent N }}`
//! - the [`INCLUDE_KEY`] entry of a mapping becomes `{{- include ... | nindent N }}`
//!
//! Literal strings containing `{{` are escaped so Helm renders them verbatim.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value as JsonValue};

use crate::error::Result;
use crate::template::Templated;

/// Prefix marking a string as an inline template expression
pub const INLINE_MARKER: &str = "__inline__:";

/// Prefix marking a string as a values block lookup
pub const BLOCK_MARKER: &str = "__block__:";

/// Mapping key carrying a helper include merged into that mapping
pub const INCLUDE_KEY: &str = "__include__";

/// A mapping key as serde_yaml emits it: plain, single- or double-quoted
const KEY: &str = r#"(?:'(?:[^']|'')*'|"(?:[^"\\]|\\.)*"|[^\s'"][^:]*)"#;

static BLOCK_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?P<lead>\s*(?:- )*)(?P<key>{KEY}): '?__block__:(?P<path>[^'\s]+)'?\s*$"
    ))
    .expect("valid regex")
});

static INCLUDE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<indent>\s*)__include__: (?P<call>.+?)\s*$").expect("valid regex")
});

static INLINE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?P<lead>\s*(?:- )*(?:{KEY}: )?)(?:'__inline__:(?P<quoted>.*)'|__inline__:(?P<plain>.*))\s*$"
    ))
    .expect("valid regex")
});

/// Insert a helper include into a literal mapping
pub fn with_include(mut map: Map<String, JsonValue>, include: &Templated) -> JsonValue {
    map.insert(INCLUDE_KEY.to_string(), include.to_json());
    JsonValue::Object(map)
}

/// Serialize `value` as template text, indented by `indent` spaces
pub fn render(value: &JsonValue, indent: usize) -> Result<String> {
    let mut value = value.clone();
    escape_literals(&mut value);
    let raw = serde_yaml::to_string(&value)?;
    let pad = " ".repeat(indent);
    let mut out = String::with_capacity(raw.len() + 64);

    for line in raw.lines() {
        let line = rewrite_line(line);
        out.push_str(&pad);
        out.push_str(&line);
        out.push('\n');
    }

    Ok(fix_nindent(&out, indent))
}

/// Serialize `{ key: value }` as a template section
pub fn render_section(key: &str, value: &JsonValue, indent: usize) -> Result<String> {
    let mut map = Map::new();
    map.insert(key.to_string(), value.clone());
    render(&JsonValue::Object(map), indent)
}

fn rewrite_line(line: &str) -> String {
    if let Some(caps) = BLOCK_LINE.captures(line) {
        let lead = &caps["lead"];
        let column = lead.len();
        return format!(
            "{lead}{key}: {{{{- toYaml {path} | nindent {n} }}}}",
            key = &caps["key"],
            path = &caps["path"],
            n = column + 2,
        );
    }

    if let Some(caps) = INCLUDE_LINE.captures(line) {
        let indent = caps["indent"].len();
        let call = unquote(&caps["call"]);
        return format!(
            "{pad}{{{{- {call} | nindent {indent} }}}}",
            pad = " ".repeat(indent.saturating_sub(2)),
        );
    }

    if let Some(caps) = INLINE_LINE.captures(line) {
        let expr = match (caps.name("quoted"), caps.name("plain")) {
            (Some(quoted), _) => quoted.as_str().replace("''", "'"),
            (None, Some(plain)) => plain.as_str().to_string(),
            (None, None) => String::new(),
        };
        return format!("{}{}", &caps["lead"], expr);
    }

    line.to_string()
}

/// Escape `{{` in literal strings; marked strings and includes are kept
fn escape_literals(value: &mut JsonValue) {
    match value {
        JsonValue::String(s) => {
            if s.contains("{{") && !s.starts_with(INLINE_MARKER) && !s.starts_with(BLOCK_MARKER) {
                *s = s.replace("{{", "{{ \"{{\" }}");
            }
        }
        JsonValue::Array(items) => items.iter_mut().for_each(escape_literals),
        JsonValue::Object(map) => {
            for (key, item) in map.iter_mut() {
                if key != INCLUDE_KEY {
                    escape_literals(item);
                }
            }
        }
        _ => {}
    }
}

/// `nindent` values are computed before the section indent is applied;
/// shift them by the same amount.
fn fix_nindent(text: &str, indent: usize) -> String {
    if indent == 0 {
        return text.to_string();
    }
    static NINDENT: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\| nindent (\d+) \}\}").expect("valid regex"));
    NINDENT
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let n: usize = caps[1].parse().unwrap_or(0);
            format!("| nindent {} }}}}", n + indent)
        })
        .into_owned()
}

fn unquote(s: &str) -> String {
    match s.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        Some(inner) => inner.replace("''", "'"),
        None => match s.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
            Some(inner) => inner.replace("\\\"", "\""),
            None => s.to_string(),
        },
    }
}
