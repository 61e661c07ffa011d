//! Name registry
//!
//! Maps the plain names found in rendered manifests to the names used in
//! the chart. The mapping is a pure function of the plain name and the
//! chart identity, so a processor can rewrite a reference to an object it
//! never processes and still agree with the processor that owns it.

use indexmap::IndexMap;
use std::sync::Mutex;

use crate::template::Templated;

#[derive(Debug, Clone, PartialEq, Eq)]
struct NameEntry {
    trimmed: String,
    templated: String,
}

/// Cached plain-name → chart-name mapping for one run
#[derive(Debug)]
pub struct NameRegistry {
    chart_name: String,
    prefix: String,
    cache: Mutex<IndexMap<String, NameEntry>>,
}

impl NameRegistry {
    /// `chart_name` selects the helper templates, `fullname_prefix` is the
    /// prefix stripped from plain names (normally `<chart_name>-`).
    pub fn new(chart_name: impl Into<String>, fullname_prefix: impl Into<String>) -> Self {
        Self {
            chart_name: chart_name.into(),
            prefix: fullname_prefix.into(),
            cache: Mutex::new(IndexMap::new()),
        }
    }

    /// Record a name. Idempotent.
    pub fn register(&self, plain: &str) {
        self.entry(plain);
    }

    /// An earlier, different plain name that maps to the same values root
    /// as `plain` (`web-svc` and `web.svc` both become `webSvc`)
    pub fn collision(&self, plain: &str) -> Option<String> {
        let templated = self.templated_name(plain);
        self.lock()
            .iter()
            .find(|(other, entry)| other.as_str() != plain && entry.templated == templated)
            .map(|(other, _)| other.clone())
    }

    /// Names recorded so far, in first-seen order
    pub fn registered(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Plain name with the chart prefix removed
    pub fn trimmed_name(&self, plain: &str) -> String {
        self.entry(plain).trimmed
    }

    /// Identifier used as the values root key for an object
    pub fn templated_name(&self, plain: &str) -> String {
        self.entry(plain).templated
    }

    /// Expression that renders to the object's name in the installed chart
    pub fn templated_reference(&self, plain: &str) -> Templated {
        let trimmed = self.trimmed_name(plain);
        Templated::Inline(format!(
            "{{{{ include \"{}.fullname\" . }}}}-{}",
            self.chart_name, trimmed
        ))
    }

    fn entry(&self, plain: &str) -> NameEntry {
        let mut cache = self.lock();
        if let Some(entry) = cache.get(plain) {
            return entry.clone();
        }
        let trimmed = trim_prefix(plain, &self.prefix).to_string();
        let entry = NameEntry {
            templated: lower_camel(&trimmed),
            trimmed,
        };
        cache.insert(plain.to_string(), entry.clone());
        entry
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, IndexMap<String, NameEntry>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn trim_prefix<'a>(plain: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return plain;
    }
    plain.strip_prefix(prefix).unwrap_or(plain)
}

/// Convert a DNS-style name to a lowerCamelCase template identifier
/// (`my-web.svc` → `myWebSvc`). A leading digit gets a `_` prefix, since
/// `.Values.2fa` does not parse as a field chain.
pub fn lower_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;

    for c in name.chars() {
        if !c.is_ascii_alphanumeric() {
            upper_next = !out.is_empty();
            continue;
        }
        if out.is_empty() {
            out.push(c.to_ascii_lowercase());
        } else if upper_next {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
        upper_next = false;
    }

    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> NameRegistry {
        NameRegistry::new("myapp", "myapp-")
    }

    #[test]
    fn test_trimmed_name_strips_prefix() {
        let names = registry();
        assert_eq!(names.trimmed_name("myapp-web"), "web");
        assert_eq!(names.trimmed_name("other-web"), "other-web");
        assert_eq!(names.trimmed_name("myapp"), "myapp");
        assert_eq!(names.trimmed_name(""), "");
    }

    #[test]
    fn test_trimmed_name_matches_slice() {
        let names = registry();
        for n in ["myapp-a", "myapp-web-svc", "myapp-", "web"] {
            let expected = if n.starts_with("myapp-") { &n["myapp-".len()..] } else { n };
            assert_eq!(names.trimmed_name(n), expected);
        }
    }

    #[test]
    fn test_templated_name_is_camel() {
        let names = registry();
        assert_eq!(names.templated_name("myapp-web-svc"), "webSvc");
        assert_eq!(names.templated_name("redis.master"), "redisMaster");
    }

    #[test]
    fn test_templated_name_is_identifier() {
        let names = registry();
        for plain in ["app-2fa-svc", "myapp-2fa-svc", "myapp-9", "web"] {
            let name = names.templated_name(plain);
            let first = name.chars().next().unwrap();
            assert!(first.is_ascii_alphabetic() || first == '_', "{plain} -> {name}");
            assert!(name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        }
        assert_eq!(names.templated_name("myapp-2fa-svc"), "_2faSvc");
    }

    #[test]
    fn test_collision_between_spellings() {
        let names = registry();
        names.register("myapp-web-svc");
        assert_eq!(names.collision("myapp-web-svc"), None);
        assert_eq!(names.collision("myapp-api"), None);

        names.register("myapp-web.svc");
        assert_eq!(names.collision("myapp-web.svc"), Some("myapp-web-svc".to_string()));
        assert_eq!(names.collision("web_svc"), Some("myapp-web-svc".to_string()));
    }

    #[test]
    fn test_naming_is_idempotent() {
        let names = registry();
        let first = names.templated_name("myapp-api");
        let second = names.templated_name("myapp-api");
        assert_eq!(first, second);
        assert_eq!(
            names.templated_reference("myapp-api"),
            names.templated_reference("myapp-api")
        );
    }

    #[test]
    fn test_templated_reference() {
        let names = registry();
        assert_eq!(
            names.templated_reference("myapp-my-svc").as_str(),
            "{{ include \"myapp.fullname\" . }}-my-svc"
        );
    }

    #[test]
    fn test_register_is_idempotent() {
        let names = registry();
        names.register("myapp-a");
        names.register("myapp-b");
        names.register("myapp-a");
        assert_eq!(names.registered(), vec!["myapp-a", "myapp-b"]);
    }

    #[test]
    fn test_lower_camel() {
        assert_eq!(lower_camel("web"), "web");
        assert_eq!(lower_camel("Web-API"), "webAPI");
        assert_eq!(lower_camel("nginx-1"), "nginx1");
        assert_eq!(lower_camel("123"), "_123");
        assert_eq!(lower_camel("1st"), "_1st");
        assert_eq!(lower_camel("--a--b"), "aB");
        assert_eq!(lower_camel(""), "");
    }
}
