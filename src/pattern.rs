//! Route template compiler.
//!
//! Turns a template such as `/users/:id` into an anchored [`Regex`] plus the
//! ordered list of parameter names. Captures are positional: group `n` holds
//! the value of `params[n - 1]`, and the group after the last parameter holds
//! the raw query string.
//!
//! ```text
//! /users/:id          →  ^/users/([^/?]+)(?:\?(.*))?$
//! /files/:name.json   →  ^/files/([^/?]+)\.json(?:\?(.*))?$
//! /users              →  ^/users(?:\?(.*))?$
//! ```

use std::collections::HashMap;

use regex::Regex;

use crate::error::Error;

/// One parameter: a maximal run of characters that are neither `/` nor the
/// `?` that starts the query string.
const PARAM_GROUP: &str = "([^/?]+)";

/// Optional query suffix. Captures everything after the `?`.
const QUERY_GROUP: &str = r"(?:\?(.*))?";

/// A compiled route template.
#[derive(Clone, Debug)]
pub struct Pattern {
    template: String,
    regex: Regex,
    params: Vec<String>,
}

/// The values a [`Pattern`] extracted from one URL.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Captures {
    /// Path parameters by name.
    pub params: HashMap<String, String>,
    /// Raw query string without the leading `?`, if the URL had one.
    pub query: Option<String>,
}

impl Pattern {
    /// Compiles `template` into a matcher.
    ///
    /// `:name` starts a parameter, where `name` is one or more ASCII
    /// alphanumerics or `_`. A parameter can fill a whole segment or sit
    /// inside one (`/files/:name.json`). Everything else matches literally.
    ///
    /// # Errors
    ///
    /// [`Error::Template`] if the template does not start with `/`, contains a
    /// `:` with no name after it, or repeats a parameter name.
    pub fn compile(template: &str) -> Result<Self, Error> {
        if !template.starts_with('/') {
            return Err(Error::template(template, "must start with `/`"));
        }

        let mut source = String::with_capacity(template.len() + 16);
        source.push('^');
        let mut params: Vec<String> = Vec::new();
        let mut literal = String::new();

        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            if c != ':' {
                literal.push(c);
                continue;
            }

            let mut name = String::new();
            while let Some(&next) = chars.peek() {
                if !is_param_char(next) {
                    break;
                }
                name.push(next);
                chars.next();
            }
            if name.is_empty() {
                return Err(Error::template(template, "`:` must be followed by a parameter name"));
            }
            if params.contains(&name) {
                return Err(Error::template(template, format!("duplicate parameter `{name}`")));
            }

            source.push_str(&regex::escape(&literal));
            literal.clear();
            source.push_str(PARAM_GROUP);
            params.push(name);
        }
        source.push_str(&regex::escape(&literal));
        source.push_str(QUERY_GROUP);
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| Error::template(template, e.to_string()))?;

        Ok(Self { template: template.to_owned(), regex, params })
    }

    /// The template this pattern was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Parameter names in the order they appear in the template.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn is_match(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }

    /// Matches the whole of `url` (path plus optional `?query`) and extracts
    /// the parameters. Returns `None` when the URL does not match.
    pub fn captures(&self, url: &str) -> Option<Captures> {
        let caps = self.regex.captures(url)?;

        let params = self.params.iter()
            .enumerate()
            .filter_map(|(i, name)| {
                caps.get(i + 1).map(|m| (name.clone(), m.as_str().to_owned()))
            })
            .collect();
        let query = caps.get(self.params.len() + 1).map(|m| m.as_str().to_owned());

        Some(Captures { params, query })
    }
}

fn is_param_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
