//! Canonical rendering of arguments and captured environment
//!
//! Values are rendered through serde into a JSON tree at the moment they
//! are added, so every later fingerprint of the same [`Arguments`] or
//! [`Environment`] sees exactly the same bytes. Object keys are sorted when
//! the tree is written out, independent of serde_json's map ordering.
//!
//! This rendering is used for hashing only. It is unrelated to the format
//! the result store uses for records.

use crate::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

/// Render a value into its canonical JSON tree
///
/// # Errors
///
/// Returns a canonicalization error if serde_json rejects the value
pub fn render<T: Serialize + ?Sized>(what: impl FnOnce() -> String, value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::canonicalization(what(), e.to_string()))
}

/// Write a JSON tree as compact text with object keys in sorted order
#[must_use]
pub fn canonical_text(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::String(s) => write_string(s, out),
        Value::Null | Value::Bool(_) | Value::Number(_) => out.push_str(&value.to_string()),
    }
}

fn write_string(s: &str, out: &mut String) {
    // Display of a JSON string value applies JSON escaping
    out.push_str(&Value::String(s.to_owned()).to_string());
}

fn write_named(map: &BTreeMap<String, Value>, out: &mut String) {
    out.push('{');
    for (i, (key, item)) in map.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_string(key, out);
        out.push(':');
        write_canonical(item, out);
    }
    out.push('}');
}

/// Positional and keyword arguments of a call
///
/// Positional order matters; keyword insertion order does not.
///
/// ```
/// use memoir_fingerprint::args;
///
/// let call = args![2, 5, 6; p = 2, q = 3]?;
/// assert_eq!(call.positional::<i64>(1)?, 5);
/// assert_eq!(call.keyword::<i64>("q")?, 3);
/// # Ok::<(), memoir_fingerprint::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments {
    positional: Vec<Value>,
    keyword: BTreeMap<String, Value>,
}

impl Arguments {
    /// An empty argument set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an argument set with a closure that pushes and inserts values
    ///
    /// # Errors
    ///
    /// Returns the first rendering error raised by the closure
    pub fn build(f: impl FnOnce(&mut Self) -> Result<()>) -> Result<Self> {
        let mut args = Self::new();
        f(&mut args)?;
        Ok(args)
    }

    /// Append a positional argument
    ///
    /// # Errors
    ///
    /// Returns a canonicalization error if the value cannot be rendered
    pub fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let index = self.positional.len();
        let rendered = render(|| format!("positional argument {index}"), value)?;
        self.positional.push(rendered);
        Ok(())
    }

    /// Set a keyword argument, replacing any previous value for the name
    ///
    /// # Errors
    ///
    /// Returns a canonicalization error if the value cannot be rendered
    pub fn insert<T: Serialize + ?Sized>(
        &mut self,
        name: impl Into<String>,
        value: &T,
    ) -> Result<()> {
        let name = name.into();
        let rendered = render(|| format!("keyword argument {name}"), value)?;
        self.keyword.insert(name, rendered);
        Ok(())
    }

    /// Builder form of [`push`](Self::push)
    ///
    /// # Errors
    ///
    /// Returns a canonicalization error if the value cannot be rendered
    pub fn arg<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self> {
        self.push(value)?;
        Ok(self)
    }

    /// Builder form of [`insert`](Self::insert)
    ///
    /// # Errors
    ///
    /// Returns a canonicalization error if the value cannot be rendered
    pub fn kwarg<T: Serialize + ?Sized>(
        mut self,
        name: impl Into<String>,
        value: &T,
    ) -> Result<Self> {
        self.insert(name, value)?;
        Ok(self)
    }

    /// Decode the positional argument at `index`
    ///
    /// # Errors
    ///
    /// Returns an error if the argument is missing or has a different type
    pub fn positional<T: DeserializeOwned>(&self, index: usize) -> Result<T> {
        let name = format!("#{index}");
        let value = self
            .positional
            .get(index)
            .ok_or_else(|| Error::argument_missing(&name))?;
        decode(&name, value)
    }

    /// Decode the keyword argument `name`
    ///
    /// # Errors
    ///
    /// Returns an error if the argument is missing or has a different type
    pub fn keyword<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let value = self
            .keyword
            .get(name)
            .ok_or_else(|| Error::argument_missing(name))?;
        decode(name, value)
    }

    /// Decode the keyword argument `name`, or return `default` when absent
    ///
    /// # Errors
    ///
    /// Returns an error if the argument is present with a different type
    pub fn keyword_or<T: DeserializeOwned>(&self, name: &str, default: T) -> Result<T> {
        match self.keyword.get(name) {
            Some(value) => decode(name, value),
            None => Ok(default),
        }
    }

    /// Number of positional arguments
    #[must_use]
    pub fn positional_len(&self) -> usize {
        self.positional.len()
    }

    /// Keyword names in sorted order
    pub fn keyword_names(&self) -> impl Iterator<Item = &str> {
        self.keyword.keys().map(String::as_str)
    }

    /// Whether there are no arguments at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    /// Canonical text of the positional sequence
    #[must_use]
    pub fn canonical_positional(&self) -> String {
        let mut out = String::new();
        write_canonical(&Value::Array(self.positional.clone()), &mut out);
        out
    }

    /// Canonical text of the keyword mapping, sorted by name
    #[must_use]
    pub fn canonical_keywords(&self) -> String {
        let mut out = String::new();
        write_named(&self.keyword, &mut out);
        out
    }
}

fn decode<T: DeserializeOwned>(name: &str, value: &Value) -> Result<T> {
    T::deserialize(value)
        .map_err(|e| Error::argument_type(name, std::any::type_name::<T>(), e.to_string()))
}

/// State a computation reads besides its arguments
///
/// Non-locals are values captured from an enclosing scope; globals are
/// process- or module-level values. Only names and values matter, so two
/// computations capturing the same values get the same environment
/// fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    nonlocals: BTreeMap<String, Value>,
    globals: BTreeMap<String, Value>,
}

impl Environment {
    /// An empty environment
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a captured non-local value
    ///
    /// # Errors
    ///
    /// Returns a canonicalization error if the value cannot be rendered
    pub fn capture_nonlocal<T: Serialize + ?Sized>(
        &mut self,
        name: impl Into<String>,
        value: &T,
    ) -> Result<()> {
        let name = name.into();
        let rendered = render(|| format!("non-local {name}"), value)?;
        self.nonlocals.insert(name, rendered);
        Ok(())
    }

    /// Record a referenced global value
    ///
    /// # Errors
    ///
    /// Returns a canonicalization error if the value cannot be rendered
    pub fn capture_global<T: Serialize + ?Sized>(
        &mut self,
        name: impl Into<String>,
        value: &T,
    ) -> Result<()> {
        let name = name.into();
        let rendered = render(|| format!("global {name}"), value)?;
        self.globals.insert(name, rendered);
        Ok(())
    }

    /// Builder form of [`capture_nonlocal`](Self::capture_nonlocal)
    ///
    /// # Errors
    ///
    /// Returns a canonicalization error if the value cannot be rendered
    pub fn nonlocal<T: Serialize + ?Sized>(
        mut self,
        name: impl Into<String>,
        value: &T,
    ) -> Result<Self> {
        self.capture_nonlocal(name, value)?;
        Ok(self)
    }

    /// Builder form of [`capture_global`](Self::capture_global)
    ///
    /// # Errors
    ///
    /// Returns a canonicalization error if the value cannot be rendered
    pub fn global<T: Serialize + ?Sized>(
        mut self,
        name: impl Into<String>,
        value: &T,
    ) -> Result<Self> {
        self.capture_global(name, value)?;
        Ok(self)
    }

    /// Whether nothing has been captured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nonlocals.is_empty() && self.globals.is_empty()
    }

    /// Canonical text of the non-locals, sorted by name
    #[must_use]
    pub fn canonical_nonlocals(&self) -> String {
        let mut out = String::new();
        write_named(&self.nonlocals, &mut out);
        out
    }

    /// Canonical text of the globals, sorted by name
    #[must_use]
    pub fn canonical_globals(&self) -> String {
        let mut out = String::new();
        write_named(&self.globals, &mut out);
        out
    }
}

/// Build an [`Arguments`] set from positional values and `name = value` keywords
///
/// Evaluates to `Result<Arguments>`.
#[macro_export]
macro_rules! args {
    ($($pos:expr),* $(; $($key:ident = $val:expr),*)?) => {
        $crate::Arguments::build(|__args| {
            $( __args.push(&$pos)?; )*
            $($( __args.insert(stringify!($key), &$val)?; )*)?
            Ok(())
        })
    };
}
