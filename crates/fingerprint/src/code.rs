//! Code identity of a memoizable computation
//!
//! Rust has no runtime access to a function's source, so a computation
//! declares how its code is identified:
//!
//! - [`Code::source`] with the source text (a literal, `include_str!` or
//!   `stringify!` of the body). Blank lines and trailing whitespace are
//!   ignored, so reformatting by adding or removing blank lines keeps the
//!   fingerprint stable.
//! - [`Code::versioned`] with an explicit version tag, bumped by hand when
//!   the computation changes.
//! - [`Code::named`] when no source is available; only the qualified name
//!   contributes.

use std::borrow::Cow;
use std::path::Path;

/// How the code of a computation is identified
///
/// The variants hash into one byte space. A name containing NUL can
/// therefore make `Code::named("a\0b")` collide with
/// `Code::versioned("a", "b")`, and a name equal to a source text collides
/// with that source. Qualified names never contain NUL or newlines in
/// practice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeBody {
    /// Source text
    Source(String),
    /// Explicit version tag
    Version(String),
    /// No retrievable source; the qualified name stands in
    Unavailable,
}

/// Identity of a computation's code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    name: Cow<'static, str>,
    body: CodeBody,
}

impl Code {
    /// Identify a computation by its source text
    pub fn source(name: impl Into<Cow<'static, str>>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: CodeBody::Source(text.into()),
        }
    }

    /// Identify a computation by an explicit version tag
    pub fn versioned(name: impl Into<Cow<'static, str>>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: CodeBody::Version(tag.into()),
        }
    }

    /// Identify a computation by its qualified name only
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            body: CodeBody::Unavailable,
        }
    }

    /// Identify a computation by the contents of a source file
    ///
    /// An unreadable file is not an error: the code falls back to
    /// name-only identity, matching [`Code::named`].
    pub fn from_file(name: impl Into<Cow<'static, str>>, path: impl AsRef<Path>) -> Self {
        let name = name.into();
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Self::source(name, text),
            Err(e) => {
                tracing::debug!(
                    name = %name,
                    path = %path.display(),
                    "Source unavailable, fingerprinting by name: {e}"
                );
                Self::named(name)
            }
        }
    }

    /// Qualified name of the computation
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How the code is identified
    #[must_use]
    pub fn body(&self) -> &CodeBody {
        &self.body
    }

    /// Bytes that contribute to the code fingerprint
    pub(crate) fn fingerprint_bytes(&self) -> Vec<u8> {
        match &self.body {
            CodeBody::Source(text) => significant_lines(text).into_bytes(),
            CodeBody::Version(tag) => {
                let mut bytes = Vec::with_capacity(self.name.len() + tag.len() + 1);
                bytes.extend_from_slice(self.name.as_bytes());
                bytes.push(0);
                bytes.extend_from_slice(tag.as_bytes());
                bytes
            }
            CodeBody::Unavailable => self.name.as_bytes().to_vec(),
        }
    }
}

/// Non-blank lines with trailing whitespace removed, each terminated by `\n`
fn significant_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}
