use crate::error::{FsTreeError, Result};

/// One step of walking a [`Query`] through a directory hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Descend into (creating if absent) the directory named `0`.
    Dir(String),
    /// The walk has reached its terminal component, named `0`.
    File(String),
}

/// A path being walked one component at a time against an [`crate::Directory`].
///
/// Mirrors `FileSystemQuery`: a list of directory components plus a terminal
/// name, and a pointer that advances as each directory is descended into.
/// When constructed for [`crate::Directory::insert`] it also carries the
/// file payload to place at the terminal component.
#[derive(Debug, Clone)]
pub struct Query<F> {
    path: Vec<String>,
    name: String,
    ptr: usize,
    pub file: Option<F>,
}

impl<F> Query<F> {
    /// Builds a query from an ordered list of path components; the last
    /// component is the terminal (file) name.
    pub fn new(components: Vec<String>, file: Option<F>) -> Self {
        let mut components = components;
        let name = components.pop().unwrap_or_default();
        Query {
            path: components,
            name,
            ptr: 0,
            file,
        }
    }

    /// Builds a query by splitting a `/`-separated path string.
    pub fn from_path(path: &str, file: Option<F>) -> Self {
        Self::new(path.split('/').map(str::to_string).collect(), file)
    }

    /// Returns the current step and advances the pointer past it.
    pub fn next_step(&mut self) -> Result<Step> {
        if self.ptr > self.path.len() {
            return Err(FsTreeError::QueryExhausted);
        }
        if self.ptr == self.path.len() {
            self.ptr += 1;
            Ok(Step::File(self.name.clone()))
        } else {
            let step = Step::Dir(self.path[self.ptr].clone());
            self.ptr += 1;
            Ok(step)
        }
    }
}

/// A single exclude/include predicate used by [`crate::Directory::search`].
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Matches if the candidate name contains this literal substring.
    Literal(String),
    /// Matches if the candidate name matches this regular expression.
    Regex(regex::Regex),
}

impl Matcher {
    pub fn literal(s: impl Into<String>) -> Self {
        Matcher::Literal(s.into())
    }

    pub fn regex(pattern: &str) -> std::result::Result<Self, regex::Error> {
        Ok(Matcher::Regex(regex::Regex::new(pattern)?))
    }

    fn is_match(&self, name: &str) -> bool {
        match self {
            Matcher::Literal(s) => name.contains(s.as_str()),
            Matcher::Regex(r) => r.is_match(name),
        }
    }
}

/// Exclude/include filters for a depth-first [`crate::Directory::search`].
///
/// Exclusion is checked first and wins ties: a name dropped by
/// `file_exclude` is never reconsidered by `file_include`. An empty
/// `file_include` keeps everything that survived exclusion.
#[derive(Debug, Clone, Default)]
pub struct MassQuery {
    pub file_exclude: Vec<Matcher>,
    pub file_include: Vec<Matcher>,
}

impl MassQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude(mut self, m: Matcher) -> Self {
        self.file_exclude.push(m);
        self
    }

    pub fn include(mut self, m: Matcher) -> Self {
        self.file_include.push(m);
        self
    }

    pub(crate) fn survives_exclude(&self, name: &str) -> bool {
        !self.file_exclude.iter().any(|m| m.is_match(name))
    }

    pub(crate) fn survives_include(&self, name: &str) -> bool {
        self.file_include.is_empty() || self.file_include.iter().any(|m| m.is_match(name))
    }
}
