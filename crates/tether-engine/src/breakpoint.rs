use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Breakpoint registered by the IDE.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BreakPoint {
    /// Normalized (lowercase) file path.
    pub file: String,

    /// Segments of the normalized file path.
    pub path_parts: Vec<String>,

    /// Line of the breakpoint (1-based).
    pub line: i64,

    /// Condition expression (not evaluated).
    pub condition: String,
}

impl BreakPoint {
    /// Creates a new breakpoint, normalizing its file path.
    pub fn new(file: &str, line: i64, condition: impl Into<String>) -> Self {
        let file = file.to_lowercase();
        let path_parts = parse_path_parts(&file);

        Self {
            file,
            path_parts,
            line,
            condition: condition.into(),
        }
    }

    fn matches_suffix(&self, query: &[String], extensions: &[String]) -> bool {
        let Some((query_last, query_rest)) = query.split_last() else {
            return false;
        };

        let Some((bp_last, bp_rest)) = self.path_parts.split_last() else {
            return false;
        };

        if bp_rest.len() < query_rest.len() {
            return false;
        }

        let last_matches = query_last == bp_last
            || extensions
                .iter()
                .any(|ext| bp_last.strip_prefix(query_last.as_str()) == Some(ext.as_str()));

        last_matches
            && query_rest
                .iter()
                .rev()
                .zip(bp_rest.iter().rev())
                .all(|(q, bp)| q == bp)
    }
}

/// Splits a path into its segments, resolving `.` and `..` segments.
///
/// Both `/` and `\` are accepted as separators. A `..` segment with no
/// previous segment to pop is dropped.
pub fn parse_path_parts(path: &str) -> Vec<String> {
    let mut parts = Vec::new();

    for part in path.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            part => parts.push(part.to_owned()),
        }
    }

    parts
}

#[derive(Default)]
struct Registry {
    breakpoints: Vec<BreakPoint>,
    lines: HashSet<i64>,
    extensions: Vec<String>,
}

impl Registry {
    fn rebuild_lines(&mut self) {
        self.lines = self.breakpoints.iter().map(|bp| bp.line).collect();
    }
}

/// Thread-safe collection of breakpoints.
///
/// Lookups are fast-rejected on the set of registered lines before any
/// path comparison takes place.
#[derive(Default)]
pub struct BreakPointRegistry {
    inner: Mutex<Registry>,
}

impl BreakPointRegistry {
    fn lock(&self) -> MutexGuard<'_, Registry> {
        // the registry is left consistent by every operation
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets the file extensions tried when matching chunk names.
    pub fn set_extensions(&self, extensions: Vec<String>) {
        self.lock().extensions = extensions;
    }

    /// Registers a breakpoint.
    pub fn add(&self, bp: BreakPoint) {
        let mut registry = self.lock();
        tracing::debug!(file = bp.file, line = bp.line, "breakpoint added");
        registry.breakpoints.push(bp);
        registry.rebuild_lines();
    }

    /// Removes the first breakpoint registered at the given location.
    pub fn remove(&self, file: &str, line: i64) {
        let file = file.to_lowercase();
        let mut registry = self.lock();

        if let Some(i) = registry
            .breakpoints
            .iter()
            .position(|bp| bp.file == file && bp.line == line)
        {
            registry.breakpoints.remove(i);
            registry.rebuild_lines();
            tracing::debug!(file, line, "breakpoint removed");
        }
    }

    /// Removes every breakpoint.
    pub fn remove_all(&self) {
        let mut registry = self.lock();
        registry.breakpoints.clear();
        registry.lines.clear();
    }

    /// Returns every registered breakpoint, in registration order.
    pub fn list(&self) -> Vec<BreakPoint> {
        self.lock().breakpoints.clone()
    }

    /// Returns whether a breakpoint is registered at the given line, in any
    /// file.
    pub fn has_line(&self, line: i64) -> bool {
        self.lock().lines.contains(&line)
    }

    /// Finds the first breakpoint matching the given location.
    pub fn find(&self, file: &str, line: i64) -> Option<BreakPoint> {
        let registry = self.lock();

        if !registry.lines.contains(&line) {
            return None;
        }

        let file = file.to_lowercase();
        let query = parse_path_parts(&file);

        registry
            .breakpoints
            .iter()
            .filter(|bp| bp.line == line)
            .find(|bp| bp.file == file || bp.matches_suffix(&query, &registry.extensions))
            .cloned()
    }
}
