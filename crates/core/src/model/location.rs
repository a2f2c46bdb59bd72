use std::collections::HashMap;
use std::path::{Path, PathBuf};

use cinder_protocol::{Category, LocationId};

use crate::trace::CallFrame;

/// Name of the pseudo-frame the profiler emits for garbage collection
/// interrupts. GC samples carry no real call stack.
pub const GC_FRAME_NAME: &str = "(garbage collector)";

/// Best-effort resolution of a call frame's URL to an on-disk position.
/// Lines and columns are 1-based here, unlike the 0-based wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub path: PathBuf,
    pub line: u64,
    pub column: u64,
    /// Path relative to the workspace root, when the file is inside it.
    pub relative_path: Option<PathBuf>,
}

/// The deduplicated identity of a call site, carrying metric accumulators.
///
/// Accumulators are written only while the owning model is built; the
/// finished model exposes locations as an immutable slice.
#[derive(Debug, Clone)]
pub struct Location {
    pub id: LocationId,
    pub category: Category,
    /// The originating frame, with an empty function name normalized to
    /// `"(anonymous)"`.
    pub call_frame: CallFrame,
    pub source: Option<SourceLocation>,
    pub self_time: f64,
    pub aggregate_time: f64,
    pub self_size: f64,
    pub aggregate_size: f64,
    /// Per-line hit count, for line-granularity heat display.
    pub ticks: u64,
}

impl Location {
    pub fn name(&self) -> &str {
        &self.call_frame.function_name
    }

    /// Whether this is the garbage-collection pseudo-frame.
    pub fn is_gc(&self) -> bool {
        self.call_frame.function_name == GC_FRAME_NAME
    }

    /// Display label: function name plus its resolved position or URL.
    pub fn label(&self) -> String {
        let name = self.name();
        match &self.source {
            Some(src) => {
                let path = src.relative_path.as_deref().unwrap_or(&src.path);
                format!("{name} ({}:{})", path.display(), src.line)
            }
            None if !self.call_frame.url.is_empty() => {
                format!("{name} ({})", self.call_frame.url)
            }
            None => name.to_string(),
        }
    }
}

/// Composite call-site key. A tuple of the raw fields, so distinct call
/// sites can never collide the way a joined string could.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LocationKey {
    function_name: String,
    url: String,
    script_id: String,
    line: i64,
    column: i64,
}

impl LocationKey {
    fn of(frame: &CallFrame) -> Self {
        Self {
            function_name: frame.function_name.clone(),
            url: frame.url.clone(),
            script_id: frame.script_id.clone(),
            line: frame.line_number,
            column: frame.column_number,
        }
    }
}

/// Assigns dense, first-seen-order ids to call sites for one model build.
#[derive(Debug, Default)]
pub struct LocationInterner {
    workspace_root: Option<PathBuf>,
    table: HashMap<LocationKey, LocationId>,
    locations: Vec<Location>,
}

impl LocationInterner {
    pub fn new(workspace_root: Option<&Path>) -> Self {
        Self {
            workspace_root: workspace_root.map(Path::to_path_buf),
            table: HashMap::new(),
            locations: Vec::new(),
        }
    }

    /// Return the existing id for this call site, or allocate the next one.
    pub fn intern(&mut self, frame: &CallFrame) -> LocationId {
        let key = LocationKey::of(frame);
        if let Some(&id) = self.table.get(&key) {
            return id;
        }

        let id = LocationId(self.locations.len() as u32);
        let source = resolve_source(frame, self.workspace_root.as_deref());
        let category = classify(frame, source.is_some());

        let mut call_frame = frame.clone();
        if call_frame.function_name.is_empty() {
            call_frame.function_name = "(anonymous)".to_string();
        }

        self.locations.push(Location {
            id,
            category,
            call_frame,
            source,
            self_time: 0.0,
            aggregate_time: 0.0,
            self_size: 0.0,
            aggregate_size: 0.0,
            ticks: 0,
        });
        self.table.insert(key, id);
        id
    }

    /// Intern a synthetic per-line location: the same call frame pinned to
    /// `line` (0-based), used to attribute position ticks at line
    /// granularity distinct from the enclosing function location.
    pub fn intern_line(&mut self, frame: &CallFrame, line: i64) -> LocationId {
        let mut pinned = frame.clone();
        pinned.line_number = line;
        self.intern(&pinned)
    }

    pub fn add_time(&mut self, id: LocationId, self_time: f64, aggregate_time: f64) {
        if let Some(loc) = self.locations.get_mut(id.index()) {
            loc.self_time += self_time;
            loc.aggregate_time += aggregate_time;
        }
    }

    pub fn add_size(&mut self, id: LocationId, self_size: f64, aggregate_size: f64) {
        if let Some(loc) = self.locations.get_mut(id.index()) {
            loc.self_size += self_size;
            loc.aggregate_size += aggregate_size;
        }
    }

    pub fn add_ticks(&mut self, id: LocationId, ticks: u64) {
        if let Some(loc) = self.locations.get_mut(id.index()) {
            loc.ticks += ticks;
        }
    }

    /// Freeze the accumulator arena into the model's read-only location list.
    pub fn finish(self) -> Vec<Location> {
        self.locations
    }
}

/// Classify a call frame.
///
/// `System` for synthetic engine frames (negative line number); `Module`
/// for dependency code or anything without a resolved source; `User`
/// otherwise. `Deemphasized` is never produced here — the layout step
/// applies it to boxes below a filter match.
pub fn classify(frame: &CallFrame, has_resolved_source: bool) -> Category {
    if frame.line_number < 0 {
        Category::System
    } else if is_dependency_url(&frame.url) || !has_resolved_source {
        Category::Module
    } else {
        Category::User
    }
}

fn is_dependency_url(url: &str) -> bool {
    url.split(['/', '\\']).any(|segment| segment == "node_modules")
}

fn resolve_source(frame: &CallFrame, workspace_root: Option<&Path>) -> Option<SourceLocation> {
    if frame.line_number < 0 {
        return None;
    }
    let path = url_to_path(&frame.url)?;
    let relative_path = workspace_root
        .and_then(|root| path.strip_prefix(root).ok())
        .map(Path::to_path_buf);
    Some(SourceLocation {
        line: frame.line_number as u64 + 1,
        column: frame.column_number.max(0) as u64 + 1,
        path,
        relative_path,
    })
}

fn url_to_path(url: &str) -> Option<PathBuf> {
    let rest = url.strip_prefix("file://")?;
    // file:///C:/… carries a leading slash before the drive letter.
    let bytes = rest.as_bytes();
    let rest = if bytes.len() > 2 && bytes[0] == b'/' && bytes[2] == b':' {
        &rest[1..]
    } else {
        rest
    };
    if rest.is_empty() {
        None
    } else {
        Some(PathBuf::from(rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(name: &str, url: &str, line: i64, column: i64) -> CallFrame {
        CallFrame {
            function_name: name.to_string(),
            script_id: "1".to_string(),
            url: url.to_string(),
            line_number: line,
            column_number: column,
        }
    }

    #[test]
    fn interning_deduplicates_and_is_dense() {
        let mut interner = LocationInterner::new(None);
        let a = interner.intern(&frame("f", "file:///a.js", 1, 0));
        let b = interner.intern(&frame("g", "file:///a.js", 2, 0));
        let a_again = interner.intern(&frame("f", "file:///a.js", 1, 0));
        assert_eq!(a, LocationId(0));
        assert_eq!(b, LocationId(1));
        assert_eq!(a, a_again);
        assert_eq!(interner.finish().len(), 2);
    }

    #[test]
    fn distinct_columns_are_distinct_sites() {
        let mut interner = LocationInterner::new(None);
        let a = interner.intern(&frame("f", "file:///a.js", 1, 0));
        let b = interner.intern(&frame("f", "file:///a.js", 1, 8));
        assert_ne!(a, b);
    }

    #[test]
    fn anonymous_name_is_synthesized() {
        let mut interner = LocationInterner::new(None);
        let id = interner.intern(&frame("", "file:///a.js", 1, 0));
        let locations = interner.finish();
        assert_eq!(locations[id.index()].name(), "(anonymous)");
    }

    #[test]
    fn classify_system_module_user() {
        let system = frame("native", "", -1, -1);
        assert_eq!(classify(&system, false), Category::System);

        let vendored = frame("dep", "file:///app/node_modules/x/i.js", 3, 0);
        assert_eq!(classify(&vendored, true), Category::Module);

        let unresolved = frame("f", "webpack://x/i.js", 3, 0);
        assert_eq!(classify(&unresolved, false), Category::Module);

        let user = frame("f", "file:///app/src/i.js", 3, 0);
        assert_eq!(classify(&user, true), Category::User);
    }

    #[test]
    fn resolves_workspace_relative_source() {
        let root = PathBuf::from("/app");
        let mut interner = LocationInterner::new(Some(&root));
        let id = interner.intern(&frame("f", "file:///app/src/main.js", 4, 2));
        let locations = interner.finish();
        let src = locations[id.index()].source.as_ref().unwrap();
        assert_eq!(src.path, PathBuf::from("/app/src/main.js"));
        assert_eq!(src.line, 5);
        assert_eq!(src.column, 3);
        assert_eq!(src.relative_path.as_deref(), Some(Path::new("src/main.js")));
    }

    #[test]
    fn unresolvable_url_keeps_raw_frame() {
        let mut interner = LocationInterner::new(None);
        let id = interner.intern(&frame("f", "https://cdn.example/x.js", 4, 2));
        let locations = interner.finish();
        let loc = &locations[id.index()];
        assert!(loc.source.is_none());
        assert_eq!(loc.label(), "f (https://cdn.example/x.js)");
    }

    #[test]
    fn line_pinned_interning_is_a_distinct_site() {
        let mut interner = LocationInterner::new(None);
        let f = frame("f", "file:///a.js", 1, 0);
        let whole = interner.intern(&f);
        let line3 = interner.intern_line(&f, 3);
        let line3_again = interner.intern_line(&f, 3);
        assert_ne!(whole, line3);
        assert_eq!(line3, line3_again);
    }

    #[test]
    fn windows_file_url() {
        assert_eq!(
            url_to_path("file:///C:/src/a.js"),
            Some(PathBuf::from("C:/src/a.js"))
        );
        assert_eq!(url_to_path(""), None);
    }
}
