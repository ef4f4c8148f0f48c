//! Directory catalog: a recursive walk producing an arena-backed tree of
//! directory and file nodes.
//!
//! Nodes are addressed by index into the arena and deduplicated through a
//! relative-path side table. Parent links exist only so a node's absolute
//! path can be reconstructed upward, never for ownership. The walk is
//! cooperative: `Walker::step` processes a bounded batch of entries and
//! returns, so the UI thread can repaint and observe a cancel request
//! between batches. Empty directories are pruned once the walk ends.

use crate::constant::WALK_BATCH_SIZE;
use crate::stamp_backend::{FileStamps, StampBackend};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("source directory {0:?} does not exist")]
    Missing(PathBuf),

    #[error("{0:?} is not a directory")]
    NotADirectory(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Index of a node in the catalog arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Dir,
    File,
}

#[derive(Debug)]
pub struct Node {
    /// Final path component, shown for file rows.
    pub name: String,
    /// POSIX-style path relative to the catalog root; the node's identity
    /// key. The root itself is `"."`.
    pub rel_path: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub kind: NodeKind,
    /// Filled lazily for files when first displayed.
    pub stamps: Option<FileStamps>,
}

/// The tree built from one load. Created fresh per load and discarded
/// wholesale on the next one.
pub struct Catalog {
    root_path: PathBuf,
    nodes: Vec<Node>,
    index: HashMap<String, NodeId>,
    root: Option<NodeId>,
}

impl Catalog {
    /// Walk `root` to completion and return the pruned tree. The UI steps a
    /// `Walker` manually instead so it can repaint between batches.
    pub fn build(root: &Path) -> Result<Catalog, CatalogError> {
        let mut walker = Walker::new(root)?;
        while let WalkStatus::InProgress = walker.step(WALK_BATCH_SIZE) {}
        Ok(walker.finish())
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn lookup(&self, rel_path: &str) -> Option<NodeId> {
        self.index.get(rel_path).copied()
    }

    /// True when pruning removed everything, the root included.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn file_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.kind == NodeKind::File)
            .count()
    }

    /// Absolute path of a node, reconstructed upward. Directories carry
    /// their full relative path; files join their name onto the parent
    /// directory. `None` if a file is unparented (defensive, should not
    /// occur for a built catalog).
    pub fn resolve_path(&self, id: NodeId) -> Option<PathBuf> {
        let node = self.nodes.get(id.0)?;
        match node.kind {
            NodeKind::Dir => Some(join_to_root(&self.root_path, &node.rel_path)),
            NodeKind::File => {
                let dir = self.resolve_path(node.parent?)?;
                Some(dir.join(&node.name))
            }
        }
    }

    /// Read a file's stamps on first display. A read failure leaves the
    /// four fields absent rather than erroring the render.
    pub fn ensure_stamps<B: StampBackend>(&mut self, id: NodeId, backend: &B) {
        if self.nodes[id.0].stamps.is_none() {
            self.reload_stamps(id, backend);
        }
    }

    /// Re-read a file's stamps, e.g. after an editor session saved.
    pub fn reload_stamps<B: StampBackend>(&mut self, id: NodeId, backend: &B) {
        if self.nodes[id.0].kind != NodeKind::File {
            return;
        }
        let stamps = self
            .resolve_path(id)
            .and_then(|path| backend.read_stamps(&path).ok())
            .unwrap_or_default();
        self.nodes[id.0].stamps = Some(stamps);
    }

    fn add_root(&mut self) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: ".".to_string(),
            rel_path: ".".to_string(),
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Dir,
            stamps: None,
        });
        self.index.insert(".".to_string(), id);
        self.root = Some(id);
        id
    }

    fn add_node(&mut self, parent: NodeId, name: String, rel_path: String, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name,
            rel_path: rel_path.clone(),
            parent: Some(parent),
            children: Vec::new(),
            kind,
            stamps: None,
        });
        self.index.insert(rel_path, id);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Deterministic child order regardless of readdir order: files first,
    /// then subdirectories, each by name.
    fn sort_children(&mut self) {
        for i in 0..self.nodes.len() {
            let mut kids = std::mem::take(&mut self.nodes[i].children);
            kids.sort_by(|a, b| {
                let (na, nb) = (&self.nodes[a.0], &self.nodes[b.0]);
                (na.kind == NodeKind::Dir, &na.name).cmp(&(nb.kind == NodeKind::Dir, &nb.name))
            });
            self.nodes[i].children = kids;
        }
    }

    /// Bottom-up removal of every directory with zero file descendants.
    /// The root is no exception: an all-empty tree prunes to nothing and
    /// the UI shows an empty state. Surviving nodes are compacted into a
    /// fresh arena and the path index is rebuilt.
    fn prune(&mut self) {
        let Some(root) = self.root else {
            return;
        };

        let mut keep = vec![false; self.nodes.len()];
        self.mark_kept(root, &mut keep);

        if !keep[root.0] {
            self.nodes.clear();
            self.index.clear();
            self.root = None;
            return;
        }

        let mut remap: Vec<Option<NodeId>> = vec![None; self.nodes.len()];
        let mut next = 0;
        for (i, kept) in keep.iter().enumerate() {
            if *kept {
                remap[i] = Some(NodeId(next));
                next += 1;
            }
        }

        let old_nodes = std::mem::take(&mut self.nodes);
        for (i, mut node) in old_nodes.into_iter().enumerate() {
            if remap[i].is_none() {
                continue;
            }
            node.parent = node.parent.and_then(|p| remap[p.0]);
            node.children = node.children.iter().filter_map(|c| remap[c.0]).collect();
            self.nodes.push(node);
        }

        self.index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.rel_path.clone(), NodeId(i)))
            .collect();
        self.root = remap[root.0];
    }

    /// Post-order: returns the number of file descendants and marks every
    /// node that survives the prune.
    fn mark_kept(&self, id: NodeId, keep: &mut [bool]) -> usize {
        let node = &self.nodes[id.0];
        match node.kind {
            NodeKind::File => {
                keep[id.0] = true;
                1
            }
            NodeKind::Dir => {
                let mut files = 0;
                for child in &node.children {
                    files += self.mark_kept(*child, keep);
                }
                if files > 0 {
                    keep[id.0] = true;
                }
                files
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStatus {
    InProgress,
    Done,
}

struct PendingDir {
    id: NodeId,
    entries: fs::ReadDir,
}

/// Depth-first walker over a root directory. Call `step` until it reports
/// `Done` (one batch per UI frame), then `finish` to sort and prune.
pub struct Walker {
    catalog: Catalog,
    stack: Vec<PendingDir>,
    canceled: bool,
    visited: usize,
}

impl Walker {
    /// Fails fast, before any walking, when the root does not exist or is
    /// not a directory.
    pub fn new(root: &Path) -> Result<Self, CatalogError> {
        if !root.exists() {
            return Err(CatalogError::Missing(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(CatalogError::NotADirectory(root.to_path_buf()));
        }

        let mut catalog = Catalog {
            root_path: root.to_path_buf(),
            nodes: Vec::new(),
            index: HashMap::new(),
            root: None,
        };
        let root_id = catalog.add_root();
        let entries = fs::read_dir(root)?;

        Ok(Self {
            catalog,
            stack: vec![PendingDir {
                id: root_id,
                entries,
            }],
            canceled: false,
            visited: 0,
        })
    }

    /// Process up to `budget` directory entries, then yield back to the
    /// caller. Cancellation is observed here, between batches.
    pub fn step(&mut self, budget: usize) -> WalkStatus {
        if self.canceled {
            self.stack.clear();
            return WalkStatus::Done;
        }

        let mut remaining = budget.max(1);
        while remaining > 0 {
            let (parent, next) = match self.stack.last_mut() {
                None => return WalkStatus::Done,
                Some(top) => (top.id, top.entries.next()),
            };
            match next {
                None => {
                    self.stack.pop();
                }
                Some(Err(e)) => {
                    warn!("skipping unreadable entry: {}", e);
                    self.visited += 1;
                    remaining -= 1;
                }
                Some(Ok(entry)) => {
                    self.visit_entry(parent, &entry);
                    self.visited += 1;
                    remaining -= 1;
                }
            }
        }

        if self.stack.is_empty() {
            WalkStatus::Done
        } else {
            WalkStatus::InProgress
        }
    }

    /// Advisory: stop descending into new directories. The tree built so
    /// far is still sorted and pruned by `finish`.
    pub fn cancel(&mut self) {
        self.canceled = true;
    }

    pub fn visited(&self) -> usize {
        self.visited
    }

    pub fn files_found(&self) -> usize {
        self.catalog.file_count()
    }

    pub fn finish(mut self) -> Catalog {
        self.stack.clear();
        self.catalog.sort_children();
        let before = self.catalog.file_count();
        self.catalog.prune();
        info!(
            "catalog built: {} entries visited, {} files, canceled: {}",
            self.visited, before, self.canceled
        );
        self.catalog
    }

    fn visit_entry(&mut self, parent: NodeId, entry: &fs::DirEntry) {
        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(e) => {
                warn!("skipping {:?}: {}", entry.path(), e);
                return;
            }
        };
        // Symlinks are excluded from the catalog entirely.
        if file_type.is_symlink() {
            return;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        let rel_path = join_rel(&self.catalog.nodes[parent.0].rel_path, &name);

        // A path is visited at most once, even if the walk revisits it.
        if self.catalog.index.contains_key(&rel_path) {
            return;
        }

        if file_type.is_dir() {
            let id = self
                .catalog
                .add_node(parent, name, rel_path, NodeKind::Dir);
            match fs::read_dir(entry.path()) {
                Ok(entries) => self.stack.push(PendingDir { id, entries }),
                // Unreadable subdirectory: keep walking its siblings. The
                // childless node goes away in the prune.
                Err(e) => warn!("skipping unreadable directory {:?}: {}", entry.path(), e),
            }
        } else if file_type.is_file() {
            self.catalog.add_node(parent, name, rel_path, NodeKind::File);
        }
    }
}

fn join_rel(parent: &str, name: &str) -> String {
    if parent == "." {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Join a POSIX-style rel_path onto the root using native separators.
fn join_to_root(root: &Path, rel_path: &str) -> PathBuf {
    if rel_path == "." {
        return root.to_path_buf();
    }
    let mut path = root.to_path_buf();
    for segment in rel_path.split('/') {
        path.push(segment);
    }
    path
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use uuid::Uuid;

    fn setup_test_dir() -> PathBuf {
        let test_dir = std::env::temp_dir().join(format!("test_catalog_{}", Uuid::new_v4()));
        fs::create_dir_all(&test_dir).unwrap();
        test_dir
    }

    fn cleanup_test_dir(test_dir: &Path) {
        let _ = fs::remove_dir_all(test_dir);
    }

    fn rel_paths(catalog: &Catalog) -> BTreeSet<String> {
        catalog.nodes.iter().map(|n| n.rel_path.clone()).collect()
    }

    /// (rel_path, parent rel_path) pairs, for structural comparison.
    fn structure(catalog: &Catalog) -> BTreeSet<(String, Option<String>)> {
        catalog
            .nodes
            .iter()
            .map(|n| {
                let parent = n.parent.map(|p| catalog.node(p).rel_path.clone());
                (n.rel_path.clone(), parent)
            })
            .collect()
    }

    #[test]
    fn test_walk_prunes_empty_directories() {
        let test_dir = setup_test_dir();
        fs::create_dir_all(test_dir.join("a")).unwrap();
        fs::write(test_dir.join("a/file1.txt"), "x").unwrap();
        fs::create_dir_all(test_dir.join("b")).unwrap();

        let catalog = Catalog::build(&test_dir).unwrap();

        let expected: BTreeSet<String> = [".", "a", "a/file1.txt"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(rel_paths(&catalog), expected);
        assert!(catalog.lookup("b").is_none(), "empty dir should be pruned");

        cleanup_test_dir(&test_dir);
    }

    #[test]
    fn test_prune_cascades_through_nested_empty_dirs() {
        let test_dir = setup_test_dir();
        fs::create_dir_all(test_dir.join("x/y/z")).unwrap();
        fs::write(test_dir.join("kept.txt"), "x").unwrap();

        let catalog = Catalog::build(&test_dir).unwrap();

        assert!(catalog.lookup("x").is_none());
        assert!(catalog.lookup("x/y").is_none());
        assert!(catalog.lookup("x/y/z").is_none());
        assert!(catalog.lookup("kept.txt").is_some());

        cleanup_test_dir(&test_dir);
    }

    #[test]
    fn test_empty_root_prunes_to_nothing() {
        let test_dir = setup_test_dir();

        let catalog = Catalog::build(&test_dir).unwrap();
        assert!(catalog.is_empty());
        assert_eq!(catalog.file_count(), 0);
        assert!(catalog.lookup(".").is_none());

        cleanup_test_dir(&test_dir);
    }

    #[test]
    fn test_every_surviving_dir_has_a_file_descendant() {
        let test_dir = setup_test_dir();
        fs::create_dir_all(test_dir.join("a/empty")).unwrap();
        fs::create_dir_all(test_dir.join("a/full")).unwrap();
        fs::write(test_dir.join("a/full/f.txt"), "x").unwrap();
        fs::create_dir_all(test_dir.join("hollow/inner")).unwrap();

        let catalog = Catalog::build(&test_dir).unwrap();

        for node in &catalog.nodes {
            if node.kind == NodeKind::Dir {
                let id = catalog.lookup(&node.rel_path).unwrap();
                let mut keep = vec![false; catalog.nodes.len()];
                assert!(
                    catalog.mark_kept(id, &mut keep) > 0,
                    "dir {:?} survived prune without file descendants",
                    node.rel_path
                );
            }
        }
        assert!(catalog.lookup("a/empty").is_none());
        assert!(catalog.lookup("hollow").is_none());

        cleanup_test_dir(&test_dir);
    }

    #[test]
    fn test_missing_root_fails_fast() {
        let missing = std::env::temp_dir().join(format!("no_such_{}", Uuid::new_v4()));
        match Walker::new(&missing) {
            Err(CatalogError::Missing(path)) => assert_eq!(path, missing),
            other => panic!("expected Missing, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_file_root_fails_fast() {
        let test_dir = setup_test_dir();
        let file = test_dir.join("not_a_dir.txt");
        fs::write(&file, "x").unwrap();

        assert!(matches!(
            Walker::new(&file),
            Err(CatalogError::NotADirectory(_))
        ));

        cleanup_test_dir(&test_dir);
    }

    #[test]
    fn test_resolve_path_round_trips() {
        let test_dir = setup_test_dir();
        fs::create_dir_all(test_dir.join("a/b")).unwrap();
        fs::write(test_dir.join("a/b/deep.txt"), "x").unwrap();
        fs::write(test_dir.join("top.txt"), "x").unwrap();

        let catalog = Catalog::build(&test_dir).unwrap();

        let file = catalog.lookup("a/b/deep.txt").unwrap();
        assert_eq!(
            catalog.resolve_path(file).unwrap(),
            test_dir.join("a").join("b").join("deep.txt")
        );

        let top = catalog.lookup("top.txt").unwrap();
        assert_eq!(catalog.resolve_path(top).unwrap(), test_dir.join("top.txt"));

        let dir = catalog.lookup("a/b").unwrap();
        assert_eq!(
            catalog.resolve_path(dir).unwrap(),
            test_dir.join("a").join("b")
        );
        assert_eq!(
            catalog.resolve_path(catalog.root().unwrap()).unwrap(),
            test_dir
        );

        cleanup_test_dir(&test_dir);
    }

    #[test]
    fn test_rebuild_is_structurally_identical() {
        let test_dir = setup_test_dir();
        fs::create_dir_all(test_dir.join("a/b")).unwrap();
        fs::write(test_dir.join("a/one.txt"), "x").unwrap();
        fs::write(test_dir.join("a/b/two.txt"), "x").unwrap();
        fs::write(test_dir.join("zero.txt"), "x").unwrap();

        let first = Catalog::build(&test_dir).unwrap();
        let second = Catalog::build(&test_dir).unwrap();

        assert_eq!(structure(&first), structure(&second));

        cleanup_test_dir(&test_dir);
    }

    #[test]
    fn test_unique_rel_paths() {
        let test_dir = setup_test_dir();
        fs::create_dir_all(test_dir.join("a")).unwrap();
        fs::write(test_dir.join("a/f.txt"), "x").unwrap();
        fs::write(test_dir.join("g.txt"), "x").unwrap();

        let catalog = Catalog::build(&test_dir).unwrap();
        assert_eq!(rel_paths(&catalog).len(), catalog.nodes.len());

        cleanup_test_dir(&test_dir);
    }

    #[test]
    fn test_children_sorted_files_before_dirs() {
        let test_dir = setup_test_dir();
        fs::create_dir_all(test_dir.join("zdir")).unwrap();
        fs::write(test_dir.join("zdir/inner.txt"), "x").unwrap();
        fs::create_dir_all(test_dir.join("adir")).unwrap();
        fs::write(test_dir.join("adir/inner.txt"), "x").unwrap();
        fs::write(test_dir.join("b.txt"), "x").unwrap();
        fs::write(test_dir.join("a.txt"), "x").unwrap();

        let catalog = Catalog::build(&test_dir).unwrap();
        let root = catalog.root().unwrap();
        let names: Vec<&str> = catalog
            .node(root)
            .children
            .iter()
            .map(|c| catalog.node(*c).name.as_str())
            .collect();

        assert_eq!(names, vec!["a.txt", "b.txt", "adir", "zdir"]);

        cleanup_test_dir(&test_dir);
    }

    #[test]
    fn test_step_yields_between_batches() {
        let test_dir = setup_test_dir();
        for i in 0..20 {
            fs::write(test_dir.join(format!("f{:02}.txt", i)), "x").unwrap();
        }

        let mut walker = Walker::new(&test_dir).unwrap();
        let status = walker.step(5);
        assert_eq!(status, WalkStatus::InProgress);
        assert_eq!(walker.visited(), 5);

        while let WalkStatus::InProgress = walker.step(5) {}
        let catalog = walker.finish();
        assert_eq!(catalog.file_count(), 20);

        cleanup_test_dir(&test_dir);
    }

    #[test]
    fn test_cancel_keeps_partial_tree_and_still_prunes() {
        let test_dir = setup_test_dir();
        fs::create_dir_all(test_dir.join("empty")).unwrap();
        fs::write(test_dir.join("seen.txt"), "x").unwrap();

        let mut walker = Walker::new(&test_dir).unwrap();
        while let WalkStatus::InProgress = walker.step(WALK_BATCH_SIZE) {}
        walker.cancel();
        assert_eq!(walker.step(WALK_BATCH_SIZE), WalkStatus::Done);

        let catalog = walker.finish();
        assert!(catalog.lookup("seen.txt").is_some());
        assert!(catalog.lookup("empty").is_none(), "prune still applies");

        cleanup_test_dir(&test_dir);
    }

    #[test]
    fn test_cancel_before_stepping_yields_empty_catalog() {
        let test_dir = setup_test_dir();
        fs::write(test_dir.join("f.txt"), "x").unwrap();

        let mut walker = Walker::new(&test_dir).unwrap();
        walker.cancel();
        assert_eq!(walker.step(WALK_BATCH_SIZE), WalkStatus::Done);

        let catalog = walker.finish();
        assert!(catalog.is_empty());

        cleanup_test_dir(&test_dir);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_excluded() {
        let test_dir = setup_test_dir();
        fs::create_dir_all(test_dir.join("real")).unwrap();
        fs::write(test_dir.join("real/f.txt"), "x").unwrap();
        std::os::unix::fs::symlink(test_dir.join("real"), test_dir.join("link")).unwrap();
        std::os::unix::fs::symlink(test_dir.join("real/f.txt"), test_dir.join("link.txt"))
            .unwrap();

        let catalog = Catalog::build(&test_dir).unwrap();
        assert!(catalog.lookup("link").is_none());
        assert!(catalog.lookup("link.txt").is_none());
        assert!(catalog.lookup("real/f.txt").is_some());

        cleanup_test_dir(&test_dir);
    }
}
