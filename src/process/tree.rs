use std::collections::{HashSet, VecDeque};

/// Levels below the child that are collected for termination.
pub const MAX_TREE_DEPTH: usize = 16;

/// Processes shared with the parent console, never terminated.
pub const SKIPPED_PROCESSES: &[&str] = &["conhost.exe"];

/// One row of a system-wide process snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub ppid: u32,
    pub name: String,
}

impl ProcessEntry {
    pub fn new<N: Into<String>>(pid: u32, ppid: u32, name: N) -> Self {
        Self {
            pid,
            ppid,
            name: name.into(),
        }
    }

    fn is_skipped(&self) -> bool {
        SKIPPED_PROCESSES
            .iter()
            .any(|name| self.name.eq_ignore_ascii_case(name))
    }
}

/// A descendant of the supervised child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessNode {
    pub pid: u32,
    pub parent: u32,
    /// 1 for direct children of the root
    pub depth: usize,
    /// number of transitive descendants collected below this node
    pub descendants: usize,
}

/// Collects the descendants of `root` breadth-first, down to
/// [`MAX_TREE_DEPTH`] levels. The result is ordered for termination: deepest
/// first, and within a level in snapshot order.
pub fn descendants(snapshot: &[ProcessEntry], root: u32) -> Vec<ProcessNode> {
    let mut nodes: Vec<ProcessNode> = vec![];
    let mut seen = HashSet::from([root]);
    let mut queue = VecDeque::from([(root, 0usize)]);

    while let Some((parent, depth)) = queue.pop_front() {
        if depth >= MAX_TREE_DEPTH {
            continue;
        }
        for entry in snapshot.iter().filter(|e| e.ppid == parent && e.pid != parent) {
            if entry.is_skipped() || !seen.insert(entry.pid) {
                continue;
            }
            nodes.push(ProcessNode {
                pid: entry.pid,
                parent,
                depth: depth + 1,
                descendants: 0,
            });
            queue.push_back((entry.pid, depth + 1));
        }
    }

    // nodes are in breadth-first order, so every node comes after its parent
    for i in (0..nodes.len()).rev() {
        let (parent, count) = (nodes[i].parent, nodes[i].descendants + 1);
        if let Some(p) = nodes[..i].iter_mut().rev().find(|n| n.pid == parent) {
            p.descendants += count;
        }
    }

    nodes.sort_by(|a, b| b.depth.cmp(&a.depth));
    nodes
}
