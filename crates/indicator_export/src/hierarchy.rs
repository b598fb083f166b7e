//! Reconstruction of the archive's folder structure from its entry
//! list.
//!
//! The archive is the only source of truth: a [`PathTree`] is rebuilt
//! by splitting each entry name on `/` and inserting segments as nested
//! keys, preserving first-insertion order. Inserting a path twice is a
//! no-op. The tree flattens into a [`HierarchySnapshot`] — one row per
//! folder or file, padded to the maximum depth, with repeated parent
//! headers blanked for display.

use indicator_core::frame::{Cell, Frame};

/// Insertion-ordered tree node.
#[derive(Debug, Default, Clone, PartialEq)]
struct Node {
    children: Vec<(String, Node)>,
}

impl Node {
    fn child_mut(&mut self, name: &str) -> &mut Node {
        if let Some(pos) = self.children.iter().position(|(n, _)| n == name) {
            return &mut self.children[pos].1;
        }
        self.children.push((name.to_string(), Node::default()));
        &mut self.children.last_mut().unwrap().1
    }
}

/// The archive's path namespace as a tree.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PathTree {
    root: Node,
}

impl PathTree {
    /// Empty tree.
    pub fn new() -> PathTree {
        PathTree::default()
    }

    /// Build a tree from an ordered entry list.
    pub fn from_entries<I, S>(entries: I) -> PathTree
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tree = PathTree::new();
        for entry in entries {
            tree.insert(entry.as_ref());
        }
        tree
    }

    /// Insert one path; inserting the same path again changes nothing.
    pub fn insert(&mut self, path: &str) {
        let mut node = &mut self.root;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            node = node.child_mut(segment);
        }
    }

    /// Flatten into display rows.
    pub fn flatten(&self) -> HierarchySnapshot {
        let mut raw: Vec<Vec<String>> = Vec::new();
        let mut prefix: Vec<String> = Vec::new();
        walk(&self.root, &mut prefix, &mut raw);

        let depth = raw.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut raw {
            row.resize(depth, String::new());
        }

        let rows = blank_repeated_headers(raw);
        HierarchySnapshot { rows, depth }
    }
}

fn walk(node: &Node, prefix: &mut Vec<String>, rows: &mut Vec<Vec<String>>) {
    for (name, child) in &node.children {
        prefix.push(name.clone());
        rows.push(prefix.clone());
        walk(child, prefix, rows);
        prefix.pop();
    }
}

/// Blank a cell when it repeats the previous row's value in the same
/// column and every column to its left is unchanged too. A value whose
/// parent context differs is never collapsed.
fn blank_repeated_headers(raw: Vec<Vec<String>>) -> Vec<Vec<String>> {
    let mut rows = raw.clone();
    for i in 1..raw.len() {
        let mut parents_equal = true;
        for c in 0..raw[i].len() {
            if parents_equal && raw[i][c] == raw[i - 1][c] {
                rows[i][c] = String::new();
            } else {
                parents_equal = false;
            }
        }
    }
    rows
}

/// Flattened, display-deduplicated view of the archive structure.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchySnapshot {
    rows: Vec<Vec<String>>,
    depth: usize,
}

impl HierarchySnapshot {
    /// The display rows, one per folder or file.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Maximum depth observed.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Render as a frame with one `level_<n>` column per depth.
    pub fn to_frame(&self) -> Frame {
        let columns: Vec<String> = (1..=self.depth).map(|i| format!("level_{}", i)).collect();
        let rows: Vec<Vec<Cell>> = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|s| {
                        if s.is_empty() {
                            Cell::Null
                        } else {
                            Cell::Text(s.clone())
                        }
                    })
                    .collect()
            })
            .collect();
        Frame::from_rows(columns, rows).expect("level columns are unique")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_idempotent() {
        let once = PathTree::from_entries(["A/B/x.csv"]);
        let twice = PathTree::from_entries(["A/B/x.csv", "A/B/x.csv"]);
        assert_eq!(once.flatten(), twice.flatten());
    }

    #[test]
    fn test_flatten_rows_one_per_node() {
        let tree = PathTree::from_entries(["A/B/x.csv"]);
        let snapshot = tree.flatten();
        // A, A/B, A/B/x.csv
        assert_eq!(snapshot.rows().len(), 3);
        assert_eq!(snapshot.depth(), 3);
    }

    #[test]
    fn test_dedup_collapses_repeats_but_not_changed_parents() {
        let tree = PathTree::from_entries(["A/B/x.xlsx", "A/B/y.xlsx", "A/C/z.xlsx"]);
        let snapshot = tree.flatten();
        let rows = snapshot.rows();

        assert_eq!(rows[0], vec!["A", "", ""]);
        assert_eq!(rows[1], vec!["", "B", ""]);
        assert_eq!(rows[2], vec!["", "", "x.xlsx"]);
        // Second file under the same folder: A and B stay collapsed.
        assert_eq!(rows[3], vec!["", "", "y.xlsx"]);
        // The folder changed to C: it must not be collapsed.
        assert_eq!(rows[4], vec!["", "C", ""]);
        assert_eq!(rows[5], vec!["", "", "z.xlsx"]);
    }

    #[test]
    fn test_same_name_under_different_parent_not_collapsed() {
        let tree = PathTree::from_entries(["A/B/x.csv", "C/B/y.csv"]);
        let rows = tree.flatten();
        let rows = rows.rows();
        // The second "B" sits under "C"; parent context differs.
        assert_eq!(rows[3], vec!["C", "", ""]);
        assert_eq!(rows[4], vec!["", "B", ""]);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let tree = PathTree::from_entries(["Z/a.csv", "A/b.csv"]);
        let rows = tree.flatten();
        assert_eq!(rows.rows()[0][0], "Z");
        assert_eq!(rows.rows()[2][0], "A");
    }

    #[test]
    fn test_to_frame_levels() {
        let tree = PathTree::from_entries(["A/B/x.csv"]);
        let frame = tree.flatten().to_frame();
        assert_eq!(frame.columns(), &["level_1", "level_2", "level_3"]);
        assert_eq!(frame.cell(0, "level_1").unwrap(), &Cell::Text("A".into()));
        assert!(frame.cell(1, "level_1").unwrap().is_null());
    }

    #[test]
    fn test_empty_tree_flattens_empty() {
        let snapshot = PathTree::new().flatten();
        assert!(snapshot.rows().is_empty());
        assert_eq!(snapshot.depth(), 0);
    }
}
