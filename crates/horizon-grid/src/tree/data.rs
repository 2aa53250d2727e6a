use horizon_grid_core::logging::targets;

/// The shape of a tree whose nodes are row indexes.
pub trait TreeData: Send + Sync {
    fn element_count(&self) -> usize;

    fn parent(&self, index: usize) -> Option<usize>;

    /// Direct children in row order.
    fn children(&self, index: usize) -> Vec<usize>;

    /// Number of ancestors; roots have depth 0.
    fn depth(&self, index: usize) -> usize {
        let mut depth = 0;
        let mut current = index;
        while let Some(parent) = self.parent(current) {
            depth += 1;
            current = parent;
        }
        depth
    }

    fn has_children(&self, index: usize) -> bool {
        !self.children(index).is_empty()
    }

    /// All descendants in depth-first order.
    fn descendants(&self, index: usize) -> Vec<usize> {
        let mut descendants = Vec::new();
        let mut stack: Vec<usize> = self.children(index).into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            descendants.push(node);
            stack.extend(self.children(node).into_iter().rev());
        }
        descendants
    }
}

/// A tree given by each row's parent row.
///
/// Rows are in tree order: a parent comes before its children.
#[derive(Debug, Clone, Default)]
pub struct ParentTreeData {
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    depths: Vec<usize>,
}

impl ParentTreeData {
    /// Parents that do not precede their child are treated as missing.
    pub fn new(parents: impl IntoIterator<Item = Option<usize>>) -> Self {
        let mut parents: Vec<Option<usize>> = parents.into_iter().collect();
        let mut children = vec![Vec::new(); parents.len()];
        let mut depths = vec![0; parents.len()];
        for index in 0..parents.len() {
            match parents[index] {
                Some(parent) if parent < index => {
                    children[parent].push(index);
                    depths[index] = depths[parent] + 1;
                }
                Some(parent) => {
                    tracing::warn!(target: targets::TREE, index, parent, "parent after child, treated as root");
                    parents[index] = None;
                }
                None => {}
            }
        }
        Self {
            parents,
            children,
            depths,
        }
    }

    /// A tree from each row's depth, the way outlines are written.
    pub fn from_depths(depths: impl IntoIterator<Item = usize>) -> Self {
        let mut path: Vec<usize> = Vec::new();
        let parents: Vec<Option<usize>> = depths
            .into_iter()
            .enumerate()
            .map(|(index, depth)| {
                path.truncate(depth);
                let parent = path.last().copied();
                path.push(index);
                parent
            })
            .collect();
        Self::new(parents)
    }
}

impl TreeData for ParentTreeData {
    fn element_count(&self) -> usize {
        self.parents.len()
    }

    fn parent(&self, index: usize) -> Option<usize> {
        self.parents.get(index).copied().flatten()
    }

    fn children(&self, index: usize) -> Vec<usize> {
        self.children.get(index).cloned().unwrap_or_default()
    }

    fn depth(&self, index: usize) -> usize {
        self.depths.get(index).copied().unwrap_or(0)
    }

    fn has_children(&self, index: usize) -> bool {
        self.children.get(index).is_some_and(|c| !c.is_empty())
    }
}
