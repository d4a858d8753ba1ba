use crate::{
    error::Error,
    pose::{self, KeypointKind},
};
use bitvec::bitvec;
use std::collections::VecDeque;

/// Which displacement tensor to read when walking an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Parent to child.
    Forward,
    /// Child to parent.
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor {
    pub part: usize,
    pub edge: usize,
    pub direction: Direction,
}

/// One step of a traversal: reach `neighbor` from the already decoded `source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub source: usize,
    pub neighbor: Neighbor,
}

/// Undirected view of the kinematic tree, indexed by part id. Each part lists
/// its neighbors in edge-table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkeletonGraph {
    neighbors: Vec<Vec<Neighbor>>,
    num_edges: usize,
}

impl SkeletonGraph {
    /// Build the graph from `(parent, child)` edges over `num_parts` parts.
    pub fn from_edges(num_parts: usize, edges: &[(usize, usize)]) -> Result<Self, Error> {
        if let Some((edge, &(parent, child))) = edges
            .iter()
            .enumerate()
            .find(|(_, (parent, child))| *parent >= num_parts || *child >= num_parts)
        {
            return Err(Error::InvalidSkeletonEdge {
                edge,
                parent,
                child,
                num_parts,
            });
        }
        Ok(Self::from_valid_edges(num_parts, edges))
    }

    fn from_valid_edges(num_parts: usize, edges: &[(usize, usize)]) -> Self {
        let mut neighbors = vec![vec![]; num_parts];
        for (edge, &(parent, child)) in edges.iter().enumerate() {
            neighbors[parent].push(Neighbor {
                part: child,
                edge,
                direction: Direction::Forward,
            });
            neighbors[child].push(Neighbor {
                part: parent,
                edge,
                direction: Direction::Backward,
            });
        }
        Self {
            neighbors,
            num_edges: edges.len(),
        }
    }

    pub fn coco() -> Self {
        let edges = pose::constants::POSE_CHAIN
            .iter()
            .map(|&(parent, child)| (parent.idx(), child.idx()))
            .collect::<Vec<_>>();
        Self::from_valid_edges(pose::NUM_KEYPOINTS, &edges)
    }

    #[inline]
    pub fn num_parts(&self) -> usize {
        self.neighbors.len()
    }

    #[inline]
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    pub fn edges_from(&self, part: usize) -> &[Neighbor] {
        &self.neighbors[part]
    }

    pub fn edges_from_kind(&self, kind: KeypointKind) -> &[Neighbor] {
        self.edges_from(kind.idx())
    }

    /// Breadth-first order from `root`, neighbors taken in edge-table order.
    /// Every part other than the root appears exactly once as a target.
    pub fn traversal_order(&self, root: usize) -> Vec<Step> {
        let mut steps = Vec::with_capacity(self.num_parts().saturating_sub(1));
        let mut visited = bitvec![0; self.num_parts()];
        let mut queue = VecDeque::with_capacity(self.num_parts());

        visited.set(root, true);
        queue.push_back(root);

        while let Some(source) = queue.pop_front() {
            for &neighbor in self.edges_from(source) {
                if visited[neighbor.part] {
                    continue;
                }
                visited.set(neighbor.part, true);
                steps.push(Step { source, neighbor });
                queue.push_back(neighbor.part);
            }
        }
        steps
    }
}

impl Default for SkeletonGraph {
    fn default() -> Self {
        Self::coco()
    }
}
