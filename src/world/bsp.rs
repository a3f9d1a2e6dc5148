//! ----------------------------------------------------------------------------
//! **Static BSP over splitting lines**
//!
//! Internal nodes carry a splitting line and up to two children; leaves bind
//! exactly one sector.  Nodes live in one arena (`Vec<BspNode>`) and refer to
//! each other by index, so dropping the tree drops every node.
//!
//! Traversal is *back-to-front* relative to the viewer (painter's order):
//! whatever is farther along a partition is emitted first.
//! ----------------------------------------------------------------------------

use glam::DVec2;
use log::trace;
use thiserror::Error;

use crate::world::geometry::Segment;

pub type NodeId = u32;
pub type SectorId = u16;

/// Which side of a splitting line a point is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Front,
    Back,
    On,
}

/// Child slot of an internal node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Branch {
    Front,
    Back,
}

#[derive(Clone, Debug, PartialEq)]
pub enum BspNode {
    Internal {
        split: Segment,
        front: Option<NodeId>,
        back: Option<NodeId>,
    },
    Leaf {
        sector: SectorId,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BspError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("node {0} is a leaf and cannot take children")]
    LeafParent(NodeId),

    #[error("{branch:?} child of node {parent} is already set")]
    Occupied { parent: NodeId, branch: Branch },

    #[error("leaf node {node} references missing sector {sector}")]
    DanglingSector { node: NodeId, sector: SectorId },

    #[error("node {0} is reachable more than once")]
    SharedNode(NodeId),

    #[error("node {0} is not reachable from the root")]
    Orphan(NodeId),

    #[error("tree has no nodes")]
    Empty,
}

/// Classify `p` against the infinite line through `split`.
///
/// * vertical line: compare x (greater x is front)
/// * horizontal line: compare y (greater y is front)
/// * otherwise: front when `p.y` is above the line's y at `p.x`
pub fn classify(split: &Segment, p: DVec2) -> Side {
    let side = |d: f64| {
        if d > 0.0 {
            Side::Front
        } else if d < 0.0 {
            Side::Back
        } else {
            Side::On
        }
    };

    if split.is_vertical() {
        return side(p.x - split.a.x);
    }
    if split.is_horizontal() {
        return side(p.y - split.a.y);
    }

    let m = (split.b.y - split.a.y) / (split.b.x - split.a.x);
    let b = split.a.y - split.a.x * m;
    side(p.y - (p.x * m + b))
}

/// Binary space partition stored as an index arena.  Node 0 is the root.
#[derive(Clone, Debug, Default)]
pub struct BspTree {
    nodes: Vec<BspNode>,
}

impl BspTree {
    /// Tree whose root splits along `split`.
    pub fn new(split: Segment) -> Self {
        Self {
            nodes: vec![BspNode::Internal {
                split,
                front: None,
                back: None,
            }],
        }
    }

    /// Tree consisting of a single leaf.
    pub fn single(sector: SectorId) -> Self {
        Self {
            nodes: vec![BspNode::Leaf { sector }],
        }
    }

    /// Adopt a pre-built arena (e.g. from a level file).  Call
    /// [`BspTree::validate`] before traversing it.
    pub fn from_nodes(nodes: Vec<BspNode>) -> Self {
        Self { nodes }
    }

    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        (!self.nodes.is_empty()).then_some(0)
    }

    #[inline]
    pub fn nodes(&self) -> &[BspNode] {
        &self.nodes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&BspNode> {
        self.nodes.get(id as usize)
    }

    /// Hang a new internal node under `parent` and return its id.
    pub fn add_split(
        &mut self,
        parent: NodeId,
        branch: Branch,
        split: Segment,
    ) -> Result<NodeId, BspError> {
        self.attach(
            parent,
            branch,
            BspNode::Internal {
                split,
                front: None,
                back: None,
            },
        )
    }

    /// Hang a leaf bound to `sector` under `parent` and return its id.
    pub fn add_leaf(
        &mut self,
        parent: NodeId,
        branch: Branch,
        sector: SectorId,
    ) -> Result<NodeId, BspError> {
        self.attach(parent, branch, BspNode::Leaf { sector })
    }

    fn attach(&mut self, parent: NodeId, branch: Branch, node: BspNode) -> Result<NodeId, BspError> {
        let id = self.nodes.len() as NodeId;
        let slot = match self.nodes.get_mut(parent as usize) {
            None => return Err(BspError::UnknownNode(parent)),
            Some(BspNode::Leaf { .. }) => return Err(BspError::LeafParent(parent)),
            Some(BspNode::Internal { front, back, .. }) => match branch {
                Branch::Front => front,
                Branch::Back => back,
            },
        };
        if slot.is_some() {
            return Err(BspError::Occupied { parent, branch });
        }
        *slot = Some(id);
        self.nodes.push(node);
        Ok(id)
    }

    /// Check the arena is a proper tree whose leaves all reference one of
    /// `sector_count` sectors.
    pub fn validate(&self, sector_count: usize) -> Result<(), BspError> {
        if self.nodes.is_empty() {
            return Err(BspError::Empty);
        }

        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![0 as NodeId];
        while let Some(id) = stack.pop() {
            let node = self.node(id).ok_or(BspError::UnknownNode(id))?;
            let slot = &mut seen[id as usize];
            if *slot {
                return Err(BspError::SharedNode(id));
            }
            *slot = true;

            match node {
                BspNode::Leaf { sector } => {
                    if *sector as usize >= sector_count {
                        return Err(BspError::DanglingSector {
                            node: id,
                            sector: *sector,
                        });
                    }
                }
                BspNode::Internal { front, back, .. } => {
                    stack.extend(front.iter().chain(back.iter()).copied());
                }
            }
        }

        match seen.iter().position(|s| !s) {
            Some(orphan) => Err(BspError::Orphan(orphan as NodeId)),
            None => Ok(()),
        }
    }

    /// Sectors in painter's order (farthest first) as seen from `eye`.
    pub fn fill_draw_order(&self, eye: DVec2, out: &mut Vec<SectorId>) {
        out.clear();
        self.walk(self.root(), eye, &mut |s| out.push(s));
    }

    /// Visit every leaf sector back-to-front as seen from `eye`.
    pub fn for_each_back_to_front(&self, eye: DVec2, mut visit: impl FnMut(SectorId)) {
        self.walk(self.root(), eye, &mut visit);
    }

    fn walk(&self, id: Option<NodeId>, eye: DVec2, visit: &mut impl FnMut(SectorId)) {
        let Some(id) = id else {
            return;
        };

        match &self.nodes[id as usize] {
            BspNode::Leaf { sector } => {
                trace!("bsp: leaf {id} -> sector {sector}");
                visit(*sector);
            }
            BspNode::Internal { split, front, back } => match classify(split, eye) {
                // far side first, near side last
                Side::Front => {
                    self.walk(*back, eye, visit);
                    self.walk(*front, eye, visit);
                }
                Side::Back => {
                    self.walk(*front, eye, visit);
                    self.walk(*back, eye, visit);
                }
                Side::On => {
                    self.walk(*front, eye, visit);
                    self.walk(*back, eye, visit);
                }
            },
        }
    }

    /// Leaf sector containing `p`, descending front on ties.  `None` when
    /// the path ends in an empty child slot.
    pub fn locate(&self, p: DVec2) -> Option<SectorId> {
        let mut id = self.root()?;
        loop {
            match &self.nodes[id as usize] {
                BspNode::Leaf { sector } => return Some(*sector),
                BspNode::Internal { split, front, back } => {
                    id = match classify(split, p) {
                        Side::Back => (*back)?,
                        Side::Front | Side::On => (*front)?,
                    };
                }
            }
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;

    const A: SectorId = 0;
    const B: SectorId = 1;

    fn split_at_100() -> BspTree {
        let mut t = BspTree::new(Segment::new(100.0, 0.0, 100.0, 500.0));
        t.add_leaf(0, Branch::Back, A).unwrap();
        t.add_leaf(0, Branch::Front, B).unwrap();
        t
    }

    fn order(t: &BspTree, x: f64, y: f64) -> Vec<SectorId> {
        let mut v = Vec::new();
        t.fill_draw_order(dvec2(x, y), &mut v);
        v
    }

    #[test]
    fn classify_vertical_horizontal_and_sloped() {
        let v = Segment::new(100.0, 0.0, 100.0, 10.0);
        assert_eq!(classify(&v, dvec2(150.0, 3.0)), Side::Front);
        assert_eq!(classify(&v, dvec2(50.0, 3.0)), Side::Back);
        assert_eq!(classify(&v, dvec2(100.0, -7.0)), Side::On);

        let h = Segment::new(0.0, 20.0, 10.0, 20.0);
        assert_eq!(classify(&h, dvec2(5.0, 25.0)), Side::Front);
        assert_eq!(classify(&h, dvec2(5.0, 15.0)), Side::Back);
        assert_eq!(classify(&h, dvec2(99.0, 20.0)), Side::On);

        let d = Segment::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(classify(&d, dvec2(2.0, 5.0)), Side::Front);
        assert_eq!(classify(&d, dvec2(5.0, 2.0)), Side::Back);
        assert_eq!(classify(&d, dvec2(4.0, 4.0)), Side::On);
    }

    #[test]
    fn painter_order_follows_camera_side() {
        let t = split_at_100();
        assert_eq!(order(&t, 150.0, 10.0), vec![A, B]);
        assert_eq!(order(&t, 50.0, 10.0), vec![B, A]);
        // on the line: front then back
        assert_eq!(order(&t, 100.0, 10.0), vec![B, A]);
    }

    #[test]
    fn missing_children_are_skipped() {
        let mut t = BspTree::new(Segment::new(0.0, 0.0, 0.0, 1.0));
        t.add_leaf(0, Branch::Front, 3).unwrap();
        assert_eq!(order(&t, -5.0, 0.0), vec![3]);
        assert_eq!(t.locate(dvec2(-5.0, 0.0)), None);
        assert_eq!(t.locate(dvec2(5.0, 0.0)), Some(3));
    }

    #[test]
    fn nested_tree_orders_far_to_near() {
        // root: x = 100; front subtree splits y = 50
        let mut t = BspTree::new(Segment::new(100.0, 0.0, 100.0, 1.0));
        t.add_leaf(0, Branch::Back, 0).unwrap();
        let n = t.add_split(0, Branch::Front, Segment::new(0.0, 50.0, 1.0, 50.0)).unwrap();
        t.add_leaf(n, Branch::Back, 1).unwrap();
        t.add_leaf(n, Branch::Front, 2).unwrap();

        // camera at (150, 80): in front of both lines
        assert_eq!(order(&t, 150.0, 80.0), vec![0, 1, 2]);
        // camera at (150, 20): front of root, back of inner
        assert_eq!(order(&t, 150.0, 20.0), vec![0, 2, 1]);
        // camera at (20, 20): back of root
        assert_eq!(order(&t, 20.0, 20.0), vec![2, 1, 0]);

        assert_eq!(t.locate(dvec2(150.0, 80.0)), Some(2));
        assert_eq!(t.locate(dvec2(150.0, 20.0)), Some(1));
        assert_eq!(t.locate(dvec2(20.0, 20.0)), Some(0));
    }

    #[test]
    fn builder_rejects_bad_parents() {
        let mut t = split_at_100();
        assert_eq!(
            t.add_leaf(0, Branch::Back, 9),
            Err(BspError::Occupied {
                parent: 0,
                branch: Branch::Back
            })
        );
        assert_eq!(t.add_leaf(1, Branch::Back, 9), Err(BspError::LeafParent(1)));
        assert_eq!(t.add_leaf(42, Branch::Back, 9), Err(BspError::UnknownNode(42)));
    }

    #[test]
    fn validate_catches_malformed_arenas() {
        assert!(split_at_100().validate(2).is_ok());
        assert_eq!(
            split_at_100().validate(1),
            Err(BspError::DanglingSector { node: 2, sector: B })
        );
        assert_eq!(BspTree::default().validate(1), Err(BspError::Empty));

        let split = Segment::new(0.0, 0.0, 0.0, 1.0);
        let shared = BspTree::from_nodes(vec![
            BspNode::Internal {
                split,
                front: Some(1),
                back: Some(1),
            },
            BspNode::Leaf { sector: 0 },
        ]);
        assert_eq!(shared.validate(1), Err(BspError::SharedNode(1)));

        let cyclic = BspTree::from_nodes(vec![BspNode::Internal {
            split,
            front: Some(0),
            back: None,
        }]);
        assert_eq!(cyclic.validate(1), Err(BspError::SharedNode(0)));

        let orphan = BspTree::from_nodes(vec![
            BspNode::Leaf { sector: 0 },
            BspNode::Leaf { sector: 0 },
        ]);
        assert_eq!(orphan.validate(1), Err(BspError::Orphan(1)));

        let dangling_child = BspTree::from_nodes(vec![BspNode::Internal {
            split,
            front: Some(7),
            back: None,
        }]);
        assert_eq!(dangling_child.validate(1), Err(BspError::UnknownNode(7)));
    }
}
