use arrayvec::ArrayVec;
use index_vec::IndexVec;
use ordered_float::OrderedFloat;

use crate::geometry::{
    Aabb, FloatType, Ray, SurfaceHit, TriangleIdx, TriangleTable, VertexTable, WorldPoint,
};
use crate::parallel_for_each::{parallel_map, WorkerCount};

index_vec::define_index_type! {
    pub struct NodeIdx = u32;
}

/// Nodes with fewer triangles than this become leaves.
pub const LEAF_TRIANGLE_LIMIT: usize = 20;
/// Hard cap on subdivision depth.
pub const DEPTH_MAX: i32 = 10;
/// Sizing factor for the depth heuristic: triangles typically land in
/// several octants, so the tree is sized for more nodes than triangles.
const NODES_PER_TRIANGLE: usize = 4;

/// Recursive spatial partition over one model's triangles, stored as an
/// arena of nodes. Built once at model load, immutable afterwards.
#[derive(Clone, Debug)]
pub struct Octree {
    nodes: IndexVec<NodeIdx, OctNode>,
    root: Option<NodeIdx>,
}

#[derive(Clone, Debug)]
struct OctNode {
    bbox: Aabb,
    kind: NodeKind,
}

#[derive(Clone, Debug)]
enum NodeKind {
    /// Non-empty triangle list, no children.
    Leaf(Vec<TriangleIdx>),
    /// Exactly 8 child slots, absent children allowed and common.
    Inner([Option<NodeIdx>; 8]),
}

impl Octree {
    /// Builds the octree over all triangles of the table. The 8 top-level
    /// octant subtrees build in parallel into independent arenas which are
    /// then grafted into the final one.
    pub fn build(bbox: &Aabb, triangles: &TriangleTable) -> Octree {
        let all: Vec<TriangleIdx> = (0..triangles.len()).map(TriangleIdx::from_usize).collect();
        if all.is_empty() {
            return Octree {
                nodes: IndexVec::new(),
                root: None,
            };
        }

        let depth = Self::initial_depth(all.len());
        if all.len() < LEAF_TRIANGLE_LIMIT || depth < 0 {
            let mut nodes = IndexVec::new();
            let root = build_node(&mut nodes, bbox.clone(), all, depth, triangles);
            return Octree { nodes, root };
        }

        let boxes = octant_boxes(bbox);
        let lists = partition_triangles(&all, &boxes, triangles);

        let subtrees = parallel_map(8, WorkerCount::Auto, |i| {
            let mut nodes = IndexVec::new();
            let root = build_node(
                &mut nodes,
                boxes[i].clone(),
                lists[i].clone(),
                depth - 1,
                triangles,
            );
            Octree { nodes, root }
        });

        let mut nodes: IndexVec<NodeIdx, OctNode> = IndexVec::new();
        let mut children = [None; 8];
        for (child, subtree) in children.iter_mut().zip(subtrees) {
            *child = graft(&mut nodes, subtree);
        }
        let root = nodes.push(OctNode {
            bbox: bbox.clone(),
            kind: NodeKind::Inner(children),
        });

        Octree {
            nodes,
            root: Some(root),
        }
    }

    /// Subdivision depth derived from the triangle count, so denser models
    /// get deeper trees.
    pub fn initial_depth(triangle_count: usize) -> i32 {
        let nodes_required = (triangle_count * NODES_PER_TRIANGLE) as FloatType;
        let depth = (nodes_required.ln() / (8.0 as FloatType).ln()).round() as i32;
        depth.min(DEPTH_MAX)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nearest hit strictly below `target_depth`, in ray-distance order with
    /// early termination. Under `shadow`, any qualifying hit is returned
    /// immediately since shadow queries only need existence of an occluder.
    pub fn nearest_hit(
        &self,
        ray: &Ray,
        vertices: &VertexTable,
        triangles: &TriangleTable,
        hit: &mut SurfaceHit,
        target_depth: FloatType,
        shadow: bool,
    ) -> Option<FloatType> {
        let root = self.root?;
        self.nearest_hit_node(root, ray, vertices, triangles, hit, target_depth, shadow)
    }

    fn nearest_hit_node(
        &self,
        node: NodeIdx,
        ray: &Ray,
        vertices: &VertexTable,
        triangles: &TriangleTable,
        hit: &mut SurfaceHit,
        target_depth: FloatType,
        shadow: bool,
    ) -> Option<FloatType> {
        match &self.nodes[node].kind {
            NodeKind::Leaf(indices) => {
                let mut best = None;
                for &index in indices {
                    if let Some(depth) = triangles[index].ray_cast(index, vertices, ray, hit) {
                        if depth < best.unwrap_or(target_depth) {
                            best = Some(depth);
                            if shadow {
                                return best;
                            }
                        }
                    }
                }
                best
            }
            NodeKind::Inner(children) => {
                // Children the ray can reach, ordered by box entry distance
                let mut ordered: ArrayVec<(FloatType, NodeIdx), 8> = children
                    .iter()
                    .flatten()
                    .filter_map(|&child| {
                        self.nodes[child]
                            .bbox
                            .ray_cast(ray)
                            .map(|entry| (entry, child))
                    })
                    .collect();
                ordered.sort_unstable_by_key(|&(entry, _)| OrderedFloat(entry));

                let mut best: Option<FloatType> = None;
                for &(entry, child) in &ordered {
                    if best.unwrap_or(target_depth) <= entry {
                        // Only strictly closer hits are accepted, so a child
                        // entered at or beyond the current best cannot
                        // contribute.
                        break;
                    }
                    if let Some(depth) = self.nearest_hit_node(
                        child,
                        ray,
                        vertices,
                        triangles,
                        hit,
                        target_depth,
                        shadow,
                    ) {
                        if depth < best.unwrap_or(target_depth) {
                            best = Some(depth);
                        }
                        if shadow && best.is_some() {
                            return best;
                        }
                    }
                }
                best
            }
        }
    }
}

fn build_node(
    nodes: &mut IndexVec<NodeIdx, OctNode>,
    bbox: Aabb,
    indices: Vec<TriangleIdx>,
    depth: i32,
    triangles: &TriangleTable,
) -> Option<NodeIdx> {
    if indices.is_empty() {
        return None;
    }

    if indices.len() < LEAF_TRIANGLE_LIMIT || depth < 0 {
        return Some(nodes.push(OctNode {
            bbox,
            kind: NodeKind::Leaf(indices),
        }));
    }

    let boxes = octant_boxes(&bbox);
    let lists = partition_triangles(&indices, &boxes, triangles);

    let mut children = [None; 8];
    for ((child, octant_box), list) in children.iter_mut().zip(boxes).zip(lists) {
        *child = build_node(nodes, octant_box, list, depth - 1, triangles);
    }

    Some(nodes.push(OctNode {
        bbox,
        kind: NodeKind::Inner(children),
    }))
}

/// Splits a box into its 8 equal octants, indexed x * 4 + y * 2 + z.
fn octant_boxes(bbox: &Aabb) -> [Aabb; 8] {
    let half = bbox.size() / 2.0;
    std::array::from_fn(|i| {
        let offsets = [(i / 4) as FloatType, (i / 2 % 2) as FloatType, (i % 2) as FloatType];
        let min = WorldPoint::new(
            bbox.min.x + offsets[0] * half.x,
            bbox.min.y + offsets[1] * half.y,
            bbox.min.z + offsets[2] * half.z,
        );
        Aabb::new(min, min + half)
    })
}

/// Assigns each triangle to every octant whose box overlaps its box. A
/// triangle may land in up to 8 lists; the duplication trades memory for
/// avoiding exact triangle/octant clipping.
fn partition_triangles(
    indices: &[TriangleIdx],
    boxes: &[Aabb; 8],
    triangles: &TriangleTable,
) -> [Vec<TriangleIdx>; 8] {
    let mut lists: [Vec<TriangleIdx>; 8] = Default::default();
    for &index in indices {
        for (list, octant_box) in lists.iter_mut().zip(boxes) {
            if Aabb::overlap(octant_box, triangles[index].bounding_box()) {
                list.push(index);
            }
        }
    }
    lists
}

fn graft(nodes: &mut IndexVec<NodeIdx, OctNode>, sub: Octree) -> Option<NodeIdx> {
    let offset = nodes.len();
    let root = sub.root?;
    for mut node in sub.nodes.into_iter() {
        if let NodeKind::Inner(children) = &mut node.kind {
            for child in children.iter_mut() {
                *child = child.map(|c| NodeIdx::from_usize(c.index() + offset));
            }
        }
        nodes.push(node);
    }
    Some(NodeIdx::from_usize(root.index() + offset))
}
