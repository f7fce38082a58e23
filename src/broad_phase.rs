//! Broad Phase — Dynamic AABB Tree
//!
//! A self-balancing binary tree of fattened AABBs with O(log n) insert,
//! remove, and move operations, plus the pair bookkeeping that feeds the
//! contact manager. Leaves are fixture proxies; fat margins and displacement
//! prediction keep fast bodies from re-inserting every step.
//!
//! # Features
//!
//! - **Incremental updates**: proxies move without a full rebuild
//! - **SAH insertion**: siblings chosen by perimeter cost
//! - **Tree rotations**: AVL-style balancing keeps queries O(log n)
//! - **Move buffer**: only proxies that actually re-inserted generate pairs

use crate::math::{Aabb, Vec2};
use crate::settings::{AABB_EXTENSION, AABB_MULTIPLIER};
use crate::shape::RayCastInput;

/// Null node sentinel.
pub const NULL_NODE: u32 = u32::MAX;

/// Identifies a fixture: the owning body's id and the fixture's index on that
/// body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixtureKey {
    /// Body id in the world arena
    pub body: usize,
    /// Fixture index on the body
    pub fixture: usize,
}

impl FixtureKey {
    /// Sentinel key for internal nodes.
    const NONE: Self = Self {
        body: usize::MAX,
        fixture: usize::MAX,
    };
}

/// A node in the tree.
#[derive(Clone, Debug)]
struct TreeNode {
    /// Fat AABB
    aabb: Aabb,
    parent: u32,
    left: u32,
    right: u32,
    /// 0 for leaves, -1 for free nodes
    height: i32,
    key: FixtureKey,
}

impl TreeNode {
    fn new() -> Self {
        Self {
            aabb: Aabb::default(),
            parent: NULL_NODE,
            left: NULL_NODE,
            right: NULL_NODE,
            height: -1,
            key: FixtureKey::NONE,
        }
    }

    #[inline]
    fn is_leaf(&self) -> bool {
        self.left == NULL_NODE
    }
}

// ============================================================================
// Dynamic tree
// ============================================================================

/// Incremental AABB tree over fixture proxies.
pub struct DynamicTree {
    nodes: Vec<TreeNode>,
    free_list: Vec<u32>,
    root: u32,
    proxy_count: usize,
}

impl DynamicTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free_list: Vec::new(),
            root: NULL_NODE,
            proxy_count: 0,
        }
    }

    /// Number of live proxies.
    #[inline]
    #[must_use]
    pub fn proxy_count(&self) -> usize {
        self.proxy_count
    }

    /// Tree height (0 when empty).
    #[must_use]
    pub fn height(&self) -> i32 {
        if self.root == NULL_NODE {
            0
        } else {
            self.nodes[self.root as usize].height
        }
    }

    /// Insert a proxy with a fattened AABB. Returns the proxy id.
    pub fn create_proxy(&mut self, aabb: Aabb, key: FixtureKey) -> u32 {
        let proxy = self.alloc_node();
        let r = Vec2::new(AABB_EXTENSION, AABB_EXTENSION);
        let node = &mut self.nodes[proxy as usize];
        node.aabb = Aabb::new(aabb.min - r, aabb.max + r);
        node.key = key;
        node.height = 0;
        self.insert_leaf(proxy);
        self.proxy_count += 1;
        proxy
    }

    /// Remove a proxy.
    pub fn destroy_proxy(&mut self, proxy: u32) {
        debug_assert!(self.nodes[proxy as usize].is_leaf());
        self.remove_leaf(proxy);
        self.free_node(proxy);
        self.proxy_count -= 1;
    }

    /// Move a proxy to a new tight AABB with a predicted displacement.
    /// Returns `true` if the proxy was re-inserted (its fat AABB changed).
    pub fn move_proxy(&mut self, proxy: u32, aabb: Aabb, displacement: Vec2) -> bool {
        debug_assert!(self.nodes[proxy as usize].is_leaf());

        // Extend and predict motion.
        let r = Vec2::new(AABB_EXTENSION, AABB_EXTENSION);
        let mut fat = Aabb::new(aabb.min - r, aabb.max + r);
        let d = displacement * AABB_MULTIPLIER;
        if d.x < 0.0 {
            fat.min.x += d.x;
        } else {
            fat.max.x += d.x;
        }
        if d.y < 0.0 {
            fat.min.y += d.y;
        } else {
            fat.max.y += d.y;
        }

        if self.nodes[proxy as usize].aabb.contains(&aabb) {
            return false;
        }

        self.remove_leaf(proxy);
        self.nodes[proxy as usize].aabb = fat;
        self.insert_leaf(proxy);
        true
    }

    /// Fixture key of a proxy.
    #[inline]
    #[must_use]
    pub fn key(&self, proxy: u32) -> FixtureKey {
        self.nodes[proxy as usize].key
    }

    /// Fat AABB of a proxy.
    #[inline]
    #[must_use]
    pub fn fat_aabb(&self, proxy: u32) -> Aabb {
        self.nodes[proxy as usize].aabb
    }

    /// Visit every proxy whose fat AABB overlaps `aabb`. The callback returns
    /// `false` to stop the query.
    pub fn query<F: FnMut(u32) -> bool>(&self, aabb: &Aabb, mut callback: F) {
        if self.root == NULL_NODE {
            return;
        }

        let mut stack = Vec::with_capacity(64);
        stack.push(self.root);

        while let Some(node_id) = stack.pop() {
            if node_id == NULL_NODE {
                continue;
            }
            let node = &self.nodes[node_id as usize];
            if !node.aabb.overlaps(aabb) {
                continue;
            }
            if node.is_leaf() {
                if !callback(node_id) {
                    return;
                }
            } else {
                stack.push(node.left);
                stack.push(node.right);
            }
        }
    }

    /// Cast a segment through the tree. The callback receives the clipped
    /// input and the leaf's fixture key, and returns the new clip fraction:
    /// `0` stops the traversal, the input fraction continues unchanged, and a
    /// smaller value shortens the segment.
    pub fn ray_cast<F>(&self, input: &RayCastInput, mut callback: F)
    where
        F: FnMut(&RayCastInput, FixtureKey) -> f32,
    {
        let p1 = input.p1;
        let p2 = input.p2;
        let r = (p2 - p1).normalize();
        if r == Vec2::ZERO {
            return;
        }

        // v is perpendicular to the segment; used for a separating-axis test
        // against node AABBs.
        let v = r.perpendicular();
        let abs_v = v.abs();

        let mut max_fraction = input.max_fraction;
        let mut segment_aabb = {
            let t = p1 + (p2 - p1) * max_fraction;
            Aabb::new(p1.min(t), p1.max(t))
        };

        let mut stack = Vec::with_capacity(64);
        stack.push(self.root);

        while let Some(node_id) = stack.pop() {
            if node_id == NULL_NODE {
                continue;
            }
            let node = &self.nodes[node_id as usize];
            if !node.aabb.overlaps(&segment_aabb) {
                continue;
            }

            // Separating axis: |dot(v, p1 - c)| > dot(|v|, h)
            let c = node.aabb.center();
            let h = node.aabb.extents();
            if v.dot(p1 - c).abs() - abs_v.dot(h) > 0.0 {
                continue;
            }

            if node.is_leaf() {
                let sub_input = RayCastInput {
                    p1,
                    p2,
                    max_fraction,
                };
                let value = callback(&sub_input, node.key);
                if value == 0.0 {
                    // The client has terminated the ray cast.
                    return;
                }
                if value > 0.0 {
                    max_fraction = value;
                    let t = p1 + (p2 - p1) * max_fraction;
                    segment_aabb = Aabb::new(p1.min(t), p1.max(t));
                }
            } else {
                stack.push(node.left);
                stack.push(node.right);
            }
        }
    }

    // =========== Internal methods ===========

    fn alloc_node(&mut self) -> u32 {
        if let Some(id) = self.free_list.pop() {
            self.nodes[id as usize] = TreeNode::new();
            id
        } else {
            let id = self.nodes.len() as u32;
            self.nodes.push(TreeNode::new());
            id
        }
    }

    fn free_node(&mut self, node_id: u32) {
        self.nodes[node_id as usize] = TreeNode::new();
        self.free_list.push(node_id);
    }

    fn insert_leaf(&mut self, leaf: u32) {
        if self.root == NULL_NODE {
            self.root = leaf;
            self.nodes[leaf as usize].parent = NULL_NODE;
            return;
        }

        // Find the best sibling by perimeter cost.
        let leaf_aabb = self.nodes[leaf as usize].aabb;
        let mut sibling = self.root;
        while !self.nodes[sibling as usize].is_leaf() {
            let left = self.nodes[sibling as usize].left;
            let right = self.nodes[sibling as usize].right;

            let area = self.nodes[sibling as usize].aabb.perimeter();
            let combined_area = leaf_aabb.union(&self.nodes[sibling as usize].aabb).perimeter();

            // Cost of making a new parent for this node and the leaf.
            let cost = 2.0 * combined_area;
            let inheritance_cost = 2.0 * (combined_area - area);

            let cost_left = self.descend_cost(left, &leaf_aabb, inheritance_cost);
            let cost_right = self.descend_cost(right, &leaf_aabb, inheritance_cost);

            if cost < cost_left && cost < cost_right {
                break;
            }
            sibling = if cost_left < cost_right { left } else { right };
        }

        // Splice in a new parent.
        let old_parent = self.nodes[sibling as usize].parent;
        let new_parent = self.alloc_node();
        self.nodes[new_parent as usize].parent = old_parent;
        self.nodes[new_parent as usize].aabb =
            leaf_aabb.union(&self.nodes[sibling as usize].aabb);
        self.nodes[new_parent as usize].height = self.nodes[sibling as usize].height + 1;

        if old_parent != NULL_NODE {
            if self.nodes[old_parent as usize].left == sibling {
                self.nodes[old_parent as usize].left = new_parent;
            } else {
                self.nodes[old_parent as usize].right = new_parent;
            }
        } else {
            self.root = new_parent;
        }

        self.nodes[new_parent as usize].left = sibling;
        self.nodes[new_parent as usize].right = leaf;
        self.nodes[sibling as usize].parent = new_parent;
        self.nodes[leaf as usize].parent = new_parent;

        self.refit_upwards(new_parent);
    }

    fn descend_cost(&self, child: u32, leaf_aabb: &Aabb, inheritance: f32) -> f32 {
        let combined = leaf_aabb.union(&self.nodes[child as usize].aabb);
        if self.nodes[child as usize].is_leaf() {
            combined.perimeter() + inheritance
        } else {
            combined.perimeter() - self.nodes[child as usize].aabb.perimeter() + inheritance
        }
    }

    fn remove_leaf(&mut self, leaf: u32) {
        if leaf == self.root {
            self.root = NULL_NODE;
            return;
        }

        let parent = self.nodes[leaf as usize].parent;
        let grand_parent = self.nodes[parent as usize].parent;
        let sibling = if self.nodes[parent as usize].left == leaf {
            self.nodes[parent as usize].right
        } else {
            self.nodes[parent as usize].left
        };

        if grand_parent != NULL_NODE {
            if self.nodes[grand_parent as usize].left == parent {
                self.nodes[grand_parent as usize].left = sibling;
            } else {
                self.nodes[grand_parent as usize].right = sibling;
            }
            self.nodes[sibling as usize].parent = grand_parent;
            self.free_node(parent);
            self.refit_upwards(grand_parent);
        } else {
            self.root = sibling;
            self.nodes[sibling as usize].parent = NULL_NODE;
            self.free_node(parent);
        }
    }

    /// Walk to the root fixing heights, AABBs, and balance.
    fn refit_upwards(&mut self, start: u32) {
        let mut node_id = start;
        while node_id != NULL_NODE {
            node_id = self.balance(node_id);

            let left = self.nodes[node_id as usize].left;
            let right = self.nodes[node_id as usize].right;
            let lh = self.nodes[left as usize].height;
            let rh = self.nodes[right as usize].height;
            self.nodes[node_id as usize].height = 1 + lh.max(rh);
            self.nodes[node_id as usize].aabb = self.nodes[left as usize]
                .aabb
                .union(&self.nodes[right as usize].aabb);

            node_id = self.nodes[node_id as usize].parent;
        }
    }

    /// AVL rotation at `a` if it is unbalanced. Returns the subtree root.
    fn balance(&mut self, a: u32) -> u32 {
        if self.nodes[a as usize].is_leaf() || self.nodes[a as usize].height < 2 {
            return a;
        }

        let b = self.nodes[a as usize].left;
        let c = self.nodes[a as usize].right;
        let balance = self.nodes[c as usize].height - self.nodes[b as usize].height;

        if balance > 1 {
            self.rotate_up(a, c)
        } else if balance < -1 {
            self.rotate_up(a, b)
        } else {
            a
        }
    }

    /// Promote child `b` above its parent `a`, hanging `a` and the taller of
    /// `b`'s children back underneath.
    fn rotate_up(&mut self, a: u32, b: u32) -> u32 {
        let b_left = self.nodes[b as usize].left;
        let b_right = self.nodes[b as usize].right;
        let parent = self.nodes[a as usize].parent;

        self.nodes[b as usize].left = a;
        self.nodes[b as usize].parent = parent;
        self.nodes[a as usize].parent = b;

        if parent != NULL_NODE {
            if self.nodes[parent as usize].left == a {
                self.nodes[parent as usize].left = b;
            } else {
                self.nodes[parent as usize].right = b;
            }
        } else {
            self.root = b;
        }

        let (keep, give) = if self.nodes[b_left as usize].height > self.nodes[b_right as usize].height
        {
            (b_left, b_right)
        } else {
            (b_right, b_left)
        };
        self.nodes[b as usize].right = keep;
        self.nodes[keep as usize].parent = b;

        // `give` replaces b in a's child slot.
        if self.nodes[a as usize].left == b {
            self.nodes[a as usize].left = give;
        } else {
            self.nodes[a as usize].right = give;
        }
        self.nodes[give as usize].parent = a;

        // Refresh a, then b.
        for node in [a, b] {
            let left = self.nodes[node as usize].left;
            let right = self.nodes[node as usize].right;
            self.nodes[node as usize].aabb = self.nodes[left as usize]
                .aabb
                .union(&self.nodes[right as usize].aabb);
            self.nodes[node as usize].height =
                1 + self.nodes[left as usize].height.max(self.nodes[right as usize].height);
        }

        b
    }
}

impl Default for DynamicTree {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Broad phase
// ============================================================================

/// Pair management on top of the dynamic tree. Proxies that moved since the
/// last sweep are buffered; `update_pairs` queries the tree around each of
/// them and reports deduplicated proxy pairs.
pub struct BroadPhase {
    /// The underlying tree
    pub tree: DynamicTree,
    move_buffer: Vec<u32>,
    pair_buffer: Vec<(u32, u32)>,
}

impl BroadPhase {
    /// Create an empty broad phase.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: DynamicTree::new(),
            move_buffer: Vec::new(),
            pair_buffer: Vec::new(),
        }
    }

    /// Number of live proxies.
    #[inline]
    #[must_use]
    pub fn proxy_count(&self) -> usize {
        self.tree.proxy_count()
    }

    /// Create a proxy and schedule it for pair generation.
    pub fn create_proxy(&mut self, aabb: Aabb, key: FixtureKey) -> u32 {
        let proxy = self.tree.create_proxy(aabb, key);
        self.move_buffer.push(proxy);
        proxy
    }

    /// Destroy a proxy.
    pub fn destroy_proxy(&mut self, proxy: u32) {
        self.move_buffer.retain(|&p| p != proxy);
        self.tree.destroy_proxy(proxy);
    }

    /// Move a proxy; only re-inserted proxies are scheduled for pair
    /// generation (a proxy still inside its fat AABB cannot create new
    /// overlaps).
    pub fn move_proxy(&mut self, proxy: u32, aabb: Aabb, displacement: Vec2) {
        if self.tree.move_proxy(proxy, aabb, displacement) {
            self.move_buffer.push(proxy);
        }
    }

    /// Force a proxy to participate in the next pair sweep.
    pub fn touch_proxy(&mut self, proxy: u32) {
        self.move_buffer.push(proxy);
    }

    /// Returns `true` if the fat AABBs of two proxies overlap.
    #[must_use]
    pub fn test_overlap(&self, proxy_a: u32, proxy_b: u32) -> bool {
        self.tree
            .fat_aabb(proxy_a)
            .overlaps(&self.tree.fat_aabb(proxy_b))
    }

    /// Report every new potentially-overlapping proxy pair involving a moved
    /// proxy, then clear the move buffer.
    pub fn update_pairs<F: FnMut(FixtureKey, FixtureKey)>(&mut self, mut callback: F) {
        self.pair_buffer.clear();

        for &proxy in &self.move_buffer {
            let fat = self.tree.fat_aabb(proxy);
            let pairs = &mut self.pair_buffer;
            self.tree.query(&fat, |other| {
                if other != proxy {
                    pairs.push((proxy.min(other), proxy.max(other)));
                }
                true
            });
        }
        self.move_buffer.clear();

        self.pair_buffer.sort_unstable();
        self.pair_buffer.dedup();

        for &(a, b) in &self.pair_buffer {
            callback(self.tree.key(a), self.tree.key(b));
        }
    }

    /// Query the tree; see [`DynamicTree::query`].
    pub fn query<F: FnMut(u32) -> bool>(&self, aabb: &Aabb, callback: F) {
        self.tree.query(aabb, callback);
    }

    /// Ray cast through the tree; see [`DynamicTree::ray_cast`].
    pub fn ray_cast<F>(&self, input: &RayCastInput, callback: F)
    where
        F: FnMut(&RayCastInput, FixtureKey) -> f32,
    {
        self.tree.ray_cast(input, callback);
    }
}

impl Default for BroadPhase {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn key(i: usize) -> FixtureKey {
        FixtureKey {
            body: i,
            fixture: 0,
        }
    }

    fn unit_aabb(x: f32, y: f32) -> Aabb {
        Aabb::new(Vec2::new(x, y), Vec2::new(x + 1.0, y + 1.0))
    }

    #[test]
    fn test_create_and_query() {
        let mut tree = DynamicTree::new();
        tree.create_proxy(unit_aabb(0.0, 0.0), key(0));
        tree.create_proxy(unit_aabb(10.0, 10.0), key(1));
        tree.create_proxy(unit_aabb(20.0, 20.0), key(2));
        assert_eq!(tree.proxy_count(), 3);

        let mut hits = Vec::new();
        tree.query(&unit_aabb(-0.5, -0.5), |p| {
            hits.push(tree.key(p).body);
            true
        });
        assert!(hits.contains(&0));
        assert!(!hits.contains(&2));
    }

    #[test]
    fn test_destroy_proxy() {
        let mut tree = DynamicTree::new();
        let _p0 = tree.create_proxy(unit_aabb(0.0, 0.0), key(0));
        let p1 = tree.create_proxy(unit_aabb(5.0, 5.0), key(1));
        tree.destroy_proxy(p1);
        assert_eq!(tree.proxy_count(), 1);

        let mut hits = Vec::new();
        tree.query(
            &Aabb::new(Vec2::new(-100.0, -100.0), Vec2::new(100.0, 100.0)),
            |p| {
                hits.push(tree.key(p).body);
                true
            },
        );
        assert_eq!(hits, vec![0]);
    }

    #[test]
    fn test_move_within_fat_aabb_no_reinsert() {
        let mut tree = DynamicTree::new();
        let p = tree.create_proxy(unit_aabb(0.0, 0.0), key(0));
        assert!(!tree.move_proxy(p, unit_aabb(0.05, 0.0), Vec2::ZERO));
    }

    #[test]
    fn test_move_far_reinserts() {
        let mut tree = DynamicTree::new();
        let p = tree.create_proxy(unit_aabb(0.0, 0.0), key(0));
        assert!(tree.move_proxy(p, unit_aabb(50.0, 50.0), Vec2::ZERO));

        let mut hits = Vec::new();
        tree.query(&unit_aabb(49.5, 49.5), |q| {
            hits.push(tree.key(q).body);
            true
        });
        assert_eq!(hits, vec![0]);
    }

    #[test]
    fn test_tree_stays_balanced() {
        let mut tree = DynamicTree::new();
        for i in 0..100 {
            tree.create_proxy(unit_aabb(i as f32 * 3.0, 0.0), key(i));
        }
        assert_eq!(tree.proxy_count(), 100);
        assert!(tree.height() < 20, "height = {}", tree.height());
    }

    #[test]
    fn test_update_pairs_dedup() {
        let mut bp = BroadPhase::new();
        bp.create_proxy(Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(2.0, 2.0)), key(0));
        bp.create_proxy(Aabb::new(Vec2::new(1.0, 1.0), Vec2::new(3.0, 3.0)), key(1));
        bp.create_proxy(unit_aabb(100.0, 100.0), key(2));

        let mut pairs = Vec::new();
        bp.update_pairs(|a, b| pairs.push((a.body.min(b.body), a.body.max(b.body))));
        assert_eq!(pairs, vec![(0, 1)]);

        // Nothing moved: a second sweep reports nothing.
        let mut pairs2 = Vec::new();
        bp.update_pairs(|a, b| pairs2.push((a.body, b.body)));
        assert!(pairs2.is_empty());
    }

    #[test]
    fn test_ray_cast_closest() {
        let mut bp = BroadPhase::new();
        bp.create_proxy(unit_aabb(5.0, -0.5), key(0));
        bp.create_proxy(unit_aabb(10.0, -0.5), key(1));

        let input = RayCastInput {
            p1: Vec2::new(0.0, 0.0),
            p2: Vec2::new(20.0, 0.0),
            max_fraction: 1.0,
        };
        let mut visited = Vec::new();
        bp.ray_cast(&input, |sub, k| {
            visited.push(k.body);
            sub.max_fraction
        });
        assert!(visited.contains(&0));
        assert!(visited.contains(&1));
    }

    #[test]
    fn test_ray_cast_early_out() {
        let mut bp = BroadPhase::new();
        bp.create_proxy(unit_aabb(5.0, -0.5), key(0));
        bp.create_proxy(unit_aabb(10.0, -0.5), key(1));

        let input = RayCastInput {
            p1: Vec2::new(0.0, 0.0),
            p2: Vec2::new(20.0, 0.0),
            max_fraction: 1.0,
        };
        let mut count = 0;
        bp.ray_cast(&input, |_sub, _k| {
            count += 1;
            0.0
        });
        assert_eq!(count, 1, "returning 0 must stop the traversal");
    }

    #[test]
    fn test_ray_cast_misses_off_axis() {
        let mut bp = BroadPhase::new();
        bp.create_proxy(unit_aabb(5.0, 10.0), key(0));

        let input = RayCastInput {
            p1: Vec2::new(0.0, 0.0),
            p2: Vec2::new(20.0, 0.0),
            max_fraction: 1.0,
        };
        let mut count = 0;
        bp.ray_cast(&input, |sub, _k| {
            count += 1;
            sub.max_fraction
        });
        assert_eq!(count, 0);
    }
}
