// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Bounding Volume Hierarchy (BVH) for spatial acceleration
//! Used to find candidate triangle pairs before exact intersection tests

use super::BoundingBox;

/// BVH node
#[derive(Debug, Clone)]
pub struct BVHNode {
    /// Bounding box of this node
    pub bbox: BoundingBox,
    /// Left child (None for leaf)
    pub left: Option<Box<BVHNode>>,
    /// Right child (None for leaf)
    pub right: Option<Box<BVHNode>>,
    /// Items with their boxes (only for leaf nodes)
    pub items: Vec<(usize, BoundingBox)>,
}

impl BVHNode {
    fn leaf(bbox: BoundingBox, items: Vec<(usize, BoundingBox)>) -> Self {
        Self {
            bbox,
            left: None,
            right: None,
            items,
        }
    }

    fn internal(left: Box<BVHNode>, right: Box<BVHNode>) -> Self {
        Self {
            bbox: left.bbox.union(&right.bbox),
            left: Some(left),
            right: Some(right),
            items: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Bounding Volume Hierarchy over boxed items
#[derive(Debug, Clone)]
pub struct BVH {
    root: BVHNode,
}

impl BVH {
    const MAX_DEPTH: usize = 32;
    const LEAF_SIZE: usize = 4;

    /// Build from `(item_index, bbox)` pairs
    pub fn build(items: Vec<(usize, BoundingBox)>) -> Self {
        if items.is_empty() {
            return Self {
                root: BVHNode::leaf(BoundingBox::empty(), Vec::new()),
            };
        }
        Self {
            root: Self::build_recursive(items, 0),
        }
    }

    fn build_recursive(mut items: Vec<(usize, BoundingBox)>, depth: usize) -> BVHNode {
        let bbox = items
            .iter()
            .fold(BoundingBox::empty(), |acc, (_, b)| acc.union(b));

        if items.len() <= Self::LEAF_SIZE || depth >= Self::MAX_DEPTH {
            return BVHNode::leaf(bbox, items);
        }

        // Median split along the longest axis of the node
        let size = bbox.size();
        let axis = if size.x >= size.y && size.x >= size.z {
            0
        } else if size.y >= size.z {
            1
        } else {
            2
        };
        items.sort_by(|(_, a), (_, b)| a.center()[axis].total_cmp(&b.center()[axis]));

        let right_items = items.split_off(items.len() / 2);
        let left = Box::new(Self::build_recursive(items, depth + 1));
        let right = Box::new(Self::build_recursive(right_items, depth + 1));
        BVHNode::internal(left, right)
    }

    /// Items whose boxes overlap `bbox`
    pub fn query(&self, bbox: &BoundingBox) -> Vec<usize> {
        let mut result = Vec::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            if !node.bbox.intersects(bbox) {
                continue;
            }
            if node.is_leaf() {
                result.extend(
                    node.items
                        .iter()
                        .filter(|(_, item_box)| item_box.intersects(bbox))
                        .map(|(idx, _)| *idx),
                );
            } else {
                stack.extend(node.left.as_deref());
                stack.extend(node.right.as_deref());
            }
        }
        result
    }

    pub fn bounds(&self) -> BoundingBox {
        self.root.bbox
    }

    pub fn root(&self) -> &BVHNode {
        &self.root
    }
}
