use super::super::node::{Entry, Node, NodeId};
use super::super::rectangle::{Rect, Rect2};
use super::super::rtree::RTree;
use geo::algorithm::bounding_rect::BoundingRect;
use tracing::debug;

/// 从 geo::Geometry 计算边界框，空几何体返回 None
pub fn geometry_to_bbox(geometry: &geo::Geometry<f64>) -> Option<Rect2> {
    geometry.bounding_rect().map(Rect2::from)
}

/// R-tree工具函数实现
impl<T, const D: usize> RTree<T, D> {
    /// AdjustTree - 从节点向上传播MBR变化和分裂
    ///
    /// `split` 是 `node` 刚分裂出的兄弟节点（如果有）。返回到达根节点时仍未被
    /// 吸收的分裂节点，调用方需要用它增长根节点。
    pub(crate) fn adjust_tree(&mut self, node: NodeId, split: Option<NodeId>) -> Option<NodeId> {
        let mut current = node;
        let mut split = split;

        // AT2: 到达根节点则停止
        while let Some(parent) = self.node(current).parent {
            // AT3: 调整父节点中指向当前节点的条目MBR
            let mbr = self.node_mbr(current);
            let position = self.entry_index_in_parent(parent, current);
            *self.node_mut(parent).entries[position].mbr_mut() = mbr;

            // AT4: 如果发生过分裂，把兄弟节点加入父节点
            split = match split {
                Some(sibling) => {
                    let sibling_mbr = self.node_mbr(sibling);
                    self.node_mut(sibling).parent = Some(parent);
                    self.node_mut(parent).entries.push(Entry::Node {
                        mbr: sibling_mbr,
                        child: sibling,
                    });

                    if self.node(parent).entries.len() > self.max_children() {
                        Some(self.split_node(parent))
                    } else {
                        None
                    }
                }
                None => None,
            };

            // AT5: 上移一层
            current = parent;
        }

        split
    }

    /// 根节点分裂后创建新的根节点，树高加一
    pub(crate) fn grow_root(&mut self, sibling: NodeId) {
        let old_root = self.root_id();
        let level = self.node(old_root).level + 1;

        let mut new_root = Node::new_index_node(level);
        new_root.entries.push(Entry::Node {
            mbr: self.node_mbr(old_root),
            child: old_root,
        });
        new_root.entries.push(Entry::Node {
            mbr: self.node_mbr(sibling),
            child: sibling,
        });

        let new_root = self.alloc(new_root);
        self.node_mut(old_root).parent = Some(new_root);
        self.node_mut(sibling).parent = Some(new_root);
        self.set_root(new_root);

        debug!("root split, tree height is now {}", level);
    }

    /// 把节点所有子节点的父指针指向该节点
    pub(crate) fn reparent_children(&mut self, id: NodeId) {
        for child in self.node(id).child_ids() {
            self.node_mut(child).parent = Some(id);
        }
    }

    /// 非空节点的MBR
    ///
    /// 只有空的根节点才没有MBR，其他位置出现空节点说明树结构已损坏
    pub(crate) fn node_mbr(&self, id: NodeId) -> Rect<D> {
        self.node(id)
            .compute_mbr()
            .unwrap_or_else(|| panic!("R-tree corrupted: empty non-root node {:?}", id))
    }

    /// 父节点中指向子节点的条目位置
    pub(crate) fn entry_index_in_parent(&self, parent: NodeId, child: NodeId) -> usize {
        self.node(parent)
            .position_of_child(child)
            .unwrap_or_else(|| {
                panic!(
                    "R-tree corrupted: node {:?} missing from parent {:?}",
                    child, parent
                )
            })
    }
}
