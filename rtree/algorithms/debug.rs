use super::super::node::{Entry, NodeId};
use super::super::rtree::RTree;
use std::fmt::Debug;
use tracing::debug;

/// 比较MBR时使用的浮点容差
const MBR_EPSILON: f64 = 1e-9;

/// R-tree调试功能实现
impl<T, const D: usize> RTree<T, D> {
    /// 检查树的结构不变量
    ///
    /// - 每个节点条目MBR等于子节点所有条目的并集
    /// - 非根节点的条目数在 [min_children, max_children] 之间
    /// - 子节点层级恰好比父节点小1，叶子节点层级为1
    /// - 父指针与实际结构一致
    /// - 数据条目总数与 len() 一致
    pub fn check_invariants(&self) -> Result<(), String> {
        let root = self.root();
        if root.parent.is_some() {
            return Err("root has a parent".to_string());
        }
        if root.level != self.height() {
            return Err(format!(
                "root level {} != tree height {}",
                root.level,
                self.height()
            ));
        }
        if root.is_index_node() && root.entries.len() < 2 {
            return Err(format!(
                "index root has {} entries",
                root.entries.len()
            ));
        }

        let count = self.check_node(self.root_id())?;
        if count != self.len() {
            return Err(format!("found {} data entries, len() is {}", count, self.len()));
        }
        Ok(())
    }

    /// 递归检查节点，返回子树中的数据条目数
    fn check_node(&self, id: NodeId) -> Result<usize, String> {
        let node = self.node(id);
        let is_root = id == self.root_id();

        if node.entries.len() > self.max_children() {
            return Err(format!(
                "node {:?} has {} entries (max {})",
                id,
                node.entries.len(),
                self.max_children()
            ));
        }
        if !is_root && node.entries.len() < self.min_children() {
            return Err(format!(
                "node {:?} has {} entries (min {})",
                id,
                node.entries.len(),
                self.min_children()
            ));
        }
        if node.is_leaf_node() != (node.level == 1) {
            return Err(format!(
                "node {:?} is {:?} at level {}",
                id, node.node_type, node.level
            ));
        }

        let mut count = 0;
        for entry in &node.entries {
            match entry {
                Entry::Data { .. } => {
                    if !node.is_leaf_node() {
                        return Err(format!("data entry in index node {:?}", id));
                    }
                    count += 1;
                }
                Entry::Node { mbr, child } => {
                    if node.is_leaf_node() {
                        return Err(format!("node entry in leaf node {:?}", id));
                    }
                    let child_node = self.node(*child);
                    if child_node.parent != Some(id) {
                        return Err(format!(
                            "node {:?} has parent {:?}, expected {:?}",
                            child, child_node.parent, id
                        ));
                    }
                    if child_node.level + 1 != node.level {
                        return Err(format!(
                            "child {:?} at level {} under node {:?} at level {}",
                            child, child_node.level, id, node.level
                        ));
                    }
                    match child_node.compute_mbr() {
                        Some(actual) if actual.approx_eq(mbr, MBR_EPSILON) => {}
                        actual => {
                            return Err(format!(
                                "entry mbr {:?} for {:?} does not bound its children ({:?})",
                                mbr, child, actual
                            ))
                        }
                    }
                    count += self.check_node(*child)?;
                }
            }
        }

        Ok(count)
    }
}

impl<T: Debug, const D: usize> RTree<T, D> {
    /// 以DEBUG级别输出完整的树结构
    ///
    /// 递归遍历整个树结构，输出每个节点的类型、层级、MBR和条目数量
    pub fn log_structure(&self) {
        debug!(
            "=== R-tree structure: {} entries, height {} ===",
            self.len(),
            self.height()
        );
        self.log_node(self.root_id(), 0, String::new());
    }

    fn log_node(&self, id: NodeId, depth: usize, path: String) {
        let node = self.node(id);
        let indent = "  ".repeat(depth);
        debug!(
            "{}Node{} (level={}, type={:?}, mbr={:?}, {} entries)",
            indent,
            path,
            node.level,
            node.node_type,
            node.compute_mbr(),
            node.entries.len()
        );

        for (i, entry) in node.entries.iter().enumerate() {
            match entry {
                Entry::Data { mbr, data } => {
                    debug!("{}  [{}] Data: {:?} at {:?}", indent, i, data, mbr);
                }
                Entry::Node { child, .. } => {
                    self.log_node(*child, depth + 1, format!("{}[{}]", path, i));
                }
            }
        }
    }
}
