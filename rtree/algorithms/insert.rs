use super::super::node::{Entry, NodeId};
use super::super::rectangle::Rect;
use super::super::rtree::RTree;
use tracing::trace;

/// 插入操作相关算法
impl<T, const D: usize> RTree<T, D> {
    /// 插入新的数据条目 - 遵循论文Algorithm Insert
    pub fn insert(&mut self, rect: Rect<D>, data: T) {
        self.insert_entry(Entry::Data { mbr: rect, data }, 1);
        self.inc_size();
    }

    /// 在指定层级插入条目
    ///
    /// 数据条目插入到第1层；删除时重新插入的节点条目插入到原节点所在的层级，
    /// 这样它们携带的子树保持原有高度。
    pub(crate) fn insert_entry(&mut self, entry: Entry<T, D>, level: usize) {
        // I1: 选择放置新条目的节点
        let target = self.choose_node(entry.mbr(), level);

        // I2: 添加条目，溢出时分裂
        if let Some(child) = entry.child() {
            self.node_mut(child).parent = Some(target);
        }
        self.node_mut(target).entries.push(entry);

        let split = if self.node(target).entries.len() > self.max_children() {
            Some(self.split_node(target))
        } else {
            None
        };

        // I3: 向上传播变化
        // I4: 根节点分裂则增长树高
        if let Some(sibling) = self.adjust_tree(target, split) {
            self.grow_root(sibling);
        }
    }

    /// ChooseNode - 从根节点下降到指定层级
    fn choose_node(&self, rect: &Rect<D>, level: usize) -> NodeId {
        // CL1: 初始化，从根节点开始
        let mut current = self.root_id();

        // CL2: 到达目标层级
        while self.node(current).level > level {
            // CL3: 选择子树 - 选择扩大面积最小的条目
            let entries = &self.node(current).entries;
            let best_index = self.choose_subtree(entries, rect);
            trace!(
                "choose_node: level {} -> entry {}",
                self.node(current).level,
                best_index
            );

            // CL4: 下降到子节点
            current = entries[best_index]
                .child()
                .unwrap_or_else(|| panic!("R-tree corrupted: data entry in index node"));
        }

        current
    }

    /// 选择子树 - 计算扩大面积最小的条目
    fn choose_subtree(&self, entries: &[Entry<T, D>], rect: &Rect<D>) -> usize {
        let mut best_index = 0;
        let mut min_enlargement = f64::INFINITY;
        let mut min_area = f64::INFINITY;

        for (i, entry) in entries.iter().enumerate() {
            let mbr = entry.mbr();
            let enlargement = mbr.enlargement(rect);
            let area = mbr.space();

            // 选择扩大面积最小的，如果相同则选择面积最小的
            if enlargement < min_enlargement || (enlargement == min_enlargement && area < min_area)
            {
                min_enlargement = enlargement;
                min_area = area;
                best_index = i;
            }
        }

        best_index
    }
}
