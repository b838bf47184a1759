use super::super::node::{Node, NodeId};
use super::super::rectangle::Rect;
use super::super::rtree::RTree;
use tracing::debug;

/// R-tree删除算法实现
impl<T, const D: usize> RTree<T, D> {
    /// 删除指定的数据条目 - 遵循论文Algorithm Delete
    ///
    /// `rect` 必须是插入时使用的矩形（或被其包含），否则找不到条目
    pub fn delete(&mut self, rect: &Rect<D>, data: &T) -> bool
    where
        T: PartialEq,
    {
        self.delete_by(rect, |item| item == data).is_some()
    }

    /// 删除第一个满足谓词的数据条目，并返回被删除的数据
    pub fn delete_by<F>(&mut self, rect: &Rect<D>, mut predicate: F) -> Option<T>
    where
        F: FnMut(&T) -> bool,
    {
        // D1: 找到包含目标条目的叶子节点
        let (leaf, index) = self.find_leaf(self.root_id(), rect, &mut predicate)?;

        // D2: 从叶子节点删除条目
        let entry = self.node_mut(leaf).entries.remove(index);
        self.dec_size();

        // D3: 压缩树
        self.condense_tree(leaf);

        // D4: 如果根节点只有一个条目且为索引节点，则缩短树
        self.shorten_tree();

        entry.into_data()
    }

    /// FindLeaf - 查找包含目标条目的叶子节点及条目位置
    ///
    /// 只在MBR包含目标矩形的子树中搜索
    fn find_leaf<F>(&self, id: NodeId, rect: &Rect<D>, predicate: &mut F) -> Option<(NodeId, usize)>
    where
        F: FnMut(&T) -> bool,
    {
        let node = self.node(id);
        if node.is_leaf_node() {
            return node
                .entries
                .iter()
                .position(|entry| {
                    entry.mbr().contains(rect) && entry.data().is_some_and(|data| predicate(data))
                })
                .map(|index| (id, index));
        }

        node.entries
            .iter()
            .filter(|entry| entry.mbr().contains(rect))
            .filter_map(|entry| entry.child())
            .find_map(|child| self.find_leaf(child, rect, predicate))
    }

    /// CondenseTree - 从叶子节点向上处理下溢
    ///
    /// 下溢节点从父节点中移除，它的条目在遍历结束后按原层级重新插入；
    /// 其余祖先节点只更新MBR。
    fn condense_tree(&mut self, leaf: NodeId) {
        let min_entries = self.min_children();
        // CT1: 初始化
        let mut orphans: Vec<Node<T, D>> = Vec::new();
        let mut current = leaf;

        // CT2: 到达根节点则停止
        while let Some(parent) = self.node(current).parent {
            if self.node(current).entries.len() < min_entries {
                // CT3: 移除下溢节点
                let position = self.entry_index_in_parent(parent, current);
                self.node_mut(parent).entries.remove(position);

                let orphan = self.release(current);
                if !orphan.entries.is_empty() {
                    orphans.push(orphan);
                }
            } else {
                // CT4: 调整父节点中的MBR
                let mbr = self.node_mbr(current);
                let position = self.entry_index_in_parent(parent, current);
                *self.node_mut(parent).entries[position].mbr_mut() = mbr;
            }

            // CT5: 上移一层
            current = parent;
        }

        if !orphans.is_empty() {
            debug!("condense tree: reinserting {} orphaned nodes", orphans.len());
        }

        // CT6: 重新插入孤立节点中的条目，最深的节点先插入
        for orphan in orphans {
            let level = orphan.level;
            for entry in orphan.entries {
                self.insert_entry(entry, level);
            }
        }
    }

    /// 缩短树 - 根节点是只有一个子节点的索引节点时，用该子节点替换根节点
    fn shorten_tree(&mut self) {
        if self.is_empty() {
            // 所有数据都已删除，直接回到初始状态
            self.clear();
            return;
        }

        loop {
            let root = self.root();
            if !root.is_index_node() || root.entries.len() != 1 {
                break;
            }

            let child = root.entries[0]
                .child()
                .unwrap_or_else(|| panic!("R-tree corrupted: data entry in index node"));
            let old_root = self.root_id();
            self.release(old_root);
            self.node_mut(child).parent = None;
            self.set_root(child);

            debug!("root shortened, tree height is now {}", self.height());
        }
    }
}
