use super::super::node::{Entry, Node, NodeId};
use super::super::rectangle::Rect;
use super::super::rtree::RTree;
use tracing::debug;

/// 节点分裂算法 - 实现完整的二次分裂(Quadratic Split)
impl<T, const D: usize> RTree<T, D> {
    /// 分裂溢出的节点，返回新创建的兄弟节点
    ///
    /// 原节点保留第一组条目（节点标识不变），兄弟节点拿到第二组，
    /// 并与原节点共享父节点和层级。父节点中的条目由 AdjustTree 负责添加。
    pub(crate) fn split_node(&mut self, id: NodeId) -> NodeId {
        let min_entries = self.min_children();
        let (entries, node_type, level, parent) = {
            let node = self.node_mut(id);
            (
                std::mem::take(&mut node.entries),
                node.node_type,
                node.level,
                node.parent,
            )
        };

        let (group1, group2) = quadratic_split(entries, min_entries);
        debug!(
            "split node at level {}: {} + {} entries",
            level,
            group1.len(),
            group2.len()
        );

        self.node_mut(id).entries = group1;

        let mut sibling = Node::new(node_type, level);
        sibling.parent = parent;
        sibling.entries = group2;
        let sibling = self.alloc(sibling);
        self.reparent_children(sibling);

        sibling
    }
}

/// 二次分裂算法 - 遵循Gut84.pdf论文Algorithm QuadraticSplit
///
/// 该算法的目标是将溢出的节点分裂为两组，使得：
/// 1. 两组的总面积尽量小
/// 2. 每组至少包含 `min_entries` 个条目
///
/// 条目的相对顺序在两组内保持不变
pub(crate) fn quadratic_split<T, const D: usize>(
    mut entries: Vec<Entry<T, D>>,
    min_entries: usize,
) -> (Vec<Entry<T, D>>, Vec<Entry<T, D>>) {
    // QS1: 选择种子 - 找到浪费空间最大的两个条目作为两组的种子
    let (seed1, seed2) = pick_seeds(&entries);
    let right_seed = entries.remove(seed2); // seed2 > seed1，先移除索引大的
    let left_seed = entries.remove(seed1);

    let mut group1_mbr = *left_seed.mbr();
    let mut group2_mbr = *right_seed.mbr();
    let mut group1 = vec![left_seed];
    let mut group2 = vec![right_seed];

    while !entries.is_empty() {
        // QS2: 如果某一组必须拿走所有剩余条目才能达到最小条目数，则全部分配给它
        let remaining = entries.len();
        if group1.len() + remaining <= min_entries {
            group1.append(&mut entries);
            break;
        }
        if group2.len() + remaining <= min_entries {
            group2.append(&mut entries);
            break;
        }

        // QS3: 选择下一个条目 - 选择对某一组偏好最强的条目
        let next = pick_next(&entries, &group1_mbr, &group2_mbr);
        let entry = entries.remove(next);

        if prefers_first_group(
            entry.mbr(),
            (&group1_mbr, group1.len()),
            (&group2_mbr, group2.len()),
        ) {
            group1_mbr = group1_mbr.union(entry.mbr());
            group1.push(entry);
        } else {
            group2_mbr = group2_mbr.union(entry.mbr());
            group2.push(entry);
        }
    }

    (group1, group2)
}

/// PickSeeds算法 - 选择两个条目作为种子，使得它们组合后的死空间最大
///
/// 死空间 = 包含两个条目的矩形面积 - 两个条目各自的面积
/// 选择死空间最大的两个条目，这样可以避免在同一组中放置相距很远的条目
fn pick_seeds<T, const D: usize>(entries: &[Entry<T, D>]) -> (usize, usize) {
    let mut max_waste = f64::NEG_INFINITY;
    let mut best_pair = (0, 1);

    for i in 0..entries.len() {
        for j in (i + 1)..entries.len() {
            let rect1 = entries[i].mbr();
            let rect2 = entries[j].mbr();
            let waste = rect1.union(rect2).space() - rect1.space() - rect2.space();

            if waste > max_waste {
                max_waste = waste;
                best_pair = (i, j);
            }
        }
    }

    best_pair
}

/// PickNext算法 - 选择两组扩大代价差异最大的条目
fn pick_next<T, const D: usize>(
    entries: &[Entry<T, D>],
    group1_mbr: &Rect<D>,
    group2_mbr: &Rect<D>,
) -> usize {
    let mut max_diff = f64::NEG_INFINITY;
    let mut best_index = 0;

    for (i, entry) in entries.iter().enumerate() {
        let d1 = group1_mbr.enlargement(entry.mbr());
        let d2 = group2_mbr.enlargement(entry.mbr());
        let diff = (d1 - d2).abs();

        if diff > max_diff {
            max_diff = diff;
            best_index = i;
        }
    }

    best_index
}

/// AssignGroup - 判断条目是否应该分配给第一组
///
/// 依次比较：扩大面积更小、结果面积更小、条目数更少；全部相同时选第一组
fn prefers_first_group<const D: usize>(
    rect: &Rect<D>,
    (group1_mbr, group1_len): (&Rect<D>, usize),
    (group2_mbr, group2_len): (&Rect<D>, usize),
) -> bool {
    let d1 = group1_mbr.enlargement(rect);
    let d2 = group2_mbr.enlargement(rect);
    if d1 != d2 {
        return d1 < d2;
    }

    let area1 = group1_mbr.union(rect).space();
    let area2 = group2_mbr.union(rect).space();
    if area1 != area2 {
        return area1 < area2;
    }

    group1_len <= group2_len
}
