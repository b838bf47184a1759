use super::super::node::{Entry, NodeId};
use super::super::rectangle::Rect;
use super::super::rtree::RTree;

/// 搜索操作相关算法
impl<T, const D: usize> RTree<T, D> {
    /// 搜索与查询矩形相交的所有数据 - 遵循论文Search算法
    ///
    /// 结果没有顺序保证，空树返回空结果
    pub fn search_intersect(&self, query: &Rect<D>) -> Vec<&T> {
        let mut results = Vec::new();
        self.search_recursive(self.root_id(), query, &mut results, 0);
        results
    }

    /// 搜索与查询矩形相交的数据，最多返回 `limit` 个结果
    ///
    /// `limit == 0` 表示无限制
    pub fn search_intersect_with_limit(&self, query: &Rect<D>, limit: usize) -> Vec<&T> {
        let mut results = Vec::new();
        self.search_recursive(self.root_id(), query, &mut results, limit);
        results
    }

    /// 递归搜索，达到数量限制时提前结束
    fn search_recursive<'a>(
        &'a self,
        id: NodeId,
        query: &Rect<D>,
        results: &mut Vec<&'a T>,
        limit: usize,
    ) {
        // S1: 搜索子树
        for entry in &self.node(id).entries {
            if limit > 0 && results.len() >= limit {
                return;
            }
            if !entry.mbr().intersects(query) {
                continue;
            }

            match entry {
                // S2: 搜索叶子节点
                Entry::Data { data, .. } => results.push(data),
                Entry::Node { child, .. } => self.search_recursive(*child, query, results, limit),
            }
        }
    }
}
