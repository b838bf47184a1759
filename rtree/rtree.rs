use super::node::{Entry, Node, NodeId, NodeType};
use super::rectangle::Rect;
use crate::errors::TreeError;
use serde::Serialize;

/// 默认最小条目数m
pub const DEFAULT_MIN_CHILDREN: usize = 20;
/// 默认最大条目数M
pub const DEFAULT_MAX_CHILDREN: usize = 40;

/// 用于JSON序列化的简化树结构
#[derive(Debug, Serialize)]
pub struct TreeVisualization<'a, T, const D: usize> {
    /// 根节点
    pub root: NodeVisualization<'a, T, D>,
    /// 树的配置参数
    pub config: TreeConfig,
    /// 数据条目总数
    pub size: usize,
    /// 树高
    pub height: usize,
}

/// 用于JSON序列化的树配置
#[derive(Debug, Serialize)]
pub struct TreeConfig {
    pub min_children: usize,
    pub max_children: usize,
}

/// 用于JSON序列化的节点结构
#[derive(Debug, Serialize)]
pub struct NodeVisualization<'a, T, const D: usize> {
    /// 节点的最小边界矩形（空的根节点没有MBR）
    pub mbr: Option<Rect<D>>,
    pub node_type: NodeType,
    pub level: usize,
    /// 数据条目（仅叶子节点）
    pub data_entries: Vec<DataEntry<'a, T, D>>,
    /// 子节点（仅索引节点）
    pub child_nodes: Vec<NodeVisualization<'a, T, D>>,
}

/// 用于JSON序列化的数据条目
#[derive(Debug, Serialize)]
pub struct DataEntry<'a, T, const D: usize> {
    pub mbr: Rect<D>,
    pub data: &'a T,
}

/// R-tree主结构
///
/// 节点存放在arena中，通过 [`NodeId`] 相互引用。根节点始终存在：
/// 空树的根是一个没有条目的叶子节点。
///
/// 本结构没有任何内部同步，并发访问需要外部加锁（见 `collision::Tree`）。
#[derive(Debug, Clone)]
pub struct RTree<T, const D: usize> {
    /// 节点arena，None 表示已释放的槽位
    nodes: Vec<Option<Node<T, D>>>,
    /// 可复用的空闲槽位
    free: Vec<NodeId>,
    root: NodeId,
    /// 最小条目数m
    min_children: usize,
    /// 最大条目数M
    max_children: usize,
    /// 数据条目总数
    size: usize,
    /// 树高，等于根节点的层级
    height: usize,
}

/// 校验扇出参数
pub fn validate_fanout(min_children: usize, max_children: usize) -> Result<(), TreeError> {
    if min_children == 0 || min_children > max_children || max_children < 2 {
        return Err(TreeError::InvalidFanout {
            min: min_children,
            max: max_children,
        });
    }
    Ok(())
}

impl<T, const D: usize> RTree<T, D> {
    /// 创建新的R-tree
    ///
    /// # 错误
    /// `min_children > max_children`、`min_children == 0` 或 `max_children < 2`
    /// 时返回 `TreeError::InvalidFanout`
    pub fn new(min_children: usize, max_children: usize) -> Result<Self, TreeError> {
        validate_fanout(min_children, max_children)?;
        Ok(Self::with_fanout(min_children, max_children))
    }

    fn with_fanout(min_children: usize, max_children: usize) -> Self {
        RTree {
            nodes: vec![Some(Node::new_leaf_node())],
            free: Vec::new(),
            root: NodeId(0),
            min_children,
            max_children,
            size: 0,
            height: 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// 获取数据条目总数
    pub fn len(&self) -> usize {
        self.size
    }

    /// 获取树高（根节点层级，空树为1）
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn min_children(&self) -> usize {
        self.min_children
    }

    pub fn max_children(&self) -> usize {
        self.max_children
    }

    /// 获取整棵树的MBR，空树返回 None
    pub fn root_mbr(&self) -> Option<Rect<D>> {
        self.root().compute_mbr()
    }

    pub fn root(&self) -> &Node<T, D> {
        self.node(self.root)
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// 清空所有数据，保留扇出参数
    pub fn clear(&mut self) {
        *self = Self::with_fanout(self.min_children, self.max_children);
    }

    /// 遍历树中所有数据（无顺序保证）
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.nodes
            .iter()
            .flatten()
            .filter(|node| node.is_leaf_node())
            .flat_map(|node| node.entries.iter().filter_map(Entry::data))
    }

    /// 根据索引获取节点
    ///
    /// 索引悬空说明树结构已损坏，直接 panic
    pub fn node(&self, id: NodeId) -> &Node<T, D> {
        match self.nodes.get(id.0) {
            Some(Some(node)) => node,
            _ => panic!("R-tree corrupted: dangling node id {:?}", id),
        }
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node<T, D> {
        match self.nodes.get_mut(id.0) {
            Some(Some(node)) => node,
            _ => panic!("R-tree corrupted: dangling node id {:?}", id),
        }
    }

    /// 分配新节点，优先复用空闲槽位
    pub(crate) fn alloc(&mut self, node: Node<T, D>) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.0] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    /// 释放节点并返回其内容
    pub(crate) fn release(&mut self, id: NodeId) -> Node<T, D> {
        match self.nodes.get_mut(id.0).and_then(Option::take) {
            Some(node) => {
                self.free.push(id);
                node
            }
            None => panic!("R-tree corrupted: releasing dangling node id {:?}", id),
        }
    }

    pub(crate) fn set_root(&mut self, id: NodeId) {
        self.root = id;
        self.height = self.node(id).level;
    }

    pub(crate) fn inc_size(&mut self) {
        self.size += 1;
    }

    pub(crate) fn dec_size(&mut self) {
        self.size -= 1;
    }

    /// 当前存活的节点数量
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }
}

impl<T, const D: usize> Default for RTree<T, D> {
    /// 使用默认参数创建R-tree（m=20, M=40）
    fn default() -> Self {
        Self::with_fanout(DEFAULT_MIN_CHILDREN, DEFAULT_MAX_CHILDREN)
    }
}

impl<T: Serialize, const D: usize> RTree<T, D> {
    /// 导出树结构为JSON格式
    ///
    /// 返回包含完整树结构的JSON字符串，用于调试和可视化
    pub fn export_to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.create_tree_visualization())
    }

    /// 创建用于可视化的树结构
    pub fn create_tree_visualization(&self) -> TreeVisualization<'_, T, D> {
        TreeVisualization {
            root: self.create_node_visualization(self.root),
            config: TreeConfig {
                min_children: self.min_children,
                max_children: self.max_children,
            },
            size: self.size,
            height: self.height,
        }
    }

    /// 递归创建节点的可视化结构
    fn create_node_visualization(&self, id: NodeId) -> NodeVisualization<'_, T, D> {
        let node = self.node(id);
        let mut data_entries = Vec::new();
        let mut child_nodes = Vec::new();

        for entry in &node.entries {
            match entry {
                Entry::Data { mbr, data } => data_entries.push(DataEntry { mbr: *mbr, data }),
                Entry::Node { child, .. } => {
                    child_nodes.push(self.create_node_visualization(*child))
                }
            }
        }

        NodeVisualization {
            mbr: node.compute_mbr(),
            node_type: node.node_type,
            level: node.level,
            data_entries,
            child_nodes,
        }
    }
}
