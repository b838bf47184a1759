use super::rectangle::Rect;
use serde::Serialize;

/// 节点在arena中的稳定索引
///
/// 父子关系全部通过索引表示，避免了双向链接可变树的别名问题
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub(crate) usize);

/// R-tree节点类型
///
/// 用于明确区分R-tree中的两种节点类型，避免概念混淆
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeType {
    /// 叶子节点：包含用户插入的真实数据条目
    Leaf,
    /// 索引节点：包含指向子节点的引用条目
    Index,
}

/// R-tree节点条目
///
/// 每个条目都包含一个MBR（最小边界矩形）和对应的内容，二者只能居其一：
/// - Data条目：存储用户插入的真实数据，只出现在叶子节点中
/// - Node条目：存储子节点的索引，只出现在索引节点中
#[derive(Debug, Clone)]
pub enum Entry<T, const D: usize> {
    /// 数据条目：mbr 是数据的边界矩形
    Data { mbr: Rect<D>, data: T },

    /// 节点条目：mbr 是子节点所有条目的最小边界矩形
    Node { mbr: Rect<D>, child: NodeId },
}

impl<T, const D: usize> Entry<T, D> {
    /// 获取条目的MBR
    pub fn mbr(&self) -> &Rect<D> {
        match self {
            Entry::Data { mbr, .. } => mbr,
            Entry::Node { mbr, .. } => mbr,
        }
    }

    /// 获取条目的MBR（可变引用），用于向上调整边界
    pub fn mbr_mut(&mut self) -> &mut Rect<D> {
        match self {
            Entry::Data { mbr, .. } => mbr,
            Entry::Node { mbr, .. } => mbr,
        }
    }

    /// 检查是否为数据条目
    pub fn is_data(&self) -> bool {
        matches!(self, Entry::Data { .. })
    }

    /// 获取数据条目的数据引用（如果是数据条目）
    pub fn data(&self) -> Option<&T> {
        match self {
            Entry::Data { data, .. } => Some(data),
            Entry::Node { .. } => None,
        }
    }

    /// 获取节点条目的子节点索引（如果是节点条目）
    pub fn child(&self) -> Option<NodeId> {
        match self {
            Entry::Data { .. } => None,
            Entry::Node { child, .. } => Some(*child),
        }
    }

    /// 取出数据条目中的数据
    pub fn into_data(self) -> Option<T> {
        match self {
            Entry::Data { data, .. } => Some(data),
            Entry::Node { .. } => None,
        }
    }
}

/// R-tree节点
///
/// 节点本身不保存MBR：它的MBR保存在父节点指向它的条目中
#[derive(Debug, Clone)]
pub struct Node<T, const D: usize> {
    /// 父节点索引，只有根节点为 None
    pub(crate) parent: Option<NodeId>,

    /// 节点包含的条目列表
    ///
    /// - 叶子节点：只包含Entry::Data条目
    /// - 索引节点：只包含Entry::Node条目
    pub(crate) entries: Vec<Entry<T, D>>,

    pub(crate) node_type: NodeType,

    /// 节点在树中的层级
    ///
    /// 叶子层的层级为1，根节点层级最高（等于树高）
    pub(crate) level: usize,
}

impl<T, const D: usize> Node<T, D> {
    /// 创建新的叶子节点，层级固定为1
    pub fn new_leaf_node() -> Self {
        Self::new(NodeType::Leaf, 1)
    }

    /// 创建新的索引节点
    ///
    /// # 参数
    /// * `level` - 节点在树中的层级，必须 > 1
    pub fn new_index_node(level: usize) -> Self {
        Self::new(NodeType::Index, level)
    }

    /// 创建指定类型和层级的节点
    pub fn new(node_type: NodeType, level: usize) -> Self {
        Node {
            parent: None,
            entries: Vec::new(),
            node_type,
            level,
        }
    }

    pub fn is_leaf_node(&self) -> bool {
        matches!(self.node_type, NodeType::Leaf)
    }

    pub fn is_index_node(&self) -> bool {
        matches!(self.node_type, NodeType::Index)
    }

    pub fn entries(&self) -> &[Entry<T, D>] {
        &self.entries
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// 计算能够包含所有条目的最小边界矩形，空节点返回 None
    pub fn compute_mbr(&self) -> Option<Rect<D>> {
        let (first, rest) = self.entries.split_first()?;
        Some(
            rest.iter()
                .fold(*first.mbr(), |acc, entry| acc.union(entry.mbr())),
        )
    }

    /// 查找指向指定子节点的条目位置
    pub(crate) fn position_of_child(&self, child: NodeId) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.child() == Some(child))
    }

    /// 所有子节点的索引（叶子节点返回空）
    pub(crate) fn child_ids(&self) -> Vec<NodeId> {
        self.entries.iter().filter_map(Entry::child).collect()
    }
}
