use super::index::SpaceIndex;
use super::space::{Label, Space};
use super::tree::require;
use crate::config::IndexConfig;
use crate::errors::Result;
use crate::rtree::rectangle::{Point2, Rect2};
use std::sync::Arc;
use tokio::sync::RwLock;

/// 异步版本的碰撞索引
///
/// 与 [`crate::Tree`] 提供相同的操作，使用 `tokio::sync::RwLock` 协调并发访问，
/// 等待锁时不会阻塞运行时线程。查询总是运行到结束，没有超时和取消。
///
/// # 示例
///
/// ```
/// use collision_index::{AsyncTree, Label, OwnerId, Space};
///
/// # #[tokio::main]
/// # async fn main() {
/// let tree = AsyncTree::new(2, 8).unwrap();
/// let mut space = Space::from_xywh(0.0, 0.0, 1.0, 1.0, OwnerId(1), Label(0));
///
/// tree.add([&space]).await.unwrap();
/// tree.shift_space(5.0, 0.0, Some(&mut space)).await.unwrap();
/// assert_eq!(space.x(), 5.0);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AsyncTree {
    inner: Arc<RwLock<SpaceIndex>>,
}

impl AsyncTree {
    pub fn new(min_children: usize, max_children: usize) -> Result<Self> {
        Ok(Self {
            inner: Arc::new(RwLock::new(SpaceIndex::new(min_children, max_children)?)),
        })
    }

    pub fn from_config(config: &IndexConfig) -> Result<Self> {
        Self::new(config.min_children, config.max_children)
    }

    /// 添加对象，`None` 会被跳过
    ///
    /// 任何一个矩形含有非有限坐标时返回 `NonFiniteRect`，这一批都不添加
    pub async fn add<'a, I, S>(&self, spaces: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<Option<&'a Space>>,
    {
        let spaces: Vec<&Space> = spaces
            .into_iter()
            .filter_map(Into::<Option<&'a Space>>::into)
            .collect();
        self.inner.write().await.add_all(&spaces)
    }

    /// 移除对象，返回实际被移除的数量
    pub async fn remove<'a, I, S>(&self, spaces: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<Option<&'a Space>>,
    {
        let mut index = self.inner.write().await;
        spaces
            .into_iter()
            .filter_map(Into::<Option<&'a Space>>::into)
            .filter(|space| index.remove(space).is_some())
            .count()
    }

    pub async fn update_space(
        &self,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        space: Option<&mut Space>,
    ) -> Result<()> {
        self.update_space_rect(Rect2::from_xywh(x, y, w, h), space)
            .await
    }

    pub async fn update_space_rect(&self, rect: Rect2, space: Option<&mut Space>) -> Result<()> {
        let space = require(space)?;
        self.inner.write().await.relocate(space, rect)
    }

    pub async fn shift_space(&self, dx: f64, dy: f64, space: Option<&mut Space>) -> Result<()> {
        let space = require(space)?;
        self.inner.write().await.shift(space, dx, dy)
    }

    pub async fn update_label(&self, label: Label, space: Option<&mut Space>) -> Result<()> {
        let space = require(space)?;
        self.inner.write().await.relabel(space, label)
    }

    pub async fn hits(&self, space: &Space) -> Vec<Space> {
        self.inner.read().await.hits(space)
    }

    pub async fn hits_filtered<F>(&self, space: &Space, filter: F) -> Vec<Space>
    where
        F: Fn(Vec<Space>) -> Vec<Space>,
    {
        filter(self.hits(space).await)
    }

    pub async fn hit_label(&self, space: &Space, labels: &[Label]) -> Option<Space> {
        self.inner.read().await.hit_label(space, labels)
    }

    pub async fn search_intersect(&self, rect: &Rect2) -> Vec<Space> {
        self.inner.read().await.search_intersect(rect)
    }

    pub async fn nearest_neighbor(&self, point: &Point2) -> Option<Space> {
        self.inner.read().await.nearest_neighbor(point)
    }

    pub async fn nearest_neighbors(&self, k: usize, point: &Point2) -> Vec<Space> {
        self.inner.read().await.nearest_neighbors(k, point)
    }

    pub async fn contains(&self, space: &Space) -> bool {
        self.inner.read().await.contains(space)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }

    pub async fn check_invariants(&self) -> std::result::Result<(), String> {
        self.inner.read().await.rtree().check_invariants()
    }
}
