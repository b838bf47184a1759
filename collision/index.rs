use super::space::{Label, Space, SpaceId};
use crate::errors::{Result, TreeError};
use crate::rtree::rectangle::{Point2, Rect2};
use crate::rtree::RTree;
use std::collections::HashMap;
use tracing::{debug, warn};

/// `Tree` 和 `AsyncTree` 共用的索引实现，不做任何同步
///
/// 除了R-tree本身，还记录每个已索引对象的当前矩形，用于判断对象是否存在，
/// 并在删除时找到树中的条目（调用方手里的副本可能已经过期）。
#[derive(Debug, Clone)]
pub(crate) struct SpaceIndex {
    rtree: RTree<Space, 2>,
    rects: HashMap<SpaceId, Rect2>,
}

impl SpaceIndex {
    pub(crate) fn new(min_children: usize, max_children: usize) -> Result<Self> {
        Ok(SpaceIndex {
            rtree: RTree::new(min_children, max_children)?,
            rects: HashMap::new(),
        })
    }

    pub(crate) fn rtree(&self) -> &RTree<Space, 2> {
        &self.rtree
    }

    pub(crate) fn len(&self) -> usize {
        self.rtree.len()
    }

    pub(crate) fn contains(&self, space: &Space) -> bool {
        self.rects.contains_key(&space.id())
    }

    /// 添加对象，已索引的对象会先被移除再以新的状态插入
    ///
    /// 矩形坐标不是有限值时返回 `NonFiniteRect`，索引不变
    pub(crate) fn add(&mut self, space: &Space) -> Result<()> {
        check_finite(space)?;
        if self.contains(space) {
            self.remove(space);
        }
        self.insert_checked(space);
        Ok(())
    }

    /// 添加一批对象：先检查全部矩形，任何一个不合法时一个都不添加
    pub(crate) fn add_all(&mut self, spaces: &[&Space]) -> Result<()> {
        for space in spaces {
            check_finite(space)?;
        }
        for space in spaces {
            self.add(space)?;
        }
        Ok(())
    }

    /// 插入已经检查过、且当前未被索引的对象
    fn insert_checked(&mut self, space: &Space) {
        self.rtree.insert(space.rect(), space.clone());
        self.rects.insert(space.id(), space.rect());
    }

    /// 移除对象，返回树中保存的版本
    pub(crate) fn remove(&mut self, space: &Space) -> Option<Space> {
        let rect = self.rects.remove(&space.id())?;
        let id = space.id();
        let removed = self
            .rtree
            .delete_by(&rect, |stored| stored.id() == id)
            .unwrap_or_else(|| panic!("space {} recorded at {:?} but missing from the R-tree", id, rect));
        Some(removed)
    }

    /// 把对象移动到新的矩形：先删除再重新插入
    ///
    /// 成功后调用方的副本与树中的版本一致
    pub(crate) fn relocate(&mut self, space: &mut Space, rect: Rect2) -> Result<()> {
        self.modify(space, |stored| stored.set_rect(rect))
    }

    /// 按偏移量平移对象，以树中保存的矩形为准
    pub(crate) fn shift(&mut self, space: &mut Space, dx: f64, dy: f64) -> Result<()> {
        self.modify(space, |stored| {
            let rect = stored.rect().shift([dx, dy]);
            stored.set_rect(rect);
        })
    }

    pub(crate) fn relabel(&mut self, space: &mut Space, label: Label) -> Result<()> {
        self.modify(space, |stored| stored.set_label(label))
    }

    fn modify<F>(&mut self, space: &mut Space, update: F) -> Result<()>
    where
        F: FnOnce(&mut Space),
    {
        let Some(mut stored) = self.remove(space) else {
            warn!("update rejected: {} is not in the tree", space);
            return Err(TreeError::NotExist);
        };

        let original = stored.clone();
        update(&mut stored);
        if let Err(e) = check_finite(&stored) {
            // 恢复原来的条目
            self.insert_checked(&original);
            return Err(e);
        }

        debug!("reinserting {}", stored);
        self.insert_checked(&stored);
        *space = stored;
        Ok(())
    }

    /// 与对象相交的所有其他对象
    ///
    /// 已索引的对象用树中记录的矩形查询，否则使用调用方给出的矩形
    pub(crate) fn hits(&self, space: &Space) -> Vec<Space> {
        let rect = self
            .rects
            .get(&space.id())
            .copied()
            .unwrap_or_else(|| space.rect());
        let mut hits = self.search_intersect(&rect);

        // 去掉对象自身
        let mut i = 0;
        while i < hits.len() {
            if hits[i].id() == space.id() {
                hits.swap_remove(i);
            } else {
                i += 1;
            }
        }
        hits
    }

    /// 第一个带有指定标签之一的碰撞对象；标签为空时返回任意一个碰撞对象
    pub(crate) fn hit_label(&self, space: &Space, labels: &[Label]) -> Option<Space> {
        self.hits(space)
            .into_iter()
            .find(|hit| labels.is_empty() || labels.contains(&hit.label()))
    }

    pub(crate) fn search_intersect(&self, rect: &Rect2) -> Vec<Space> {
        self.rtree.search_intersect(rect).into_iter().cloned().collect()
    }

    pub(crate) fn nearest_neighbor(&self, point: &Point2) -> Option<Space> {
        self.rtree.nearest_neighbor(point).cloned()
    }

    pub(crate) fn nearest_neighbors(&self, k: usize, point: &Point2) -> Vec<Space> {
        self.rtree
            .nearest_neighbors(k, point)
            .into_iter()
            .cloned()
            .collect()
    }

    pub(crate) fn clear(&mut self) {
        self.rtree.clear();
        self.rects.clear();
    }
}

/// 含有 NaN 或无穷大坐标的矩形无法被正确包围，拒绝索引
fn check_finite(space: &Space) -> Result<()> {
    if space.rect().is_finite() {
        Ok(())
    } else {
        warn!("rejected {}: non-finite rectangle", space);
        Err(TreeError::NonFiniteRect(format!("{:?}", space.rect())))
    }
}
