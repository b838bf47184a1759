use super::index::SpaceIndex;
use super::space::{Label, Space};
use crate::config::IndexConfig;
use crate::errors::{Result, TreeError};
use crate::rtree::rectangle::{Point2, Rect2};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

/// 线程安全的碰撞索引
///
/// 这个结构体包装了R-tree，提供线程安全的操作接口。
/// 使用读写锁来协调并发访问：
/// - 读操作（hits, search_intersect, nearest_neighbor）可以并发执行
/// - 写操作（add, remove, update_*, clear）需要独占访问，
///   先删除再插入的组合操作在整个过程中持有写锁
///
/// 克隆得到的 `Tree` 共享同一个索引。
///
/// # 示例
///
/// ```
/// use collision_index::{Label, OwnerId, Space, Tree};
/// use std::thread;
///
/// let tree = Tree::new(2, 8).unwrap();
///
/// let handles: Vec<_> = (0..4).map(|i| {
///     let tree = tree.clone(); // 通过clone共享同一个索引
///     thread::spawn(move || {
///         let x = i as f64 * 10.0;
///         let space = Space::from_xywh(x, 0.0, 1.0, 1.0, OwnerId(i), Label(0));
///         tree.add([&space]).unwrap();
///     })
/// }).collect();
///
/// for handle in handles {
///     handle.join().unwrap();
/// }
///
/// assert_eq!(tree.len(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct Tree {
    inner: Arc<RwLock<SpaceIndex>>,
}

impl Tree {
    /// 创建新的索引
    ///
    /// # 错误
    /// 扇出参数不合法时返回 `TreeError::InvalidFanout`。
    /// 除了 `min_children > max_children`，还拒绝 `min_children == 0`
    /// 和 `max_children < 2`：最多只能容纳一个条目的节点无法分裂。
    pub fn new(min_children: usize, max_children: usize) -> Result<Self> {
        Ok(Self::from_index(SpaceIndex::new(min_children, max_children)?))
    }

    /// 按配置创建索引
    pub fn from_config(config: &IndexConfig) -> Result<Self> {
        Self::new(config.min_children, config.max_children)
    }

    fn from_index(index: SpaceIndex) -> Self {
        Self {
            inner: Arc::new(RwLock::new(index)),
        }
    }

    /// 添加对象，`None` 会被跳过
    ///
    /// 任何一个对象的矩形含有 NaN 或无穷大坐标时返回 `TreeError::NonFiniteRect`，
    /// 这一批对象都不会被添加
    pub fn add<'a, I, S>(&self, spaces: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<Option<&'a Space>>,
    {
        let spaces: Vec<&Space> = spaces
            .into_iter()
            .filter_map(Into::<Option<&'a Space>>::into)
            .collect();
        self.write_lock()?.add_all(&spaces)
    }

    /// 移除对象，返回实际被移除的数量，`None` 和未索引的对象会被跳过
    pub fn remove<'a, I, S>(&self, spaces: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<Option<&'a Space>>,
    {
        let mut index = self.write_lock()?;
        Ok(spaces
            .into_iter()
            .filter_map(Into::<Option<&'a Space>>::into)
            .filter(|space| index.remove(space).is_some())
            .count())
    }

    /// 把对象移动到 (x, y) 并设置宽高
    pub fn update_space(
        &self,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        space: Option<&mut Space>,
    ) -> Result<()> {
        self.update_space_rect(Rect2::from_xywh(x, y, w, h), space)
    }

    /// 把对象的矩形替换为 `rect`
    pub fn update_space_rect(&self, rect: Rect2, space: Option<&mut Space>) -> Result<()> {
        let space = require(space)?;
        self.write_lock()?.relocate(space, rect)
    }

    /// 按偏移量平移对象
    pub fn shift_space(&self, dx: f64, dy: f64, space: Option<&mut Space>) -> Result<()> {
        let space = require(space)?;
        self.write_lock()?.shift(space, dx, dy)
    }

    /// 修改对象的标签
    pub fn update_label(&self, label: Label, space: Option<&mut Space>) -> Result<()> {
        let space = require(space)?;
        self.write_lock()?.relabel(space, label)
    }

    /// 与对象相交的所有其他对象（不包含对象自身）
    pub fn hits(&self, space: &Space) -> Vec<Space> {
        self.read_lock().hits(space)
    }

    /// 与对象相交的其他对象，再经过 `filter` 过滤
    ///
    /// 过滤器见 [`crate::collision::filter`]
    pub fn hits_filtered<F>(&self, space: &Space, filter: F) -> Vec<Space>
    where
        F: Fn(Vec<Space>) -> Vec<Space>,
    {
        filter(self.hits(space))
    }

    /// 第一个带有指定标签之一的碰撞对象，标签为空时返回任意一个碰撞对象
    pub fn hit_label(&self, space: &Space, labels: &[Label]) -> Option<Space> {
        self.read_lock().hit_label(space, labels)
    }

    pub fn search_intersect(&self, rect: &Rect2) -> Vec<Space> {
        self.read_lock().search_intersect(rect)
    }

    pub fn nearest_neighbor(&self, point: &Point2) -> Option<Space> {
        self.read_lock().nearest_neighbor(point)
    }

    pub fn nearest_neighbors(&self, k: usize, point: &Point2) -> Vec<Space> {
        self.read_lock().nearest_neighbors(k, point)
    }

    /// 对象当前是否在索引中
    pub fn contains(&self, space: &Space) -> bool {
        self.read_lock().contains(space)
    }

    pub fn len(&self) -> usize {
        self.read_lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 清空索引，保留扇出参数
    pub fn clear(&self) -> Result<()> {
        self.write_lock()?.clear();
        Ok(())
    }

    /// 检查底层R-tree的结构不变量
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        self.read_lock().rtree().check_invariants()
    }

    /// 导出底层R-tree结构为JSON格式
    pub fn export_to_json(&self) -> std::result::Result<String, serde_json::Error> {
        self.read_lock().rtree().export_to_json()
    }

    /// 以DEBUG级别输出底层R-tree结构
    pub fn log_structure(&self) {
        self.read_lock().rtree().log_structure();
    }

    /// 读锁
    ///
    /// 锁中毒说明某个写操作在修改中途panic，索引可能处于不一致状态
    /// （例如对象表已更新而R-tree尚未更新）。此时查询仍然返回结果，
    /// 但不保证与对象表一致；写操作统一返回 `LockPoisoned`。
    fn read_lock(&self) -> RwLockReadGuard<'_, SpaceIndex> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lock(&self) -> Result<RwLockWriteGuard<'_, SpaceIndex>> {
        self.inner.write().map_err(|_| TreeError::LockPoisoned)
    }
}

impl Default for Tree {
    /// 使用默认配置创建索引（min=20, max=40）
    fn default() -> Self {
        let config = IndexConfig::default();
        Self::from_index(
            SpaceIndex::new(config.min_children, config.max_children)
                .unwrap_or_else(|e| panic!("default index configuration is invalid: {}", e)),
        )
    }
}

/// 把 `None` 转换为 `NilInput` 错误
pub(crate) fn require(space: Option<&mut Space>) -> Result<&mut Space> {
    space.ok_or_else(|| {
        warn!("update rejected: nil space");
        TreeError::NilInput
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::filter;
    use crate::collision::space::OwnerId;
    use std::thread;

    fn space(x: f64, y: f64, w: f64, h: f64) -> Space {
        Space::from_xywh(x, y, w, h, OwnerId(0), Label(0))
    }

    /// 十个固定矩形，以 (点, 边长) 的形式给出
    fn fixtures() -> Vec<Space> {
        [
            (0.0, 0.0, 2.0, 1.0),
            (3.0, 1.0, 1.0, 2.0),
            (1.0, 2.0, 2.0, 2.0),
            (8.0, 6.0, 1.0, 1.0),
            (10.0, 3.0, 1.0, 2.0),
            (11.0, 7.0, 1.0, 1.0),
            (2.0, 6.0, 1.0, 1.0),
            (3.0, 6.0, 1.0, 1.0),
            (2.0, 8.0, 1.0, 1.0),
            (3.0, 8.0, 1.0, 1.0),
        ]
        .into_iter()
        .map(|(x, y, w, h)| space(x, y, w, h))
        .collect()
    }

    #[test]
    fn test_new_tree_validates_fanout() {
        assert!(matches!(
            Tree::new(5, 3),
            Err(TreeError::InvalidFanout { min: 5, max: 3 })
        ));
        assert!(Tree::new(3, 3).is_ok());
        // 最多容纳一个条目的节点无法分裂
        assert!(matches!(
            Tree::new(1, 1),
            Err(TreeError::InvalidFanout { min: 1, max: 1 })
        ));
        assert!(matches!(
            Tree::new(0, 4),
            Err(TreeError::InvalidFanout { min: 0, max: 4 })
        ));
        assert!(Tree::new(1, 2).is_ok());

        let tree = Tree::from_config(&IndexConfig {
            min_children: 2,
            max_children: 6,
        })
        .unwrap();
        assert!(tree.is_empty());
        assert!(Tree::default().is_empty());
    }

    #[test]
    fn test_root_split_after_overflow() {
        let tree = Tree::new(3, 3).unwrap();
        let spaces = fixtures();
        tree.add(&spaces[..6]).unwrap();

        assert_eq!(tree.len(), 6);
        let guard = tree.read_lock();
        let rtree = guard.rtree();
        assert_eq!(rtree.root().entries().len(), 2);
        assert_eq!(rtree.height(), 2);
    }

    #[test]
    fn test_search_intersect_fixtures() {
        let tree = Tree::new(3, 3).unwrap();
        let spaces = fixtures();
        tree.add(&spaces).unwrap();

        let found = tree.search_intersect(&Rect2::xyxy(2.0, 1.5, 12.0, 7.0));
        let mut indices: Vec<usize> = found
            .iter()
            .map(|hit| spaces.iter().position(|s| s == hit).unwrap())
            .collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![1, 2, 3, 4, 6, 7]);
    }

    #[test]
    fn test_nearest_neighbor_points() {
        let tree = Tree::new(2, 4).unwrap();
        let points: Vec<Space> = [
            (1.0, 1.0),
            (1.0, 3.0),
            (3.0, 2.0),
            (-7.0, -7.0),
            (7.0, 7.0),
            (10.0, 2.0),
        ]
        .into_iter()
        .map(|(x, y)| space(x, y, 0.0, 0.0))
        .collect();
        tree.add(&points).unwrap();

        let nearest = tree.nearest_neighbor(&Point2::xy(0.5, 0.5)).unwrap();
        assert_eq!(nearest, points[0]);

        let three = tree.nearest_neighbors(3, &Point2::xy(0.5, 0.5));
        assert_eq!(three, vec![points[0].clone(), points[1].clone(), points[2].clone()]);
    }

    #[test]
    fn test_update_errors_do_not_change_size() {
        let tree = Tree::new(2, 4).unwrap();
        let indexed = space(0.0, 0.0, 1.0, 1.0);
        tree.add([&indexed]).unwrap();

        let mut absent = space(5.0, 5.0, 1.0, 1.0);
        assert_eq!(
            tree.update_space(1.0, 1.0, 2.0, 2.0, Some(&mut absent)),
            Err(TreeError::NotExist)
        );
        assert_eq!(
            tree.shift_space(1.0, 1.0, Some(&mut absent)),
            Err(TreeError::NotExist)
        );
        assert_eq!(tree.len(), 1);

        assert_eq!(
            tree.shift_space(1.0, 1.0, None),
            Err(TreeError::NilInput)
        );
        assert_eq!(
            tree.update_space(1.0, 1.0, 2.0, 2.0, None),
            Err(TreeError::NilInput)
        );
        assert_eq!(
            tree.update_space_rect(Rect2::xyxy(0.0, 0.0, 1.0, 1.0), None),
            Err(TreeError::NilInput)
        );
        assert_eq!(tree.update_label(Label(1), None), Err(TreeError::NilInput));
        assert_eq!(tree.len(), 1);
        assert_eq!(absent.rect(), Rect2::from_xywh(5.0, 5.0, 1.0, 1.0));
    }

    #[test]
    fn test_update_and_shift_space() {
        let tree = Tree::new(2, 4).unwrap();
        let mut moving = space(0.0, 0.0, 1.0, 1.0);
        let other = space(10.0, 10.0, 2.0, 2.0);
        tree.add([&moving, &other]).unwrap();
        assert!(tree.hits(&moving).is_empty());

        tree.update_space(9.5, 9.5, 1.0, 1.0, Some(&mut moving))
            .unwrap();
        assert_eq!(moving.rect(), Rect2::from_xywh(9.5, 9.5, 1.0, 1.0));
        assert_eq!(tree.hits(&moving), vec![other.clone()]);

        tree.shift_space(-5.0, 0.0, Some(&mut moving)).unwrap();
        assert_eq!(moving.rect(), Rect2::from_xywh(4.5, 9.5, 1.0, 1.0));
        assert!(tree.hits(&moving).is_empty());
        assert!(tree
            .search_intersect(&Rect2::from_xywh(9.0, 9.0, 1.0, 1.0))
            .iter()
            .all(|s| s != &moving));

        tree.update_space_rect(Rect2::xyxy(11.0, 11.0, 13.0, 13.0), Some(&mut moving))
            .unwrap();
        assert_eq!(tree.hits(&other), vec![moving.clone()]);
        assert_eq!(tree.len(), 2);
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn test_update_label() {
        let tree = Tree::new(2, 4).unwrap();
        let mut labelled = space(0.0, 0.0, 2.0, 2.0);
        let probe = space(1.0, 1.0, 2.0, 2.0);
        tree.add([&labelled, &probe]).unwrap();

        assert!(tree.hit_label(&probe, &[Label(7)]).is_none());
        tree.update_label(Label(7), Some(&mut labelled)).unwrap();
        assert_eq!(labelled.label(), Label(7));
        assert_eq!(tree.hit_label(&probe, &[Label(7)]), Some(labelled));
    }

    #[test]
    fn test_hits_never_include_self() {
        let tree = Tree::new(2, 4).unwrap();
        let spaces: Vec<Space> = (0..20)
            .map(|i| space((i % 5) as f64, (i / 5) as f64, 1.5, 1.5))
            .collect();
        tree.add(&spaces).unwrap();

        for s in &spaces {
            let hits = tree.hits(s);
            assert!(!hits.contains(s));
            assert!(!hits.is_empty());
            assert!(hits.iter().all(|hit| hit.overlaps(s)));
        }
    }

    #[test]
    fn test_hit_label_and_filters() {
        let tree = Tree::new(2, 4).unwrap();
        let player = Space::from_xywh(0.0, 0.0, 4.0, 4.0, OwnerId(1), Label(1));
        let wall = Space::from_xywh(3.0, 0.0, 4.0, 4.0, OwnerId(2), Label(2));
        let coin = Space::from_xywh(1.0, 1.0, 1.0, 1.0, OwnerId(3), Label(3));
        let own_hitbox = Space::from_xywh(0.0, 0.0, 1.0, 1.0, OwnerId(1), Label(4));
        tree.add([&player, &wall, &coin, &own_hitbox]).unwrap();

        assert_eq!(tree.hit_label(&player, &[Label(3)]), Some(coin.clone()));
        assert!(tree.hit_label(&player, &[Label(9)]).is_none());
        assert!(tree.hit_label(&player, &[]).is_some());

        let others = tree.hits_filtered(&player, filter::without_owners(&[OwnerId(1)]));
        assert_eq!(others.len(), 2);
        assert!(!others.contains(&own_hitbox));

        let walls = tree.hits_filtered(&player, filter::with_labels(&[Label(2)]));
        assert_eq!(walls, vec![wall]);
    }

    #[test]
    fn test_add_and_remove_skip_none() {
        let tree = Tree::new(2, 4).unwrap();
        let a = space(0.0, 0.0, 1.0, 1.0);
        let b = space(2.0, 2.0, 1.0, 1.0);
        let never_added = space(4.0, 4.0, 1.0, 1.0);

        tree.add([Some(&a), None, Some(&b)]).unwrap();
        assert_eq!(tree.len(), 2);
        assert!(tree.contains(&a));

        let removed = tree
            .remove([Some(&a), None, Some(&never_added), Some(&a)])
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(tree.len(), 1);
        assert!(!tree.contains(&a));
    }

    #[test]
    fn test_add_all_remove_all() {
        let tree = Tree::new(2, 5).unwrap();
        let spaces: Vec<Space> = (0..200)
            .map(|i| space((i * 7 % 100) as f64, (i * 13 % 100) as f64, 2.0, 2.0))
            .collect();
        tree.add(&spaces).unwrap();
        assert_eq!(tree.len(), 200);
        assert!(tree.check_invariants().is_ok());

        assert_eq!(tree.remove(&spaces).unwrap(), 200);
        assert!(tree.is_empty());
        assert!(tree
            .search_intersect(&Rect2::xyxy(-1000.0, -1000.0, 1000.0, 1000.0))
            .is_empty());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let tree = Tree::new(2, 4).unwrap();
        let spaces = fixtures();
        tree.add(&spaces).unwrap();

        tree.clear().unwrap();
        assert!(tree.is_empty());
        assert!(tree
            .search_intersect(&Rect2::xyxy(-100.0, -100.0, 100.0, 100.0))
            .is_empty());
        assert!(tree.hits(&spaces[0]).is_empty());
        assert!(tree.nearest_neighbor(&Point2::xy(0.0, 0.0)).is_none());

        tree.clear().unwrap();
        assert!(tree.is_empty());

        // 清空后仍然可以继续使用
        tree.add(&spaces[..2]).unwrap();
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_export_to_json() {
        let tree = Tree::new(2, 4).unwrap();
        tree.add(&fixtures()).unwrap();
        let json = tree.export_to_json().unwrap();
        assert!(json.contains("\"size\": 10"));
        assert!(json.contains("\"label\": 0"));
    }

    #[test]
    fn test_concurrent_writers_and_readers() {
        let tree = Tree::new(4, 16).unwrap();

        let writers: Vec<_> = (0..4)
            .map(|thread_id| {
                let tree = tree.clone();
                thread::spawn(move || {
                    let mut mine = Vec::new();
                    for i in 0..50 {
                        let x = (thread_id * 100 + i) as f64;
                        let s = Space::from_xywh(x, 0.0, 1.0, 1.0, OwnerId(thread_id), Label(0));
                        tree.add([&s]).unwrap();
                        mine.push(s);
                    }
                    for s in mine.iter_mut().step_by(2) {
                        tree.shift_space(0.0, 10.0, Some(s)).unwrap();
                    }
                    mine
                })
            })
            .collect();

        let readers: Vec<_> = (0..2)
            .map(|_| {
                let tree = tree.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        let x = (i * 4) as f64;
                        let _ = tree.search_intersect(&Rect2::xyxy(x, -1.0, x + 10.0, 20.0));
                        let _ = tree.nearest_neighbor(&Point2::xy(x, 0.0));
                    }
                })
            })
            .collect();

        let mut all = Vec::new();
        for handle in writers {
            all.extend(handle.join().unwrap());
        }
        for handle in readers {
            handle.join().unwrap();
        }

        assert_eq!(tree.len(), 200);
        assert!(tree.check_invariants().is_ok());
        let shifted = tree.search_intersect(&Rect2::xyxy(-1.0, 9.5, 1000.0, 12.0));
        assert_eq!(shifted.len(), 100);
        assert_eq!(tree.remove(&all).unwrap(), 200);
    }

    #[test]
    fn test_poisoned_lock() {
        let tree = Tree::new(2, 4).unwrap();
        let s = space(0.0, 0.0, 1.0, 1.0);
        tree.add([&s]).unwrap();

        let poisoner = tree.clone();
        let _ = thread::spawn(move || {
            let _guard = poisoner.inner.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        // 写操作报告锁中毒，读操作仍然可用
        assert_eq!(tree.add([&s]), Err(TreeError::LockPoisoned));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.search_intersect(&s.rect()), vec![s]);
    }

    #[test]
    fn test_non_finite_space_is_rejected() {
        let tree = Tree::new(2, 4).unwrap();
        let mut ok = space(0.0, 0.0, 1.0, 1.0);
        let nan = space(f64::NAN, 0.0, 1.0, 1.0);

        assert!(matches!(
            tree.add([&ok, &nan]),
            Err(TreeError::NonFiniteRect(_))
        ));
        assert!(tree.is_empty());
        assert_eq!(tree.remove([&nan]).unwrap(), 0);

        tree.add([&ok]).unwrap();
        assert!(matches!(
            tree.update_space(f64::NAN, 0.0, 1.0, 1.0, Some(&mut ok)),
            Err(TreeError::NonFiniteRect(_))
        ));
        assert!(matches!(
            tree.shift_space(0.0, f64::INFINITY, Some(&mut ok)),
            Err(TreeError::NonFiniteRect(_))
        ));
        assert_eq!(ok.rect(), Rect2::from_xywh(0.0, 0.0, 1.0, 1.0));

        // 索引没有中毒，仍然可以正常读写
        tree.shift_space(2.0, 0.0, Some(&mut ok)).unwrap();
        assert_eq!(tree.search_intersect(&ok.rect()), vec![ok.clone()]);
        assert_eq!(tree.remove([&ok]).unwrap(), 1);
        assert!(tree.is_empty());
        assert!(tree.check_invariants().is_ok());
    }
}
