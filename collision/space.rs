use crate::rtree::algorithms::utils::geometry_to_bbox;
use crate::rtree::rectangle::{Point2, Rect2};
use derive_more::Display;
use serde::Serialize;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SPACE_ID: AtomicU64 = AtomicU64::new(1);

/// Space 的唯一标识，在构造时分配
///
/// 克隆出来的 Space 共享同一个标识，相当于对同一个对象的引用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize)]
#[display(fmt = "#{}", _0)]
pub struct SpaceId(u64);

impl SpaceId {
    fn next() -> Self {
        SpaceId(NEXT_SPACE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// 所有者标识（例如实体编号），索引只用它做比较和过滤
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize)]
#[display(fmt = "owner:{}", _0)]
pub struct OwnerId(pub u64);

/// 碰撞分类标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize)]
#[display(fmt = "label:{}", _0)]
pub struct Label(pub u32);

/// 被索引的对象：一个矩形加上所有者和标签
///
/// 坐标系与屏幕一致：x 向右增大，y 向下增大。
/// 矩形只能通过 `Tree` 的更新操作修改，这样树中的边界框始终保持一致。
#[derive(Debug, Clone, Display, Serialize)]
#[display(fmt = "Space{} {:?} {} {}", id, rect, owner, label)]
pub struct Space {
    id: SpaceId,
    rect: Rect2,
    owner: OwnerId,
    label: Label,
}

impl Space {
    pub fn new(rect: Rect2, owner: OwnerId, label: Label) -> Self {
        Space {
            id: SpaceId::next(),
            rect,
            owner,
            label,
        }
    }

    /// 由左上角坐标和宽高创建
    pub fn from_xywh(x: f64, y: f64, w: f64, h: f64, owner: OwnerId, label: Label) -> Self {
        Self::new(Rect2::from_xywh(x, y, w, h), owner, label)
    }

    /// 用几何体的边界框创建，空几何体返回 None
    pub fn from_geometry(geometry: &geo::Geometry<f64>, owner: OwnerId, label: Label) -> Option<Self> {
        geometry_to_bbox(geometry).map(|rect| Self::new(rect, owner, label))
    }

    pub fn id(&self) -> SpaceId {
        self.id
    }

    pub fn rect(&self) -> Rect2 {
        self.rect
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn x(&self) -> f64 {
        self.rect.min[0]
    }

    pub fn y(&self) -> f64 {
        self.rect.min[1]
    }

    pub fn w(&self) -> f64 {
        self.rect.width()
    }

    pub fn h(&self) -> f64 {
        self.rect.height()
    }

    pub fn center(&self) -> Point2 {
        self.rect.center()
    }

    pub(crate) fn set_rect(&mut self, rect: Rect2) {
        self.rect = rect;
    }

    pub(crate) fn set_label(&mut self, label: Label) {
        self.label = label;
    }

    /// 点是否在矩形内（边界包含在内）
    pub fn contains_point(&self, point: &Point2) -> bool {
        self.rect.contains_point(point)
    }

    /// 两个对象的矩形内部是否重叠
    pub fn overlaps(&self, other: &Space) -> bool {
        self.rect.intersects(&other.rect)
    }

    /// x轴上的重叠长度，为负时表示两者之间的间距
    pub fn overlap_x(&self, other: &Space) -> f64 {
        self.rect.max[0].min(other.rect.max[0]) - self.rect.min[0].max(other.rect.min[0])
    }

    /// y轴上的重叠长度，为负时表示两者之间的间距
    pub fn overlap_y(&self, other: &Space) -> f64 {
        self.rect.max[1].min(other.rect.max[1]) - self.rect.min[1].max(other.rect.min[1])
    }

    /// 当前对象在 `other` 上方的距离，为负表示在y轴上有重叠
    pub fn above(&self, other: &Space) -> f64 {
        other.rect.min[1] - self.rect.max[1]
    }

    /// 当前对象在 `other` 下方的距离
    pub fn below(&self, other: &Space) -> f64 {
        self.rect.min[1] - other.rect.max[1]
    }

    /// 当前对象在 `other` 左侧的距离
    pub fn left_of(&self, other: &Space) -> f64 {
        other.rect.min[0] - self.rect.max[0]
    }

    /// 当前对象在 `other` 右侧的距离
    pub fn right_of(&self, other: &Space) -> f64 {
        self.rect.min[0] - other.rect.max[0]
    }
}

impl PartialEq for Space {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Space {}

impl Hash for Space {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
