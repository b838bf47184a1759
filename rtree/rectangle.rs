use serde::ser::{Serialize, SerializeStruct, Serializer};

/// 点 - 固定维度的浮点坐标元组
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point<const D: usize>(pub [f64; D]);

/// 二维点
pub type Point2 = Point<2>;
/// 三维点
pub type Point3 = Point<3>;

impl<const D: usize> Point<D> {
    /// 创建新的点
    pub fn new(coords: [f64; D]) -> Self {
        Point(coords)
    }

    /// 获取坐标数组
    pub fn coords(&self) -> &[f64; D] {
        &self.0
    }

    /// 计算到另一个点的欧氏距离的平方
    pub fn distance2(&self, other: &Point<D>) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }
}

impl Point<2> {
    pub fn xy(x: f64, y: f64) -> Self {
        Point([x, y])
    }

    pub fn x(&self) -> f64 {
        self.0[0]
    }

    pub fn y(&self) -> f64 {
        self.0[1]
    }
}

impl Point<3> {
    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Point([x, y, z])
    }
}

impl<const D: usize> From<[f64; D]> for Point<D> {
    fn from(coords: [f64; D]) -> Self {
        Point(coords)
    }
}

impl<const D: usize> Serialize for Point<D> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

/// 轴对齐矩形边界框 - 用于表示R-tree中的最小边界矩形(MBR)
///
/// 不变量：每个轴上 `min[i] <= max[i]`。构造函数会自动交换颠倒的坐标。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect<const D: usize> {
    pub min: [f64; D],
    pub max: [f64; D],
}

/// 二维矩形
pub type Rect2 = Rect<2>;
/// 三维长方体
pub type Rect3 = Rect<3>;

impl<const D: usize> Rect<D> {
    /// 由两个角点创建矩形，逐轴规范化 min/max
    pub fn new(a: [f64; D], b: [f64; D]) -> Self {
        let mut min = a;
        let mut max = b;
        for i in 0..D {
            if min[i] > max[i] {
                std::mem::swap(&mut min[i], &mut max[i]);
            }
        }
        Rect { min, max }
    }

    /// 创建一个点矩形（各轴宽度为0）
    pub fn from_point(point: &Point<D>) -> Self {
        Rect {
            min: point.0,
            max: point.0,
        }
    }

    /// 计算矩形的"空间"：二维为面积，三维为体积
    ///
    /// 这是R-tree选择子树和分裂节点时使用的质量度量
    pub fn space(&self) -> f64 {
        (0..D).map(|i| self.max[i] - self.min[i]).product()
    }

    /// 计算两个矩形的并集MBR
    pub fn union(&self, other: &Rect<D>) -> Rect<D> {
        let mut result = *self;
        for i in 0..D {
            result.min[i] = result.min[i].min(other.min[i]);
            result.max[i] = result.max[i].max(other.max[i]);
        }
        result
    }

    /// 判断两个矩形是否相交
    ///
    /// 只有内部在每个轴上都有重叠才算相交，仅共享边界的矩形不相交
    pub fn intersects(&self, other: &Rect<D>) -> bool {
        (0..D).all(|i| self.min[i] < other.max[i] && other.min[i] < self.max[i])
    }

    /// 判断当前矩形是否包含另一个矩形（边界包含在内）
    pub fn contains(&self, other: &Rect<D>) -> bool {
        (0..D).all(|i| self.min[i] <= other.min[i] && other.max[i] <= self.max[i])
    }

    /// 判断当前矩形是否包含一个点（边界包含在内）
    pub fn contains_point(&self, point: &Point<D>) -> bool {
        (0..D).all(|i| self.min[i] <= point.0[i] && point.0[i] <= self.max[i])
    }

    /// 计算扩大到包含另一个矩形所需的空间增量
    pub fn enlargement(&self, other: &Rect<D>) -> f64 {
        self.union(other).space() - self.space()
    }

    /// 计算矩形中心点
    pub fn center(&self) -> Point<D> {
        let mut center = self.min;
        for (i, c) in center.iter_mut().enumerate() {
            *c = (self.min[i] + self.max[i]) / 2.0;
        }
        Point(center)
    }

    /// 判断矩形是否退化为一个点
    pub fn is_point(&self) -> bool {
        self.min == self.max
    }

    /// 所有坐标是否都是有限值（不含 NaN 和无穷大）
    pub fn is_finite(&self) -> bool {
        (0..D).all(|i| self.min[i].is_finite() && self.max[i].is_finite())
    }

    /// 按给定偏移量平移矩形
    pub fn shift(&self, delta: [f64; D]) -> Rect<D> {
        let mut result = *self;
        for i in 0..D {
            result.min[i] += delta[i];
            result.max[i] += delta[i];
        }
        result
    }

    /// MINDIST：点到矩形最近点的距离平方，点在矩形内时为0
    pub fn min_dist(&self, point: &Point<D>) -> f64 {
        (0..D)
            .map(|i| {
                let p = point.0[i];
                let closest = p.clamp(self.min[i], self.max[i]);
                (p - closest) * (p - closest)
            })
            .sum()
    }

    /// MINMAXDIST：矩形内"必然存在某个对象"的距离上界的平方
    ///
    /// 对每个轴k，取该轴上离点较近的那个面，再取该面上离点最远的顶点；
    /// 所有轴中取最小值。
    pub fn min_max_dist(&self, point: &Point<D>) -> f64 {
        let mut far_sum = 0.0;
        let mut far = [0.0; D];
        let mut near = [0.0; D];
        for i in 0..D {
            let p = point.0[i];
            let mid = (self.min[i] + self.max[i]) / 2.0;
            let rm = if p <= mid { self.min[i] } else { self.max[i] };
            let r_m = if p >= mid { self.min[i] } else { self.max[i] };
            near[i] = (p - rm) * (p - rm);
            far[i] = (p - r_m) * (p - r_m);
            far_sum += far[i];
        }

        (0..D)
            .map(|k| far_sum - far[k] + near[k])
            .fold(f64::INFINITY, f64::min)
    }

    /// 在浮点容差内比较两个矩形
    pub(crate) fn approx_eq(&self, other: &Rect<D>, epsilon: f64) -> bool {
        (0..D).all(|i| {
            (self.min[i] - other.min[i]).abs() <= epsilon
                && (self.max[i] - other.max[i]).abs() <= epsilon
        })
    }
}

impl Rect<2> {
    /// 由左上角坐标和宽高创建矩形，负的宽高会被规范化
    pub fn from_xywh(x: f64, y: f64, w: f64, h: f64) -> Self {
        Rect::new([x, y], [x + w, y + h])
    }

    /// 由两个角点坐标创建矩形
    pub fn xyxy(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Rect::new([x1, y1], [x2, y2])
    }

    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }
}

impl Rect<3> {
    /// 由两个角点坐标创建长方体
    pub fn xyzxyz(x1: f64, y1: f64, z1: f64, x2: f64, y2: f64, z2: f64) -> Self {
        Rect::new([x1, y1, z1], [x2, y2, z2])
    }
}

impl From<geo::Rect<f64>> for Rect<2> {
    fn from(rect: geo::Rect<f64>) -> Self {
        Rect::xyxy(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }
}

impl<const D: usize> Serialize for Rect<D> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Rect", 2)?;
        state.serialize_field("min", &self.min[..])?;
        state.serialize_field("max", &self.max[..])?;
        state.end()
    }
}
