pub mod algorithms;
pub mod node;
pub mod rectangle;
#[allow(clippy::module_inception)]
pub mod rtree;

// 重新导出主要类型
pub use algorithms::knn::KnnResult;
pub use node::{Entry, Node, NodeId, NodeType};
pub use rectangle::{Point, Point2, Point3, Rect, Rect2, Rect3};
pub use rtree::{RTree, TreeVisualization, DEFAULT_MAX_CHILDREN, DEFAULT_MIN_CHILDREN};
