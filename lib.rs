//! # 碰撞索引
//!
//! 基于 Antonin Guttman 的论文 "R-trees: A Dynamic Index Structure for Spatial Searching"
//! 的动态R-tree，以及在其之上构建的二维碰撞索引。
//!
//! ## 主要特性
//!
//! - 二维和三维的点与矩形
//! - 论文中的插入、搜索、删除算法，使用二次分裂算法进行节点分裂
//! - 基于 MINDIST / MINMAXDIST 剪枝的最近邻和k近邻查询
//! - 带所有者和标签的碰撞对象，碰撞查询不返回对象自身
//! - 线程安全（`Tree`）和异步（`AsyncTree`）两种共享访问方式
//!
//! ## 使用示例
//!
//! ### R-tree
//! ```rust
//! use collision_index::{Point2, RTree, Rect2};
//!
//! let mut rtree = RTree::new(2, 4).unwrap();
//! rtree.insert(Rect2::xyxy(0.0, 0.0, 1.0, 1.0), "a");
//! rtree.insert(Rect2::xyxy(5.0, 5.0, 6.0, 6.0), "b");
//!
//! assert_eq!(rtree.search_intersect(&Rect2::xyxy(0.5, 0.5, 2.0, 2.0)), vec![&"a"]);
//! assert_eq!(rtree.nearest_neighbor(&Point2::xy(7.0, 7.0)), Some(&"b"));
//! ```
//!
//! ### 碰撞索引
//! ```rust
//! use collision_index::{filter, Label, OwnerId, Space, Tree};
//!
//! let tree = Tree::new(2, 8).unwrap();
//! let mut player = Space::from_xywh(0.0, 0.0, 2.0, 2.0, OwnerId(1), Label(0));
//! let wall = Space::from_xywh(3.0, 0.0, 1.0, 4.0, OwnerId(2), Label(1));
//! tree.add([&player, &wall]).unwrap();
//!
//! assert!(tree.hits(&player).is_empty());
//!
//! tree.shift_space(1.5, 0.0, Some(&mut player)).unwrap();
//! assert_eq!(tree.hit_label(&player, &[Label(1)]), Some(wall.clone()));
//! assert!(tree.hits_filtered(&player, filter::without_owners(&[OwnerId(2)])).is_empty());
//! ```

pub mod collision;
pub mod config;
pub mod errors;
pub mod rtree;

// 重新导出主要的公共接口
pub use collision::{filter, AsyncTree, Label, OwnerId, Space, SpaceId, Tree};
pub use config::IndexConfig;
pub use errors::{Result, TreeError};
pub use rtree::{KnnResult, Point, Point2, Point3, RTree, Rect, Rect2, Rect3};
