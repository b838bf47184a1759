// R-tree算法模块
//
// 这个模块包含R-tree的所有核心算法实现，按功能分解为不同的子模块：
// - search: 相交搜索
// - insert: 插入和ChooseNode
// - split: 二次分裂算法
// - delete: 删除、CondenseTree和根节点缩短
// - knn: 最近邻/K-最近邻搜索（分支限界）
// - utils: AdjustTree等共用的工具函数
// - debug: 不变量检查和结构日志

pub mod debug;
pub mod delete;
pub mod insert;
pub mod knn;
pub mod search;
pub mod split;
pub mod utils;
