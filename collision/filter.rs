//! 碰撞查询结果的后置过滤器
//!
//! 每个过滤器都是可复用的闭包 `Fn(Vec<Space>) -> Vec<Space>`，
//! 可以传给 `Tree::hits_filtered`。空的标签/所有者集合表示不过滤。

use super::space::{Label, OwnerId, Space};

/// 只保留带有指定标签之一的对象
pub fn with_labels(labels: &[Label]) -> impl Fn(Vec<Space>) -> Vec<Space> {
    let labels = labels.to_vec();
    move |mut spaces| {
        if !labels.is_empty() {
            spaces.retain(|space| labels.contains(&space.label()));
        }
        spaces
    }
}

/// 去掉带有指定标签之一的对象
pub fn without_labels(labels: &[Label]) -> impl Fn(Vec<Space>) -> Vec<Space> {
    let labels = labels.to_vec();
    move |mut spaces| {
        spaces.retain(|space| !labels.contains(&space.label()));
        spaces
    }
}

/// 去掉属于指定所有者之一的对象
pub fn without_owners(owners: &[OwnerId]) -> impl Fn(Vec<Space>) -> Vec<Space> {
    let owners = owners.to_vec();
    move |mut spaces| {
        spaces.retain(|space| !owners.contains(&space.owner()));
        spaces
    }
}

/// 只保留第一个带有指定标签之一的对象；标签为空时保留第一个对象
pub fn first_label(labels: &[Label]) -> impl Fn(Vec<Space>) -> Vec<Space> {
    let labels = labels.to_vec();
    move |spaces| {
        spaces
            .into_iter()
            .find(|space| labels.is_empty() || labels.contains(&space.label()))
            .into_iter()
            .collect()
    }
}

/// 只保留满足谓词的对象
pub fn with<F>(predicate: F) -> impl Fn(Vec<Space>) -> Vec<Space>
where
    F: Fn(&Space) -> bool,
{
    move |mut spaces| {
        spaces.retain(|space| predicate(space));
        spaces
    }
}

/// 去掉满足谓词的对象
pub fn without<F>(predicate: F) -> impl Fn(Vec<Space>) -> Vec<Space>
where
    F: Fn(&Space) -> bool,
{
    move |mut spaces| {
        spaces.retain(|space| !predicate(space));
        spaces
    }
}
