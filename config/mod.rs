use crate::errors::{Result, TreeError};
use crate::rtree::rtree::{validate_fanout, DEFAULT_MAX_CHILDREN, DEFAULT_MIN_CHILDREN};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// 索引配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// 非根节点的最小条目数
    #[serde(default = "default_min_children")]
    pub min_children: usize,

    /// 节点的最大条目数
    #[serde(default = "default_max_children")]
    pub max_children: usize,
}

// ============================================================================
// 默认值函数
// ============================================================================

fn default_min_children() -> usize {
    DEFAULT_MIN_CHILDREN
}

fn default_max_children() -> usize {
    DEFAULT_MAX_CHILDREN
}

// ============================================================================
// 实现
// ============================================================================

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            min_children: default_min_children(),
            max_children: default_max_children(),
        }
    }
}

impl IndexConfig {
    /// 从文件加载配置
    ///
    /// 配置加载顺序（优先级从低到高）：
    /// 1. 默认配置（内嵌的 default.toml）
    /// 2. 用户配置文件（TOML 格式，可选，不存在时使用默认配置）
    ///
    /// # 示例
    ///
    /// ```no_run
    /// use collision_index::config::IndexConfig;
    ///
    /// let config = IndexConfig::from_file("collision.toml").unwrap();
    /// ```
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_string_lossy();
        let settings = config::Config::builder()
            // 1. 加载默认配置（内嵌）
            .add_source(config::File::from_str(
                include_str!("default.toml"),
                config::FileFormat::Toml,
            ))
            // 2. 加载用户配置（可选，不存在不报错）
            .add_source(config::File::new(&path, config::FileFormat::Toml).required(false))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// 从 TOML 字符串解析配置，缺失的字段使用默认值
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 保存配置到文件
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;
        Ok(())
    }

    /// 验证配置
    ///
    /// 与构造R-tree时的检查相同：`0 < min_children <= max_children` 且 `max_children >= 2`
    pub fn validate(&self) -> Result<()> {
        validate_fanout(self.min_children, self.max_children)
    }

    /// 验证配置并输出摘要日志
    pub fn validated(self) -> Result<Self> {
        self.validate().map_err(|e| {
            TreeError::Config(format!("invalid index configuration: {}", e))
        })?;
        info!(
            "index configuration: min_children={}, max_children={}",
            self.min_children, self.max_children
        );
        Ok(self)
    }
}
