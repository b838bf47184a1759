/// 索引错误类型
///
/// 查询操作永远不会返回错误，只有构造和修改操作会失败
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("invalid fan-out: min_children={min}, max_children={max}")]
    InvalidFanout { min: usize, max: usize },

    #[error("nil space given")]
    NilInput,

    #[error("space does not exist in the tree")]
    NotExist,

    /// 矩形含有 NaN 或无穷大的坐标，无法被索引
    #[error("non-finite rectangle: {0}")]
    NonFiniteRect(String),

    #[error("Lock was poisoned by a panicked thread")]
    LockPoisoned,

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, TreeError>;

impl From<config::ConfigError> for TreeError {
    fn from(err: config::ConfigError) -> Self {
        TreeError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for TreeError {
    fn from(err: toml::ser::Error) -> Self {
        TreeError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for TreeError {
    fn from(err: toml::de::Error) -> Self {
        TreeError::Config(err.to_string())
    }
}

impl From<std::io::Error> for TreeError {
    fn from(err: std::io::Error) -> Self {
        TreeError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            TreeError::InvalidFanout { min: 5, max: 3 }.to_string(),
            "invalid fan-out: min_children=5, max_children=3"
        );
        assert_eq!(TreeError::NilInput.to_string(), "nil space given");
        assert_eq!(
            TreeError::NotExist.to_string(),
            "space does not exist in the tree"
        );
    }

    #[test]
    fn test_from_io_error() {
        let err: TreeError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, TreeError::Config(msg) if msg.contains("gone")));
    }
}
