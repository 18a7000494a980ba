/// 索引库统一的 Result 类型
pub type Result<T> = std::result::Result<T, IndexError>;

/// 索引构建、加载与查询过程中可能出现的错误。
///
/// 查询本身是纯计算，不会失败；这里的错误几乎都来自构建参数或磁盘上的数据。
#[derive(thiserror::Error, Debug)]
pub enum IndexError {
    /// 底层 I/O 错误
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// bincode 编解码失败（元信息文件、轻量索引）
    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    /// 文件长度与头部声明的序列长度不一致
    #[error("truncated or oversized {what}: expected {expected} words, found {actual}")]
    Truncated {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// 头部或 checkpoint 内容自相矛盾
    #[error("corrupt {what}: {reason}")]
    Corrupt { what: &'static str, reason: String },

    /// .sa 与 .bwt 不属于同一个索引
    #[error("suffix array does not match BWT: {0}")]
    Mismatch(String),

    /// 查询或构建输入中出现了 {0,1,2,3} 以外的符号
    #[error("invalid symbol {symbol} at position {pos}; expected 0..=3")]
    InvalidSymbol { pos: usize, symbol: u8 },

    /// 构建参数不合法（checkpoint 间隔、SA 采样步长等）
    #[error("invalid index option: {0}")]
    InvalidOption(String),

    /// 序列长度超出 32 位行号可表示的范围
    #[error("sequence of {0} symbols is too long for 32-bit ranks")]
    TooLong(usize),
}

impl IndexError {
    pub(crate) fn corrupt(what: &'static str, reason: impl Into<String>) -> Self {
        Self::Corrupt { what, reason: reason.into() }
    }
}
