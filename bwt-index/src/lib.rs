//! # bwt-index
//!
//! BWA 风格的 DNA 序列 BWT / FM 索引。
//!
//! 本 crate 提供：
//!
//! - **打包 BWT**：2 bit/符号，每隔固定间隔交错存放 4 个符号的累计计数（checkpoint）
//! - **秩查询**：单符号 / 四符号 Occ，以及同时查询两行的 dual 版本
//! - **采样后缀数组**：按步长保存 SA，沿 inverse Psi 回走恢复任意行
//! - **反向搜索**：精确匹配得到 SA 区间，可从已有区间继续收窄
//! - **轻量索引**：短序列在内存中直接构建，带完整 SA
//!
//! ## 快速示例
//!
//! ```rust
//! use bwt_index::index::{FmIndex, IndexOpt, RankIndex};
//! use bwt_index::util::dna;
//!
//! let text = dna::encode(b"ACGTACGTAGCTGATCGTAG");
//! let fm = FmIndex::build(&text, IndexOpt::default()).unwrap();
//!
//! let pattern = dna::encode(b"GCTGATC");
//! let interval = fm.backward_search(&pattern).unwrap().unwrap();
//! assert_eq!(interval.len(), 1);
//! assert_eq!(fm.sa_interval_positions(interval), vec![9]);
//! ```
//!
//! ## 模块说明
//!
//! - [`index`] — BWT 存储、秩查询、采样 SA、反向搜索、轻量索引
//! - [`io`] — FASTA 参考序列读取
//! - [`util`] — DNA 编码 / 解码 / 反向互补 / 2-bit 打包
//! - [`error`] — 错误类型

pub mod error;
pub mod index;
pub mod io;
pub mod util;

pub use error::{IndexError, Result};
