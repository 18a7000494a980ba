//! FM 索引：交错 checkpoint 的 2-bit BWT、批量 Occ、采样后缀数组与反向搜索。
//!
//! 行号约定：`text + $` 的 BWT 共有 `seq_len + 1` 行，编号 `0..=seq_len`，
//! 第 0 行是 `$` 后缀；BWT 中 `$` 所在的行记为 `primary`，它不进入存储串。

pub mod bwt;
pub mod fm;
pub mod lite;
pub mod occ;
pub mod packed;
pub mod rank;
pub mod sa;
pub mod sampled;
pub mod search;

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};

/// 行号类型；32 位行号可索引约 4.29G 个碱基，与 BWA `.bwt` 文件格式一致
pub type BwtInt = u32;

/// “第 0 行之前”，对它求 Occ 恒为 0。反向搜索中 `start - 1` 在 start 为 0 时回绕到这里。
pub const NO_POSITION: BwtInt = BwtInt::MAX;

/// BWA 的默认 checkpoint 间隔
pub const DEFAULT_OCC_INTERVAL: u32 = 128;

/// 最大 checkpoint 间隔；`occurrence4` 用字节累加，每路计数不能超过 255
pub const MAX_OCC_INTERVAL: u32 = 128;

pub const DEFAULT_SA_STRIDE: u32 = 32;

/// 索引构建参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexOpt {
    /// 每隔多少个符号存一组 checkpoint；2 的幂，16..=128
    pub occ_interval: u32,
    /// SA 采样步长。越大越省内存，`suffix_at` 最坏要走 `sa_stride` 步 inverse Psi
    pub sa_stride: u32,
}

impl Default for IndexOpt {
    fn default() -> Self {
        Self { occ_interval: DEFAULT_OCC_INTERVAL, sa_stride: DEFAULT_SA_STRIDE }
    }
}

impl IndexOpt {
    pub fn validate(&self) -> Result<()> {
        check_occ_interval(self.occ_interval)?;
        if self.sa_stride == 0 {
            return Err(IndexError::InvalidOption("sa_stride must be positive".to_string()));
        }
        Ok(())
    }
}

pub(crate) fn check_occ_interval(occ_interval: u32) -> Result<()> {
    if !occ_interval.is_power_of_two() || occ_interval % 16 != 0 || occ_interval > MAX_OCC_INTERVAL {
        return Err(IndexError::InvalidOption(format!(
            "occ_interval must be a power of two in 16..={}, got {}",
            MAX_OCC_INTERVAL, occ_interval
        )));
    }
    Ok(())
}

/// 构建入口接受的最长序列：行号要容纳 `seq_len + 1`，并且与 NO_POSITION 区分
pub(crate) fn check_len(len: usize) -> Result<BwtInt> {
    if len >= (NO_POSITION - 1) as usize {
        return Err(IndexError::TooLong(len));
    }
    Ok(len as BwtInt)
}

/// 检查符号都在 0..=3
pub(crate) fn check_symbols(seq: &[u8]) -> Result<()> {
    match seq.iter().position(|&c| c > 3) {
        Some(pos) => Err(IndexError::InvalidSymbol { pos, symbol: seq[pos] }),
        None => Ok(()),
    }
}

pub use bwt::Bwt;
pub use fm::{FmIndex, IndexMeta};
pub use lite::BwtLite;
pub use sampled::SampledSa;
pub use search::{RankIndex, SaInterval};
