//! 反向精确匹配。
//!
//! 区间统一采用半开约定 `[start, end)`（行号）。初始区间覆盖全部 `seq_len + 1` 行；
//! 每读入一个字符 c（从查询末尾向前），新区间为
//! `[C(c) + Occ(start - 1, c) + 1, C(c) + Occ(end - 1, c) + 1)`，
//! 其中 `start - 1` 在 start 为 0 时回绕成 `NO_POSITION`（`BwtInt::MAX`），Occ 为 0。

use serde::{Deserialize, Serialize};

use super::BwtInt;
use crate::error::{IndexError, Result};

/// SA 行区间 `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SaInterval {
    pub start: BwtInt,
    pub end: BwtInt,
}

impl SaInterval {
    pub fn new(start: BwtInt, end: BwtInt) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn len(&self) -> BwtInt {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn rows(&self) -> std::ops::Range<BwtInt> {
        self.start..self.end
    }
}

/// 支持反向搜索的秩索引。主索引与轻量索引都实现它，搜索逻辑只写一份。
pub trait RankIndex {
    fn seq_len(&self) -> BwtInt;

    /// C 表：l2[c] = 文本中小于 c 的符号个数
    fn cumulative(&self) -> &[BwtInt; 5];

    /// 第 k、l 行（k <= l）处 c 的 Occ，语义同 `Bwt::occurrence`
    fn dual_occ(&self, k: BwtInt, l: BwtInt, c: u8) -> (BwtInt, BwtInt);

    fn dual_occ4(&self, k: BwtInt, l: BwtInt) -> ([BwtInt; 4], [BwtInt; 4]);

    /// 覆盖所有行（含 `$` 行）的初始区间
    fn full_interval(&self) -> SaInterval {
        SaInterval::new(0, self.seq_len() + 1)
    }

    /// 用一个字符把区间向左扩展一步；结果为空时返回 None
    #[inline]
    fn step(&self, interval: SaInterval, c: u8) -> Option<SaInterval> {
        let (ok, ol) = self.dual_occ(interval.start.wrapping_sub(1), interval.end - 1, c);
        let base = self.cumulative()[c as usize];
        let next = SaInterval::new(base + ok + 1, base + ol + 1);
        if next.is_empty() {
            None
        } else {
            Some(next)
        }
    }

    /// 从给定区间出发继续向左匹配整个查询。
    ///
    /// 任何一步区间变空就立即返回 `Ok(None)`，剩余的查询字符不再读取；
    /// 扫描途中遇到 0..=3 以外的符号返回 `InvalidSymbol`。
    fn extend_interval(&self, interval: SaInterval, query: &[u8]) -> Result<Option<SaInterval>> {
        assert!(
            interval.end <= self.seq_len() + 1,
            "interval end {} beyond {} rows",
            interval.end,
            self.seq_len() + 1
        );
        if interval.is_empty() {
            return Ok(None);
        }
        let mut cur = interval;
        for (pos, &c) in query.iter().enumerate().rev() {
            if c > 3 {
                return Err(IndexError::InvalidSymbol { pos, symbol: c });
            }
            match self.step(cur, c) {
                Some(next) => cur = next,
                None => return Ok(None),
            }
        }
        Ok(Some(cur))
    }

    /// 精确匹配整个查询，返回以查询开头的所有后缀所在的行区间
    fn backward_search(&self, query: &[u8]) -> Result<Option<SaInterval>> {
        self.extend_interval(self.full_interval(), query)
    }

    /// 出现次数
    fn count(&self, query: &[u8]) -> Result<BwtInt> {
        Ok(self.backward_search(query)?.map_or(0, |iv| iv.len()))
    }

    /// 一次求出区间向左扩展 0/1/2/3 四个字符后的结果，空结果为 None
    fn extend4(&self, interval: SaInterval) -> [Option<SaInterval>; 4] {
        if interval.is_empty() {
            return [None; 4];
        }
        let (ok, ol) = self.dual_occ4(interval.start.wrapping_sub(1), interval.end - 1);
        let l2 = self.cumulative();
        let mut out = [None; 4];
        for c in 0..4 {
            let next = SaInterval::new(l2[c] + ok[c] + 1, l2[c] + ol[c] + 1);
            if !next.is_empty() {
                out[c] = Some(next);
            }
        }
        out
    }
}
