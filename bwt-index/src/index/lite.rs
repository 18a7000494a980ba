//! 轻量 BWT 索引，面向短序列（例如种子延伸时的局部参考片段）。
//!
//! 与主索引的区别：
//! - checkpoint 单独存在 `occ` 数组里，每 16 个符号（一个字）一组，不与 BWT 交错；
//! - 保存完整 SA，`suffix_at` 直接查表；
//! - 直接由符号序列在进程内构建。

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::occ::{lane, mask_word, masked_word_slots, unpack_lanes, CountTable};
use super::search::RankIndex;
use super::{bwt, check_len, check_symbols, sa, BwtInt, NO_POSITION};
use crate::error::{IndexError, Result};
use crate::util::dna::{self, SYMBOLS_PER_WORD};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BwtLite {
    seq_len: BwtInt,
    primary: BwtInt,
    l2: [BwtInt; 5],
    /// 去掉 `$` 的 BWT，每字 16 个符号
    bwt: Vec<u32>,
    /// occ[w * 4 + c]：符号 c 在存储位置 `[0, 16 * w)` 中的个数
    occ: Vec<BwtInt>,
    /// 完整 SA，长度 seq_len + 1
    sa: Vec<BwtInt>,
    /// 派生数据，不序列化；反序列化时经 Default 重新生成
    #[serde(skip)]
    cnt_table: CountTable,
}

impl BwtLite {
    pub fn from_symbols(seq: &[u8]) -> Result<Self> {
        let seq_len = check_len(seq.len())?;
        check_symbols(seq)?;

        let sa = sa::build_sa(seq);
        let (symbols, primary) = bwt::build_bwt(seq, &sa);
        let packed = dna::pack_symbols(&symbols);

        let mut occ = Vec::with_capacity(packed.len() * 4);
        let mut cnt = [0 as BwtInt; 4];
        for (i, &s) in symbols.iter().enumerate() {
            if i % SYMBOLS_PER_WORD == 0 {
                occ.extend_from_slice(&cnt);
            }
            cnt[s as usize] += 1;
        }
        let mut l2 = [0; 5];
        for c in 0..4 {
            l2[c + 1] = l2[c] + cnt[c];
        }

        Ok(Self { seq_len, primary, l2, bwt: packed, occ, sa, cnt_table: CountTable::new() })
    }

    #[inline]
    pub fn seq_len(&self) -> BwtInt {
        self.seq_len
    }

    #[inline]
    pub fn primary(&self) -> BwtInt {
        self.primary
    }

    #[inline]
    pub fn cumulative(&self) -> &[BwtInt; 5] {
        &self.l2
    }

    #[inline]
    fn strip_sentinel(&self, row: BwtInt) -> BwtInt {
        if row >= self.primary {
            row - 1
        } else {
            row
        }
    }

    /// 第 row 行的 BWT 符号；row 不能是 primary
    #[inline]
    pub fn symbol_at(&self, row: BwtInt) -> u8 {
        debug_assert!(row != self.primary);
        dna::packed_symbol(&self.bwt, self.strip_sentinel(row) as usize)
    }

    /// 存储位置 k 所在字截断到 k（含）之后的 4 路字节计数
    #[inline]
    fn word_lanes(&self, k: BwtInt) -> u32 {
        let w = mask_word(self.bwt[(k >> 4) as usize], k);
        self.cnt_table.aux4(w) - masked_word_slots(k)
    }

    /// 第 0..=k 行中 c 的个数，语义同 `Bwt::occurrence`
    pub fn occurrence(&self, k: BwtInt, c: u8) -> BwtInt {
        if k == self.seq_len {
            return self.l2[c as usize + 1] - self.l2[c as usize];
        }
        if k == NO_POSITION {
            return 0;
        }
        assert!(k < self.seq_len, "row {} out of range 0..={}", k, self.seq_len);
        let k = self.strip_sentinel(k);
        self.occ[((k >> 4) << 2) as usize + c as usize] + lane(self.word_lanes(k), c)
    }

    pub fn occurrence4(&self, k: BwtInt) -> [BwtInt; 4] {
        if k == NO_POSITION {
            return [0; 4];
        }
        if k == self.seq_len {
            let l2 = &self.l2;
            return [l2[1] - l2[0], l2[2] - l2[1], l2[3] - l2[2], l2[4] - l2[3]];
        }
        assert!(k < self.seq_len, "row {} out of range 0..={}", k, self.seq_len);
        let k = self.strip_sentinel(k);
        let base = ((k >> 4) << 2) as usize;
        let mut cnt = [0; 4];
        cnt.copy_from_slice(&self.occ[base..base + 4]);
        unpack_lanes(&mut cnt, self.word_lanes(k));
        cnt
    }

    /// checkpoint 每字一组，两次独立查询已经足够便宜
    pub fn dual_occurrence(&self, k: BwtInt, l: BwtInt, c: u8) -> (BwtInt, BwtInt) {
        (self.occurrence(k, c), self.occurrence(l, c))
    }

    pub fn dual_occurrence4(&self, k: BwtInt, l: BwtInt) -> ([BwtInt; 4], [BwtInt; 4]) {
        (self.occurrence4(k), self.occurrence4(l))
    }

    /// 完整 SA 直接查表
    #[inline]
    pub fn suffix_at(&self, k: BwtInt) -> BwtInt {
        self.sa[k as usize]
    }

    pub fn size_in_bytes(&self) -> usize {
        (self.bwt.len() + self.occ.len() + self.sa.len()) * std::mem::size_of::<u32>()
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let f = std::io::BufWriter::new(std::fs::File::create(path)?);
        bincode::serialize_into(f, self)?;
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let f = std::io::BufReader::new(std::fs::File::open(path)?);
        let idx: Self = bincode::deserialize_from(f)?;
        idx.validate()?;
        Ok(idx)
    }

    /// 反序列化之后检查各数组长度是否与 seq_len 吻合，并逐字重算 checkpoint
    fn validate(&self) -> Result<()> {
        let n = self.seq_len as usize;
        let words = (n + SYMBOLS_PER_WORD - 1) / SYMBOLS_PER_WORD;
        let checks = [("packed BWT", words, self.bwt.len()), ("checkpoints", words * 4, self.occ.len()), ("suffix array", n + 1, self.sa.len())];
        for (what, expected, actual) in checks {
            if expected != actual {
                return Err(IndexError::Truncated { what, expected, actual });
            }
        }
        if self.l2[4] != self.seq_len || self.l2.windows(2).any(|p| p[0] > p[1]) {
            return Err(IndexError::corrupt("lite index", format!("bad cumulative counts {:?}", self.l2)));
        }
        if self.primary > self.seq_len || (n > 0 && self.primary == 0) {
            return Err(IndexError::corrupt("lite index", format!("primary {} out of range", self.primary)));
        }

        let mut cnt = [0 as BwtInt; 4];
        for w in 0..words {
            if self.occ[w * 4..w * 4 + 4] != cnt {
                return Err(IndexError::corrupt(
                    "lite index",
                    format!("checkpoint {} is {:?}, symbols before it count {:?}", w, &self.occ[w * 4..w * 4 + 4], cnt),
                ));
            }
            let start = w * SYMBOLS_PER_WORD;
            for i in start..(start + SYMBOLS_PER_WORD).min(n) {
                cnt[dna::packed_symbol(&self.bwt, i) as usize] += 1;
            }
        }
        for c in 0..4 {
            if self.l2[c + 1] - self.l2[c] != cnt[c] {
                return Err(IndexError::corrupt(
                    "lite index",
                    format!("symbol {} occurs {} times but C table says {}", c, cnt[c], self.l2[c + 1] - self.l2[c]),
                ));
            }
        }
        Ok(())
    }
}

impl RankIndex for BwtLite {
    fn seq_len(&self) -> BwtInt {
        self.seq_len
    }

    fn cumulative(&self) -> &[BwtInt; 5] {
        &self.l2
    }

    fn dual_occ(&self, k: BwtInt, l: BwtInt, c: u8) -> (BwtInt, BwtInt) {
        self.dual_occurrence(k, l, c)
    }

    fn dual_occ4(&self, k: BwtInt, l: BwtInt) -> ([BwtInt; 4], [BwtInt; 4]) {
        self.dual_occurrence4(k, l)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Bwt;

    fn make_text(len: usize, seed: u32) -> Vec<u8> {
        let mut x = seed;
        (0..len)
            .map(|_| {
                x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                ((x >> 16) & 3) as u8
            })
            .collect()
    }

    #[test]
    fn lite_agrees_with_primary_index() {
        for &len in &[1usize, 15, 16, 17, 100, 333] {
            let text = make_text(len, len as u32 + 100);
            let lite = BwtLite::from_symbols(&text).unwrap();
            let bwt = Bwt::from_symbols(&text, 32).unwrap();
            assert_eq!(lite.primary(), bwt.primary());
            assert_eq!(lite.cumulative(), bwt.cumulative());
            for k in (0..=lite.seq_len()).chain(std::iter::once(NO_POSITION)) {
                assert_eq!(lite.occurrence4(k), bwt.occurrence4(k), "len={} k={}", len, k);
                for c in 0..4u8 {
                    assert_eq!(lite.occurrence(k, c), bwt.occurrence(k, c));
                }
            }
        }
    }

    #[test]
    fn suffix_at_is_direct_lookup() {
        let text = [2u8, 0, 3, 3, 0, 1, 0];
        let lite = BwtLite::from_symbols(&text).unwrap();
        let sa: Vec<BwtInt> = (0..=7).map(|k| lite.suffix_at(k)).collect();
        assert_eq!(sa, vec![7, 6, 4, 1, 5, 0, 3, 2]);
        let iv = lite.backward_search(&[0, 3, 3]).unwrap().unwrap();
        assert_eq!(lite.suffix_at(iv.start), 1);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn occurrence_past_end_panics() {
        let lite = BwtLite::from_symbols(&make_text(200, 3)).unwrap();
        lite.occurrence(201, 0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn occurrence4_past_end_panics() {
        let lite = BwtLite::from_symbols(&make_text(200, 3)).unwrap();
        lite.occurrence4(203);
    }

    #[test]
    fn rejects_invalid_symbols() {
        assert!(matches!(
            BwtLite::from_symbols(&[0, 1, 7]),
            Err(IndexError::InvalidSymbol { pos: 2, symbol: 7 })
        ));
    }

    #[test]
    fn save_load_roundtrip() {
        let text = make_text(250, 8);
        let lite = BwtLite::from_symbols(&text).unwrap();
        let path = std::env::temp_dir().join(format!("bwt_index_lite_{}.bin", std::process::id()));
        lite.save_to_file(&path).unwrap();
        let back = BwtLite::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        for k in 0..=lite.seq_len() {
            assert_eq!(back.occurrence4(k), lite.occurrence4(k));
            assert_eq!(back.suffix_at(k), lite.suffix_at(k));
        }
        let q = &text[40..52];
        assert_eq!(back.backward_search(q).unwrap(), lite.backward_search(q).unwrap());
    }

    #[test]
    fn load_rejects_inconsistent_arrays() {
        let mut lite = BwtLite::from_symbols(&make_text(40, 1)).unwrap();
        lite.sa.pop();
        let path = std::env::temp_dir().join(format!("bwt_index_lite_bad_{}.bin", std::process::id()));
        lite.save_to_file(&path).unwrap();
        let res = BwtLite::load_from_file(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(res, Err(IndexError::Truncated { what: "suffix array", .. })));
    }

    #[test]
    fn load_rejects_corrupt_checkpoints() {
        let mut lite = BwtLite::from_symbols(&make_text(90, 6)).unwrap();
        lite.occ[2 * 4 + 1] += 1;
        let path = std::env::temp_dir().join(format!("bwt_index_lite_occ_{}.bin", std::process::id()));
        lite.save_to_file(&path).unwrap();
        let res = BwtLite::load_from_file(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(res, Err(IndexError::Corrupt { what: "lite index", .. })));

        // 打包符号被改动：最后的总数与 C 表对不上
        let mut lite = BwtLite::from_symbols(&make_text(90, 6)).unwrap();
        let last = lite.bwt.len() - 1;
        lite.bwt[last] ^= 0x4000_0000;
        let path = std::env::temp_dir().join(format!("bwt_index_lite_sym_{}.bin", std::process::id()));
        lite.save_to_file(&path).unwrap();
        let res = BwtLite::load_from_file(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(res, Err(IndexError::Corrupt { .. })));
    }
}
