//! 批量 Occ 计算。
//!
//! `occurrence(k, c)` 返回 BWT 第 `0..=k` 行中符号 c 的个数（`$` 行不计）。
//! `k == seq_len` 时直接由 C 表得出总数；`k == NO_POSITION` 表示“第 0 行之前”，结果为 0。
//! 扫描都以区间起点为基准，因此任意合法的 occ_interval（包括 16）都适用。

use super::bwt::Bwt;
use super::occ::{mask_pair, mask_word, masked_pair_slots, masked_word_slots, occ_aux, unpack_lanes};
use super::search::RankIndex;
use super::{BwtInt, NO_POSITION};

impl Bwt {
    /// 行号越界直接 panic（发布版本同样检查）：末尾补齐的 0 槽位会被当成符号 0
    #[inline]
    fn check_row(&self, k: BwtInt) {
        assert!(
            k <= self.seq_len || k == NO_POSITION,
            "row {} out of range 0..={}",
            k,
            self.seq_len
        );
    }

    /// 从区间起点扫到 rel（含），单符号版本；pair 为起始的 32 符号组号。
    /// 返回 (扫到 rel 所在组之前的累计, 含 rel 的最终结果)。
    #[inline]
    fn scan_pairs(&self, words: &[u32], pair: &mut usize, base: u32, rel: u32, c: u8) -> (u32, u32) {
        let mut n = base;
        let last = (rel >> 5) as usize;
        while *pair < last {
            n += occ_aux(self.store.pair_at(words, *pair << 1), c);
            *pair += 1;
        }
        let mut full = n + occ_aux(mask_pair(self.store.pair_at(words, last << 1), rel), c);
        if c == 0 {
            full -= masked_pair_slots(rel);
        }
        (n, full)
    }

    /// 4 路版本：按 16 符号一个字查表累加，结果是字节打包的 4 路计数。
    /// 返回 (扫到 rel 所在字之前的累计, 含 rel 的结果)。
    #[inline]
    fn scan_words(&self, words: &[u32], word: &mut usize, base: u32, rel: u32) -> (u32, u32) {
        let mut x = base;
        let last = (rel >> 4) as usize;
        while *word < last {
            x += self.cnt_table.aux4(words[*word]);
            *word += 1;
        }
        let full = x + self.cnt_table.aux4(mask_word(words[last], rel)) - masked_word_slots(rel);
        (x, full)
    }

    /// 第 0..=k 行中 c 的个数
    pub fn occurrence(&self, k: BwtInt, c: u8) -> BwtInt {
        debug_assert!(c < 4);
        if k == self.seq_len {
            return self.l2[c as usize + 1] - self.l2[c as usize];
        }
        if k == NO_POSITION {
            return 0;
        }
        self.check_row(k);
        let k = self.strip_sentinel(k);

        let interval = self.store.interval_of(k);
        let words = self.store.interval_words(interval);
        let base = self.store.checkpoint_for(interval)[c as usize];
        let mut pair = 0;
        self.scan_pairs(words, &mut pair, base, self.store.offset_in_interval(k), c).1
    }

    /// 一次算出四种符号在第 0..=k 行中的个数
    pub fn occurrence4(&self, k: BwtInt) -> [BwtInt; 4] {
        if k == NO_POSITION {
            return [0; 4];
        }
        if k == self.seq_len {
            return self.totals();
        }
        self.check_row(k);
        let k = self.strip_sentinel(k);

        let interval = self.store.interval_of(k);
        let words = self.store.interval_words(interval);
        let mut cnt = self.store.checkpoint_for(interval);
        let mut word = 0;
        let (_, x) = self.scan_words(words, &mut word, 0, self.store.offset_in_interval(k));
        unpack_lanes(&mut cnt, x);
        cnt
    }

    fn totals(&self) -> [BwtInt; 4] {
        let l2 = &self.l2;
        [l2[1] - l2[0], l2[2] - l2[1], l2[3] - l2[2], l2[4] - l2[3]]
    }

    /// 同时求 k、l 两行的 Occ（要求 k <= l）。
    ///
    /// 去掉 `$` 后两者落在同一个 checkpoint 区间时只读一次 checkpoint，
    /// 并在扫到 k 之后继续扫到 l，不重复扫描公共前缀。这是反向搜索的主要开销。
    pub fn dual_occurrence(&self, k: BwtInt, l: BwtInt, c: u8) -> (BwtInt, BwtInt) {
        if k == l {
            let o = self.occurrence(k, c);
            return (o, o);
        }
        if !self.shares_interval(k, l) {
            return (self.occurrence(k, c), self.occurrence(l, c));
        }
        let k = self.strip_sentinel(k);
        let l = self.strip_sentinel(l);
        debug_assert!(k <= l);

        let interval = self.store.interval_of(k);
        let words = self.store.interval_words(interval);
        let base = self.store.checkpoint_for(interval)[c as usize];
        let mut pair = 0;
        let (prefix, ok) = self.scan_pairs(words, &mut pair, base, self.store.offset_in_interval(k), c);
        let (_, ol) = self.scan_pairs(words, &mut pair, prefix, self.store.offset_in_interval(l), c);
        (ok, ol)
    }

    /// `dual_occurrence` 的 4 路版本，要求 k <= l
    pub fn dual_occurrence4(&self, k: BwtInt, l: BwtInt) -> ([BwtInt; 4], [BwtInt; 4]) {
        if k == l {
            let cnt = self.occurrence4(k);
            return (cnt, cnt);
        }
        if !self.shares_interval(k, l) {
            return (self.occurrence4(k), self.occurrence4(l));
        }
        let k = self.strip_sentinel(k);
        let l = self.strip_sentinel(l);
        debug_assert!(k <= l);

        let interval = self.store.interval_of(k);
        let words = self.store.interval_words(interval);
        let mut cntk = self.store.checkpoint_for(interval);
        let mut cntl = cntk;
        let mut word = 0;
        let (prefix, x) = self.scan_words(words, &mut word, 0, self.store.offset_in_interval(k));
        let (_, y) = self.scan_words(words, &mut word, prefix, self.store.offset_in_interval(l));
        unpack_lanes(&mut cntk, x);
        unpack_lanes(&mut cntl, y);
        (cntk, cntl)
    }

    /// 两行都能走共享扫描：都不是 NO_POSITION / seq_len，且去 `$` 后落在同一区间
    #[inline]
    fn shares_interval(&self, k: BwtInt, l: BwtInt) -> bool {
        if k == NO_POSITION || l == NO_POSITION || k == self.seq_len || l == self.seq_len {
            return false;
        }
        self.check_row(k);
        self.check_row(l);
        let k = self.strip_sentinel(k);
        let l = self.strip_sentinel(l);
        self.store.interval_of(k) == self.store.interval_of(l)
    }

    /// inverse Psi：第 k 行后缀的前一个后缀所在的行（LF 映射）。
    /// `$` 所在行的前驱是整段文本，即第 0 行。
    #[inline]
    pub fn inv_psi(&self, k: BwtInt) -> BwtInt {
        if k == self.primary {
            return 0;
        }
        self.check_row(k);
        let c = self.symbol_at(k);
        self.l2[c as usize] + self.occurrence(k, c)
    }
}

impl RankIndex for Bwt {
    fn seq_len(&self) -> BwtInt {
        self.seq_len
    }

    fn cumulative(&self) -> &[BwtInt; 5] {
        &self.l2
    }

    #[inline]
    fn dual_occ(&self, k: BwtInt, l: BwtInt, c: u8) -> (BwtInt, BwtInt) {
        self.dual_occurrence(k, l, c)
    }

    #[inline]
    fn dual_occ4(&self, k: BwtInt, l: BwtInt) -> ([BwtInt; 4], [BwtInt; 4]) {
        self.dual_occurrence4(k, l)
    }
}
