//! Checkpoint 与 2-bit BWT 交错存放的扁平缓冲区。
//!
//! 第 i 个区间占 `4 + occ_interval / 16` 个字：
//! 前 4 个字是符号 0..3 在 `[0, i * occ_interval)` 中的累计出现次数，
//! 随后是本区间的打包符号。最后一个（可能不满的）区间之后再跟一个总计 checkpoint。
//! 这就是 BWA `.bwt` 文件里的布局，所以所有访问都走下面的命名方法，不直接算偏移。

use std::io::{ErrorKind, Read};

use byteorder::{ByteOrder, LittleEndian};

use super::check_occ_interval;
use crate::error::{IndexError, Result};
use crate::util::dna::SYMBOLS_PER_WORD;

const CHECKPOINT_WORDS: usize = 4;

#[derive(Debug, Clone)]
pub struct PackedBwt {
    words: Vec<u32>,
    seq_len: u32,
    occ_interval: u32,
    interval_shift: u32,
}

impl PackedBwt {
    /// 交错后缓冲区应有的字数
    pub fn expected_words(seq_len: u32, occ_interval: u32) -> usize {
        let n = seq_len as usize;
        let interval = occ_interval as usize;
        let packed = (n + SYMBOLS_PER_WORD - 1) / SYMBOLS_PER_WORD;
        let n_occ = (n + interval - 1) / interval + 1;
        packed + n_occ * CHECKPOINT_WORDS
    }

    /// 从普通的打包 BWT（已去掉 `$`）构建交错布局，同时返回四种符号的总数。
    pub fn interleave(raw: &[u32], seq_len: u32, occ_interval: u32) -> Result<(Self, [u32; 4])> {
        check_occ_interval(occ_interval)?;
        let n = seq_len as usize;
        let interval = occ_interval as usize;
        let raw_words = (n + SYMBOLS_PER_WORD - 1) / SYMBOLS_PER_WORD;
        if raw.len() < raw_words {
            return Err(IndexError::Truncated { what: "packed BWT", expected: raw_words, actual: raw.len() });
        }

        let mut words = Vec::with_capacity(Self::expected_words(seq_len, occ_interval));
        let mut cnt = [0u32; 4];
        for (wi, &w) in raw[..raw_words].iter().enumerate() {
            let pos = wi * SYMBOLS_PER_WORD;
            if pos % interval == 0 {
                words.extend_from_slice(&cnt);
            }
            // 最后一个字的尾部可能是补齐的 0，不能计入
            let valid = (n - pos).min(SYMBOLS_PER_WORD);
            for j in 0..valid {
                cnt[(w >> ((15 - j) << 1) & 3) as usize] += 1;
            }
            words.push(w);
        }
        words.extend_from_slice(&cnt);

        let store = Self::from_words(words, seq_len, occ_interval)?;
        Ok((store, cnt))
    }

    /// 接管一个已交错好的缓冲区（通常来自磁盘），校验长度与 checkpoint。
    pub fn from_words(words: Vec<u32>, seq_len: u32, occ_interval: u32) -> Result<Self> {
        check_occ_interval(occ_interval)?;
        let expected = Self::expected_words(seq_len, occ_interval);
        if words.len() != expected {
            return Err(IndexError::Truncated { what: "BWT", expected, actual: words.len() });
        }
        let store = Self { words, seq_len, occ_interval, interval_shift: occ_interval.trailing_zeros() };
        store.check_checkpoints()?;
        Ok(store)
    }

    /// checkpoint 必须单调不减，相邻两个的差等于区间长度，最后一个的和等于序列长度
    fn check_checkpoints(&self) -> Result<()> {
        let mut prev = [0u32; 4];
        for i in 0..=self.n_intervals() {
            let cp = self.checkpoint_for(i);
            if cp.iter().zip(&prev).any(|(a, b)| a < b) {
                return Err(IndexError::corrupt("BWT", format!("checkpoint {} decreases", i)));
            }
            let span = cp.iter().map(|&x| u64::from(x)).sum::<u64>() - prev.iter().map(|&x| u64::from(x)).sum::<u64>();
            let want = if i == 0 { 0 } else { u64::from(self.interval_len(i - 1)) };
            if span != want {
                return Err(IndexError::corrupt(
                    "BWT",
                    format!("checkpoint {} covers {} symbols, expected {}", i, span, want),
                ));
            }
            prev = cp;
        }
        Ok(())
    }

    #[inline]
    pub fn seq_len(&self) -> u32 {
        self.seq_len
    }

    #[inline]
    pub fn occ_interval(&self) -> u32 {
        self.occ_interval
    }

    /// 完整区间加上最后一个不满的区间
    #[inline]
    pub fn n_intervals(&self) -> usize {
        (self.seq_len as usize + self.occ_interval as usize - 1) >> self.interval_shift
    }

    /// 每个完整区间占用的字数
    #[inline]
    pub fn interval_stride(&self) -> usize {
        CHECKPOINT_WORDS + self.occ_interval as usize / SYMBOLS_PER_WORD
    }

    /// 存储位置 pos 所在的区间号
    #[inline]
    pub fn interval_of(&self, pos: u32) -> usize {
        (pos >> self.interval_shift) as usize
    }

    /// pos 相对于所在区间起点的偏移
    #[inline]
    pub fn offset_in_interval(&self, pos: u32) -> u32 {
        pos & (self.occ_interval - 1)
    }

    fn interval_len(&self, interval: usize) -> u32 {
        let start = (interval as u32) << self.interval_shift;
        (self.seq_len - start).min(self.occ_interval)
    }

    /// 第 interval 个区间起点处的 4 路累计计数；interval == n_intervals() 时是总计
    #[inline]
    pub fn checkpoint_for(&self, interval: usize) -> [u32; 4] {
        // 总计 checkpoint 紧跟在最后一个区间的实际末尾之后，不一定按 stride 对齐
        let base = if interval >= self.n_intervals() {
            debug_assert_eq!(interval, self.n_intervals());
            self.words.len() - CHECKPOINT_WORDS
        } else {
            interval * self.interval_stride()
        };
        let mut cp = [0u32; 4];
        cp.copy_from_slice(&self.words[base..base + CHECKPOINT_WORDS]);
        cp
    }

    /// 第 interval 个区间的打包符号字（最后一个区间可能更短）
    #[inline]
    pub fn interval_words(&self, interval: usize) -> &[u32] {
        let base = interval * self.interval_stride() + CHECKPOINT_WORDS;
        let n = (self.interval_len(interval) as usize + SYMBOLS_PER_WORD - 1) / SYMBOLS_PER_WORD;
        &self.words[base..base + n]
    }

    #[inline]
    pub fn word_at(&self, interval: usize, offset: usize) -> u32 {
        self.interval_words(interval)[offset]
    }

    /// 取存储串（已去掉 `$`）中第 pos 个符号
    #[inline]
    pub fn symbol(&self, pos: u32) -> u8 {
        debug_assert!(pos < self.seq_len, "stored position {} out of range {}", pos, self.seq_len);
        let rel = self.offset_in_interval(pos);
        let w = self.word_at(self.interval_of(pos), (rel >> 4) as usize);
        (w >> ((!rel & 15) << 1) & 3) as u8
    }

    /// 区间内从 offset 开始的两个字拼成的 u64；越过区间末尾的部分补 0
    #[inline]
    pub(crate) fn pair_at(&self, words: &[u32], offset: usize) -> u64 {
        let hi = words.get(offset).copied().unwrap_or(0);
        let lo = words.get(offset + 1).copied().unwrap_or(0);
        (u64::from(hi) << 32) | u64::from(lo)
    }

    /// 底层缓冲区，用于写盘
    pub fn as_words(&self) -> &[u32] {
        &self.words
    }

    pub fn size_in_bytes(&self) -> usize {
        self.words.len() * std::mem::size_of::<u32>()
    }
}

/// 从 r 中读出恰好 expected 个小端 u32。按块读入，不在内存里另存一份字节副本；
/// 文件过短报 `Truncated`，读满之后还有剩余字节报 `Corrupt`。
pub(crate) fn read_words<R: Read>(r: &mut R, expected: usize, what: &'static str) -> Result<Vec<u32>> {
    const CHUNK_WORDS: usize = 1 << 14;
    let mut words = vec![0u32; expected];
    let mut buf = vec![0u8; CHUNK_WORDS.min(expected.max(1)) * 4];
    let mut done = 0;
    while done < expected {
        let want = (expected - done).min(CHUNK_WORDS) * 4;
        let got = fill(r, &mut buf[..want])?;
        let n = got / 4;
        LittleEndian::read_u32_into(&buf[..n * 4], &mut words[done..done + n]);
        done += n;
        if got < want {
            return Err(IndexError::Truncated { what, expected, actual: done });
        }
    }
    let mut extra = [0u8; 1];
    if fill(r, &mut extra)? != 0 {
        return Err(IndexError::corrupt(what, format!("trailing data after {} words", expected)));
    }
    Ok(words)
}

/// 尽量读满 buf，返回实际读到的字节数（到 EOF 为止）
fn fill<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut got = 0;
    while got < buf.len() {
        match r.read(&mut buf[got..]) {
            Ok(0) => break,
            Ok(n) => got += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(got)
}
