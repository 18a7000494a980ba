//! 采样后缀数组。
//!
//! 只保存行号为 stride 倍数的 SA 值，其它行沿 inverse Psi 向前走，
//! 直到落在采样行上，再加上走过的步数。步长是空间与 `suffix_at` 耗时之间的取舍：
//! 内存约为 `4 * seq_len / stride` 字节，单次查询最多 `stride` 次 Occ。

use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::bwt::Bwt;
use super::packed::read_words;
use super::BwtInt;
use crate::error::{IndexError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledSa {
    stride: u32,
    /// values[i] 为第 i * stride 行的 SA 值；values[0] = seq_len（`$` 后缀）
    values: Vec<BwtInt>,
}

impl SampledSa {
    /// 采样行数：`0..=seq_len` 中 stride 的倍数
    pub fn sample_count(seq_len: BwtInt, stride: u32) -> usize {
        (seq_len / stride) as usize + 1
    }

    /// 从 `$` 行出发沿 inverse Psi 遍历整段文本，顺带记下采样行的 SA 值。
    /// 第 0 行是 `$`，往前一步是 SA = seq_len - 1 的行，依此类推。
    pub fn build(bwt: &Bwt, stride: u32) -> Result<Self> {
        if stride == 0 {
            return Err(IndexError::InvalidOption("sa_stride must be positive".to_string()));
        }
        let n = bwt.seq_len();
        let mut values = vec![0; Self::sample_count(n, stride)];
        let mut isa: BwtInt = 0;
        let mut sa = n;
        for _ in 0..n {
            if isa % stride == 0 {
                values[(isa / stride) as usize] = sa;
            }
            sa -= 1;
            isa = bwt.inv_psi(isa);
        }
        if isa % stride == 0 {
            values[(isa / stride) as usize] = sa;
        }
        values[0] = n;
        log::debug!("sampled {} suffix array values at stride {}", values.len(), stride);
        Ok(Self { stride, values })
    }

    #[inline]
    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn values(&self) -> &[BwtInt] {
        &self.values
    }

    /// 第 k 行的后缀在原文中的起始位置。第 0 行返回 seq_len。
    pub fn suffix_at(&self, bwt: &Bwt, mut k: BwtInt) -> BwtInt {
        debug_assert!(k <= bwt.seq_len());
        let mut steps: u64 = 0;
        while k % self.stride != 0 {
            steps += 1;
            k = bwt.inv_psi(k);
        }
        let base = u64::from(self.values[(k / self.stride) as usize]);
        ((base + steps) % (u64::from(bwt.seq_len()) + 1)) as BwtInt
    }

    /// 写出 BWA `.sa` 格式：primary、l2[1..=4]、stride、seq_len、values[1..]
    pub fn dump<W: Write>(&self, bwt: &Bwt, w: &mut W) -> Result<()> {
        w.write_u32::<LittleEndian>(bwt.primary())?;
        for &x in &bwt.cumulative()[1..] {
            w.write_u32::<LittleEndian>(x)?;
        }
        w.write_u32::<LittleEndian>(self.stride)?;
        w.write_u32::<LittleEndian>(bwt.seq_len())?;
        for &x in &self.values[1..] {
            w.write_u32::<LittleEndian>(x)?;
        }
        Ok(())
    }

    /// 读回 `.sa`，头部必须与已加载的 BWT 一致
    pub fn restore<R: Read>(r: &mut R, bwt: &Bwt) -> Result<Self> {
        let primary = r.read_u32::<LittleEndian>()?;
        if primary != bwt.primary() {
            return Err(IndexError::Mismatch(format!("primary {} != {}", primary, bwt.primary())));
        }
        let mut l2 = [0; 5];
        for x in l2.iter_mut().skip(1) {
            *x = r.read_u32::<LittleEndian>()?;
        }
        if &l2 != bwt.cumulative() {
            return Err(IndexError::Mismatch(format!("C table {:?} != {:?}", l2, bwt.cumulative())));
        }
        let stride = r.read_u32::<LittleEndian>()?;
        if stride == 0 {
            return Err(IndexError::corrupt("suffix array", "zero sampling stride"));
        }
        let seq_len = r.read_u32::<LittleEndian>()?;
        if seq_len != bwt.seq_len() {
            return Err(IndexError::Mismatch(format!("seq_len {} != {}", seq_len, bwt.seq_len())));
        }

        let expected = Self::sample_count(seq_len, stride) - 1;
        let mut values = read_words(r, expected, "suffix array")?;
        values.insert(0, seq_len);
        if let Some(&bad) = values.iter().find(|&&v| v > seq_len) {
            return Err(IndexError::corrupt("suffix array", format!("value {} exceeds {}", bad, seq_len)));
        }
        Ok(Self { stride, values })
    }

    pub fn save_to_file(&self, bwt: &Bwt, path: impl AsRef<Path>) -> Result<()> {
        let mut w = BufWriter::new(std::fs::File::create(path)?);
        self.dump(bwt, &mut w)?;
        w.flush()?;
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>, bwt: &Bwt) -> Result<Self> {
        let mut r = BufReader::new(std::fs::File::open(path)?);
        Self::restore(&mut r, bwt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::sa::build_sa;

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
    fn suffix_at_matches_full_sa() {
        for &stride in &[1u32, 2, 5, 32] {
            for &len in &[1usize, 7, 64, 301] {
                let text = make_text(len, len as u32 ^ stride);
                let bwt = Bwt::from_symbols(&text, 16).unwrap();
                let ssa = SampledSa::build(&bwt, stride).unwrap();
                let full = build_sa(&text);
                assert_eq!(ssa.values().len(), SampledSa::sample_count(len as u32, stride));
                for (k, &want) in full.iter().enumerate() {
                    assert_eq!(ssa.suffix_at(&bwt, k as BwtInt), want, "stride={} len={} k={}", stride, len, k);
                }
            }
        }
    }

    #[test]
    fn suffix_at_is_a_permutation() {
        let text = make_text(513, 3);
        let bwt = Bwt::from_symbols(&text, 128).unwrap();
        let ssa = SampledSa::build(&bwt, 8).unwrap();
        let n = bwt.seq_len();
        assert_eq!(ssa.suffix_at(&bwt, 0), n);
        let mut seen = vec![false; n as usize];
        for k in 1..=n {
            let pos = ssa.suffix_at(&bwt, k) as usize;
            assert!(!seen[pos], "duplicate text position {}", pos);
            seen[pos] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn gattaca_samples() {
        let bwt = Bwt::from_symbols(&[2, 0, 3, 3, 0, 1, 0], 16).unwrap();
        let ssa = SampledSa::build(&bwt, 2).unwrap();
        // SA = [7, 6, 4, 1, 5, 0, 3, 2]，采样第 0/2/4/6 行
        assert_eq!(ssa.values(), &[7, 4, 5, 3]);
    }

    #[test]
    fn dump_restore_and_mismatch() {
        let text = make_text(100, 1);
        let bwt = Bwt::from_symbols(&text, 32).unwrap();
        let ssa = SampledSa::build(&bwt, 4).unwrap();
        let mut buf = Vec::new();
        ssa.dump(&bwt, &mut buf).unwrap();
        let back = SampledSa::restore(&mut &buf[..], &bwt).unwrap();
        assert_eq!(back, ssa);

        let cut = &buf[..buf.len() - 4];
        assert!(matches!(SampledSa::restore(&mut &cut[..], &bwt), Err(IndexError::Truncated { .. })));
        let mut extra = buf.clone();
        extra.extend_from_slice(&[1, 0, 0, 0]);
        assert!(matches!(SampledSa::restore(&mut &extra[..], &bwt), Err(IndexError::Corrupt { .. })));

        let other = Bwt::from_symbols(&make_text(101, 2), 32).unwrap();
        assert!(SampledSa::restore(&mut &buf[..], &other).is_err());
    }

    #[test]
    fn zero_stride_rejected() {
        let bwt = Bwt::from_symbols(&[0, 1], 16).unwrap();
        assert!(SampledSa::build(&bwt, 0).is_err());
    }
}
