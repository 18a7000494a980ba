use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::occ::CountTable;
use super::packed::{read_words, PackedBwt};
use super::{check_len, check_occ_interval, check_symbols, sa, BwtInt};
use crate::error::{IndexError, Result};
use crate::util::dna;

/// 去掉 `$` 之后的普通打包 BWT，即外部 BWT 构建程序交给本库的输入。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBwt {
    /// `$` 所在的行
    pub primary: BwtInt,
    pub seq_len: BwtInt,
    /// 每字 16 个符号，第一个符号在最高两位
    pub packed: Vec<u32>,
}

/// 根据后缀数组构建 BWT，并把 `$` 从中剔除。
/// text 为 0..=3 的符号序列（不含哨兵），sa 为 `sa::build_sa` 的结果（长度 n+1）。
pub fn build_bwt(text: &[u8], sa: &[u32]) -> (Vec<u8>, BwtInt) {
    let n = text.len();
    let mut bwt = Vec::with_capacity(n);
    let mut primary = 0;
    for (row, &p) in sa.iter().enumerate() {
        if p == 0 {
            primary = row as BwtInt;
        } else {
            bwt.push(text[p as usize - 1]);
        }
    }
    (bwt, primary)
}

/// 进程内的 BWT 生成：后缀排序 → 取前驱符号 → 去 `$` → 打包
pub fn transform(text: &[u8]) -> Result<RawBwt> {
    let seq_len = check_len(text.len())?;
    check_symbols(text)?;
    let sa = sa::build_sa(text);
    let (bwt, primary) = build_bwt(text, &sa);
    Ok(RawBwt { primary, seq_len, packed: dna::pack_symbols(&bwt) })
}

/// 主索引的 BWT 部分：交错存储 + C 表 + 字节计数表。
///
/// 构建后只读，可以在线程间随意共享。
#[derive(Debug, Clone)]
pub struct Bwt {
    pub(crate) primary: BwtInt,
    /// l2[c] = 文本中小于 c 的符号个数，l2[4] = seq_len
    pub(crate) l2: [BwtInt; 5],
    pub(crate) seq_len: BwtInt,
    pub(crate) store: PackedBwt,
    pub(crate) cnt_table: CountTable,
}

impl Bwt {
    /// 由外部 BWT 生成的结果建立交错布局（对应 BWA 的 bwt_bwtupdate_core）
    pub fn from_raw(raw: &RawBwt, occ_interval: u32) -> Result<Self> {
        if raw.seq_len > 0 && (raw.primary == 0 || raw.primary > raw.seq_len) {
            return Err(IndexError::corrupt(
                "BWT",
                format!("primary {} outside 1..={}", raw.primary, raw.seq_len),
            ));
        }
        let (store, totals) = PackedBwt::interleave(&raw.packed, raw.seq_len, occ_interval)?;
        let mut l2 = [0; 5];
        for c in 0..4 {
            l2[c + 1] = l2[c] + totals[c];
        }
        log::debug!(
            "interleaved BWT: {} symbols, {} intervals of {}, {} bytes",
            raw.seq_len,
            store.n_intervals(),
            occ_interval,
            store.size_in_bytes()
        );
        Ok(Self::from_parts(raw.primary, l2, store))
    }

    /// 直接从符号序列构建
    pub fn from_symbols(text: &[u8], occ_interval: u32) -> Result<Self> {
        Self::from_raw(&transform(text)?, occ_interval)
    }

    /// 计数表属于构建流程的一部分：任何途径得到的 Bwt 都在这里重新生成
    fn from_parts(primary: BwtInt, l2: [BwtInt; 5], store: PackedBwt) -> Self {
        Self { primary, l2, seq_len: store.seq_len(), store, cnt_table: CountTable::new() }
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
    pub fn occ_interval(&self) -> u32 {
        self.store.occ_interval()
    }

    pub fn store(&self) -> &PackedBwt {
        &self.store
    }

    /// `$` 不在存储串里：primary 及之后的行整体前移一位。
    /// 所有按行号访问存储串的地方都经过这里。
    #[inline]
    pub(crate) fn strip_sentinel(&self, row: BwtInt) -> BwtInt {
        if row >= self.primary {
            row - 1
        } else {
            row
        }
    }

    /// 第 row 行的 BWT 符号；row 不能是 primary（那一行是 `$`）
    #[inline]
    pub fn symbol_at(&self, row: BwtInt) -> u8 {
        debug_assert!(row != self.primary, "row {} holds the sentinel", row);
        debug_assert!(row <= self.seq_len);
        self.store.symbol(self.strip_sentinel(row))
    }

    /// 写出 BWA `.bwt` 格式：primary、l2[1..=4]、交错缓冲区，全部为小端 u32
    pub fn dump<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u32::<LittleEndian>(self.primary)?;
        for &x in &self.l2[1..] {
            w.write_u32::<LittleEndian>(x)?;
        }
        for &x in self.store.as_words() {
            w.write_u32::<LittleEndian>(x)?;
        }
        Ok(())
    }

    /// 读回 `.bwt`。序列长度取自 l2[4]，由它和 occ_interval 算出字数，文件必须恰好这么长。
    pub fn restore<R: Read>(r: &mut R, occ_interval: u32) -> Result<Self> {
        let primary = r.read_u32::<LittleEndian>()?;
        let mut l2 = [0; 5];
        for x in l2.iter_mut().skip(1) {
            *x = r.read_u32::<LittleEndian>()?;
        }
        let seq_len = l2[4];
        if l2.windows(2).any(|p| p[0] > p[1]) {
            return Err(IndexError::corrupt("BWT", format!("cumulative counts {:?} decrease", l2)));
        }
        if primary > seq_len || (seq_len > 0 && primary == 0) {
            return Err(IndexError::corrupt("BWT", format!("primary {} outside 1..={}", primary, seq_len)));
        }

        check_occ_interval(occ_interval)?;
        let words = read_words(r, PackedBwt::expected_words(seq_len, occ_interval), "BWT")?;

        let store = PackedBwt::from_words(words, seq_len, occ_interval)?;
        let totals = store.checkpoint_for(store.n_intervals());
        for c in 0..4 {
            if l2[c + 1] - l2[c] != totals[c] {
                return Err(IndexError::corrupt(
                    "BWT",
                    format!("symbol {} occurs {} times but C table says {}", c, totals[c], l2[c + 1] - l2[c]),
                ));
            }
        }
        Ok(Self::from_parts(primary, l2, store))
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut w = BufWriter::new(std::fs::File::create(path)?);
        self.dump(&mut w)?;
        w.flush()?;
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>, occ_interval: u32) -> Result<Self> {
        let mut r = BufReader::new(std::fs::File::open(path)?);
        Self::restore(&mut r, occ_interval)
    }
}
