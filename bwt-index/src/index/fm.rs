use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::bwt::{transform, Bwt, RawBwt};
use super::sampled::SampledSa;
use super::search::{RankIndex, SaInterval};
use super::{BwtInt, IndexOpt};
use crate::error::{IndexError, Result};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Contig {
    pub name: String,
    pub len: u32,
    pub offset: u32,
}

/// 构建来源信息，写入 `<prefix>.meta`
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct IndexMeta {
    pub reference_file: Option<String>,
    pub build_args: Option<String>,
    pub build_timestamp: Option<String>,
    /// 构建时被替换掉的非 ACGT 碱基个数
    pub n_ambiguous: u64,
    /// contig 元信息（名称、长度、起始偏移）；文本是各 contig 首尾相接
    pub contigs: Vec<Contig>,
}

/// `.meta` 文件内容。occ 间隔不在 `.bwt` 里，必须随索引一起保存
#[derive(Debug, Serialize, Deserialize)]
struct MetaFile {
    opt: IndexOpt,
    meta: IndexMeta,
}

/// 主索引：交错 BWT + 采样 SA。构建后只读。
#[derive(Debug, Clone)]
pub struct FmIndex {
    bwt: Bwt,
    sa: SampledSa,
    opt: IndexOpt,
    meta: IndexMeta,
}

pub fn bwt_path(prefix: &str) -> PathBuf {
    PathBuf::from(format!("{}.bwt", prefix))
}

pub fn sa_path(prefix: &str) -> PathBuf {
    PathBuf::from(format!("{}.sa", prefix))
}

pub fn meta_path(prefix: &str) -> PathBuf {
    PathBuf::from(format!("{}.meta", prefix))
}

impl FmIndex {
    /// 由 0..=3 的符号序列构建
    pub fn build(text: &[u8], opt: IndexOpt) -> Result<Self> {
        opt.validate()?;
        let raw = transform(text)?;
        Self::from_raw(&raw, opt)
    }

    /// 由外部生成的打包 BWT 构建：先交错 checkpoint，再沿 inverse Psi 采样 SA
    pub fn from_raw(raw: &RawBwt, opt: IndexOpt) -> Result<Self> {
        opt.validate()?;
        let bwt = Bwt::from_raw(raw, opt.occ_interval)?;
        let sa = SampledSa::build(&bwt, opt.sa_stride)?;
        log::info!(
            "built FM index: {} bp, primary {}, occ interval {}, SA stride {}",
            bwt.seq_len(),
            bwt.primary(),
            opt.occ_interval,
            opt.sa_stride
        );
        Ok(Self { bwt, sa, opt, meta: IndexMeta::default() })
    }

    pub fn set_meta(&mut self, meta: IndexMeta) {
        self.meta = meta;
    }

    pub fn meta(&self) -> &IndexMeta {
        &self.meta
    }

    pub fn opt(&self) -> IndexOpt {
        self.opt
    }

    pub fn bwt(&self) -> &Bwt {
        &self.bwt
    }

    pub fn sampled_sa(&self) -> &SampledSa {
        &self.sa
    }

    /// 第 k 行后缀在文本中的起始位置（第 0 行为 seq_len）
    #[inline]
    pub fn suffix_at(&self, k: BwtInt) -> BwtInt {
        self.sa.suffix_at(&self.bwt, k)
    }

    /// 取出 SA 区间对应的文本位置（升序）。`$` 行不对应任何文本位置，被跳过。
    pub fn sa_interval_positions(&self, interval: SaInterval) -> Vec<u32> {
        let n = self.bwt.seq_len();
        let mut pos: Vec<u32> = interval.rows().map(|k| self.suffix_at(k)).filter(|&p| p < n).collect();
        pos.sort_unstable();
        pos
    }

    /// 精确匹配并定位
    pub fn locate(&self, query: &[u8]) -> Result<Vec<u32>> {
        Ok(self.backward_search(query)?.map(|iv| self.sa_interval_positions(iv)).unwrap_or_default())
    }

    /// 将文本位置映射到 (contig_index, contig_offset)。没有 contig 信息时返回 None。
    pub fn map_text_pos(&self, pos: u32) -> Option<(usize, u32)> {
        let contigs = &self.meta.contigs;
        let mut lo = 0usize;
        let mut hi = contigs.len();
        while lo < hi {
            let mid = (lo + hi) / 2;
            let c = &contigs[mid];
            if pos < c.offset {
                hi = mid;
            } else if pos >= c.offset + c.len {
                lo = mid + 1;
            } else {
                return Some((mid, pos - c.offset));
            }
        }
        None
    }

    /// 写出 `<prefix>.bwt`、`<prefix>.sa`、`<prefix>.meta`
    pub fn save(&self, prefix: &str) -> Result<()> {
        self.bwt.save_to_file(bwt_path(prefix))?;
        self.sa.save_to_file(&self.bwt, sa_path(prefix))?;
        let mut w = BufWriter::new(std::fs::File::create(meta_path(prefix))?);
        bincode::serialize_into(&mut w, &MetaFile { opt: self.opt, meta: self.meta.clone() })?;
        w.flush()?;
        log::debug!("saved index files under prefix {}", prefix);
        Ok(())
    }

    /// 加载三个文件。计数表在 `Bwt::restore` 中重新生成。
    pub fn load(prefix: &str) -> Result<Self> {
        let f = BufReader::new(std::fs::File::open(meta_path(prefix))?);
        let MetaFile { opt, meta } = bincode::deserialize_from(f)?;
        opt.validate()?;
        let bwt = Bwt::load_from_file(bwt_path(prefix), opt.occ_interval)?;
        let sa = SampledSa::load_from_file(sa_path(prefix), &bwt)?;
        if sa.stride() != opt.sa_stride {
            log::warn!("{}: SA stride {} differs from recorded {}", prefix, sa.stride(), opt.sa_stride);
        }
        if let Some(last) = meta.contigs.last() {
            if u64::from(last.offset) + u64::from(last.len) != u64::from(bwt.seq_len()) {
                return Err(IndexError::Mismatch(format!(
                    "contigs cover {} bp but BWT has {}",
                    u64::from(last.offset) + u64::from(last.len),
                    bwt.seq_len()
                )));
            }
        }
        log::info!("loaded FM index {}: {} bp, {} contigs", prefix, bwt.seq_len(), meta.contigs.len());
        let opt = IndexOpt { sa_stride: sa.stride(), ..opt };
        Ok(Self { bwt, sa, opt, meta })
    }

    pub fn exists(prefix: &str) -> bool {
        [bwt_path(prefix), sa_path(prefix), meta_path(prefix)].iter().all(|p| p.exists())
    }
}

impl RankIndex for FmIndex {
    fn seq_len(&self) -> BwtInt {
        self.bwt.seq_len()
    }

    fn cumulative(&self) -> &[BwtInt; 5] {
        self.bwt.cumulative()
    }

    #[inline]
    fn dual_occ(&self, k: BwtInt, l: BwtInt, c: u8) -> (BwtInt, BwtInt) {
        self.bwt.dual_occurrence(k, l, c)
    }

    #[inline]
    fn dual_occ4(&self, k: BwtInt, l: BwtInt) -> ([BwtInt; 4], [BwtInt; 4]) {
        self.bwt.dual_occurrence4(k, l)
    }
}
