//! 参考序列读取：FASTA 解析，并把多条记录拼成一条 0..=3 的索引文本。

use std::io::BufRead;

use crate::error::{IndexError, Result};
use crate::index::check_len;
use crate::index::fm::Contig;
use crate::util::dna;

#[derive(Debug, Clone)]
pub struct FastaRecord {
    pub id: String,
    pub seq: Vec<u8>,
}

/// 逐条读取 FASTA 记录，序列中的空白被忽略，碱基转为大写
pub struct FastaReader<R: BufRead> {
    reader: R,
    line: String,
    pending_header: Option<String>,
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, line: String::new(), pending_header: None }
    }

    fn read_line(&mut self) -> Result<bool> {
        self.line.clear();
        Ok(self.reader.read_line(&mut self.line)? > 0)
    }

    pub fn next_record(&mut self) -> Result<Option<FastaRecord>> {
        let header = match self.pending_header.take() {
            Some(h) => h,
            None => loop {
                if !self.read_line()? {
                    return Ok(None);
                }
                if let Some(h) = self.line.strip_prefix('>') {
                    break h.trim().to_string();
                }
            },
        };
        let id = header.split_whitespace().next().unwrap_or("").to_string();

        let mut seq = Vec::new();
        while self.read_line()? {
            if let Some(h) = self.line.strip_prefix('>') {
                self.pending_header = Some(h.trim().to_string());
                break;
            }
            seq.extend(self.line.bytes().filter(|b| !b.is_ascii_whitespace()).map(|b| b.to_ascii_uppercase()));
        }
        Ok(Some(FastaRecord { id, seq }))
    }
}

/// 拼接后的参考文本
#[derive(Debug, Clone, Default)]
pub struct Reference {
    /// 0..=3 编码，非 ACGT 已被替换
    pub text: Vec<u8>,
    pub contigs: Vec<Contig>,
    pub n_ambiguous: u64,
}

/// 读入全部记录并首尾相接。非 ACGT 碱基按固定种子替换为伪随机碱基。
pub fn load_reference<R: BufRead>(reader: R) -> Result<Reference> {
    let mut fasta = FastaReader::new(reader);
    let mut reference = Reference::default();
    while let Some(rec) = fasta.next_record()? {
        let offset = check_len(reference.text.len())?;
        let mut codes = dna::encode(&rec.seq);
        reference.n_ambiguous += dna::replace_ambiguous(&mut codes, offset ^ 0x9e37_79b9) as u64;
        reference.text.extend_from_slice(&codes);
        let len = check_len(reference.text.len())? - offset;
        reference.contigs.push(Contig { name: rec.id, len, offset });
    }
    if reference.contigs.is_empty() {
        return Err(IndexError::InvalidOption("FASTA input contains no sequences".to_string()));
    }
    if reference.text.is_empty() {
        return Err(IndexError::InvalidOption("FASTA input contains only empty sequences".to_string()));
    }
    Ok(reference)
}
