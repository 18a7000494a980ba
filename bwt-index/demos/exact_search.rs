//! 演示如何在 library 模式下使用 bwt-index 做精确匹配。
//!
//! 运行方式：
//! ```bash
//! cargo run --example exact_search
//! ```

use std::io::Cursor;

use bwt_index::index::{BwtLite, FmIndex, IndexOpt, RankIndex};
use bwt_index::io::fasta;
use bwt_index::util::dna;

fn main() -> bwt_index::Result<()> {
    // 1. 读入两条 contig，拼成一条索引文本
    let data = b">ref1\nACGTACGTAGCTGATCGTAGCTAGCTAGCT\n>ref2\nGATCGTAGCTAGCTGATNNACGTTAGC\n";
    let refs = fasta::load_reference(Cursor::new(&data[..]))?;
    println!("参考长度: {} bp, contig 数: {}, 替换 N: {}", refs.text.len(), refs.contigs.len(), refs.n_ambiguous);

    // 2. 构建主索引（checkpoint 间隔 32，SA 每 4 行采样一次）
    let mut fm = FmIndex::build(&refs.text, IndexOpt { occ_interval: 32, sa_stride: 4 })?;
    fm.set_meta(bwt_index::index::IndexMeta { contigs: refs.contigs.clone(), ..Default::default() });
    let bwt = fm.bwt();
    println!("primary={}, C={:?}", bwt.primary(), bwt.cumulative());

    // 3. 精确匹配并定位
    let pattern = dna::encode(b"GCTAGCT");
    match fm.backward_search(&pattern)? {
        Some(iv) => {
            println!("\n'GCTAGCT' 的 SA 区间 [{}, {})，共 {} 处", iv.start, iv.end, iv.len());
            for pos in fm.sa_interval_positions(iv) {
                if let Some((ci, off)) = fm.map_text_pos(pos) {
                    println!("  contig={}, offset={}", refs.contigs[ci].name, off);
                }
            }
        }
        None => println!("\n'GCTAGCT' 无匹配"),
    }

    // 4. 从已有区间继续向左收窄：先匹配后缀 "AGCT"，再补上前缀 "GCT"
    let suffix = dna::encode(b"AGCT");
    if let Some(iv) = fm.backward_search(&suffix)? {
        let narrowed = fm.extend_interval(iv, &dna::encode(b"GCT"))?;
        println!("\n'AGCT' -> {:?}，补上 'GCT' 后 -> {:?}", iv, narrowed);
    }

    // 5. 单行秩查询
    let k = bwt.seq_len() / 2;
    println!("\nocc4({}) = {:?}", k, bwt.occurrence4(k));

    // 6. 短序列用轻量索引
    let lite = BwtLite::from_symbols(&refs.text[..20])?;
    let n = lite.count(&dna::encode(b"ACGT"))?;
    println!("\n轻量索引（前 20 bp）中 'ACGT' 出现 {} 次，占用 {} 字节", n, lite.size_in_bytes());

    Ok(())
}
