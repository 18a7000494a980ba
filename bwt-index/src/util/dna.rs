/// 索引字母表为 {0:A, 1:C, 2:G, 3:T}；非 ACGT 碱基的编码，只会出现在查询中，索引里不存在
pub const AMBIG: u8 = 4;

/// 每个 u32 字装 16 个 2-bit 符号
pub const SYMBOLS_PER_WORD: usize = 16;

#[inline]
pub fn to_code(b: u8) -> u8 {
    match b.to_ascii_uppercase() {
        b'A' => 0,
        b'C' => 1,
        b'G' => 2,
        b'T' | b'U' => 3,
        _ => AMBIG,
    }
}

#[inline]
pub fn from_code(a: u8) -> u8 {
    match a {
        0 => b'A',
        1 => b'C',
        2 => b'G',
        3 => b'T',
        _ => b'N',
    }
}

/// 把碱基序列编码成 0..=4 的符号
pub fn encode(seq: &[u8]) -> Vec<u8> {
    seq.iter().map(|&b| to_code(b)).collect()
}

pub fn decode(codes: &[u8]) -> Vec<u8> {
    codes.iter().map(|&a| from_code(a)).collect()
}

/// 将模糊碱基（编码 4）替换为伪随机的 ACGT，返回替换个数。
/// 与 BWA 一样，N 不进入索引；固定种子保证同一参考每次构建出相同的索引。
pub fn replace_ambiguous(codes: &mut [u8], seed: u32) -> usize {
    let mut x = seed;
    let mut n = 0usize;
    for c in codes.iter_mut() {
        if *c > 3 {
            x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            *c = ((x >> 16) & 3) as u8;
            n += 1;
        }
    }
    n
}

/// 按 2 bit/符号打包，每个字的第一个符号放在最高两位。
/// 调用方保证输入都在 0..=3。
pub fn pack_symbols(codes: &[u8]) -> Vec<u32> {
    let mut words = vec![0u32; (codes.len() + SYMBOLS_PER_WORD - 1) / SYMBOLS_PER_WORD];
    for (i, &c) in codes.iter().enumerate() {
        words[i >> 4] |= u32::from(c & 3) << ((!i & 15) << 1);
    }
    words
}

/// 取出打包数组中第 i 个符号
#[inline]
pub fn packed_symbol(words: &[u32], i: usize) -> u8 {
    (words[i >> 4] >> ((!i & 15) << 1) & 3) as u8
}

#[inline]
pub fn complement(base: u8) -> u8 {
    match base.to_ascii_uppercase() {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' | b'U' => b'A',
        _ => b'N',
    }
}

pub fn revcomp(seq: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(seq.len());
    for &b in seq.iter().rev() {
        out.push(complement(b));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_maps_acgt_and_ambiguous() {
        assert_eq!(encode(b"ACGTUN-a"), vec![0, 1, 2, 3, 3, 4, 4, 0]);
        assert_eq!(decode(&[0, 1, 2, 3, 4]), b"ACGTN");
    }

    #[test]
    fn pack_puts_first_symbol_in_high_bits() {
        let codes = [3u8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 2];
        let words = pack_symbols(&codes);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0], 0xC000_0001);
        assert_eq!(words[1], 0x8000_0000);
        for (i, &c) in codes.iter().enumerate() {
            assert_eq!(packed_symbol(&words, i), c);
        }
    }

    #[test]
    fn replace_ambiguous_is_deterministic() {
        let mut a = vec![0u8, 4, 4, 2, 4];
        let mut b = a.clone();
        assert_eq!(replace_ambiguous(&mut a, 11), 3);
        replace_ambiguous(&mut b, 11);
        assert_eq!(a, b);
        assert!(a.iter().all(|&c| c < 4));
        assert_eq!(a[0], 0);
        assert_eq!(a[3], 2);
    }

    #[test]
    fn revcomp_basic() {
        assert_eq!(revcomp(b"ACGTN"), b"NACGT");
    }
}
