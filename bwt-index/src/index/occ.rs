//! Occ 计数用到的位运算工具。
//!
//! 打包格式：每个 u32 存 16 个 2-bit 符号，第一个符号位于最高两位；
//! 两个相邻字拼成 u64 时前一个字在高 32 位，因此 64 位里同样是“靠前的符号在高位”。

const LOW_BITS: u64 = 0x5555_5555_5555_5555;

/// 统计 64 位（32 个符号）里等于 `c` 的符号个数。
///
/// 先按 c 的两个比特分别取原值或取反，再把高低位相与，
/// 每个 2-bit 槽位只剩最低位表示“是否匹配”，最后做 popcount。
#[inline]
pub(crate) fn occ_aux(y: u64, c: u8) -> u32 {
    let hi = if c & 2 != 0 { y } else { !y };
    let lo = if c & 1 != 0 { y } else { !y };
    ((hi >> 1) & lo & LOW_BITS).count_ones()
}

/// 只保留 64 位中前 `rel % 32 + 1` 个符号，其余清零。
#[inline]
pub(crate) fn mask_pair(y: u64, rel: u32) -> u64 {
    y & !((1u64 << ((!rel & 31) << 1)) - 1)
}

/// 只保留 32 位中前 `rel % 16 + 1` 个符号，其余清零。
#[inline]
pub(crate) fn mask_word(w: u32, rel: u32) -> u32 {
    w & !((1u32 << ((!rel & 15) << 1)) - 1)
}

/// 被 `mask_pair` 清零的槽位数；这些 00 槽位会被误算成符号 0
#[inline]
pub(crate) fn masked_pair_slots(rel: u32) -> u32 {
    !rel & 31
}

#[inline]
pub(crate) fn masked_word_slots(rel: u32) -> u32 {
    !rel & 15
}

/// 字节 → 四种符号计数的查找表。
///
/// 表项的 4 个字节依次是该字节中 0/1/2/3 的个数（各 0..=4）。
/// 一次把一个 u32 的 4 个字节查表相加，就能同时得到 16 个符号的 4 路计数。
/// 表是纯派生数据，每次构建或加载索引时重新生成，不写盘。
#[derive(Clone)]
pub struct CountTable([u32; 256]);

impl CountTable {
    pub fn new() -> Self {
        let mut table = [0u32; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            let mut x = 0u32;
            for j in 0..4usize {
                let n = (0..4).filter(|&s| (i >> (s << 1)) & 3 == j).count() as u32;
                x |= n << (j << 3);
            }
            *slot = x;
        }
        Self(table)
    }

    #[inline]
    pub fn get(&self, byte: u8) -> u32 {
        self.0[byte as usize]
    }

    /// 一个 u32（16 个符号）的 4 路计数，按字节打包
    #[inline]
    pub fn aux4(&self, w: u32) -> u32 {
        self.0[(w & 0xff) as usize]
            + self.0[(w >> 8 & 0xff) as usize]
            + self.0[(w >> 16 & 0xff) as usize]
            + self.0[(w >> 24) as usize]
    }
}

impl Default for CountTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CountTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CountTable([..256])")
    }
}

/// 把字节打包的 4 路计数加到 cnt 上
#[inline]
pub(crate) fn unpack_lanes(cnt: &mut [u32; 4], x: u32) {
    cnt[0] += x & 0xff;
    cnt[1] += x >> 8 & 0xff;
    cnt[2] += x >> 16 & 0xff;
    cnt[3] += x >> 24;
}

/// 取 x 中符号 c 对应的字节
#[inline]
pub(crate) fn lane(x: u32, c: u8) -> u32 {
    x >> (u32::from(c) << 3) & 0xff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::dna;

    fn naive(codes: &[u8], c: u8) -> u32 {
        codes.iter().filter(|&&x| x == c).count() as u32
    }

    fn pair_of(codes: &[u8]) -> u64 {
        let w = dna::pack_symbols(codes);
        (u64::from(w[0]) << 32) | u64::from(*w.get(1).unwrap_or(&0))
    }

    #[test]
    fn occ_aux_counts_each_symbol() {
        let codes: Vec<u8> = (0..32).map(|i| ((i * 7 + i / 3) % 4) as u8).collect();
        let y = pair_of(&codes);
        for c in 0..4u8 {
            assert_eq!(occ_aux(y, c), naive(&codes, c), "symbol {}", c);
        }
    }

    #[test]
    fn masked_pair_needs_symbol_zero_correction() {
        let codes: Vec<u8> = (0..32).map(|i| (3 - i % 4) as u8).collect();
        let y = pair_of(&codes);
        for rel in 0..32u32 {
            let m = mask_pair(y, rel);
            let upto = &codes[..=rel as usize];
            for c in 1..4u8 {
                assert_eq!(occ_aux(m, c), naive(upto, c));
            }
            assert_eq!(occ_aux(m, 0) - masked_pair_slots(rel), naive(upto, 0));
        }
    }

    #[test]
    fn count_table_matches_naive() {
        let table = CountTable::new();
        // 0b11_10_01_00：每种符号各一个
        assert_eq!(table.get(0b1110_0100), 0x0101_0101);
        assert_eq!(table.get(0), 4);
        assert_eq!(table.get(0xff), 4 << 24);

        let codes: Vec<u8> = (0..16).map(|i| ((i * 5 + 1) % 4) as u8).collect();
        let w = dna::pack_symbols(&codes)[0];
        let x = table.aux4(w);
        for c in 0..4u8 {
            assert_eq!(lane(x, c), naive(&codes, c));
        }
        for rel in 0..16u32 {
            let x = table.aux4(mask_word(w, rel)) - masked_word_slots(rel);
            let mut cnt = [0u32; 4];
            unpack_lanes(&mut cnt, x);
            for c in 0..4u8 {
                assert_eq!(cnt[c as usize], naive(&codes[..=rel as usize], c));
            }
        }
    }
}
