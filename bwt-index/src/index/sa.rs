/// 构建后缀数组（基于倍增法，O(n log² n) 排序）。
/// 输入为 0..=3 的符号序列，不含哨兵；文本末尾隐含一个比任何符号都小的 `$`。
/// 返回长度为 n+1 的完整后缀数组，sa[0] = n 即 `$` 自身这一行。
pub fn build_sa(text: &[u8]) -> Vec<u32> {
    let n = text.len();
    let mut out = Vec::with_capacity(n + 1);
    out.push(n as u32);
    if n == 0 {
        return out;
    }
    let mut sa: Vec<usize> = (0..n).collect();
    // 秩从 1 开始，0 留给越过文本末尾的 $；usize 秩对任意长度都不会溢出
    let mut rank: Vec<usize> = text.iter().map(|&b| usize::from(b) + 1).collect();
    let mut tmp: Vec<usize> = vec![0; n];

    let key = |rank: &[usize], i: usize, k: usize| (rank[i], if i + k < n { rank[i + k] } else { 0 });

    let mut k = 1usize;
    loop {
        sa.sort_unstable_by_key(|&i| key(&rank, i, k));

        tmp[sa[0]] = 1;
        for i in 1..n {
            let a = sa[i - 1];
            let b = sa[i];
            tmp[b] = tmp[a] + usize::from(key(&rank, b, k) != key(&rank, a, k));
        }

        rank.copy_from_slice(&tmp);
        if rank[sa[n - 1]] == n || k >= n {
            break;
        }
        k <<= 1;
    }

    out.extend(sa.into_iter().map(|x| x as u32));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_sa(text: &[u8]) -> Vec<u32> {
        let n = text.len();
        let mut suffixes: Vec<(usize, &[u8])> = (0..=n).map(|i| (i, &text[i..])).collect();
        // 空后缀（$）最小；前缀关系下较短者在前，正好符合 $ 最小的约定
        suffixes.sort_by(|a, b| a.1.cmp(b.1));
        suffixes.into_iter().map(|(i, _)| i as u32).collect()
    }

    fn make_text(len: usize) -> Vec<u8> {
        let mut x: u32 = 1_234_567;
        let mut v = Vec::with_capacity(len);
        for _ in 0..len {
            x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            v.push(((x >> 16) % 4) as u8);
        }
        v
    }

    #[test]
    fn sa_basic() {
        // 文本：G A T T A C A -> 2 0 3 3 0 1 0
        let text = [2u8, 0, 3, 3, 0, 1, 0];
        let sa = build_sa(&text);
        // $, A$, ACA$, ATTACA$, CA$, GATTACA$, TACA$, TTACA$
        assert_eq!(sa, vec![7, 6, 4, 1, 5, 0, 3, 2]);
    }

    #[test]
    fn sa_matches_naive_on_small_random_texts() {
        for len in 0..=40 {
            let text = make_text(len);
            let sa_fast = build_sa(&text);
            let sa_naive = naive_sa(&text);
            assert_eq!(sa_fast, sa_naive, "mismatch on len={}", len);
        }
    }

    #[test]
    fn sa_matches_naive_on_repetitive_text() {
        // 周期文本需要多轮倍增，秩一直增长到 n
        let text: Vec<u8> = (0..3000).map(|i| [0u8, 1, 0, 2, 0, 1, 0, 3][i % 8]).collect();
        assert_eq!(build_sa(&text), naive_sa(&text));
    }

    #[test]
    fn sa_handles_homopolymer() {
        let text = [0u8; 9];
        assert_eq!(build_sa(&text), naive_sa(&text));
    }
}
