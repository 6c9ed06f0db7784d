//! Benjamini-Hochberg false discovery rate correction.

/// Corrected p-values and rejection flags, aligned with the input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FdrCorrection {
    pub corrected: Vec<f64>,
    pub reject: Vec<bool>,
}

impl FdrCorrection {
    pub fn len(&self) -> usize {
        self.corrected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corrected.is_empty()
    }
}

/// Applies the Benjamini-Hochberg step-up procedure (`fdr_bh`).
///
/// With p-values sorted ascending, the raw adjustment of rank `i` (1-based) is
/// `p_(i) * m / i`; the corrected values are the running minimum of the raw
/// adjustments taken from the largest rank down, clipped to 1. A hypothesis is
/// rejected when its rank does not exceed the largest `i` with
/// `p_(i) <= i / m * alpha`.
pub fn benjamini_hochberg(p_values: &[f64], alpha: f64) -> FdrCorrection {
    let m = p_values.len();
    if m == 0 {
        return FdrCorrection::default();
    }

    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));

    let total = m as f64;
    let mut last_rejected = None;
    for (rank0, &idx) in order.iter().enumerate() {
        let threshold = (rank0 + 1) as f64 / total * alpha;
        if p_values[idx] <= threshold {
            last_rejected = Some(rank0);
        }
    }

    let mut corrected = vec![0.0; m];
    let mut reject = vec![false; m];
    let mut running_min = f64::INFINITY;
    for rank0 in (0..m).rev() {
        let idx = order[rank0];
        let raw = p_values[idx] * total / (rank0 + 1) as f64;
        running_min = running_min.min(raw);
        corrected[idx] = running_min.min(1.0);
        reject[idx] = last_rejected.is_some_and(|last| rank0 <= last);
    }

    FdrCorrection { corrected, reject }
}
