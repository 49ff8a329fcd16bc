//! grouping of exactly-equal event times

/// one duplicated value and every position it occurs at
#[derive(Debug, Clone, PartialEq)]
pub struct TieGroup {
    pub time: f64,
    pub positions: Vec<usize>, // ascending input order
}

/// output of [`group_ties`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TieGroups {
    /// first position of each distinct value, ascending by value
    pub first_positions: Vec<usize>,
    /// values seen two or more times, ascending by value
    pub groups: Vec<TieGroup>,
}

impl TieGroups {
    /// number of distinct values
    pub fn n_distinct(&self) -> usize {
        self.first_positions.len()
    }

    /// members of the tie at `time`, if it is duplicated
    pub fn get(&self, time: f64) -> Option<&[usize]> {
        self.groups
            .binary_search_by(|g| g.time.total_cmp(&time))
            .ok()
            .map(|i| self.groups[i].positions.as_slice())
    }
}

/// group `values` by exact equality, reporting `positions[k]` for the k-th value.
///
/// Values must be finite. Already-sorted input (the common case) is handled
/// in one linear scan; anything else is stable-sorted first, so the first
/// position of a value is always its first occurrence in input order.
pub fn group_ties(values: &[f64], positions: &[usize]) -> TieGroups {
    debug_assert_eq!(values.len(), positions.len());

    let sorted = values.windows(2).all(|w| w[0] <= w[1]);
    let order: Vec<usize> = if sorted {
        (0..values.len()).collect()
    } else {
        let mut order: Vec<usize> = (0..values.len()).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        order
    };

    let mut out = TieGroups::default();
    let mut start = 0;
    while start < order.len() {
        let time = values[order[start]];
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == time {
            end += 1;
        }

        out.first_positions.push(positions[order[start]]);
        if end - start > 1 {
            out.groups.push(TieGroup {
                time,
                positions: order[start..end].iter().map(|&k| positions[k]).collect(),
            });
        }
        start = end;
    }

    out
}
