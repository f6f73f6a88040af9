use std::collections::HashMap;

/// Counts string occurrences and ranks them for top-k selection.
///
/// Ties are broken alphabetically so the ranking never depends on hash order
/// or on the order rows happened to arrive in.
#[derive(Debug, Default, Clone)]
pub struct FrequencyTable {
    counts: HashMap<String, usize>,
    total: usize,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        for value in values {
            table.ingest(value.as_ref());
        }
        table
    }

    pub fn ingest(&mut self, value: &str) {
        self.total += 1;
        match self.counts.get_mut(value) {
            Some(count) => *count += 1,
            None => {
                self.counts.insert(value.to_string(), 1);
            }
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// All entries, most frequent first.
    pub fn ranked(&self) -> Vec<(String, usize)> {
        let mut items = self
            .counts
            .iter()
            .map(|(value, count)| (value.clone(), *count))
            .collect::<Vec<_>>();
        items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        items
    }

    /// The `k` most frequent values; `k == 0` keeps everything.
    pub fn top(&self, k: usize) -> Vec<String> {
        let mut ranked = self.ranked();
        if k > 0 && ranked.len() > k {
            ranked.truncate(k);
        }
        ranked.into_iter().map(|(value, _)| value).collect()
    }

    /// Like [`top`](Self::top) but ignoring one value (usually an overflow label).
    pub fn top_excluding(&self, k: usize, skip: &str) -> Vec<String> {
        let mut ranked = self
            .ranked()
            .into_iter()
            .filter(|(value, _)| value != skip)
            .collect::<Vec<_>>();
        if k > 0 && ranked.len() > k {
            ranked.truncate(k);
        }
        ranked.into_iter().map(|(value, _)| value).collect()
    }
}
