use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// A title the user has rated, with how many catalog entries carry that rating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Movie title.
    pub title: String,
    /// Number of records with this title the user has rated.
    pub count: usize,
}

/// Orders per-title counts by descending count, then ascending title.
pub fn rank(counts: HashMap<&str, usize>) -> Vec<Recommendation> {
    let mut ranked: Vec<Recommendation> = counts
        .into_iter()
        .map(|(title, count)| Recommendation {
            title: title.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.title.cmp(&b.title)));
    ranked
}
