use crate::models::ListingCandidate;

/// Price-ceiling rule for one watched product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchFilter {
    max_price: f64,
}

impl MatchFilter {
    pub fn new(max_price: f64) -> Self {
        Self { max_price }
    }

    pub fn keep(&self, candidate: &ListingCandidate) -> bool {
        candidate.price <= self.max_price
    }

    pub fn apply(&self, candidates: Vec<ListingCandidate>) -> Vec<ListingCandidate> {
        candidates
            .into_iter()
            .filter(|candidate| self.keep(candidate))
            .collect()
    }
}
