use ndarray::Array1;

use crate::models::product::{Product, SimilarProduct};

/// Feature vector produced by an [`ImageEmbedder`](crate::core::ImageEmbedder)
pub type Embedding = Array1<f32>;

/// Compute cosine similarity between two embeddings.
///
/// Returns 0.0 when either vector has zero norm or the lengths differ.
pub fn cosine_similarity(a: &Embedding, b: &Embedding) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product = a.dot(b);
    let norm_a = a.dot(a).sqrt();
    let norm_b = b.dot(b).sqrt();

    if norm_a > 0.0 && norm_b > 0.0 {
        (dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Score every candidate against `query` and keep the `top_k` best, highest first.
///
/// An empty candidate set yields the single "no vectors" entry instead of an
/// empty list. Fewer than `top_k` candidates are returned as-is, not padded.
pub fn rank_top_k(
    query: &Embedding,
    candidates: Vec<(Product, Embedding)>,
    top_k: usize,
) -> Vec<SimilarProduct> {
    if candidates.is_empty() {
        return vec![SimilarProduct::no_vectors()];
    }

    let mut scored: Vec<(Product, f32)> = candidates
        .into_iter()
        .map(|(product, vector)| {
            let similarity = cosine_similarity(query, &vector);
            (product, similarity)
        })
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(top_k);

    scored
        .into_iter()
        .map(|(product, similarity)| SimilarProduct::Match {
            product,
            similarity,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product(id: u32) -> Product {
        Product::from_record(json!({ "id": id, "imageUrl": format!("/img/{}.jpg", id) })).unwrap()
    }

    fn id_of(entry: &SimilarProduct) -> u64 {
        match entry {
            SimilarProduct::Match { product, .. } => product.fields["id"].as_u64().unwrap(),
            SimilarProduct::NoData { error } => panic!("unexpected no-data entry: {}", error),
        }
    }

    #[test]
    fn test_cosine_similarity() {
        // Test with identical vectors
        let a = Array1::from(vec![1.0, 0.0, 0.0]);
        let b = Array1::from(vec![1.0, 0.0, 0.0]);
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);

        // Test with orthogonal vectors
        let a = Array1::from(vec![1.0, 0.0]);
        let b = Array1::from(vec![0.0, 1.0]);
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);

        // Test with opposite vectors
        let a = Array1::from(vec![1.0, 0.0]);
        let b = Array1::from(vec![-1.0, 0.0]);
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_degenerate() {
        let zero = Array1::from(vec![0.0, 0.0]);
        let a = Array1::from(vec![1.0, 2.0]);
        assert_eq!(cosine_similarity(&zero, &a), 0.0);

        let short = Array1::from(vec![1.0]);
        assert_eq!(cosine_similarity(&short, &a), 0.0);
    }

    #[test]
    fn test_identical_candidate_ranks_first() {
        let query = Array1::from(vec![0.2, 0.9, 0.1]);
        let candidates = vec![
            (product(1), Array1::from(vec![1.0, 0.0, 0.0])),
            (product(2), query.clone()),
            (product(3), Array1::from(vec![0.3, 0.8, 0.3])),
        ];

        let ranked = rank_top_k(&query, candidates, 3);
        assert_eq!(ranked.len(), 3);
        assert_eq!(id_of(&ranked[0]), 2);
        assert!((ranked[0].similarity().unwrap() - 1.0).abs() < 1e-6);
        assert_eq!(id_of(&ranked[1]), 3);
        assert_eq!(id_of(&ranked[2]), 1);
    }

    #[test]
    fn test_keeps_only_top_k() {
        let query = Array1::from(vec![1.0, 0.0]);
        let candidates = (0..6)
            .map(|i| (product(i), Array1::from(vec![1.0, i as f32])))
            .collect();

        let ranked = rank_top_k(&query, candidates, 3);
        let ids: Vec<u64> = ranked.iter().map(id_of).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_fewer_candidates_than_k_not_padded() {
        let query = Array1::from(vec![1.0, 1.0]);
        let candidates = vec![
            (product(1), Array1::from(vec![1.0, 0.0])),
            (product(2), Array1::from(vec![0.0, 1.0])),
        ];
        assert_eq!(rank_top_k(&query, candidates, 5).len(), 2);
    }

    #[test]
    fn test_empty_candidates_yield_no_data() {
        let query = Array1::from(vec![1.0, 1.0]);
        let ranked = rank_top_k(&query, Vec::new(), 3);
        assert_eq!(ranked, vec![SimilarProduct::no_vectors()]);
    }
}
