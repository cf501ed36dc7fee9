//! Embedding vectors and similarity.

/// A vector embedding representing text semantics.
///
/// The dimensionality depends on the provider that produced it (384 for
/// MiniLM). An empty embedding means the provider had no signal for the
/// text; it is never treated as a zero-similarity vector.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Embedding {
    values: Vec<f32>,
}

impl Embedding {
    /// Creates a new embedding from a vector of values.
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// The "no signal" embedding returned when a provider fails.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the raw vector.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Whether this embedding carries no signal.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Computes cosine similarity with another embedding.
    ///
    /// Returns a value between -1.0 and 1.0, where 1.0 means identical.
    /// Mismatched dimensions or a zero-norm vector yield exactly 0.0.
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        if self.values.len() != other.values.len() {
            return 0.0;
        }

        let dot: f32 = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a * b)
            .sum();

        let norm_a: f32 = self.values.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = other.values.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot / (norm_a * norm_b)
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}
