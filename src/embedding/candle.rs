//! Candle-backed sentence encoder.
//!
//! Loads a BERT-family sentence-transformer from a local directory or from
//! the Hugging Face hub and runs it on-device. Nothing about the text being
//! embedded leaves the machine.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config, DTYPE};
use tokenizers::{Tokenizer, TruncationParams};

use super::local::{ModelLoader, ProgressReporter, SentenceEncoder};
use super::ModelType;

/// Configuration for the on-device embedding model.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Directory containing `config.json`, `tokenizer.json` and
    /// `model.safetensors`. Downloaded from the hub when unset.
    pub model_path: Option<PathBuf>,
    /// Which model to load.
    pub model_type: ModelType,
    /// Whether to use GPU acceleration if available.
    pub use_gpu: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            model_type: ModelType::default(),
            use_gpu: false,
        }
    }
}

/// Loads a candle [`BertModel`] as a [`SentenceEncoder`].
#[derive(Debug, Clone, Default)]
pub struct CandleModelLoader {
    config: EmbeddingConfig,
}

impl CandleModelLoader {
    pub fn new(config: EmbeddingConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ModelLoader for CandleModelLoader {
    async fn load(&self, progress: ProgressReporter) -> Result<Arc<dyn SentenceEncoder>> {
        let config = self.config.clone();
        let encoder = tokio::task::spawn_blocking(move || load_blocking(&config, &progress))
            .await
            .context("model loading task failed")??;
        Ok(Arc::new(encoder))
    }
}

struct ModelFiles {
    config: PathBuf,
    tokenizer: PathBuf,
    weights: PathBuf,
}

fn resolve_files(config: &EmbeddingConfig, progress: &ProgressReporter) -> Result<ModelFiles> {
    if let Some(dir) = &config.model_path {
        tracing::debug!(path = %dir.display(), "Using local model directory");
        return local_files(dir);
    }

    let model_id = config.model_type.hf_model_id();
    tracing::info!(model_id, "Fetching model files from Hugging Face");
    let api = hf_hub::api::sync::Api::new().context("failed to initialise hub client")?;
    let repo = api.model(model_id.to_string());

    let config_path = repo.get("config.json").context("failed to fetch config.json")?;
    progress.report(10);
    let tokenizer = repo
        .get("tokenizer.json")
        .context("failed to fetch tokenizer.json")?;
    progress.report(25);
    let weights = repo
        .get("model.safetensors")
        .context("failed to fetch model.safetensors")?;
    progress.report(60);

    Ok(ModelFiles {
        config: config_path,
        tokenizer,
        weights,
    })
}

fn local_files(dir: &Path) -> Result<ModelFiles> {
    let files = ModelFiles {
        config: dir.join("config.json"),
        tokenizer: dir.join("tokenizer.json"),
        weights: dir.join("model.safetensors"),
    };
    for path in [&files.config, &files.tokenizer, &files.weights] {
        if !path.exists() {
            return Err(anyhow!("model file not found: {}", path.display()));
        }
    }
    Ok(files)
}

fn select_device(use_gpu: bool) -> Device {
    if use_gpu {
        match Device::cuda_if_available(0) {
            Ok(device) => return device,
            Err(e) => tracing::warn!(error = %e, "GPU unavailable, falling back to CPU"),
        }
    }
    Device::Cpu
}

fn load_blocking(config: &EmbeddingConfig, progress: &ProgressReporter) -> Result<CandleEncoder> {
    let files = resolve_files(config, progress)?;
    let device = select_device(config.use_gpu);

    let bert_config: Config = serde_json::from_str(
        &std::fs::read_to_string(&files.config).context("failed to read model config")?,
    )
    .context("invalid model config")?;
    progress.report(70);

    let mut tokenizer = Tokenizer::from_file(&files.tokenizer).map_err(anyhow::Error::msg)?;
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: config.model_type.max_seq_length(),
            ..Default::default()
        }))
        .map_err(anyhow::Error::msg)?;
    tokenizer.with_padding(None);
    progress.report(80);

    // SAFETY: the weights file is not modified while mapped.
    let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[files.weights], DTYPE, &device)? };
    let model = BertModel::load(vb, &bert_config).context("failed to build model")?;
    progress.report(95);

    Ok(CandleEncoder {
        model,
        tokenizer,
        device,
        dimension: config.model_type.embedding_dim(),
    })
}

/// A loaded BERT sentence encoder.
pub struct CandleEncoder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dimension: usize,
}

impl SentenceEncoder for CandleEncoder {
    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(anyhow::Error::msg)?;

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;

        check_dimension(pooled.squeeze(0)?.to_vec1::<f32>()?, self.dimension)
    }
}

/// Rejects vectors whose length differs from the model's declared dimension.
fn check_dimension(values: Vec<f32>, expected: usize) -> Result<Vec<f32>> {
    if values.len() != expected {
        return Err(anyhow!(
            "model produced {} dimensions, expected {}",
            values.len(),
            expected
        ));
    }
    Ok(values)
}

/// Attention-masked mean pooling followed by L2 normalisation.
///
/// `hidden` is `[batch, tokens, dim]`, `attention_mask` is `[batch, tokens]`.
/// Returns `[batch, dim]`.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let mask = attention_mask
        .to_device(hidden.device())?
        .to_dtype(hidden.dtype())?
        .unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?.maximum(1e-9)?;
    let mean = summed.broadcast_div(&counts)?;

    let eps = match hidden.dtype() {
        DType::F16 | DType::BF16 => 1e-6,
        _ => 1e-12,
    };
    let norm = mean.sqr()?.sum_keepdim(1)?.sqrt()?.maximum(eps)?;
    Ok(mean.broadcast_div(&norm)?)
}
