//! ONNX-based sentence encoder (SPECTER2, MiniLM, ...).
//!
//! Loads an exported SentenceTransformers ONNX model and its tokenizer from a
//! model directory and produces float32 embeddings, mean-pooled when the model
//! emits token embeddings. Requires the `onnx` feature.

#[cfg(feature = "onnx")]
mod inner {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use ndarray::Array1;
    use ort::session::Session;
    use ort::value::Tensor;
    use papersage_core::{ComputeResources, Error, MemoCache, Result};
    use parking_lot::Mutex;
    use tokenizers::Tokenizer;
    use tracing::{debug, info};

    use crate::embedder::{EmbedderBackend, EmbeddingResult};

    /// Maximum sequence length for the model.
    const MAX_SEQ_LEN: usize = 512;

    /// Query embedding cache: 1000 entries, 1-hour TTL.
    const QUERY_CACHE_SIZE: usize = 1000;
    const QUERY_CACHE_TTL: Duration = Duration::from_secs(3600);

    /// ONNX sentence encoder.
    pub struct OnnxEmbedder {
        name: String,
        session: Arc<Mutex<Session>>,
        tokenizer: Tokenizer,
        cache: MemoCache<Array1<f32>>,
        dimension: usize,
    }

    impl OnnxEmbedder {
        /// Load an ONNX model and tokenizer from the given directory.
        ///
        /// Expects:
        /// - `model_dir/model.onnx`: the ONNX model file
        /// - `model_dir/tokenizer.json`: the HuggingFace tokenizer
        pub fn load(name: &str, model_dir: &Path, compute: &ComputeResources) -> Result<Self> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");

            if !model_path.exists() {
                return Err(Error::ModelLoad(format!(
                    "Model not found: {}",
                    model_path.display()
                )));
            }
            if !tokenizer_path.exists() {
                return Err(Error::ModelLoad(format!(
                    "Tokenizer not found: {}",
                    tokenizer_path.display()
                )));
            }

            // With load-dynamic, ORT_DYLIB_PATH must point to libonnxruntime.so
            ort::init().commit();

            if compute.has_accelerator() {
                debug!(
                    "{} accelerator(s) present; session runs on the CPU execution provider",
                    compute.accelerators
                );
            }

            let session = Session::builder()
                .map_err(|e| Error::ModelLoad(format!("Failed to create session builder: {}", e)))?
                .with_intra_threads(compute.intra_threads())
                .map_err(|e| Error::ModelLoad(format!("Failed to set threads: {}", e)))?
                .commit_from_file(&model_path)
                .map_err(|e| Error::ModelLoad(format!("Failed to load ONNX model: {}", e)))?;

            let tokenizer = Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| Error::ModelLoad(format!("Failed to load tokenizer: {}", e)))?;

            let mut embedder = Self {
                name: name.to_string(),
                session: Arc::new(Mutex::new(session)),
                tokenizer,
                cache: MemoCache::new(Some(QUERY_CACHE_SIZE), Some(QUERY_CACHE_TTL)),
                dimension: 0,
            };

            // Probe once to learn the output dimension.
            embedder.dimension = embedder.infer("dimension probe")?.len();

            info!(
                "ONNX embedder loaded: model={}, dim={}, threads={}, path={}",
                name,
                embedder.dimension,
                compute.intra_threads(),
                model_path.display()
            );

            Ok(embedder)
        }

        /// Run inference on tokenized input.
        fn infer(&self, text: &str) -> Result<Array1<f32>> {
            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| Error::Inference(format!("Tokenization failed: {}", e)))?;

            let input_ids = encoding.get_ids();
            let attention_mask = encoding.get_attention_mask();

            let seq_len = input_ids.len().min(MAX_SEQ_LEN);
            let input_ids = &input_ids[..seq_len];
            let attention_mask = &attention_mask[..seq_len];

            let ids_data: Vec<i64> = input_ids.iter().map(|&id| id as i64).collect();
            let mask_data: Vec<i64> = attention_mask.iter().map(|&m| m as i64).collect();
            let type_ids_data: Vec<i64> = vec![0i64; seq_len];

            let ids_tensor = Tensor::from_array(([1usize, seq_len], ids_data))
                .map_err(|e| Error::Inference(format!("Failed to create ids tensor: {}", e)))?;
            let mask_tensor = Tensor::from_array(([1usize, seq_len], mask_data))
                .map_err(|e| Error::Inference(format!("Failed to create mask tensor: {}", e)))?;
            let type_ids_tensor = Tensor::from_array(([1usize, seq_len], type_ids_data))
                .map_err(|e| {
                    Error::Inference(format!("Failed to create type_ids tensor: {}", e))
                })?;

            let mut session = self.session.lock();
            let outputs = session
                .run(ort::inputs![ids_tensor, mask_tensor, type_ids_tensor])
                .map_err(|e| Error::Inference(format!("ONNX inference failed: {}", e)))?;

            // [1, seq_len, dim] token embeddings need mean pooling;
            // [1, dim] is already a sentence embedding.
            let (shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| Error::Inference(format!("Failed to extract output tensor: {}", e)))?;

            let shape_dims: Vec<i64> = shape.iter().copied().collect();

            match shape_dims.len() {
                3 => {
                    let dim = shape_dims[2] as usize;
                    let mask_f32: Vec<f32> = attention_mask.iter().map(|&m| m as f32).collect();
                    let mask_sum: f32 = mask_f32.iter().sum();
                    if mask_sum < 1e-9 {
                        return Err(Error::Inference("empty attention mask".into()));
                    }

                    let mut pooled = Array1::zeros(dim);
                    for (i, &m) in mask_f32.iter().enumerate() {
                        if m > 0.0 {
                            let offset = i * dim;
                            for d in 0..dim {
                                pooled[d] += data[offset + d] * m;
                            }
                        }
                    }
                    Ok(pooled / mask_sum)
                }
                2 => {
                    let dim = shape_dims[1] as usize;
                    Ok(Array1::from_vec(data[..dim].to_vec()))
                }
                _ => Err(Error::Inference(format!(
                    "Unexpected output shape: {:?}",
                    shape_dims
                ))),
            }
        }
    }

    impl EmbedderBackend for OnnxEmbedder {
        fn model_name(&self) -> &str {
            &self.name
        }

        fn embed(&self, text: &str) -> Result<EmbeddingResult> {
            if let Some(cached) = self.cache.get(text) {
                return Ok(EmbeddingResult {
                    embedding: cached,
                    cached: true,
                });
            }

            let embedding = self.infer(text)?;
            self.cache.put(text.to_string(), embedding.clone());

            Ok(EmbeddingResult {
                embedding,
                cached: false,
            })
        }

        fn dimension(&self) -> usize {
            self.dimension
        }
    }
}

#[cfg(feature = "onnx")]
pub use inner::OnnxEmbedder;
