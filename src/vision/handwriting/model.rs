// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Handwriting recognizer combining the vision encoder and text decoder

use anyhow::{Context, Result};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use super::decoder::HandwritingDecoder;
use super::encoder::HandwritingEncoder;
use super::preprocessing::preprocess_for_recognizer;

/// Load-time knobs for the recognizer
#[derive(Debug, Clone, Copy)]
pub struct RecognizerOptions {
    /// Upper bound on generated tokens per image
    pub max_tokens: usize,
    /// ONNX Runtime intra-op threads per session
    pub intra_threads: usize,
}

impl Default for RecognizerOptions {
    fn default() -> Self {
        Self {
            max_tokens: super::decoder::DEFAULT_MAX_TOKENS,
            intra_threads: 4,
        }
    }
}

/// Result of recognizing one image
#[derive(Debug, Clone)]
pub struct RecognitionResult {
    /// Non-empty, trimmed lines in emission order
    pub lines: Vec<String>,
    /// Number of generated tokens (start token excluded)
    pub token_count: usize,
    pub processing_time_ms: u64,
}

/// Encoder/decoder handwriting recognizer (CPU)
#[derive(Clone)]
pub struct HandwritingRecognizer {
    encoder: HandwritingEncoder,
    decoder: HandwritingDecoder,
    model_dir: String,
}

impl std::fmt::Debug for HandwritingRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandwritingRecognizer")
            .field("model_dir", &self.model_dir)
            .field("max_tokens", &self.decoder.max_tokens())
            .finish_non_exhaustive()
    }
}

impl HandwritingRecognizer {
    /// Load the recognizer from a model directory
    ///
    /// Expected files:
    /// - encoder_model.onnx or encoder.onnx
    /// - decoder_model.onnx or decoder.onnx
    /// - tokenizer.json
    pub async fn new<P: AsRef<Path>>(model_dir: P, options: RecognizerOptions) -> Result<Self> {
        let model_dir = model_dir.as_ref();

        if !model_dir.exists() {
            anyhow::bail!(
                "Handwriting model directory not found: {}",
                model_dir.display()
            );
        }

        info!("Loading handwriting recognizer from {}", model_dir.display());

        let encoder_path = find_model_file(model_dir, &["encoder_model.onnx", "encoder.onnx"])?;
        let decoder_path = find_model_file(model_dir, &["decoder_model.onnx", "decoder.onnx"])?;
        let tokenizer_path = model_dir.join("tokenizer.json");

        let encoder = HandwritingEncoder::new(&encoder_path, options.intra_threads)
            .await
            .context("Failed to load handwriting encoder")?;

        let decoder = HandwritingDecoder::new(&decoder_path, &tokenizer_path, options.intra_threads)
            .await
            .context("Failed to load handwriting decoder")?
            .with_max_tokens(options.max_tokens);

        info!("✅ Handwriting recognizer ready (CPU-only)");

        Ok(Self {
            encoder,
            decoder,
            model_dir: model_dir.to_string_lossy().to_string(),
        })
    }

    pub fn model_dir(&self) -> &str {
        &self.model_dir
    }

    /// Recognize handwritten text in an image
    ///
    /// The whole image is one recognition input; line breaks come only from
    /// what the model emits.
    pub fn recognize(&self, image: &DynamicImage) -> Result<RecognitionResult> {
        let start = Instant::now();

        let pixel_values = preprocess_for_recognizer(image);
        let hidden = self
            .encoder
            .encode(&pixel_values)
            .context("Failed to encode image")?;

        let token_ids = self
            .decoder
            .generate(&hidden)
            .context("Failed to generate text")?;
        let lines = self.decoder.decode_lines(&token_ids)?;

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Handwriting recognized: {} lines from {} tokens, {}ms",
            lines.len(),
            token_ids.len(),
            processing_time_ms
        );

        Ok(RecognitionResult {
            lines,
            token_count: token_ids.len(),
            processing_time_ms,
        })
    }
}

/// First existing file among `names` inside `dir`
fn find_model_file(dir: &Path, names: &[&str]) -> Result<PathBuf> {
    for name in names {
        let path = dir.join(name);
        if path.exists() {
            return Ok(path);
        }
    }
    anyhow::bail!(
        "Model file not found in {}. Tried: {:?}",
        dir.display(),
        names
    );
}
