// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text decoder of the handwriting recognizer
//!
//! Greedy autoregressive generation over the encoder hidden states, then
//! tokenizer decoding into trimmed, non-empty lines.

use anyhow::{Context, Result};
use ndarray::{Array2, Array3, Axis, Ix3};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::Tokenizer;
use tracing::{debug, info};

/// Default maximum tokens to generate per image
pub const DEFAULT_MAX_TOKENS: usize = 64;

/// Minimum tokens to generate
pub const MIN_TOKENS: usize = 1;

/// Maximum tokens to generate
pub const MAX_TOKENS: usize = 512;

/// Token that both starts decoding and ends the sequence
const SEQUENCE_TOKEN: &str = "</s>";
const SEQUENCE_TOKEN_FALLBACK_ID: u32 = 2;

/// Recognizer text decoder (ONNX, CPU) with its tokenizer
#[derive(Clone)]
pub struct HandwritingDecoder {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    /// Tokenizer for turning generated ids back into text
    tokenizer: Arc<Tokenizer>,
    /// Maximum tokens to generate
    max_tokens: usize,
    vocab_size: usize,
    decoder_start_token_id: u32,
    eos_token_id: u32,
}

impl std::fmt::Debug for HandwritingDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandwritingDecoder")
            .field("max_tokens", &self.max_tokens)
            .field("vocab_size", &self.vocab_size)
            .field("decoder_start_token_id", &self.decoder_start_token_id)
            .field("eos_token_id", &self.eos_token_id)
            .finish_non_exhaustive()
    }
}

impl HandwritingDecoder {
    /// Load the decoder and its tokenizer
    ///
    /// # Errors
    /// Returns error if either file is missing or fails to load.
    pub async fn new<P: AsRef<Path>>(
        model_path: P,
        tokenizer_path: P,
        intra_threads: usize,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let tokenizer_path = tokenizer_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!(
                "Handwriting decoder model not found: {}",
                model_path.display()
            );
        }
        if !tokenizer_path.exists() {
            anyhow::bail!(
                "Handwriting tokenizer not found: {}",
                tokenizer_path.display()
            );
        }

        info!("Loading handwriting decoder from {}", model_path.display());

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        let vocab_size = tokenizer.get_vocab_size(true);
        info!("Loaded tokenizer with {} tokens", vocab_size);

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load handwriting decoder from {}",
                model_path.display()
            ))?;

        let input_names: Vec<_> = session.inputs.iter().map(|i| &i.name).collect();
        debug!("Decoder inputs: {:?}", input_names);

        let sequence_token = tokenizer
            .token_to_id(SEQUENCE_TOKEN)
            .unwrap_or(SEQUENCE_TOKEN_FALLBACK_ID);

        info!("✅ Handwriting decoder loaded (start/eos token {})", sequence_token);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            max_tokens: DEFAULT_MAX_TOKENS,
            vocab_size,
            decoder_start_token_id: sequence_token,
            eos_token_id: sequence_token,
        })
    }

    /// Set the maximum tokens to generate
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens.clamp(MIN_TOKENS, MAX_TOKENS);
        self
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    /// Greedy generation from encoder hidden states [1, seq_len, hidden_dim]
    ///
    /// Returns the generated ids without the start token; stops at EOS or
    /// after `max_tokens` steps.
    pub fn generate(&self, encoder_hidden_states: &Array3<f32>) -> Result<Vec<u32>> {
        let mut tokens = vec![self.decoder_start_token_id];

        for step in 0..self.max_tokens {
            let logits = self.forward(encoder_hidden_states, &tokens)?;
            let next_token =
                argmax(&logits).ok_or_else(|| anyhow::anyhow!("Decoder returned empty logits"))?;

            if next_token == self.eos_token_id {
                debug!("Generation stopped at EOS after {} steps", step + 1);
                break;
            }
            tokens.push(next_token);
        }

        Ok(tokens.split_off(1))
    }

    /// Decode generated ids into trimmed, non-empty lines
    pub fn decode_lines(&self, token_ids: &[u32]) -> Result<Vec<String>> {
        let text = self
            .tokenizer
            .decode(token_ids, true)
            .map_err(|e| anyhow::anyhow!("Decoding failed: {}", e))?;
        Ok(split_lines(&text))
    }

    /// One decoder pass; returns the logits of the last position
    fn forward(&self, encoder_hidden_states: &Array3<f32>, input_ids: &[u32]) -> Result<Vec<f32>> {
        let ids: Vec<i64> = input_ids.iter().map(|&t| t as i64).collect();
        let input_ids = Array2::from_shape_vec((1, ids.len()), ids)
            .context("Failed to shape input ids")?;

        let ids_value = Value::from_array(input_ids).context("Failed to create input ids tensor")?;
        let states_value = Value::from_array(encoder_hidden_states.to_owned())
            .context("Failed to create encoder hidden states tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Handwriting decoder session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => ids_value,
                "encoder_hidden_states" => states_value
            ])
            .context("Decoder inference failed")?;

        let logits = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract logits")?
            .into_dimensionality::<Ix3>()
            .context("Decoder logits are not [batch, seq_len, vocab]")?;

        let last = logits
            .shape()
            .get(1)
            .and_then(|len| len.checked_sub(1))
            .ok_or_else(|| anyhow::anyhow!("Decoder returned no positions"))?;

        Ok(logits.index_axis(Axis(0), 0).index_axis(Axis(0), last).to_vec())
    }
}

/// Index of the largest logit; `None` when empty
pub fn argmax(logits: &[f32]) -> Option<u32> {
    logits
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(idx, _)| idx as u32)
}

/// Split decoded text on newlines, trim, drop empty lines
pub fn split_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
