// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision encoder of the handwriting recognizer
//!
//! Turns a normalized 384x384 image tensor into the hidden states the text
//! decoder attends over.

use anyhow::{Context, Result};
use ndarray::{Array3, Array4, Ix3};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::preprocessing::RECOGNIZER_INPUT_SIZE;

/// Recognizer vision encoder (ONNX, CPU)
#[derive(Clone)]
pub struct HandwritingEncoder {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    /// Model input name
    input_name: String,
    /// Model output name (hidden states)
    output_name: String,
}

impl std::fmt::Debug for HandwritingEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandwritingEncoder")
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .finish_non_exhaustive()
    }
}

impl HandwritingEncoder {
    /// Load the encoder from an ONNX file
    ///
    /// # Errors
    /// Returns error if the file is missing or ONNX Runtime rejects it.
    pub async fn new<P: AsRef<Path>>(model_path: P, intra_threads: usize) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!(
                "Handwriting encoder model not found: {}",
                model_path.display()
            );
        }

        info!("Loading handwriting encoder from {}", model_path.display());

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
                "Failed to load handwriting encoder from {}",
                model_path.display()
            ))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "pixel_values".to_string());

        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .unwrap_or_else(|| "last_hidden_state".to_string());

        debug!(
            "Handwriting encoder loaded - input: {}, output: {}",
            input_name, output_name
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            output_name,
        })
    }

    /// Encode a preprocessed [1, 3, 384, 384] tensor
    ///
    /// Returns hidden states of shape [1, seq_len, hidden_dim].
    pub fn encode(&self, input: &Array4<f32>) -> Result<Array3<f32>> {
        let shape = input.shape();
        if shape.len() != 4 || shape[0] != 1 || shape[1] != 3 {
            anyhow::bail!("Invalid input shape: {:?}, expected [1, 3, H, W]", shape);
        }
        if shape[2] != RECOGNIZER_INPUT_SIZE as usize || shape[3] != RECOGNIZER_INPUT_SIZE as usize {
            debug!(
                "Input size {}x{} differs from expected {}x{}",
                shape[2], shape[3], RECOGNIZER_INPUT_SIZE, RECOGNIZER_INPUT_SIZE
            );
        }

        let input_value =
            Value::from_array(input.to_owned()).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Handwriting encoder session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_value])
            .context("Encoder inference failed")?;

        let hidden = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract encoder output")?;
        debug!("Encoder output shape: {:?}", hidden.shape());

        let hidden = hidden
            .to_owned()
            .into_dimensionality::<Ix3>()
            .context("Encoder output is not [batch, seq_len, hidden_dim]")?;

        Ok(hidden)
    }
}
