// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Handwriting recognition with an ONNX vision-encoder / text-decoder model
//!
//! Components:
//! - `preprocessing` - 384x384 resize and [-1, 1] normalization
//! - `encoder` - Vision encoder producing hidden states
//! - `decoder` - Greedy text generation and tokenizer decoding
//! - `model` - Combined recognizer

pub mod decoder;
pub mod encoder;
pub mod model;
pub mod preprocessing;

pub use decoder::HandwritingDecoder;
pub use encoder::HandwritingEncoder;
pub use model::{HandwritingRecognizer, RecognitionResult, RecognizerOptions};
