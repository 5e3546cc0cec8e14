// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Vision Model Manager tests
//!
//! These tests verify that the VisionModelManager correctly:
//! - Loads the handwriting recognizer and object detector
//! - Provides model availability checks
//! - Lists both models with their availability
//! - Handles missing models gracefully
//!
//! Tests marked `#[ignore]` need the exported ONNX models on disk.

use ocr_ml_node::vision::{VisionModelConfig, VisionModelInfo, VisionModelManager};

// Model paths (downloaded by the export scripts)
const HANDWRITING_MODEL_DIR: &str = "/workspace/models/trocr-base-handwritten-onnx";
const DETECTION_MODEL_PATH: &str = "/workspace/models/fasterrcnn-resnet50-fpn/model.onnx";

fn config_without_models() -> VisionModelConfig {
    VisionModelConfig {
        handwriting_model_dir: None,
        detection_model_path: None,
        ..VisionModelConfig::default()
    }
}

#[cfg(test)]
mod model_manager_tests {
    use super::*;

    // =============================================================================
    // VisionModelConfig Tests
    // =============================================================================

    /// Test 1: Default config has expected paths
    #[test]
    fn test_default_config_has_expected_paths() {
        let config = VisionModelConfig::default();

        assert!(config
            .handwriting_model_dir
            .as_ref()
            .unwrap()
            .contains("trocr"));
        assert!(config
            .detection_model_path
            .as_ref()
            .unwrap()
            .ends_with(".onnx"));
        assert_eq!(config.detection_score_threshold, 0.5);
    }

    // =============================================================================
    // Missing Model Handling
    // =============================================================================

    /// Test 2: No paths configured means no models, but no error either
    #[tokio::test]
    async fn test_manager_without_paths() {
        let manager = VisionModelManager::new(config_without_models())
            .await
            .expect("Manager should be created without models");

        assert!(!manager.has_recognizer());
        assert!(!manager.has_detector());
        assert!(manager.recognizer().is_none());
        assert!(manager.detector().is_none());
    }

    /// Test 3: Nonexistent paths are logged and skipped
    #[tokio::test]
    async fn test_manager_with_missing_files() {
        let config = VisionModelConfig {
            handwriting_model_dir: Some("/nonexistent/trocr".to_string()),
            detection_model_path: Some("/nonexistent/detector.onnx".to_string()),
            ..VisionModelConfig::default()
        };

        let manager = VisionModelManager::new(config)
            .await
            .expect("Missing files should not fail manager creation");

        assert!(!manager.has_recognizer());
        assert!(!manager.has_detector());
    }

    /// Test 4: list_models reports both models, unavailable
    #[tokio::test]
    async fn test_list_models_without_models() {
        let manager = VisionModelManager::new(config_without_models()).await.unwrap();
        let models: Vec<VisionModelInfo> = manager.list_models();

        assert_eq!(models.len(), 2);
        assert!(models.iter().all(|m| !m.available));
        assert!(models.iter().any(|m| m.model_type == "handwriting"));
        assert!(models.iter().any(|m| m.model_type == "detection"));
    }

    /// Test 5: without_models matches a manager built from an empty config
    #[tokio::test]
    async fn test_without_models_matches_empty_config() {
        let built = VisionModelManager::new(config_without_models()).await.unwrap();
        let empty = VisionModelManager::without_models();

        assert_eq!(built.list_models(), empty.list_models());
    }

    // =============================================================================
    // Real Model Loading (requires model files)
    // =============================================================================

    /// Test 6: Both models load from the exported files
    #[tokio::test]
    #[ignore]
    async fn test_manager_loads_all_models() {
        let config = VisionModelConfig {
            handwriting_model_dir: Some(HANDWRITING_MODEL_DIR.to_string()),
            detection_model_path: Some(DETECTION_MODEL_PATH.to_string()),
            ..VisionModelConfig::default()
        };

        let manager = VisionModelManager::new(config).await.unwrap();

        assert!(manager.has_recognizer());
        assert!(manager.has_detector());
        assert!(manager.list_models().iter().all(|m| m.available));
    }

    /// Test 7: Detector threshold is taken from the config
    #[tokio::test]
    #[ignore]
    async fn test_detector_uses_configured_threshold() {
        let config = VisionModelConfig {
            handwriting_model_dir: None,
            detection_model_path: Some(DETECTION_MODEL_PATH.to_string()),
            detection_score_threshold: 0.75,
            ..VisionModelConfig::default()
        };

        let manager = VisionModelManager::new(config).await.unwrap();
        let detector = manager.detector().expect("detector should load");

        assert_eq!(detector.score_threshold(), 0.75);
    }
}
