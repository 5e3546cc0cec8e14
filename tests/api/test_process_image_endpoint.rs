// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Process image endpoint tests for POST /process-image
//!
//! These tests verify that the process_image_handler correctly:
//! - Accepts a multipart upload with a `file` field
//! - Returns the merged `{text, annotations, confidence}` body
//! - Degrades to empty results when models are missing or bytes are not an image
//! - Rejects missing fields, wrong methods and oversized bodies
//! - Answers CORS preflights for any origin with credentials
//!
//! No learned models are loaded here, so `text` is always empty and
//! `confidence` is always 0.0.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use image::{DynamicImage, GrayImage, Luma};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use ocr_ml_node::{
    api::http_server::{create_app, AppState},
    pipeline::ProcessedImageResult,
    vision::{encode_png, AnnotationKind, Coordinates},
};
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`

const BOUNDARY: &str = "----ocr-ml-node-test-boundary";

/// Helper: Build a multipart body holding a single field
fn multipart_body(field: &str, file_name: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn multipart_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/process-image")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Helper: 200x200 white PNG, optionally with a black filled rectangle
fn png_with_rect(rect: Option<Rect>) -> Vec<u8> {
    let mut img = GrayImage::from_pixel(200, 200, Luma([255u8]));
    if let Some(rect) = rect {
        draw_filled_rect_mut(&mut img, rect, Luma([0u8]));
    }
    encode_png(&DynamicImage::ImageLuma8(img)).unwrap()
}

fn test_app() -> Router {
    create_app(Arc::new(AppState::new_for_test()))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[cfg(test)]
mod process_image_endpoint_tests {
    use super::*;

    // =============================================================================
    // Success Cases
    // =============================================================================

    /// Test 1: Blank image yields the empty result
    #[tokio::test]
    async fn test_blank_image_returns_empty_result() {
        let body = multipart_body("file", "blank.png", &png_with_rect(None));
        let (status, json) = send(test_app(), multipart_request(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            serde_json::json!({"text": [], "annotations": [], "confidence": 0.0})
        );
    }

    /// Test 2: A large dark square is reported as a rectangle and a text region
    #[tokio::test]
    async fn test_dark_square_is_annotated() {
        let png = png_with_rect(Some(Rect::at(70, 70).of_size(60, 60)));
        let body = multipart_body("file", "square.png", &png);
        let (status, json) = send(test_app(), multipart_request(body)).await;

        assert_eq!(status, StatusCode::OK);

        let result: ProcessedImageResult = serde_json::from_value(json.clone()).unwrap();
        assert!(result.text.is_empty());
        assert_eq!(result.confidence, 0.0);

        let rectangles: Vec<_> = result
            .annotations
            .iter()
            .filter(|a| a.kind == AnnotationKind::Rectangle)
            .collect();
        assert_eq!(rectangles.len(), 1);
        assert_eq!(rectangles[0].confidence, 1.0);
        assert!(matches!(rectangles[0].coordinates, Coordinates::Rectangle(_)));

        let texts: Vec<_> = result
            .annotations
            .iter()
            .filter(|a| a.kind == AnnotationKind::Text)
            .collect();
        assert_eq!(texts.len(), 1);

        // Wire shape: type tag and nested corner arrays
        let first_rect = json["annotations"]
            .as_array()
            .unwrap()
            .iter()
            .find(|a| a["type"] == "rectangle")
            .unwrap();
        assert_eq!(first_rect["coordinates"].as_array().unwrap().len(), 4);
        assert_eq!(first_rect["coordinates"][0].as_array().unwrap().len(), 2);
    }

    /// Test 3: Bytes that are not an image still produce 200
    #[tokio::test]
    async fn test_garbage_bytes_degrade_to_empty_result() {
        let body = multipart_body("file", "notes.txt", b"definitely not an image");
        let (status, json) = send(test_app(), multipart_request(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["text"], serde_json::json!([]));
        assert_eq!(json["annotations"], serde_json::json!([]));
        assert_eq!(json["confidence"], 0.0);
    }

    /// Test 4: Extra fields before `file` are ignored
    #[tokio::test]
    async fn test_other_fields_are_skipped() {
        let png = png_with_rect(None);
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(b"Content-Disposition: form-data; name=\"note\"\r\n\r\n");
        body.extend_from_slice(b"hello");
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(&multipart_body("file", "blank.png", &png));

        let (status, json) = send(test_app(), multipart_request(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["annotations"], serde_json::json!([]));
    }

    // =============================================================================
    // Error Cases
    // =============================================================================

    /// Test 5: Missing `file` field returns 422 with a detail message
    #[tokio::test]
    async fn test_missing_file_field_returns_422() {
        let body = multipart_body("image", "blank.png", &png_with_rect(None));
        let (status, json) = send(test_app(), multipart_request(body)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let detail = json["detail"].as_str().expect("detail should be a string");
        assert!(detail.contains("file"), "detail was: {}", detail);
    }

    /// Test 6: A non-multipart body is rejected by the extractor
    #[tokio::test]
    async fn test_json_body_is_rejected() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/process-image")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"file": "abc"}"#))
            .unwrap();

        let response = test_app().oneshot(request).await.unwrap();
        assert!(
            response.status().is_client_error(),
            "expected 4xx, got {}",
            response.status()
        );
    }

    /// Test 7: GET is not allowed on the upload route
    #[tokio::test]
    async fn test_get_returns_405() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/process-image")
            .body(Body::empty())
            .unwrap();

        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    /// Test 8: Uploads larger than the body limit get 413
    #[tokio::test]
    async fn test_oversized_upload_returns_413() {
        let mut state = AppState::new_for_test();
        state.max_upload_bytes = 1024;
        let app = create_app(Arc::new(state));

        let body = multipart_body("file", "big.bin", &vec![0u8; 8 * 1024]);
        let mut request = multipart_request(body.clone());
        request
            .headers_mut()
            .insert(header::CONTENT_LENGTH, body.len().into());

        let (status, json) = send(app, request).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        let detail = json["detail"].as_str().expect("detail should be a string");
        assert!(detail.contains("limit"), "detail was: {}", detail);
    }

    /// Test 8b: Uploads within the limit are not affected by it
    #[tokio::test]
    async fn test_upload_within_limit_is_processed() {
        let png = png_with_rect(None);
        let body = multipart_body("file", "blank.png", &png);

        let mut state = AppState::new_for_test();
        state.max_upload_bytes = body.len() + 1;
        let app = create_app(Arc::new(state));

        let mut request = multipart_request(body.clone());
        request
            .headers_mut()
            .insert(header::CONTENT_LENGTH, body.len().into());

        let (status, _) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
    }

    /// Test 9: Unknown route returns 404
    #[tokio::test]
    async fn test_unknown_route_returns_404() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/v1/ocr")
            .body(Body::empty())
            .unwrap();

        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    // =============================================================================
    // CORS
    // =============================================================================

    /// Test 10: Preflight echoes the origin and allows credentials
    #[tokio::test]
    async fn test_cors_preflight_mirrors_origin() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/process-image")
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();

        let response = test_app().oneshot(request).await.unwrap();
        let headers = response.headers();

        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:3000"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).is_some());
    }

    /// Test 11: Simple requests also carry the CORS headers
    #[tokio::test]
    async fn test_cors_headers_on_health() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/health")
            .header(header::ORIGIN, "https://app.example.com")
            .body(Body::empty())
            .unwrap();

        let response = test_app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "https://app.example.com"
        );
    }
}
