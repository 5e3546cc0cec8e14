// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Shape annotator tests
//!
//! These tests run the classical annotation pass over synthetic images and
//! verify that:
//! - Filled discs are found as circles with fixed confidence
//! - Rectangle confidence follows contour area
//! - Small or extreme boxes are not reported as text regions
//! - Undecodable bytes are reported as errors, not panics

use image::{DynamicImage, GrayImage, Luma};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;
use ocr_ml_node::vision::{
    encode_png, Annotation, AnnotationKind, AnnotatorConfig, Coordinates, ImageError,
    ShapeAnnotator,
};

fn white_canvas() -> GrayImage {
    GrayImage::from_pixel(200, 200, Luma([255u8]))
}

fn annotate(img: GrayImage) -> Vec<Annotation> {
    ShapeAnnotator::default().annotate(&DynamicImage::ImageLuma8(img))
}

fn of_kind(annotations: &[Annotation], kind: AnnotationKind) -> Vec<&Annotation> {
    annotations.iter().filter(|a| a.kind == kind).collect()
}

#[cfg(test)]
mod annotator_tests {
    use super::*;

    // =============================================================================
    // Circles
    // =============================================================================

    #[test]
    fn test_filled_disc_is_detected_as_circle() {
        let mut img = white_canvas();
        draw_filled_circle_mut(&mut img, (100, 100), 30, Luma([0u8]));

        let annotations = annotate(img);
        let circles = of_kind(&annotations, AnnotationKind::Circle);
        assert!(!circles.is_empty(), "expected a circle, got {:?}", annotations);

        let found = circles.iter().any(|a| match a.coordinates {
            Coordinates::Circle([x, y, r]) => {
                (x - 100.0).abs() <= 4.0 && (y - 100.0).abs() <= 4.0 && (20.0..=35.0).contains(&r)
            }
            _ => false,
        });
        assert!(found, "no circle near (100, 100): {:?}", circles);

        for circle in circles {
            assert_eq!(circle.confidence, 0.8);
        }
    }

    #[test]
    fn test_circles_come_first() {
        let mut img = white_canvas();
        draw_filled_circle_mut(&mut img, (100, 100), 30, Luma([0u8]));

        let annotations = annotate(img);
        let first_non_circle = annotations
            .iter()
            .position(|a| a.kind != AnnotationKind::Circle)
            .unwrap_or(annotations.len());
        assert!(annotations[first_non_circle..]
            .iter()
            .all(|a| a.kind != AnnotationKind::Circle));
    }

    // =============================================================================
    // Rectangles and text regions
    // =============================================================================

    #[test]
    fn test_small_rectangle_confidence_follows_area() {
        let mut img = white_canvas();
        draw_filled_rect_mut(&mut img, Rect::at(50, 50).of_size(30, 20), Luma([0u8]));

        let annotations = annotate(img);
        let rectangles = of_kind(&annotations, AnnotationKind::Rectangle);
        assert_eq!(rectangles.len(), 1, "got {:?}", annotations);

        // Contour area of a 30x20 pixel block traced through pixel centres
        let expected = (29.0 * 19.0) / 1000.0;
        assert!(
            (rectangles[0].confidence - expected).abs() < 0.02,
            "confidence {} not near {}",
            rectangles[0].confidence,
            expected
        );

        match rectangles[0].coordinates {
            Coordinates::Rectangle(corners) => {
                for [x, y] in corners {
                    assert!((49..=80).contains(&x), "x {} out of range", x);
                    assert!((49..=70).contains(&y), "y {} out of range", y);
                }
            }
            ref other => panic!("unexpected coordinates {:?}", other),
        }

        // Height 20 does not pass the strict > 20 filter
        assert!(of_kind(&annotations, AnnotationKind::Text).is_empty());
    }

    #[test]
    fn test_every_confidence_is_in_unit_range() {
        let mut img = white_canvas();
        draw_filled_rect_mut(&mut img, Rect::at(10, 10).of_size(80, 40), Luma([0u8]));
        draw_filled_rect_mut(&mut img, Rect::at(120, 120).of_size(15, 15), Luma([0u8]));
        draw_filled_circle_mut(&mut img, (150, 50), 25, Luma([0u8]));

        for annotation in annotate(img) {
            assert!(
                (0.0..=1.0).contains(&annotation.confidence),
                "{:?}",
                annotation
            );
        }
    }

    #[test]
    fn test_text_region_matches_bounding_box() {
        let mut img = white_canvas();
        draw_filled_rect_mut(&mut img, Rect::at(20, 60).of_size(120, 40), Luma([0u8]));

        let annotations = annotate(img);
        let texts = of_kind(&annotations, AnnotationKind::Text);
        assert_eq!(texts.len(), 1, "got {:?}", annotations);

        match texts[0].coordinates {
            Coordinates::Region([x, y, w, h]) => {
                assert!((18..=22).contains(&x));
                assert!((58..=62).contains(&y));
                assert!((116..=124).contains(&w));
                assert!((36..=44).contains(&h));
                // w * h well above 1000
                assert_eq!(texts[0].confidence, 1.0);
            }
            ref other => panic!("unexpected coordinates {:?}", other),
        }
    }

    #[test]
    fn test_custom_text_filter_rejects_everything() {
        let mut config = AnnotatorConfig::default();
        config.text_filter.min_width = 500;
        let annotator = ShapeAnnotator::new(config);

        let mut img = white_canvas();
        draw_filled_rect_mut(&mut img, Rect::at(20, 60).of_size(120, 40), Luma([0u8]));

        let annotations = annotator.annotate(&DynamicImage::ImageLuma8(img));
        assert!(of_kind(&annotations, AnnotationKind::Text).is_empty());
        assert_eq!(of_kind(&annotations, AnnotationKind::Rectangle).len(), 1);
    }

    // =============================================================================
    // Byte input
    // =============================================================================

    #[test]
    fn test_detect_annotations_from_png_bytes() {
        let mut img = white_canvas();
        draw_filled_rect_mut(&mut img, Rect::at(70, 70).of_size(60, 60), Luma([0u8]));
        let png = encode_png(&DynamicImage::ImageLuma8(img)).unwrap();

        let annotations = ShapeAnnotator::default().detect_annotations(&png).unwrap();
        assert_eq!(of_kind(&annotations, AnnotationKind::Rectangle).len(), 1);
    }

    #[test]
    fn test_detect_annotations_rejects_garbage() {
        let result = ShapeAnnotator::default().detect_annotations(b"not an image");
        assert!(matches!(result, Err(ImageError::UnsupportedFormat)));
    }

    #[test]
    fn test_detect_annotations_rejects_empty_bytes() {
        let result = ShapeAnnotator::default().detect_annotations(&[]);
        assert!(matches!(result, Err(ImageError::EmptyData)));
    }
}
