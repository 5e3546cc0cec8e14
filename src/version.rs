// Version information for the OCR/ML image analysis node

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-image-analysis-2025-10-20";

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Build date
pub const BUILD_DATE: &str = "2025-10-20";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "handwriting-recognition",
    "shape-annotation",
    "object-detection",
    "concurrent-sub-services",
    "degraded-outcomes",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("OCR ML Node {} ({})", VERSION_NUMBER, BUILD_DATE)
}
