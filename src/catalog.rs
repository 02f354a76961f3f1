//! Static field catalog.
//!
//! Reference data for rule-builder UIs: every dot path the audit pipeline
//! produces, with its type and a human-readable description. Pure
//! configuration, no behavior.

use serde::Serialize;

/// Value type of a catalog field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Number,
    String,
    Boolean,
    Array,
}

/// One entry in the field catalog.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSpec {
    pub path: &'static str,
    pub field_type: FieldType,
    pub description: &'static str,
}

const fn field(path: &'static str, field_type: FieldType, description: &'static str) -> FieldSpec {
    FieldSpec {
        path,
        field_type,
        description,
    }
}

/// Every field rule authors can reference, grouped by audit section.
pub static FIELD_CATALOG: &[FieldSpec] = &[
    // Meta tags
    field("meta.title", FieldType::String, "Page title tag text"),
    field("meta.title.length", FieldType::Number, "Title tag length in characters"),
    field("meta.description", FieldType::String, "Meta description text"),
    field("meta.description.length", FieldType::Number, "Meta description length in characters"),
    field("meta.keywords", FieldType::Array, "Keywords extracted from the page"),
    field("meta.canonical", FieldType::String, "Canonical URL declared by the page"),
    // Scores
    field("performance.score", FieldType::Number, "Performance score, 0-100"),
    field("seo.score", FieldType::Number, "SEO score, 0-100"),
    field("accessibility.score", FieldType::Number, "Accessibility score, 0-100"),
    // Performance details
    field("performance.loadTime", FieldType::Number, "Full page load time in milliseconds"),
    field("performance.pageSize", FieldType::Number, "Total page weight in bytes"),
    // Headings and content
    field("seo.h1Count", FieldType::Number, "Number of H1 headings on the page"),
    field("content.wordCount", FieldType::Number, "Visible word count"),
    // Images
    field("images.total", FieldType::Number, "Total images on the page"),
    field("images.missingAlt", FieldType::Number, "Images without alt text"),
    // Links
    field("links.internal", FieldType::Number, "Internal link count"),
    field("links.external", FieldType::Number, "External link count"),
    field("links.broken", FieldType::Number, "Broken link count"),
    // Structured data
    field("structuredData.present", FieldType::Boolean, "Whether structured data markup was found"),
    field("structuredData.types", FieldType::Array, "Schema.org types detected"),
    // Mobile
    field("mobile.friendly", FieldType::Boolean, "Whether the page passes the mobile-friendliness check"),
];

/// All catalog entries, for populating rule-builder dropdowns.
pub fn all() -> &'static [FieldSpec] {
    FIELD_CATALOG
}

/// Look up one field by its dot path.
pub fn lookup(path: &str) -> Option<&'static FieldSpec> {
    FIELD_CATALOG.iter().find(|spec| spec.path == path)
}
