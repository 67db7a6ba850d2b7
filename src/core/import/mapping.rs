//! Papers3 to Zotero field mapping

use crate::domain::dates::publication_date_value;
use crate::domain::SourceDocument;
use std::path::Path;

/// Zotero item type for publications whose type is unknown or unmapped
pub const FALLBACK_ITEM_TYPE: &str = "document";

/// Zotero item type of attachment records
pub const ATTACHMENT_ITEM_TYPE: &str = "attachment";

/// Tag added to flagged publications
pub const FLAGGED_TAG: &str = "Flagged";

/// Content type assumed when the extension says nothing
pub const DEFAULT_CONTENT_TYPE: &str = "application/pdf";

/// Maps a Papers3 publication type name to a Zotero item type name.
pub fn item_type_name(kind: Option<&str>) -> &'static str {
    let Some(kind) = kind else {
        return FALLBACK_ITEM_TYPE;
    };
    match kind.trim().to_lowercase().as_str() {
        "article" | "periodical" | "journal article" | "magazine article"
        | "newspaper article" | "review article" => "journalArticle",
        "book" | "edited book" | "textbook" | "reference book" => "book",
        "book chapter" => "bookSection",
        "report" | "technical report" | "research report" | "working paper" => "report",
        "patent" => "patent",
        "conference" | "conference paper" | "conference poster" => "conferencePaper",
        "website" => "webpage",
        "thesis" | "thesis/dissertation" => "thesis",
        _ => FALLBACK_ITEM_TYPE,
    }
}

/// Scalar fields of a publication as `(Zotero field name, literal)`, in
/// write order. Absent and empty values are left out.
pub fn field_values(doc: &SourceDocument) -> Vec<(&'static str, String)> {
    let date = doc
        .publication_date
        .as_deref()
        .and_then(publication_date_value);

    let candidates: [(&'static str, Option<String>); 11] = [
        ("title", doc.title.clone()),
        ("abstractNote", doc.abstract_text().map(str::to_string)),
        ("date", date),
        ("DOI", doc.doi.clone()),
        ("url", doc.url.clone()),
        ("volume", doc.volume.clone()),
        ("issue", doc.number.clone()),
        ("publisher", doc.publisher.clone()),
        ("language", doc.language.clone()),
        ("pages", doc.page_range()),
        ("publicationTitle", doc.publication_title().map(str::to_string)),
    ];

    let mut values: Vec<(&'static str, String)> = candidates
        .into_iter()
        .filter_map(|(field, value)| {
            value
                .filter(|v| !v.trim().is_empty())
                .map(|v| (field, v))
        })
        .collect();
    values.push(("extra", extra_field(doc)));
    values
}

/// Builds the `extra` field: Papers3-only metadata, one `Label: value` per
/// line, always ending with the source identifier.
pub fn extra_field(doc: &SourceDocument) -> String {
    let mut lines = Vec::new();
    if let Some(rating) = meaningful(doc.rating.as_deref()) {
        lines.push(format!("Rating: {rating}/5"));
    }
    if let Some(status) = meaningful(doc.read_status.as_deref()) {
        lines.push(format!("Read Status: {status}"));
    }
    if let Some(cited) = meaningful(doc.times_cited.as_deref()) {
        lines.push(format!("Times Cited: {cited}"));
    }
    lines.push(format!("Papers3 UUID: {}", doc.uuid));
    lines.join("\n")
}

// Zero counts carry no information in the export.
fn meaningful(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "0" && *v != "false")
}

/// MIME type of an attachment, guessed from its extension.
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "htm" | "html" => "text/html",
        "txt" => "text/plain",
        "epub" => "application/epub+zip",
        "djvu" => "image/vnd.djvu",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => DEFAULT_CONTENT_TYPE,
    }
}
