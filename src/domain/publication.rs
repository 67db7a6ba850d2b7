//! Publication domain model
//!
//! A [`SourceDocument`] is one publication from the Papers3 export. The export
//! is loose about shapes: authors, keywords and collection references show up
//! either as objects or as bare strings, and scalar fields may be strings or
//! numbers. All of that is normalized here, during deserialization, so the
//! import code only ever sees one representation.

use super::ids::SourceId;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Creator role assumed when the export does not name one.
pub const DEFAULT_ROLE: &str = "author";

/// A publication as exported from Papers3. Read-only input to the import.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceDocument {
    /// Source identifier
    pub uuid: SourceId,

    /// Lower-cased publication type name (e.g. "journal article")
    #[serde(default, rename = "type", deserialize_with = "scalar_text")]
    pub kind: Option<String>,

    #[serde(default, deserialize_with = "scalar_text")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "scalar_text")]
    pub created_at: Option<String>,

    #[serde(default, deserialize_with = "scalar_text")]
    pub updated_at: Option<String>,

    /// Either the raw `99YYYYMMDDHHMMSS...` encoding or an ISO string
    #[serde(default, deserialize_with = "scalar_text")]
    pub publication_date: Option<String>,

    #[serde(default, deserialize_with = "scalar_text")]
    pub doi: Option<String>,

    #[serde(default, deserialize_with = "scalar_text")]
    pub url: Option<String>,

    #[serde(default, deserialize_with = "scalar_text")]
    pub volume: Option<String>,

    /// Issue number
    #[serde(default, deserialize_with = "scalar_text")]
    pub number: Option<String>,

    #[serde(default, deserialize_with = "scalar_text")]
    pub publisher: Option<String>,

    #[serde(default, deserialize_with = "scalar_text")]
    pub language: Option<String>,

    #[serde(default, deserialize_with = "scalar_text")]
    pub startpage: Option<String>,

    #[serde(default, deserialize_with = "scalar_text")]
    pub endpage: Option<String>,

    #[serde(default, deserialize_with = "scalar_text")]
    pub pages: Option<String>,

    /// Containing journal or book
    #[serde(default)]
    pub bundle_details: Option<BundleDetails>,

    #[serde(default, deserialize_with = "scalar_text")]
    pub summary: Option<String>,

    #[serde(default, deserialize_with = "scalar_text")]
    pub notes: Option<String>,

    #[serde(default, deserialize_with = "scalar_text")]
    pub rating: Option<String>,

    #[serde(default, deserialize_with = "scalar_text")]
    pub read_status: Option<String>,

    #[serde(default, deserialize_with = "scalar_text")]
    pub times_cited: Option<String>,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub flagged: bool,

    /// Ordered author list
    #[serde(default, deserialize_with = "null_as_empty")]
    pub authors: Vec<Author>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub keywords: Vec<Keyword>,

    /// Identifiers of the collections this publication belongs to
    #[serde(default, deserialize_with = "null_as_empty")]
    pub collections: Vec<CollectionRef>,

    /// PDF attachments; entries without a usable path are dropped
    #[serde(default, rename = "pdfs", deserialize_with = "attachment_list")]
    pub attachments: Vec<AttachmentRef>,
}

impl SourceDocument {
    /// Abstract text, preferring the summary over free-form notes
    pub fn abstract_text(&self) -> Option<&str> {
        non_empty(self.summary.as_deref()).or_else(|| non_empty(self.notes.as_deref()))
    }

    /// Page range, built from start/end pages when both are present
    pub fn page_range(&self) -> Option<String> {
        match (
            non_empty(self.startpage.as_deref()),
            non_empty(self.endpage.as_deref()),
        ) {
            (Some(start), Some(end)) => Some(format!("{start}-{end}")),
            _ => non_empty(self.pages.as_deref()).map(str::to_string),
        }
    }

    /// Title of the containing journal or book
    pub fn publication_title(&self) -> Option<&str> {
        self.bundle_details
            .as_ref()
            .and_then(|bundle| non_empty(bundle.title.as_deref()))
    }

    /// Four-digit year of publication, if the date carries one
    pub fn year(&self) -> Option<i32> {
        super::dates::extract_year(self.publication_date.as_deref()?)
    }

    /// First author, as it would be shown in a citation
    pub fn first_author_name(&self) -> Option<String> {
        self.authors.iter().find_map(|author| {
            let (first, last) = author.name_parts();
            if !last.trim().is_empty() {
                Some(last)
            } else if !first.trim().is_empty() {
                Some(first)
            } else {
                None
            }
        })
    }
}

/// Containing journal or book
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BundleDetails {
    #[serde(default, deserialize_with = "scalar_text")]
    pub title: Option<String>,
}

/// An author entry, resolved to one of two representations at load time
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawAuthor")]
pub enum Author {
    /// Separate first/last name fields with a role
    Structured {
        first: String,
        last: String,
        role: String,
    },
    /// A single display string, e.g. `"Smith, J."` or `"World Health Organization"`
    NameOnly { text: String },
}

impl Author {
    /// Returns `(first, last)` as stored in the destination's creator table.
    ///
    /// A name-only entry of the form `"Last, First"` is split on the comma;
    /// anything else is kept whole as the last name.
    pub fn name_parts(&self) -> (String, String) {
        match self {
            Author::Structured { first, last, .. } => (first.clone(), last.clone()),
            Author::NameOnly { text } => {
                let parts: Vec<&str> = text.split(", ").collect();
                if parts.len() == 2 {
                    (parts[1].to_string(), parts[0].to_string())
                } else {
                    (String::new(), text.clone())
                }
            }
        }
    }

    /// Creator role name
    pub fn role(&self) -> &str {
        match self {
            Author::Structured { role, .. } => role,
            Author::NameOnly { .. } => DEFAULT_ROLE,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAuthor {
    Text(String),
    Structured {
        #[serde(default, deserialize_with = "scalar_text")]
        prename: Option<String>,
        #[serde(default, deserialize_with = "scalar_text")]
        surname: Option<String>,
        #[serde(default, deserialize_with = "scalar_text")]
        fullname: Option<String>,
        #[serde(default, rename = "type", deserialize_with = "scalar_text")]
        role: Option<String>,
    },
    Other(Value),
}

impl From<RawAuthor> for Author {
    fn from(raw: RawAuthor) -> Self {
        match raw {
            RawAuthor::Text(text) => Author::NameOnly { text },
            RawAuthor::Structured {
                prename,
                surname,
                fullname,
                role,
            } => Author::Structured {
                first: prename.unwrap_or_default(),
                last: surname.or(fullname).unwrap_or_default(),
                role: role
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_ROLE.to_string()),
            },
            RawAuthor::Other(value) => Author::NameOnly {
                text: value.to_string(),
            },
        }
    }
}

/// A keyword, taken from `{"name": ...}` or a bare string. May be empty.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawKeyword")]
pub struct Keyword(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawKeyword {
    Text(String),
    Named {
        #[serde(default, deserialize_with = "scalar_text")]
        name: Option<String>,
    },
    Other(Value),
}

impl From<RawKeyword> for Keyword {
    fn from(raw: RawKeyword) -> Self {
        match raw {
            RawKeyword::Text(text) => Keyword(text),
            RawKeyword::Named { name } => Keyword(name.unwrap_or_default()),
            RawKeyword::Other(value) => Keyword(value.to_string()),
        }
    }
}

/// A collection membership, taken from `{"collection_uuid": ...}` or a bare string
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawCollectionRef")]
pub struct CollectionRef(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCollectionRef {
    Text(String),
    Linked {
        #[serde(default, deserialize_with = "scalar_text")]
        collection_uuid: Option<String>,
    },
    Other(Value),
}

impl From<RawCollectionRef> for CollectionRef {
    fn from(raw: RawCollectionRef) -> Self {
        match raw {
            RawCollectionRef::Text(text) => CollectionRef(text),
            RawCollectionRef::Linked { collection_uuid } => {
                CollectionRef(collection_uuid.unwrap_or_default())
            }
            RawCollectionRef::Other(value) => CollectionRef(value.to_string()),
        }
    }
}

/// A PDF attachment reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    /// Path as recorded by Papers3, absolute or relative to the attachments root
    pub path: String,
    pub caption: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAttachment {
    Entry {
        #[serde(default, deserialize_with = "scalar_text")]
        path: Option<String>,
        #[serde(default, deserialize_with = "scalar_text")]
        original_path: Option<String>,
        #[serde(default, deserialize_with = "scalar_text")]
        caption: Option<String>,
    },
    Other(Value),
}

impl RawAttachment {
    fn into_ref(self) -> Option<AttachmentRef> {
        match self {
            RawAttachment::Entry {
                path,
                original_path,
                caption,
            } => {
                let path = path
                    .filter(|p| !p.is_empty())
                    .or(original_path.filter(|p| !p.is_empty()))?;
                Some(AttachmentRef {
                    path,
                    caption: caption
                        .filter(|c| !c.is_empty())
                        .unwrap_or_else(|| "PDF".to_string()),
                })
            }
            RawAttachment::Other(_) => None,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => matches!(s.as_str(), "1" | "true" | "yes"),
        _ => false,
    })
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn attachment_list<'de, D>(deserializer: D) -> Result<Vec<AttachmentRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<RawAttachment> = null_as_empty(deserializer)?;
    Ok(raw.into_iter().filter_map(RawAttachment::into_ref).collect())
}
