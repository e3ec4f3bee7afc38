use crate::codec::{from_json, JsonDecode, JsonEncode};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

/// Server-assigned tag identifier
pub type TagId = i64;

/// Tag attached to a post.
///
/// Tags built on the client only carry a name; the remaining fields are
/// filled in from server responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: Option<TagId>,
    pub uuid: Option<Uuid>,
    pub name: String,
    pub slug: Option<String>,
}

#[derive(Deserialize)]
struct TagWire {
    id: Option<TagId>,
    uuid: Option<String>,
    name: String,
    slug: Option<String>,
}

impl Tag {
    /// Create a tag to be sent to the server
    pub fn new(name: impl Into<String>) -> Self {
        Tag {
            id: None,
            uuid: None,
            name: name.into(),
            slug: None,
        }
    }
}

impl JsonDecode for Tag {
    const ENTITY: &'static str = "tag";

    fn decode(json: &Value) -> Option<Self> {
        let wire: TagWire = from_json(json)?;
        let uuid = wire.uuid.and_then(|raw| Uuid::parse_str(&raw).ok());

        Some(Tag {
            id: wire.id,
            uuid,
            name: wire.name,
            slug: wire.slug,
        })
    }
}

impl JsonEncode for Tag {
    fn encode(&self) -> Value {
        json!({ "name": self.name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_decode_full() {
        let json = json!({
            "id": 3,
            "uuid": "6ba7b810-9dad-11d1-80b4-00c04fd430c8",
            "name": "Getting Started",
            "slug": "getting-started"
        });

        let tag = Tag::decode(&json).expect("tag");
        assert_eq!(tag.id, Some(3));
        assert_eq!(tag.name, "Getting Started");
        assert_eq!(tag.slug.as_deref(), Some("getting-started"));
        assert!(tag.uuid.is_some());
    }

    #[test]
    fn test_tag_requires_name() {
        assert!(Tag::decode(&json!({"id": 3, "slug": "x"})).is_none());
        assert!(Tag::decode(&json!({"name": 42})).is_none());
    }

    #[test]
    fn test_tag_keeps_name_with_bad_uuid() {
        let tag = Tag::decode(&json!({"id": 4, "name": "a", "uuid": "not-a-uuid"})).expect("tag");
        assert_eq!(tag.name, "a");
        assert_eq!(tag.id, Some(4));
        assert!(tag.uuid.is_none());
    }

    #[test]
    fn test_tag_encode_only_name() {
        let mut tag = Tag::new("rust");
        tag.id = Some(9);
        tag.slug = Some("rust".to_string());
        assert_eq!(tag.encode(), json!({"name": "rust"}));
    }
}
