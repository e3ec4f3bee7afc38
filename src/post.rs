use crate::codec::{decode_items, from_json, JsonDecode, JsonEncode};
use crate::pagination::PageRequest;
use crate::tag::Tag;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

/// Server-assigned post identifier
pub type PostId = i64;

/// Post content as written by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub title: String,
    pub markdown: String,
    pub tags: Vec<Tag>,
}

impl Post {
    pub fn new(title: impl Into<String>, markdown: impl Into<String>) -> Self {
        Post {
            title: title.into(),
            markdown: markdown.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags = tags;
        self
    }
}

#[derive(Deserialize)]
struct PostWire {
    title: String,
    markdown: String,
}

impl JsonDecode for Post {
    const ENTITY: &'static str = "post";

    fn decode(json: &Value) -> Option<Self> {
        let wire: PostWire = from_json(json)?;
        Some(Post {
            title: wire.title,
            markdown: wire.markdown,
            tags: decode_items(json, "tags"),
        })
    }
}

impl JsonEncode for Post {
    fn encode(&self) -> Value {
        let tags: Vec<Value> = self.tags.iter().map(Tag::encode).collect();
        json!({
            "title": self.title,
            "markdown": self.markdown,
            "tags": tags,
        })
    }
}

/// A post that exists on the server.
///
/// Only produced by decoding a server response, so holding one means the id
/// is known. Dereferences to the editable [`Post`] content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedPost {
    id: PostId,
    post: Post,
}

impl PersistedPost {
    pub fn id(&self) -> PostId {
        self.id
    }

    pub fn into_post(self) -> Post {
        self.post
    }
}

impl Deref for PersistedPost {
    type Target = Post;

    fn deref(&self) -> &Self::Target {
        &self.post
    }
}

impl DerefMut for PersistedPost {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.post
    }
}

impl JsonDecode for PersistedPost {
    const ENTITY: &'static str = "post";

    fn decode(json: &Value) -> Option<Self> {
        let id = json.get("id")?.as_i64()?;
        let post = Post::decode(json)?;
        Some(PersistedPost { id, post })
    }
}

/// The id is server-assigned and never sent back
impl JsonEncode for PersistedPost {
    fn encode(&self) -> Value {
        self.post.encode()
    }
}

/// Non-paginated `{"posts": [...]}` envelope returned by single-post endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Posts(pub Vec<PersistedPost>);

impl Posts {
    pub fn first(&self) -> Option<&PersistedPost> {
        self.0.first()
    }

    pub fn into_vec(self) -> Vec<PersistedPost> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl JsonDecode for Posts {
    const ENTITY: &'static str = "posts";

    fn decode(json: &Value) -> Option<Self> {
        json.get("posts")?.as_array()?;
        Some(Posts(decode_items(json, "posts")))
    }
}

/// Publication status filter for post listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Published,
    Draft,
}

impl StatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Published => "published",
            StatusFilter::Draft => "draft",
        }
    }
}

/// Static page filter for post listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StaticFilter {
    #[default]
    All,
    Static,
    NotStatic,
}

impl StaticFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaticFilter::All => "all",
            StaticFilter::Static => "true",
            StaticFilter::NotStatic => "false",
        }
    }
}

/// Query options for post requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostsRequestOptions {
    pub status: StatusFilter,
    pub static_pages: StaticFilter,
    pub pagination: Option<PageRequest>,
}

impl PostsRequestOptions {
    pub fn new(
        status: StatusFilter,
        static_pages: StaticFilter,
        pagination: Option<PageRequest>,
    ) -> Self {
        PostsRequestOptions {
            status,
            static_pages,
            pagination,
        }
    }

    /// Default options with the given page requested
    pub fn page(pagination: PageRequest) -> Self {
        PostsRequestOptions {
            pagination: Some(pagination),
            ..Self::default()
        }
    }

    /// Flat query mapping sent with the request
    pub fn query(&self) -> BTreeMap<String, String> {
        let mut query = BTreeMap::new();
        query.insert("status".to_string(), self.status.as_str().to_string());
        query.insert(
            "staticPages".to_string(),
            self.static_pages.as_str().to_string(),
        );
        query.insert("include".to_string(), "tags".to_string());

        if let Some(pagination) = self.pagination {
            query.insert("page".to_string(), pagination.page.to_string());
            let limit = if pagination.limit > 0 {
                pagination.limit.to_string()
            } else {
                "all".to_string()
            };
            query.insert("limit".to_string(), limit);
        }

        query
    }
}
