use crate::post::PostId;
use reqwest::Method;

/// Ghost admin API operations.
///
/// Each variant resolves to a path relative to the API base URL, the HTTP
/// method, and whether the request needs an access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Token,
    GetPosts,
    GetPost(PostId),
    AddPost,
    UpdatePost(PostId),
    DeletePost(PostId),
    GetTags,
    Uploads,
}

impl Endpoint {
    pub fn path(&self) -> String {
        match self {
            Endpoint::Token => "authentication/token/".to_string(),
            Endpoint::GetPosts | Endpoint::AddPost => "posts/".to_string(),
            Endpoint::GetPost(id) | Endpoint::UpdatePost(id) | Endpoint::DeletePost(id) => {
                format!("posts/{}/", id)
            }
            Endpoint::GetTags => "tags/".to_string(),
            Endpoint::Uploads => "uploads/".to_string(),
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Endpoint::GetPosts | Endpoint::GetPost(_) | Endpoint::GetTags => Method::GET,
            Endpoint::Token | Endpoint::AddPost | Endpoint::Uploads => Method::POST,
            Endpoint::UpdatePost(_) => Method::PUT,
            Endpoint::DeletePost(_) => Method::DELETE,
        }
    }

    /// Whether the transport must attach the access token
    pub fn signed(&self) -> bool {
        !matches!(self, Endpoint::Token)
    }
}
