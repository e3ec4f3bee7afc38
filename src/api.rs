use crate::client::{create_http_client, Config};
use crate::codec::JsonDecode;
use crate::credentials::EmailCredentials;
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::pagination::{PageRequest, PostsPagination, TagsPagination};
use crate::post::{PersistedPost, Post, PostId, Posts, PostsRequestOptions};
use crate::refresh::Session;
use crate::request::{parse_base_url, Request, RequestBuilder};
use crate::task::PendingRequest;
use crate::token::{AccessToken, CredentialStore, InMemoryCredentialStore};
use crate::transport::{ReqwestTransport, Transport};
use crate::upload::UploadSource;
use std::sync::Arc;
use url::Url;

/// Client for the Ghost admin REST API.
///
/// Every operation builds its request synchronously and returns a
/// [`PendingRequest`]. Operations that send a body return a `Result` first,
/// so encoding errors are reported before anything is sent. Cloning is cheap
/// and clones share the session, including its token refresh state.
#[derive(Clone)]
pub struct ApiClient {
    base_url: Url,
    session: Session,
}

impl ApiClient {
    /// Create a client with the reqwest transport and an in-memory
    /// credential store
    pub fn new(config: Config) -> Result<Self> {
        let transport = ReqwestTransport::new(create_http_client(&config)?);
        Self::with_session(
            &config.base_url,
            Arc::new(transport),
            Arc::new(InMemoryCredentialStore::new()),
        )
    }

    /// Create a client over the given transport and credential store
    pub fn with_session(
        base_url: &str,
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self> {
        let base_url = parse_base_url(base_url)?;
        let session = Session::new(base_url.clone(), transport, store);
        Ok(ApiClient { base_url, session })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials_store(&self) -> &Arc<dyn CredentialStore> {
        self.session.store()
    }

    /// Log in with email and password. The received token is stored and used
    /// for signed requests.
    pub fn login(&self, credentials: &EmailCredentials) -> Result<PendingRequest<AccessToken>> {
        let request = RequestBuilder::new(Endpoint::Token, &self.base_url)
            .input(credentials)?
            .build()?;

        let session = self.session.clone();
        Ok(PendingRequest::new(async move {
            let token: AccessToken = session.execute(&request).await?.decode()?;
            session.store().set(token.clone());
            tracing::info!(expires = %token.expires, "logged in");
            Ok(token)
        }))
    }

    /// List posts
    pub fn posts(&self, options: PostsRequestOptions) -> PendingRequest<PostsPagination> {
        self.without_body(Endpoint::GetPosts, options)
    }

    /// First page of posts, 15 per page
    pub fn first_posts(&self) -> PendingRequest<PostsPagination> {
        self.posts(PostsRequestOptions::page(PageRequest::default()))
    }

    /// Fetch a single post
    pub fn post_with_id(&self, id: PostId, options: PostsRequestOptions) -> PendingRequest<Posts> {
        self.without_body(Endpoint::GetPost(id), options)
    }

    /// Create a post
    pub fn add_post(&self, post: &Post) -> Result<PendingRequest<Posts>> {
        let request = RequestBuilder::new(Endpoint::AddPost, &self.base_url)
            .input(post)?
            .query(PostsRequestOptions::default().query())
            .build()?;
        Ok(self.submit(request))
    }

    /// Save changes to an existing post
    pub fn update_post(&self, post: &PersistedPost) -> Result<PendingRequest<Posts>> {
        let request = RequestBuilder::new(Endpoint::UpdatePost(post.id()), &self.base_url)
            .input(post)?
            .query(PostsRequestOptions::default().query())
            .build()?;
        Ok(self.submit(request))
    }

    /// Delete a post
    pub fn delete_post(&self, post: &PersistedPost) -> PendingRequest<Posts> {
        self.without_body(Endpoint::DeletePost(post.id()), PostsRequestOptions::default())
    }

    /// List tags
    pub fn tags(&self) -> PendingRequest<TagsPagination> {
        match RequestBuilder::new(Endpoint::GetTags, &self.base_url).build() {
            Ok(request) => self.submit(request),
            Err(e) => PendingRequest::new(async move { Err(e) }),
        }
    }

    /// Upload an image, resolving to its location on the server
    pub fn upload(&self, source: &UploadSource) -> Result<PendingRequest<String>> {
        let request = RequestBuilder::new(Endpoint::Uploads, &self.base_url)
            .input(source)?
            .build()?;
        Ok(self.submit(request))
    }

    /// Bodiless request; build errors are reported when awaited
    fn without_body<T>(&self, endpoint: Endpoint, options: PostsRequestOptions) -> PendingRequest<T>
    where
        T: JsonDecode + Send + 'static,
    {
        let built = RequestBuilder::new(endpoint, &self.base_url)
            .query(options.query())
            .build();
        match built {
            Ok(request) => self.submit(request),
            Err(e) => PendingRequest::new(async move { Err(e) }),
        }
    }

    fn submit<T>(&self, request: Request) -> PendingRequest<T>
    where
        T: JsonDecode + Send + 'static,
    {
        let session = self.session.clone();
        PendingRequest::new(async move { session.execute(&request).await?.decode() })
    }
}
