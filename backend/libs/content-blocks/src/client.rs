/// HTTP client for the post create/update protocol
use crate::editor::Draft;
use crate::post::PostDocument;
use crate::preview::PreviewStore;
use crate::submission::AssembleError;
use reqwest::header::COOKIE;
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Assemble(#[from] AssembleError),

    #[error("Server returned {status}: {message}")]
    Api { status: StatusCode, message: String },
}

#[derive(Deserialize)]
struct SavedPost {
    data: PostDocument,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct BlogClient {
    http: reqwest::Client,
    base_url: String,
    session: Option<String>,
}

impl BlogClient {
    /// `base_url` is the API root, e.g. `http://localhost:8080/api`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: None,
        }
    }

    /// Attach the signed `token` cookie value obtained at sign-in
    pub fn with_session(mut self, cookie_value: impl Into<String>) -> Self {
        self.session = Some(cookie_value.into());
        self
    }

    pub async fn create_post<P: PreviewStore>(
        &self,
        draft: &Draft<P>,
    ) -> Result<PostDocument, ClientError> {
        let url = format!("{}/blocks/create", self.base_url);
        self.submit(self.http.post(url), draft).await
    }

    pub async fn update_post<P: PreviewStore>(
        &self,
        post_id: Uuid,
        draft: &Draft<P>,
    ) -> Result<PostDocument, ClientError> {
        let url = format!("{}/admin/updateBLogs/{}", self.base_url, post_id);
        self.submit(self.http.put(url), draft).await
    }

    async fn submit<P: PreviewStore>(
        &self,
        request: RequestBuilder,
        draft: &Draft<P>,
    ) -> Result<PostDocument, ClientError> {
        let submission = draft.assemble()?;
        let file_count = submission.files.len();
        let form = submission.into_form()?;

        let request = match &self.session {
            Some(token) => request.header(COOKIE, format!("token={token}")),
            None => request,
        };

        tracing::debug!(files = file_count, "submitting post");
        let response = request.multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|b| b.message)
                .unwrap_or_else(|_| status.to_string());
            return Err(ClientError::Api { status, message });
        }

        Ok(response.json::<SavedPost>().await?.data)
    }
}
