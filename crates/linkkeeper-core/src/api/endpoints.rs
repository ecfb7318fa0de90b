//! Typed operations on top of `SessionClient`.

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::models::{
    AuthResponse, Content, ContentSearch, LoginRequest, MessageResponse, NewContent,
    ProfileUpdate, RegisterRequest, ShareStatus, SharedCollection, Tag, User,
};

use super::{paths, ApiError, ApiRequest, SessionClient};

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    user: Option<User>,
}

#[derive(Debug, Deserialize)]
struct ContentListEnvelope {
    #[serde(default)]
    content: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    contents: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct ContentEnvelope {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct CreatedEnvelope {
    #[serde(rename = "_id")]
    id: Option<String>,
    content: Option<CreatedContent>,
}

#[derive(Debug, Deserialize)]
struct CreatedContent {
    #[serde(rename = "_id")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct TagEnvelope {
    tag: Option<Tag>,
}

/// Shared-collection lookup; the backend answers 200 with no username for
/// unknown hashes.
#[derive(Debug, Deserialize)]
struct SharedEnvelope {
    username: Option<String>,
    #[serde(default)]
    content: Vec<Content>,
}

fn missing(field: &str) -> ApiError {
    ApiError::InvalidResponse(format!("response is missing '{}'", field))
}

impl SessionClient {
    // ===== Account =====

    pub async fn register(&self, payload: &RegisterRequest) -> Result<Option<String>, ApiError> {
        let request = ApiRequest::post(paths::REGISTER).without_auth().json(payload)?;
        let response: MessageResponse = self.send(&request).await?;
        Ok(response.message)
    }

    /// Log in and adopt the returned credential.
    pub async fn login(&self, payload: &LoginRequest) -> Result<User, ApiError> {
        let request = ApiRequest::post(paths::LOGIN).without_auth().json(payload)?;
        let response: AuthResponse = self.send(&request).await?;

        let user = response.user.ok_or_else(|| missing("user"))?;
        let token = response
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| missing("accessToken"))?;

        self.set_credential(token);
        debug!(user_id = %user.id, "Logged in");
        Ok(user)
    }

    /// Identity behind the current credential.
    pub async fn me(&self) -> Result<User, ApiError> {
        self.fetch_me(ApiRequest::get(paths::ME)).await
    }

    pub(crate) async fn fetch_me(&self, request: ApiRequest) -> Result<User, ApiError> {
        let response: UserEnvelope = self.send(&request).await?;
        response.user.ok_or_else(|| missing("user"))
    }

    /// Invalidate the session server-side. Does not touch the local credential.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.execute(&ApiRequest::post(paths::LOGOUT)).await?;
        Ok(())
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Option<String>, ApiError> {
        let request = ApiRequest::patch(paths::UPDATE_PROFILE).json(update)?;
        let response: MessageResponse = self.send(&request).await?;
        Ok(response.message)
    }

    /// Delete the account and drop the local credential.
    pub async fn delete_account(&self) -> Result<Option<String>, ApiError> {
        let response: MessageResponse = self.send(&ApiRequest::delete(paths::ACCOUNT)).await?;
        self.clear_credential();
        Ok(response.message)
    }

    // ===== Content =====

    pub async fn add_content(&self, new: &NewContent) -> Result<Content, ApiError> {
        let request = ApiRequest::post(paths::CONTENT_ADD).json(new)?;
        let response: CreatedEnvelope = self.send(&request).await?;
        let id = response
            .id
            .or(response.content.map(|c| c.id))
            .ok_or_else(|| missing("_id"))?;

        Ok(Content {
            id,
            title: new.title.clone(),
            link: new.link.clone(),
            kind: new.kind,
            tags: Vec::new(),
            created_at: None,
        })
    }

    pub async fn list_content(&self) -> Result<Vec<Content>, ApiError> {
        let response: ContentListEnvelope = self.send(&ApiRequest::get(paths::CONTENT_LIST)).await?;
        debug!(count = response.content.len(), "Fetched content");
        Ok(response.content)
    }

    pub async fn delete_content(&self, id: &str) -> Result<Option<String>, ApiError> {
        let response: MessageResponse = self
            .send(&ApiRequest::delete(paths::content_item(id)))
            .await?;
        Ok(response.message)
    }

    pub async fn search_content(&self, search: &ContentSearch) -> Result<Vec<Content>, ApiError> {
        let request = ApiRequest::get(paths::CONTENT_SEARCH).query_pairs(search.query_pairs());
        let response: SearchEnvelope = self.send(&request).await?;
        Ok(response.contents)
    }

    // ===== Tags =====

    pub async fn add_tag(&self, title: &str) -> Result<Tag, ApiError> {
        let request = ApiRequest::post(paths::TAG_ADD).json(&json!({ "title": title }))?;
        let response: TagEnvelope = self.send(&request).await?;
        response.tag.ok_or_else(|| missing("tag"))
    }

    /// Attach tags to a saved link; returns the updated link.
    pub async fn tag_content(&self, content_id: &str, tag_ids: &[String]) -> Result<Content, ApiError> {
        let request = ApiRequest::post(paths::CONTENT_TAGS)
            .json(&json!({ "contentId": content_id, "tagIds": tag_ids }))?;
        let response: ContentEnvelope = self.send(&request).await?;
        response.content.ok_or_else(|| missing("content"))
    }

    pub async fn untag_content(&self, content_id: &str, tag_id: &str) -> Result<Content, ApiError> {
        let request = ApiRequest::delete(paths::content_tag(content_id, tag_id));
        let response: ContentEnvelope = self.send(&request).await?;
        response.content.ok_or_else(|| missing("content"))
    }

    // ===== Sharing =====

    pub async fn share_status(&self) -> Result<ShareStatus, ApiError> {
        self.send(&ApiRequest::get(paths::SHARE_STATUS)).await
    }

    /// Publish or unpublish the collection.
    pub async fn set_sharing(&self, share: bool) -> Result<ShareStatus, ApiError> {
        let request = ApiRequest::post(paths::SHARE_TOGGLE).json(&json!({ "share": share }))?;
        let mut status: ShareStatus = self.send(&request).await?;
        status.share = share;
        if !share {
            status.hash = None;
        }
        Ok(status)
    }

    /// Public collection behind a share hash. Needs no session.
    pub async fn shared_collection(&self, hash: &str) -> Result<SharedCollection, ApiError> {
        let hash = hash.trim();
        if hash.is_empty() {
            return Err(ApiError::InvalidRequest("share hash is empty".to_string()));
        }
        let request = ApiRequest::get(paths::content_item(hash))
            .without_auth()
            .without_refresh();
        let response: SharedEnvelope = self.send(&request).await?;
        match response.username {
            Some(username) if !username.is_empty() => Ok(SharedCollection {
                username,
                content: response.content,
            }),
            _ => Err(ApiError::NotFound("Invalid link or user does not exist".to_string())),
        }
    }
}
