//! HTTP access to the TaskDeck server.
//!
//! Every authenticated call goes through [`ApiClient::authorized`]: it fails
//! with [`ClientError::NoCredentials`] before touching the network when the
//! session holds no token, and any 401 ends the session before the error is
//! returned. Components depend on the [`AuthApi`], [`TaskApi`] and
//! [`ProfileApi`] traits, not on `ApiClient` itself.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use taskdeck::{
    ErrorBody, LoginRequest, LoginResponse, PasswordChange, ProfileUpdate, RegisterRequest, Task,
    TaskPayload, UserSummary,
};

use crate::{
    error::ClientError,
    session::{SessionHandle, SignOutReason},
};

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn register(&self, request: &RegisterRequest) -> Result<UserSummary, ClientError>;
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError>;
}

#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list_tasks(&self) -> Result<Vec<Task>, ClientError>;
    async fn create_task(&self, payload: &TaskPayload) -> Result<Task, ClientError>;
    async fn update_task(&self, id: &str, payload: &TaskPayload) -> Result<Task, ClientError>;
    async fn delete_task(&self, id: &str) -> Result<(), ClientError>;
}

#[async_trait]
pub trait ProfileApi: Send + Sync {
    async fn current_user(&self) -> Result<UserSummary, ClientError>;
    async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserSummary, ClientError>;
    async fn change_password(&self, change: &PasswordChange) -> Result<(), ClientError>;
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: SessionHandle,
}

impl ApiClient {
    /// `base_url` is the server origin, e.g. `http://localhost:4000`.
    pub fn new(base_url: impl Into<String>, session: SessionHandle) -> Self {
        Self::with_client(Client::new(), base_url, session)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>, session: SessionHandle) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            session,
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request carrying the session's bearer token.
    async fn authorized<F>(&self, method: Method, path: &str, build: F) -> Result<Response, ClientError>
    where
        F: FnOnce(RequestBuilder) -> RequestBuilder + Send,
    {
        let token = self.session.token().ok_or(ClientError::NoCredentials)?;
        let request = build(self.http.request(method, self.url(path)).bearer_auth(token));
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        debug!("{} {status}", response.url().path());
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .map(|body| body.message)
            .filter(|message| !message.trim().is_empty());

        Err(match status {
            StatusCode::UNAUTHORIZED => {
                warn!("server rejected the request as unauthorized, ending session");
                self.session.end(SignOutReason::Unauthorized);
                ClientError::Unauthorized(message)
            }
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            _ => ClientError::Rejected {
                status: status.as_u16(),
                message,
            },
        })
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn register(&self, request: &RegisterRequest) -> Result<UserSummary, ClientError> {
        let builder = self.http.post(self.url("/api/user/register")).json(request);
        Ok(self.dispatch(builder).await?.json().await?)
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError> {
        let builder = self.http.post(self.url("/api/user/login")).json(request);
        Ok(self.dispatch(builder).await?.json().await?)
    }
}

#[async_trait]
impl TaskApi for ApiClient {
    async fn list_tasks(&self) -> Result<Vec<Task>, ClientError> {
        let response = self.authorized(Method::GET, "/api/tasks", |req| req).await?;
        Ok(response.json().await?)
    }

    async fn create_task(&self, payload: &TaskPayload) -> Result<Task, ClientError> {
        let response = self
            .authorized(Method::POST, "/api/tasks", |req| req.json(payload))
            .await?;
        Ok(response.json().await?)
    }

    async fn update_task(&self, id: &str, payload: &TaskPayload) -> Result<Task, ClientError> {
        let path = format!("/api/tasks/{id}");
        let response = self
            .authorized(Method::PUT, &path, |req| req.json(payload))
            .await?;
        Ok(response.json().await?)
    }

    async fn delete_task(&self, id: &str) -> Result<(), ClientError> {
        let path = format!("/api/tasks/{id}");
        self.authorized(Method::DELETE, &path, |req| req).await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileApi for ApiClient {
    async fn current_user(&self) -> Result<UserSummary, ClientError> {
        let response = self.authorized(Method::GET, "/api/user/me", |req| req).await?;
        Ok(response.json().await?)
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserSummary, ClientError> {
        let response = self
            .authorized(Method::PUT, "/api/user/profile", |req| req.json(update))
            .await?;
        let user: UserSummary = response.json().await?;
        self.session.update_user(user.clone());
        Ok(user)
    }

    async fn change_password(&self, change: &PasswordChange) -> Result<(), ClientError> {
        self.authorized(Method::PUT, "/api/user/password", |req| req.json(change))
            .await?;
        Ok(())
    }
}
