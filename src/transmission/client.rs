//! Transmission JSON-RPC client over HTTP.

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};

use super::daemon::TorrentDaemon;
use super::sort::SortSpec;
use super::types::{AddedTorrent, Torrent, TORRENT_FIELDS};
use crate::config::TransmissionConfig;
use crate::error::{Error, Result};

const SESSION_HEADER: &str = "X-Transmission-Session-Id";
const SUCCESS: &str = "success";

#[derive(Serialize)]
struct RpcRequest<'a, A> {
    method: &'a str,
    arguments: A,
}

#[derive(Deserialize)]
struct RpcResponse<R> {
    result: String,
    arguments: Option<R>,
}

#[derive(Serialize)]
struct IdsArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    ids: Option<Vec<i64>>,
}

#[derive(Serialize)]
struct GetArgs<'a> {
    fields: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    ids: Option<Vec<i64>>,
}

#[derive(Serialize)]
struct RemoveArgs {
    ids: Vec<i64>,
    #[serde(rename = "delete-local-data")]
    delete_local_data: bool,
}

#[derive(Serialize)]
struct AddArgs<'a> {
    filename: &'a str,
}

#[derive(Serialize)]
struct NoArgs {}

#[derive(Deserialize, Default)]
struct TorrentsReply {
    #[serde(default)]
    torrents: Vec<Torrent>,
}

#[derive(Deserialize, Default)]
struct AddReply {
    #[serde(rename = "torrent-added")]
    added: Option<AddedTorrent>,
    #[serde(rename = "torrent-duplicate")]
    duplicate: Option<AddedTorrent>,
}

#[derive(Deserialize, Default)]
struct SessionReply {
    #[serde(default)]
    version: String,
}

/// Client for a Transmission daemon.
///
/// The session id handed out by the daemon is cached and refreshed on a
/// 409 reply. Listing order is owned here and only changes through
/// `set_sort`.
pub struct TransmissionClient {
    http: Client,
    url: String,
    credentials: Option<(String, String)>,
    session_id: Mutex<Option<String>>,
    sort: SortSpec,
}

impl TransmissionClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            url: url.into(),
            credentials: None,
            session_id: Mutex::new(None),
            sort: SortSpec::default(),
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    pub fn from_config(config: &TransmissionConfig) -> Self {
        let client = Self::new(config.url.clone());
        match &config.username {
            Some(user) => client.with_credentials(user.clone(), config.password.clone().unwrap_or_default()),
            None => client,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    fn session_id(&self) -> Option<String> {
        self.session_id
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }

    fn store_session_id(&self, id: String) {
        if let Ok(mut guard) = self.session_id.lock() {
            *guard = Some(id);
        }
    }

    /// Issue one RPC call. Retries once after a session id handshake.
    async fn call<A, R>(&self, method: &str, arguments: A) -> Result<RpcResponse<R>>
    where
        A: Serialize + Send + Sync,
        R: DeserializeOwned,
    {
        let body = RpcRequest { method, arguments };

        for _ in 0..2 {
            let mut request = self.http.post(&self.url).json(&body);
            if let Some((user, pass)) = &self.credentials {
                request = request.basic_auth(user, Some(pass));
            }
            if let Some(id) = self.session_id() {
                request = request.header(SESSION_HEADER, id);
            }

            let response = request.send().await?;
            if response.status() == StatusCode::CONFLICT {
                let id = response
                    .headers()
                    .get(SESSION_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| Error::Rpc("daemon sent 409 without a session id".to_string()))?;
                tracing::debug!("Refreshed transmission session id");
                self.store_session_id(id.to_string());
                continue;
            }

            let reply: RpcResponse<R> = response.error_for_status()?.json().await?;
            tracing::debug!(method, result = %reply.result, "transmission rpc");
            if reply.result != SUCCESS {
                return Err(Error::Rpc(reply.result));
            }
            return Ok(reply);
        }

        Err(Error::Rpc("session id handshake failed".to_string()))
    }

    async fn act(&self, method: &str, ids: Option<Vec<i64>>) -> Result<String> {
        let reply: RpcResponse<IgnoredAny> = self.call(method, IdsArgs { ids }).await?;
        Ok(reply.result)
    }

    async fn get_torrents(&self, ids: Option<Vec<i64>>) -> Result<Vec<Torrent>> {
        let args = GetArgs {
            fields: TORRENT_FIELDS,
            ids,
        };
        let reply: RpcResponse<TorrentsReply> = self.call("torrent-get", args).await?;
        Ok(reply.arguments.unwrap_or_default().torrents)
    }
}

#[async_trait]
impl TorrentDaemon for TransmissionClient {
    async fn stop_all(&self) -> Result<()> {
        self.act("torrent-stop", None).await.map(drop)
    }

    async fn start_all(&self) -> Result<()> {
        self.act("torrent-start", None).await.map(drop)
    }

    async fn verify_all(&self) -> Result<()> {
        self.act("torrent-verify", None).await.map(drop)
    }

    async fn stop_torrent(&self, id: i64) -> Result<String> {
        self.act("torrent-stop", Some(vec![id])).await
    }

    async fn start_torrent(&self, id: i64) -> Result<String> {
        self.act("torrent-start", Some(vec![id])).await
    }

    async fn verify_torrent(&self, id: i64) -> Result<String> {
        self.act("torrent-verify", Some(vec![id])).await
    }

    async fn delete_torrent(&self, id: i64, delete_data: bool) -> Result<String> {
        let torrent = self.get_torrent(id).await?;
        let args = RemoveArgs {
            ids: vec![id],
            delete_local_data: delete_data,
        };
        let _: RpcResponse<IgnoredAny> = self.call("torrent-remove", args).await?;
        Ok(torrent.name)
    }

    async fn get_torrent(&self, id: i64) -> Result<Torrent> {
        self.get_torrents(Some(vec![id]))
            .await?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::NotFound(format!("no torrent with an ID of {}", id)))
    }

    async fn add_by_url(&self, url: &str) -> Result<AddedTorrent> {
        let reply: RpcResponse<AddReply> = self.call("torrent-add", AddArgs { filename: url }).await?;
        let reply = reply.arguments.unwrap_or_default();
        Ok(reply.added.or(reply.duplicate).unwrap_or_default())
    }

    async fn version(&self) -> Result<String> {
        let reply: RpcResponse<SessionReply> = self.call("session-get", NoArgs {}).await?;
        Ok(reply.arguments.unwrap_or_default().version)
    }

    async fn list_torrents(&self) -> Result<Vec<Torrent>> {
        let mut torrents = self.get_torrents(None).await?;
        self.sort.apply(&mut torrents);
        Ok(torrents)
    }

    fn set_sort(&mut self, spec: SortSpec) {
        tracing::info!(field = %spec.field, reversed = spec.reversed, "Sort order changed");
        self.sort = spec;
    }
}
