use std::sync::Arc;

use futures::{StreamExt, future::BoxFuture};
use reqwest::{Client, Method, Response, header::ACCEPT};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::dao::{
    storage::StorageResult,
    store::{DataStore, Snapshot, StorePath, Subscription},
};

use super::{
    config::FirebaseConfig,
    error::{FirebaseDaoError, FirebaseResult},
    events::{self, StreamEvent},
};

/// Path probed by health checks; `shallow` keeps the payload to a list of keys.
const HEALTH_PATH: &str = "sessions";

/// [`DataStore`] backed by the Firebase Realtime Database REST and streaming API.
#[derive(Clone)]
pub struct FirebaseStore {
    client: Client,
    base_url: Arc<str>,
    secret: Option<Arc<str>>,
}

impl FirebaseStore {
    /// Build the HTTP client and verify the database answers.
    pub async fn connect(config: &FirebaseConfig) -> FirebaseResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| FirebaseDaoError::ClientBuilder { source })?;

        let store = Self {
            client,
            base_url: Arc::from(config.database_url.trim_end_matches('/')),
            secret: config.database_secret.as_deref().map(Arc::from),
        };

        store.ping().await?;
        Ok(store)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}.json", self.base_url, path);
        let builder = self.client.request(method, url);
        match self.secret {
            Some(ref secret) => builder.query(&[("auth", secret.as_ref())]),
            None => builder,
        }
    }

    async fn ping(&self) -> FirebaseResult<()> {
        let response = self
            .request(Method::GET, HEALTH_PATH)
            .query(&[("shallow", "true")])
            .send()
            .await
            .map_err(|source| FirebaseDaoError::RequestSend {
                path: HEALTH_PATH.to_string(),
                source,
            })?;

        ensure_success(HEALTH_PATH, response).map(|_| ())
    }

    async fn get_value(&self, path: &str) -> FirebaseResult<Option<Value>> {
        let response = self
            .request(Method::GET, path)
            .send()
            .await
            .map_err(|source| FirebaseDaoError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        let value = ensure_success(path, response)?
            .json::<Value>()
            .await
            .map_err(|source| FirebaseDaoError::DecodeResponse {
                path: path.to_string(),
                source,
            })?;

        Ok((!value.is_null()).then_some(value))
    }

    async fn put_value(&self, path: &str, value: &Value) -> FirebaseResult<()> {
        let builder = if value.is_null() {
            self.request(Method::DELETE, path)
        } else {
            self.request(Method::PUT, path).json(value)
        };

        let response = builder
            .query(&[("print", "silent")])
            .send()
            .await
            .map_err(|source| FirebaseDaoError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        ensure_success(path, response).map(|_| ())
    }

    async fn open_stream(&self, path: &str) -> FirebaseResult<Response> {
        let response = self
            .request(Method::GET, path)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|source| FirebaseDaoError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        ensure_success(path, response)
    }

    /// Re-read the subscribed path on every data event and forward the snapshot.
    async fn forward_stream(
        self,
        path: String,
        response: Response,
        tx: mpsc::UnboundedSender<Snapshot>,
    ) {
        let stream = events::decode(response.bytes_stream());
        futures::pin_mut!(stream);

        while let Some(event) = stream.next().await {
            let StreamEvent { name, .. } = match event {
                Ok(event) => event,
                Err(err) => {
                    warn!(%path, error = %err, "Firebase stream interrupted");
                    break;
                }
            };

            match name.as_str() {
                "put" | "patch" => match self.get_value(&path).await {
                    Ok(snapshot) => {
                        if tx.send(snapshot).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        warn!(%path, error = %err, "failed to refresh subscribed path");
                        break;
                    }
                },
                "keep-alive" => continue,
                "cancel" | "auth_revoked" => {
                    warn!(%path, event = %name, "Firebase closed the stream");
                    break;
                }
                other => debug!(%path, event = other, "ignoring unknown stream event"),
            }
        }

        debug!(%path, "Firebase stream ended");
    }
}

fn ensure_success(path: &str, response: Response) -> FirebaseResult<Response> {
    match response.status() {
        status if status.is_success() => Ok(response),
        other => Err(FirebaseDaoError::RequestStatus {
            path: path.to_string(),
            status: other,
        }),
    }
}

impl DataStore for FirebaseStore {
    fn write(&self, path: StorePath, value: Value) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .put_value(&path.to_string(), &value)
                .await
                .map_err(Into::into)
        })
    }

    fn read(&self, path: StorePath) -> BoxFuture<'static, StorageResult<Option<Value>>> {
        let store = self.clone();
        Box::pin(async move { store.get_value(&path.to_string()).await.map_err(Into::into) })
    }

    fn subscribe(&self, path: StorePath) -> BoxFuture<'static, StorageResult<Subscription>> {
        let store = self.clone();
        Box::pin(async move {
            let path = path.to_string();
            let response = store.open_stream(&path).await?;

            let (tx, rx) = mpsc::unbounded_channel();
            let task = tokio::spawn(store.forward_stream(path, response, tx));
            let handle = task.abort_handle();
            Ok(Subscription::new(rx, move || handle.abort()))
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        // Requests are stateless; a successful probe is all reconnecting takes.
        self.health_check()
    }
}
