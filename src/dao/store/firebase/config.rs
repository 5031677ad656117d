use super::error::{FirebaseDaoError, FirebaseResult};
use crate::config::WebClientConfig;

const API_KEY: &str = "FIREBASE_API_KEY";
const AUTH_DOMAIN: &str = "FIREBASE_AUTH_DOMAIN";
const DATABASE_URL: &str = "FIREBASE_DATABASE_URL";
const PROJECT_ID: &str = "FIREBASE_PROJECT_ID";
const STORAGE_BUCKET: &str = "FIREBASE_STORAGE_BUCKET";
const MESSAGING_SENDER_ID: &str = "FIREBASE_MESSAGING_SENDER_ID";
const APP_ID: &str = "FIREBASE_APP_ID";
const DATABASE_SECRET: &str = "FIREBASE_DATABASE_SECRET";

/// Runtime configuration describing how to reach a Firebase project.
#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub auth_domain: String,
    pub database_url: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub messaging_sender_id: String,
    pub app_id: String,
    /// Legacy database secret or access token sent as the `auth` query parameter.
    pub database_secret: Option<String>,
}

impl FirebaseConfig {
    /// Build a configuration by reading the seven required environment variables.
    pub fn from_env() -> FirebaseResult<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> FirebaseResult<Self> {
        let require = |var: &'static str| {
            lookup(var)
                .filter(|value| !value.trim().is_empty())
                .ok_or(FirebaseDaoError::MissingEnvVar { var })
        };

        Ok(Self {
            api_key: require(API_KEY)?,
            auth_domain: require(AUTH_DOMAIN)?,
            database_url: require(DATABASE_URL)?,
            project_id: require(PROJECT_ID)?,
            storage_bucket: require(STORAGE_BUCKET)?,
            messaging_sender_id: require(MESSAGING_SENDER_ID)?,
            app_id: require(APP_ID)?,
            database_secret: lookup(DATABASE_SECRET).filter(|value| !value.is_empty()),
        })
    }

    /// Public parameters a browser client needs to initialise its own SDK.
    pub fn web_client(&self) -> WebClientConfig {
        WebClientConfig {
            api_key: self.api_key.clone(),
            auth_domain: self.auth_domain.clone(),
            database_url: self.database_url.clone(),
            project_id: self.project_id.clone(),
            storage_bucket: self.storage_bucket.clone(),
            messaging_sender_id: self.messaging_sender_id.clone(),
            app_id: self.app_id.clone(),
        }
    }
}
