use thiserror::Error;

use super::session::{SessionError, SessionStore, VISITOR_TRACKED};
use crate::geo::GeoLocator;
use crate::record::VisitorRecord;

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("posting visit failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("tracking endpoint answered HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Posts one visit to the tracking endpoint.
#[derive(Debug, Clone)]
pub struct Reporter {
    client: reqwest::Client,
    endpoint: String,
    geo: GeoLocator,
}

impl Reporter {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, geo: GeoLocator) -> Self {
        Reporter {
            client,
            endpoint: endpoint.into(),
            geo,
        }
    }

    pub async fn try_report(
        &self,
        store: &mut impl SessionStore,
        mut record: VisitorRecord,
    ) -> Result<(), TrackError> {
        let (ip, location) = self.geo.locate_self().await;
        record.ip_address = Some(ip);
        record.location = Some(location.to_string());

        let resp = self.client.post(&self.endpoint).json(&record).send().await?;
        if !resp.status().is_success() {
            return Err(TrackError::Status(resp.status()));
        }
        store.set(VISITOR_TRACKED, "true")?;
        Ok(())
    }

    /// Best effort: errors are logged and reported as `false`.
    pub async fn report(&self, store: &mut impl SessionStore, record: VisitorRecord) -> bool {
        match self.try_report(store, record).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("failed to track visitor: {e}");
                false
            }
        }
    }
}
