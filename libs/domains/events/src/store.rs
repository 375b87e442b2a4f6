//! Event persistence on top of a [`DocumentStore`].

use crate::codec;
use crate::error::Result;
use crate::models::Event;
use database::{DeleteTally, DocumentStore};
use tracing::{debug, instrument, warn};

/// Stores events as documents and reads them back.
pub struct EventStore<D: DocumentStore> {
    documents: D,
}

impl<D: DocumentStore> EventStore<D> {
    pub fn new(documents: D) -> Self {
        Self { documents }
    }

    pub fn documents(&self) -> &D {
        &self.documents
    }

    #[instrument(skip(self, event), fields(event_id = %event.id))]
    pub async fn add_event(&self, event: &Event) -> Result<()> {
        let document = codec::to_document(event)?;
        let meta = self.documents.insert(document).await?;
        debug!(doc_id = %meta.id, rev = %meta.rev, "Event stored");
        Ok(())
    }

    /// Every decodable event in store order. Documents that do not decode are skipped.
    pub async fn get_events(&self) -> Vec<Event> {
        self.documents
            .list_all()
            .await
            .into_iter()
            .filter_map(|document| {
                let doc_id = document
                    .get("_id")
                    .and_then(|id| id.as_str())
                    .unwrap_or_default()
                    .to_string();
                match codec::from_document(document) {
                    Ok(event) => Some(event),
                    Err(e) => {
                        warn!(doc_id = %doc_id, error = %e, "Skipping document that is not an event");
                        None
                    }
                }
            })
            .collect()
    }

    /// Number of stored events, `-1` when the store could not tell.
    pub async fn get_num_events(&self) -> i64 {
        self.documents.count().await
    }

    #[instrument(skip(self))]
    pub async fn remove_all_events(&self) -> Result<DeleteTally> {
        Ok(self.documents.delete_all().await?)
    }
}
