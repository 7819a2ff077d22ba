//! Reference resolution.
//!
//! Fetches a root document and replaces the stubs named by a
//! [`ResolutionPlan`] with their fetched bodies, stage by stage. All slots of
//! a stage are fetched concurrently; results are written back by slot index
//! once the whole stage has completed.
//!
//! Resolution is all-or-nothing: the first failed fetch aborts the run,
//! drops every outstanding fetch, and no partial document is returned.

use crate::plan::{PathError, ResolutionPlan, Slot};
use futures::future::try_join_all;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use waybill_view_client::{FetchError, ResourceFetcher};
use waybill_view_core::{Identifier, ModelError, Shipment};

/// Resolves root documents according to a plan.
pub struct Resolver<F> {
    fetcher: F,
    plan: ResolutionPlan,
}

impl<F: ResourceFetcher> Resolver<F> {
    /// Resolver using the default shipment plan.
    pub fn new(fetcher: F) -> Self {
        Self::with_plan(fetcher, ResolutionPlan::shipment())
    }

    /// Resolver using a custom plan.
    pub fn with_plan(fetcher: F, plan: ResolutionPlan) -> Self {
        Self { fetcher, plan }
    }

    /// The plan this resolver executes.
    pub fn plan(&self) -> &ResolutionPlan {
        &self.plan
    }

    /// Resolve the shipment at `root` into a view model.
    ///
    /// # Errors
    ///
    /// Returns error if any fetch fails, a planned slot is missing or is not
    /// a stub, or the resolved document is not a shipment.
    pub async fn resolve(&self, root: &Identifier) -> Result<Shipment, ResolveError> {
        let (doc, resolved) = self.run(root).await?;
        let mut shipment = Shipment::from_value(doc).map_err(ResolveError::Decode)?;
        for pointer in &resolved {
            shipment
                .mark_resolved(pointer)
                .map_err(ResolveError::Decode)?;
        }
        Ok(shipment)
    }

    /// Like [`Resolver::resolve`], but gives up as soon as `cancel` fires.
    ///
    /// Cancelling drops every in-flight fetch of the run.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Cancelled`] if cancelled first, otherwise the
    /// errors of [`Resolver::resolve`].
    pub async fn resolve_with_cancel(
        &self,
        root: &Identifier,
        cancel: &CancellationToken,
    ) -> Result<Shipment, ResolveError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!(%root, "Resolution cancelled");
                Err(ResolveError::Cancelled)
            }
            result = self.resolve(root) => result,
        }
    }

    /// Fetch `root` and run the plan over it, returning the raw document.
    ///
    /// # Errors
    ///
    /// Returns error if any fetch fails or a planned slot is missing or is
    /// not a stub.
    pub async fn resolve_document(&self, root: &Identifier) -> Result<Value, ResolveError> {
        self.run(root).await.map(|(doc, _)| doc)
    }

    /// Resolve `root`, also returning the pointers of every replaced slot in
    /// the order they were written.
    async fn run(&self, root: &Identifier) -> Result<(Value, Vec<String>), ResolveError> {
        let run_id = Uuid::new_v4();
        tracing::debug!(%run_id, %root, "Resolving document");

        let mut doc = self.fetch(root).await?;
        let mut resolved = Vec::new();

        for (stage_index, stage) in self.plan.stages().enumerate() {
            let mut slots: Vec<Slot> = Vec::new();
            for step in &stage {
                let found = step.target().slots(&doc).map_err(|source| ResolveError::Path {
                    step: step.name().to_string(),
                    source,
                })?;
                tracing::debug!(
                    %run_id,
                    stage = stage_index,
                    step = step.name(),
                    slots = found.len(),
                    "Resolving step"
                );
                slots.extend(found);
            }

            let bodies =
                try_join_all(slots.iter().map(|slot| self.fetch(&slot.reference.id))).await?;

            for (slot, body) in slots.into_iter().zip(bodies) {
                let target = doc.pointer_mut(&slot.pointer).ok_or_else(|| ResolveError::Path {
                    step: format!("stage {stage_index}"),
                    source: PathError::MissingField(slot.pointer.clone()),
                })?;
                *target = body;
                resolved.push(slot.pointer);
            }
        }

        tracing::debug!(%run_id, %root, "Document resolved");
        Ok((doc, resolved))
    }

    async fn fetch(&self, id: &Identifier) -> Result<Value, ResolveError> {
        self.fetcher
            .fetch(id)
            .await
            .map_err(|source| ResolveError::Fetch {
                id: id.clone(),
                source,
            })
    }
}

/// Errors that abort a resolution run.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolveError {
    /// A resource could not be fetched
    #[error("failed to fetch {id}: {source}")]
    Fetch {
        /// Identifier that failed
        id: Identifier,
        /// Underlying fetch error
        source: FetchError,
    },
    /// A planned slot could not be located
    #[error("step {step}: {source}")]
    Path {
        /// Step whose target failed
        step: String,
        /// What was wrong with the document
        source: PathError,
    },
    /// The resolved document is not a shipment
    #[error(transparent)]
    Decode(ModelError),
    /// The run was cancelled before completing
    #[error("resolution cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{CONTAINED_WAYBILLS, MASTER_WAYBILL};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use waybill_view_client::StaticFetcher;

    fn id(s: &str) -> Identifier {
        Identifier::new(s)
    }

    fn fixture() -> StaticFetcher {
        StaticFetcher::new()
            .with(
                "urn:s1",
                json!({
                    "id": "urn:s1",
                    "parties": [
                        {"partyRole": "SHIPPER", "partyDetails": {"id": "urn:p1"}},
                        {"partyRole": "CONSIGNEE", "partyDetails": {"id": "urn:p2"}}
                    ],
                    "deliveryLocation": {"id": "urn:l1"},
                    "waybillNumber": {"id": "urn:w1"}
                }),
            )
            .with("urn:l1", json!({"id": "urn:l1", "locationName": "Rotterdam"}))
            .with(
                "urn:w1",
                json!({
                    "id": "urn:w1",
                    "waybillPrefix": "020",
                    "waybillNumber": "11112222",
                    "waybillType": "MASTER",
                    "containedWaybills": [{"id": "urn:c1"}, {"id": "urn:c2"}]
                }),
            )
            .with(
                "urn:c1",
                json!({"id": "urn:c1", "waybillPrefix": "020", "waybillNumber": "1", "waybillType": "HOUSE"}),
            )
            .with(
                "urn:c2",
                json!({"id": "urn:c2", "waybillPrefix": "020", "waybillNumber": "2", "waybillType": "HOUSE"}),
            )
            .with("urn:p1", json!({"id": "urn:p1", "name": "Acme"}))
            .with("urn:p2", json!({"id": "urn:p2", "name": "Globex"}))
    }

    #[tokio::test]
    async fn resolves_location_and_waybills() {
        let fetcher = Arc::new(fixture());
        let resolver = Resolver::new(Arc::clone(&fetcher));

        let shipment = resolver.resolve(&id("urn:s1")).await.unwrap();

        assert!(shipment.is_fully_resolved());
        assert_eq!(
            shipment.delivery_location.resolved().unwrap()["locationName"],
            "Rotterdam"
        );
        let contained: Vec<_> = shipment.contained_waybills().map(|w| w.id.as_str()).collect();
        assert_eq!(contained, vec!["urn:c1", "urn:c2"]);
        assert_eq!(fetcher.request_count(), 5);
    }

    #[tokio::test]
    async fn id_only_bodies_count_as_resolved() {
        let fetcher = fixture()
            .with("urn:l1", json!({"id": "urn:l1"}))
            .with("urn:c2", json!({"id": "urn:c2"}));
        let resolver = Resolver::new(fetcher);

        let shipment = resolver.resolve(&id("urn:s1")).await.unwrap();

        assert!(shipment.delivery_location.is_resolved());
        assert!(shipment.is_fully_resolved());
        assert_eq!(
            shipment.delivery_location.resolved(),
            Some(&json!({"id": "urn:l1"}))
        );
        let contained: Vec<_> = shipment.contained_waybills().map(|w| w.id.as_str()).collect();
        assert_eq!(contained, vec!["urn:c1", "urn:c2"]);
    }

    #[tokio::test]
    async fn parties_are_not_fetched_by_default() {
        let fetcher = Arc::new(fixture());
        let resolver = Resolver::new(Arc::clone(&fetcher));

        let shipment = resolver.resolve(&id("urn:s1")).await.unwrap();

        assert!(shipment
            .parties
            .iter()
            .all(|party| !party.party_details.is_resolved()));
        assert_eq!(shipment.parties[1].details_id(), Some("urn:p2"));
        assert!(!fetcher
            .requests()
            .iter()
            .any(|r| r.as_str().starts_with("urn:p")));
    }

    #[tokio::test]
    async fn party_plan_fetches_each_party() {
        let fetcher = Arc::new(fixture());
        let resolver =
            Resolver::with_plan(Arc::clone(&fetcher), ResolutionPlan::shipment_with_parties());

        let shipment = resolver.resolve(&id("urn:s1")).await.unwrap();

        assert!(shipment.parties.iter().all(|p| p.party_details.is_resolved()));
        assert_eq!(fetcher.request_count(), 7);
    }

    #[tokio::test]
    async fn contained_order_ignores_completion_order() {
        let fetcher = Arc::new(
            fixture()
                .with_delay("urn:c1", Duration::from_millis(60))
                .with_delay("urn:c2", Duration::from_millis(5)),
        );
        let resolver = Resolver::new(Arc::clone(&fetcher));

        let shipment = resolver.resolve(&id("urn:s1")).await.unwrap();

        let contained: Vec<_> = shipment
            .contained_waybills()
            .map(|w| w.waybill_number.as_str())
            .collect();
        assert_eq!(contained, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn contained_waybills_fetched_after_master() {
        let fetcher = Arc::new(fixture().with_delay("urn:w1", Duration::from_millis(20)));
        let resolver = Resolver::new(Arc::clone(&fetcher));

        resolver.resolve(&id("urn:s1")).await.unwrap();

        let requests = fetcher.requests();
        let master = requests.iter().position(|r| r.as_str() == "urn:w1").unwrap();
        let first_contained = requests
            .iter()
            .position(|r| r.as_str().starts_with("urn:c"))
            .unwrap();
        assert_eq!(requests[0], id("urn:s1"));
        assert!(master < first_contained);
        assert_eq!(
            resolver.plan().step(CONTAINED_WAYBILLS).unwrap().after(),
            [MASTER_WAYBILL.to_string()]
        );
    }

    #[tokio::test]
    async fn location_failure_aborts_resolution() {
        let fetcher = fixture().with_failure("urn:l1");
        let resolver = Resolver::new(fetcher);

        let err = resolver.resolve(&id("urn:s1")).await.unwrap_err();
        assert!(
            matches!(err, ResolveError::Fetch { id: ref failed, .. } if failed.as_str() == "urn:l1")
        );
    }

    #[tokio::test]
    async fn contained_failure_aborts_resolution() {
        let fetcher = Arc::new(fixture().with_failure("urn:c2"));
        let resolver = Resolver::new(Arc::clone(&fetcher));

        let err = resolver.resolve(&id("urn:s1")).await.unwrap_err();
        assert!(matches!(err, ResolveError::Fetch { .. }));
    }

    #[tokio::test]
    async fn root_failure_aborts_before_plan() {
        let fetcher = Arc::new(StaticFetcher::new());
        let resolver = Resolver::new(Arc::clone(&fetcher));

        let err = resolver.resolve(&id("urn:missing")).await.unwrap_err();
        assert!(matches!(err, ResolveError::Fetch { .. }));
        assert_eq!(fetcher.request_count(), 1);
    }

    #[tokio::test]
    async fn missing_link_field_is_an_error() {
        let fetcher = StaticFetcher::new().with(
            "urn:s1",
            json!({"id": "urn:s1", "waybillNumber": {"id": "urn:w1"}}),
        );
        let resolver = Resolver::new(fetcher);

        let err = resolver.resolve(&id("urn:s1")).await.unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Path { source: PathError::MissingField(_), .. }
        ));
    }

    #[tokio::test]
    async fn empty_contained_list_resolves() {
        let fetcher = fixture().with(
            "urn:w1",
            json!({"id": "urn:w1", "waybillType": "MASTER", "containedWaybills": []}),
        );
        let resolver = Resolver::new(fetcher);

        let shipment = resolver.resolve(&id("urn:s1")).await.unwrap();
        assert!(shipment.is_fully_resolved());
        assert_eq!(shipment.contained_waybills().count(), 0);
    }

    #[tokio::test]
    async fn cancellation_stops_resolution() {
        let fetcher = fixture().with_delay("urn:w1", Duration::from_secs(30));
        let resolver = Resolver::new(fetcher);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = resolver
            .resolve_with_cancel(&id("urn:s1"), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Cancelled));
    }
}
