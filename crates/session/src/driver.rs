use std::sync::Arc;

use formats::OccupationEntry;
use scene::WageThresholdTable;
use streaming::{FetchError, FetchErrorKind, FetchTicket, RequestToken, WageTableSource};
use tokio::sync::mpsc;

use crate::machine::{FetchOutcome, Session, SessionEvent};
use crate::output::SessionOutput;

struct Arrival {
    token: RequestToken,
    result: Result<WageThresholdTable, FetchError>,
}

/// Reports exactly one arrival per spawned fetch. If the task unwinds or is
/// dropped before `send`, the arrival is reported as aborted so the driver's
/// in-flight count still settles.
struct ArrivalGuard {
    tx: mpsc::UnboundedSender<Arrival>,
    token: RequestToken,
    sent: bool,
}

impl ArrivalGuard {
    fn send(mut self, result: Result<WageThresholdTable, FetchError>) {
        self.sent = true;
        // The receiver only goes away with the driver.
        let _ = self.tx.send(Arrival {
            token: self.token,
            result,
        });
    }
}

impl Drop for ArrivalGuard {
    fn drop(&mut self) {
        if !self.sent {
            let _ = self.tx.send(Arrival {
                token: self.token,
                result: Err(FetchError::new(
                    FetchErrorKind::Aborted,
                    "fetch task ended without a result",
                )),
            });
        }
    }
}

/// Runs a `Session` against a wage-table source.
///
/// Every issued ticket becomes its own tokio task; arrivals are applied in
/// completion order and the session's token gate drops superseded ones.
pub struct SessionDriver<S: ?Sized> {
    session: Session,
    source: Arc<S>,
    tx: mpsc::UnboundedSender<Arrival>,
    rx: mpsc::UnboundedReceiver<Arrival>,
    in_flight: usize,
}

impl<S> SessionDriver<S>
where
    S: WageTableSource + ?Sized + 'static,
{
    pub fn new(session: Session, source: Arc<S>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            session,
            source,
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Number of spawned fetches whose result has not been applied yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn start(&mut self) {
        let ticket = self.session.start();
        self.spawn_fetch(ticket);
    }

    pub fn dispatch(&mut self, event: SessionEvent) {
        if let Some(ticket) = self.session.apply(event) {
            self.spawn_fetch(ticket);
        }
    }

    pub fn select_occupation(&mut self, entry: &OccupationEntry) {
        let ticket = self.session.select_occupation(entry);
        self.spawn_fetch(ticket);
    }

    fn spawn_fetch(&mut self, ticket: FetchTicket) {
        let source = Arc::clone(&self.source);
        let guard = ArrivalGuard {
            tx: self.tx.clone(),
            token: ticket.token,
            sent: false,
        };
        self.in_flight += 1;
        tokio::spawn(async move {
            let result = source.fetch(&ticket.occupation_key).await;
            guard.send(result);
        });
    }

    /// Waits for the next fetch to finish and applies it. `None` when
    /// nothing is in flight.
    pub async fn next_arrival(&mut self) -> Option<FetchOutcome> {
        if self.in_flight == 0 {
            return None;
        }
        let arrival = self.rx.recv().await?;
        self.in_flight -= 1;
        Some(self.session.resolve_fetch(arrival.token, arrival.result))
    }

    /// Applies every outstanding fetch, in arrival order.
    pub async fn settle(&mut self) -> Vec<FetchOutcome> {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.next_arrival().await {
            outcomes.push(outcome);
        }
        outcomes
    }

    pub fn drain_outputs(&mut self) -> Vec<SessionOutput> {
        self.session.drain_outputs()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use foundation::bounds::LngLat;
    use foundation::geometry::Geometry;
    use pretty_assertions::assert_eq;
    use scene::{
        LevelThresholds, LocationIndex, RegionCollection, RegionFeature, WageLevel,
        WageThresholdTable,
    };
    use streaming::{BoxFuture, FetchError, FetchErrorKind, MemorySource, WageTableSource};

    use super::SessionDriver;
    use crate::config::SessionConfig;
    use crate::machine::{FetchOutcome, Session, SessionEvent};
    use crate::output::SessionOutput;

    fn index() -> Arc<LocationIndex> {
        let square = Geometry::Polygon(vec![vec![
            LngLat::new(-119.0, 34.0),
            LngLat::new(-117.0, 34.0),
            LngLat::new(-117.0, 36.0),
            LngLat::new(-119.0, 34.0),
        ]]);
        Arc::new(LocationIndex::build(Arc::new(RegionCollection::new(vec![
            RegionFeature::new("06037", "06", "Los Angeles", Some(square)),
        ]))))
    }

    fn table(i: f64) -> WageThresholdTable {
        [(
            "CA|los angeles",
            LevelThresholds::new(Some(i), Some(i + 15.0), Some(i + 30.0), Some(i + 50.0)),
        )]
        .into_iter()
        .collect()
    }

    async fn source() -> Arc<MemorySource> {
        let src = MemorySource::new();
        src.set_table("11-1011", table(40.0)).await;
        src.set_table("slow", table(60.0)).await;
        src.set_table("fast", table(10.0)).await;
        src.set_delay("slow", Duration::from_millis(500)).await;
        src.set_delay("fast", Duration::from_millis(10)).await;
        Arc::new(src)
    }

    async fn driver() -> SessionDriver<MemorySource> {
        let session = Session::new(SessionConfig::default(), index());
        SessionDriver::new(session, source().await)
    }

    fn level(d: &SessionDriver<MemorySource>) -> Option<WageLevel> {
        d.session()
            .view()
            .classification("06037")
            .and_then(|c| c.level)
    }

    #[tokio::test(start_paused = true)]
    async fn start_loads_default_table() {
        let mut d = driver().await;
        d.start();
        assert_eq!(d.in_flight(), 1);
        assert_eq!(d.settle().await, vec![FetchOutcome::Applied]);
        assert_eq!(level(&d), Some(WageLevel::III));
        assert_eq!(d.next_arrival().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_superseded_response_is_dropped() {
        let mut d = driver().await;
        d.dispatch(SessionEvent::SetOccupation("slow".into()));
        d.dispatch(SessionEvent::SetOccupation("fast".into()));

        let outcomes = d.settle().await;
        assert_eq!(outcomes, vec![FetchOutcome::Applied, FetchOutcome::Stale]);
        // 150k ≈ 72.1/h is level IV against the fast table, I against slow.
        assert_eq!(level(&d), Some(WageLevel::IV));
        assert_eq!(d.session().selection().occupation_code, "fast");
    }

    #[tokio::test(start_paused = true)]
    async fn fast_superseded_response_is_dropped() {
        let mut d = driver().await;
        d.dispatch(SessionEvent::SetOccupation("fast".into()));
        d.dispatch(SessionEvent::SetOccupation("slow".into()));

        let outcomes = d.settle().await;
        assert_eq!(outcomes, vec![FetchOutcome::Stale, FetchOutcome::Applied]);
        assert_eq!(level(&d), Some(WageLevel::I));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_table_fails_soft() {
        let mut d = driver().await;
        d.start();
        d.settle().await;
        d.drain_outputs();

        d.dispatch(SessionEvent::SetOccupation("99-9999".into()));
        let outcomes = d.settle().await;
        assert!(matches!(&outcomes[..], [FetchOutcome::Failed(_)]));
        assert_eq!(level(&d), Some(WageLevel::III));
        assert!(d.drain_outputs().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn popup_follows_arrivals_without_moving() {
        let mut d = driver().await;
        d.start();
        d.settle().await;
        d.dispatch(SessionEvent::SetCounty("06037".into()));
        d.drain_outputs();

        d.dispatch(SessionEvent::SetOccupation("fast".into()));
        d.settle().await;
        let updated: Vec<_> = d
            .drain_outputs()
            .into_iter()
            .filter_map(|o| match o {
                SessionOutput::PopupUpdated { popup, content } => Some((popup, content)),
                _ => None,
            })
            .collect();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].0.anchor, LngLat::new(-118.0, 35.0));
        assert_eq!(updated[0].1.label, "Level IV");
    }

    struct PanickingSource;

    impl WageTableSource for PanickingSource {
        fn fetch<'a>(
            &'a self,
            key: &'a str,
        ) -> BoxFuture<'a, Result<WageThresholdTable, FetchError>> {
            Box::pin(async move { panic!("source blew up on {key}") })
        }
    }

    #[tokio::test]
    async fn panicking_fetch_still_settles() {
        let session = Session::new(SessionConfig::default(), index());
        let mut d = SessionDriver::new(session, Arc::new(PanickingSource));
        d.dispatch(SessionEvent::SetOccupation("15-1252".into()));
        assert_eq!(d.in_flight(), 1);

        let outcomes = d.settle().await;
        assert_eq!(d.in_flight(), 0);
        match &outcomes[..] {
            [FetchOutcome::Failed(err)] => assert_eq!(err.kind, FetchErrorKind::Aborted),
            other => panic!("unexpected outcomes {other:?}"),
        }
        assert_eq!(d.next_arrival().await, None);
    }
}
