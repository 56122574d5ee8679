//! Background polling coordinator.
//!
//! One task periodically fetches booking lists for the signed-in account and
//! fans the results out to typed subscriptions: dashboard and earnings
//! summaries, raw booking lists, a single watched booking, and newly arrived
//! booking requests. Categories without a live subscriber cost nothing; a
//! pass with no subscribers performs no network activity at all.
//!
//! The poller is constructed and owned by the composition root and holds no
//! global state. Mode changes travel over a watch channel, so repeated
//! `start_polling` calls are idempotent and never stack timers.

mod subscription;

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::api::{ApiClient, ApiResult};
use crate::models::{Booking, BookingStatus, DashboardSummary, EarningsSummary};
use crate::session::{Session, SessionHandle};

pub use subscription::Subscription;

/// Recurring interval while polling normally.
pub const NORMAL_POLL_INTERVAL: Duration = Duration::from_secs(30);
/// Recurring interval while a screen needs fresh data, e.g. a booking watch.
pub const FAST_POLL_INTERVAL: Duration = Duration::from_secs(5);

const FEED_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub normal_interval: Duration,
    pub fast_interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            normal_interval: NORMAL_POLL_INTERVAL,
            fast_interval: FAST_POLL_INTERVAL,
        }
    }
}

/// The fetches the poller performs each pass; [`ApiClient`] is the real
/// implementation, tests substitute scripted sources.
pub trait PollSource: Send + Sync + 'static {
    fn fetch_user_bookings(
        &self,
        session: &Session,
    ) -> impl Future<Output = ApiResult<Vec<Booking>>> + Send;
    fn fetch_operator_bookings(
        &self,
        session: &Session,
    ) -> impl Future<Output = ApiResult<Vec<Booking>>> + Send;
}

impl PollSource for ApiClient {
    async fn fetch_user_bookings(&self, session: &Session) -> ApiResult<Vec<Booking>> {
        self.user_bookings(session.user_id).await
    }

    async fn fetch_operator_bookings(&self, session: &Session) -> ApiResult<Vec<Booking>> {
        self.operator_bookings(session.user_id).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollMode {
    Stopped,
    Running { fast: bool },
}

/// Periodic fetch coordinator with at most one live subscription per
/// category.
pub struct Poller<S = ApiClient> {
    shared: Arc<Shared<S>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

struct Shared<S> {
    source: S,
    session: SessionHandle,
    config: PollerConfig,
    feeds: Mutex<Feeds>,
    mode: watch::Sender<PollMode>,
    refresh: Notify,
}

impl<S: PollSource> Poller<S> {
    pub fn new(source: S, session: SessionHandle, config: PollerConfig) -> Self {
        let (mode, _) = watch::channel(PollMode::Stopped);
        Self {
            shared: Arc::new(Shared {
                source,
                session,
                config,
                feeds: Mutex::new(Feeds::default()),
                mode,
                refresh: Notify::new(),
            }),
            task: Mutex::new(None),
        }
    }

    /// The session handle this poller reads on every pass.
    #[must_use]
    pub fn session(&self) -> &SessionHandle {
        &self.shared.session
    }

    /// Replace the active session. `None` signs out; passes without a
    /// session fetch nothing.
    pub fn set_session(&self, session: Option<Session>) {
        self.shared.session.replace(session);
    }

    /// Begin polling at the normal interval. Safe to call repeatedly; an
    /// already running schedule is left untouched. Must be called from
    /// within a Tokio runtime.
    pub fn start_polling(&self) {
        self.ensure_task();
        self.set_mode(PollMode::Running { fast: false });
    }

    /// Begin polling at the fast interval, switching an already running
    /// schedule over. Must be called from within a Tokio runtime.
    pub fn start_fast_polling(&self) {
        self.ensure_task();
        self.set_mode(PollMode::Running { fast: true });
    }

    /// Halt the recurring schedule. Subscriptions stay registered and a later
    /// start resumes delivery.
    pub fn stop_polling(&self) {
        self.set_mode(PollMode::Stopped);
    }

    /// Run one extra pass as soon as possible without disturbing the
    /// recurring schedule. Works while stopped as well. Must be called from
    /// within a Tokio runtime.
    pub fn refresh_now(&self) {
        self.ensure_task();
        self.shared.refresh.notify_one();
    }

    /// Watch the dashboard summary derived from the account's bookings.
    #[must_use]
    pub fn subscribe_dashboard(&self) -> Subscription<DashboardSummary> {
        let (tx, subscription) = Subscription::channel(FEED_CAPACITY);
        self.feeds().dashboard = Some(tx);
        subscription
    }

    /// Watch the signed-in customer's booking list.
    #[must_use]
    pub fn subscribe_user_bookings(&self) -> Subscription<Vec<Booking>> {
        let (tx, subscription) = Subscription::channel(FEED_CAPACITY);
        self.feeds().user_bookings = Some(tx);
        subscription
    }

    /// Watch the signed-in operator's job list.
    #[must_use]
    pub fn subscribe_operator_bookings(&self) -> Subscription<Vec<Booking>> {
        let (tx, subscription) = Subscription::channel(FEED_CAPACITY);
        self.feeds().operator_bookings = Some(tx);
        subscription
    }

    /// Watch the earnings summary derived from the operator's jobs.
    #[must_use]
    pub fn subscribe_earnings(&self) -> Subscription<EarningsSummary> {
        let (tx, subscription) = Subscription::channel(FEED_CAPACITY);
        self.feeds().earnings = Some(tx);
        subscription
    }

    /// Follow one booking's status. Once a terminal status has been
    /// delivered, later passes reporting anything else are ignored.
    #[must_use]
    pub fn watch_booking(&self, booking_id: i64) -> Subscription<Booking> {
        let (tx, subscription) = Subscription::channel(FEED_CAPACITY);
        self.feeds().watch = Some(WatchFeed {
            booking_id,
            last_status: None,
            sender: tx,
        });
        subscription
    }

    /// Be notified of booking requests that arrive while subscribed. The
    /// first pass seeds the seen set silently; pending bookings that exist
    /// before subscribing are not replayed.
    #[must_use]
    pub fn subscribe_new_requests(&self) -> Subscription<Booking> {
        let (tx, subscription) = Subscription::channel(FEED_CAPACITY);
        self.feeds().new_requests = Some(NewRequestFeed {
            seen: HashSet::new(),
            seeded: false,
            sender: tx,
        });
        subscription
    }

    fn feeds(&self) -> MutexGuard<'_, Feeds> {
        lock_feeds(&self.shared.feeds)
    }

    fn set_mode(&self, next: PollMode) {
        self.shared.mode.send_if_modified(|mode| {
            if *mode == next {
                false
            } else {
                *mode = next;
                true
            }
        });
    }

    fn ensure_task(&self) {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        let shared = Arc::clone(&self.shared);
        *task = Some(tokio::spawn(run_loop(shared)));
    }
}

impl<S> Poller<S> {
    /// Abort the background task. Dropping the poller does the same.
    pub fn shutdown(&self) {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = task.take() {
            handle.abort();
        }
    }
}

impl<S> Drop for Poller<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_loop<S: PollSource>(shared: Arc<Shared<S>>) {
    let mut mode_rx = shared.mode.subscribe();
    loop {
        let mode = *mode_rx.borrow_and_update();
        match mode {
            PollMode::Stopped => {
                tokio::select! {
                    () = shared.refresh.notified() => poll_once(&shared).await,
                    changed = mode_rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                }
            }
            PollMode::Running { fast } => {
                let period = if fast {
                    shared.config.fast_interval
                } else {
                    shared.config.normal_interval
                };
                poll_once(&shared).await;
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // An interval's first tick completes immediately; the pass
                // above already covered it.
                ticker.tick().await;
                loop {
                    tokio::select! {
                        _ = ticker.tick() => poll_once(&shared).await,
                        () = shared.refresh.notified() => poll_once(&shared).await,
                        changed = mode_rx.changed() => {
                            if changed.is_err() {
                                return;
                            }
                            break;
                        }
                    }
                }
            }
        }
    }
}

async fn poll_once<S: PollSource>(shared: &Shared<S>) {
    let Some(session) = shared.session.snapshot() else {
        tracing::debug!("Poll pass skipped; nobody is signed in");
        return;
    };

    let plan = {
        let mut feeds = lock_feeds(&shared.feeds);
        feeds.prune();
        feeds.plan(&session)
    };
    if plan.is_empty() {
        return;
    }

    let user_list = if plan.need_user {
        fetch_list("user bookings", shared.source.fetch_user_bookings(&session)).await
    } else {
        None
    };
    let operator_list = if plan.need_operator {
        fetch_list(
            "operator bookings",
            shared.source.fetch_operator_bookings(&session),
        )
        .await
    } else {
        None
    };
    if user_list.is_none() && operator_list.is_none() {
        return;
    }

    let outbox = {
        let mut feeds = lock_feeds(&shared.feeds);
        feeds.collect(&session, user_list.as_deref(), operator_list.as_deref())
    };
    outbox.dispatch().await;
}

async fn fetch_list(
    kind: &str,
    fetch: impl Future<Output = ApiResult<Vec<Booking>>>,
) -> Option<Vec<Booking>> {
    match fetch.await {
        Ok(list) => Some(list),
        Err(error) if error.is_transient() => {
            tracing::warn!(kind, %error, "Poll fetch failed; keeping previous data");
            None
        }
        Err(error) => {
            tracing::error!(kind, %error, "Poll fetch rejected; keeping previous data");
            None
        }
    }
}

fn lock_feeds(feeds: &Mutex<Feeds>) -> MutexGuard<'_, Feeds> {
    feeds.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct Feeds {
    dashboard: Option<mpsc::Sender<DashboardSummary>>,
    user_bookings: Option<mpsc::Sender<Vec<Booking>>>,
    operator_bookings: Option<mpsc::Sender<Vec<Booking>>>,
    earnings: Option<mpsc::Sender<EarningsSummary>>,
    watch: Option<WatchFeed>,
    new_requests: Option<NewRequestFeed>,
}

#[derive(Debug, Clone, Copy)]
struct FetchPlan {
    need_user: bool,
    need_operator: bool,
}

impl FetchPlan {
    const fn is_empty(self) -> bool {
        !self.need_user && !self.need_operator
    }
}

impl Feeds {
    /// Drop feeds whose subscription handles have gone away.
    fn prune(&mut self) {
        if self.dashboard.as_ref().is_some_and(mpsc::Sender::is_closed) {
            self.dashboard = None;
        }
        if self
            .user_bookings
            .as_ref()
            .is_some_and(mpsc::Sender::is_closed)
        {
            self.user_bookings = None;
        }
        if self
            .operator_bookings
            .as_ref()
            .is_some_and(mpsc::Sender::is_closed)
        {
            self.operator_bookings = None;
        }
        if self.earnings.as_ref().is_some_and(mpsc::Sender::is_closed) {
            self.earnings = None;
        }
        if self.watch.as_ref().is_some_and(|feed| feed.sender.is_closed()) {
            self.watch = None;
        }
        if self
            .new_requests
            .as_ref()
            .is_some_and(|feed| feed.sender.is_closed())
        {
            self.new_requests = None;
        }
    }

    /// Which lists this pass must fetch. Live feeds sharing a list share one
    /// request; no live feeds means no request.
    fn plan(&self, session: &Session) -> FetchPlan {
        let operator_role = session.is_operator();
        let own_list_wanted =
            self.dashboard.is_some() || self.watch.is_some();
        FetchPlan {
            need_user: self.user_bookings.is_some() || (own_list_wanted && !operator_role),
            need_operator: self.operator_bookings.is_some()
                || self.earnings.is_some()
                || self.new_requests.is_some()
                || (own_list_wanted && operator_role),
        }
    }

    /// Pair each live feed with its payload for this pass. Senders are
    /// cloned out so the actual delivery happens without holding the lock.
    fn collect(
        &mut self,
        session: &Session,
        user: Option<&[Booking]>,
        operator: Option<&[Booking]>,
    ) -> Outbox {
        let own = if session.is_operator() { operator } else { user };
        let mut outbox = Outbox::default();

        if let (Some(sender), Some(list)) = (&self.dashboard, own) {
            outbox.dashboard = Some((sender.clone(), DashboardSummary::from_bookings(list)));
        }
        if let (Some(sender), Some(list)) = (&self.user_bookings, user) {
            outbox.user_bookings = Some((sender.clone(), list.to_vec()));
        }
        if let (Some(sender), Some(list)) = (&self.operator_bookings, operator) {
            outbox.operator_bookings = Some((sender.clone(), list.to_vec()));
        }
        if let (Some(sender), Some(list)) = (&self.earnings, operator) {
            outbox.earnings = Some((sender.clone(), EarningsSummary::from_bookings(list)));
        }
        if let (Some(feed), Some(list)) = (&mut self.watch, own) {
            if let Some(update) = feed.observe(list) {
                outbox.watch = Some((feed.sender.clone(), update));
            }
        }
        if let (Some(feed), Some(list)) = (&mut self.new_requests, operator) {
            let fresh = feed.observe(list);
            if !fresh.is_empty() {
                outbox.new_requests = Some((feed.sender.clone(), fresh));
            }
        }
        outbox
    }
}

struct WatchFeed {
    booking_id: i64,
    last_status: Option<BookingStatus>,
    sender: mpsc::Sender<Booking>,
}

impl WatchFeed {
    fn observe(&mut self, list: &[Booking]) -> Option<Booking> {
        let Some(found) = list.iter().find(|booking| booking.id == self.booking_id) else {
            tracing::debug!(
                booking_id = self.booking_id,
                "Watched booking missing from the latest list"
            );
            return None;
        };
        if let Some(previous) = self.last_status {
            if previous.is_terminal() && found.status != previous {
                tracing::warn!(
                    booking_id = self.booking_id,
                    from = %previous,
                    to = %found.status,
                    "Ignoring status change on a terminal booking"
                );
                return None;
            }
        }
        self.last_status = Some(found.status);
        Some(found.clone())
    }
}

struct NewRequestFeed {
    seen: HashSet<i64>,
    seeded: bool,
    sender: mpsc::Sender<Booking>,
}

impl NewRequestFeed {
    fn observe(&mut self, list: &[Booking]) -> Vec<Booking> {
        if !self.seeded {
            self.seeded = true;
            self.seen = list
                .iter()
                .filter(|booking| booking.status == BookingStatus::Pending)
                .map(|booking| booking.id)
                .collect();
            return Vec::new();
        }
        list.iter()
            .filter(|booking| {
                booking.status == BookingStatus::Pending && self.seen.insert(booking.id)
            })
            .cloned()
            .collect()
    }
}

#[derive(Default)]
struct Outbox {
    dashboard: Option<(mpsc::Sender<DashboardSummary>, DashboardSummary)>,
    user_bookings: Option<(mpsc::Sender<Vec<Booking>>, Vec<Booking>)>,
    operator_bookings: Option<(mpsc::Sender<Vec<Booking>>, Vec<Booking>)>,
    earnings: Option<(mpsc::Sender<EarningsSummary>, EarningsSummary)>,
    watch: Option<(mpsc::Sender<Booking>, Booking)>,
    new_requests: Option<(mpsc::Sender<Booking>, Vec<Booking>)>,
}

impl Outbox {
    /// Push every collected payload out. A receiver dropped mid-send is
    /// ignored; pruning removes the feed on the next pass.
    async fn dispatch(self) {
        if let Some((sender, summary)) = self.dashboard {
            let _ = sender.send(summary).await;
        }
        if let Some((sender, list)) = self.user_bookings {
            let _ = sender.send(list).await;
        }
        if let Some((sender, list)) = self.operator_bookings {
            let _ = sender.send(list).await;
        }
        if let Some((sender, summary)) = self.earnings {
            let _ = sender.send(summary).await;
        }
        if let Some((sender, booking)) = self.watch {
            let _ = sender.send(booking).await;
        }
        if let Some((sender, bookings)) = self.new_requests {
            for booking in bookings {
                let _ = sender.send(booking).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    use chrono::{NaiveDate, NaiveTime};
    use pretty_assertions::assert_eq;
    use tokio::time::timeout;

    use super::*;
    use crate::api::ApiError;
    use crate::session::Role;

    enum StubFetch {
        Deliver(Vec<Booking>),
        Fail,
    }

    #[derive(Default)]
    struct ScriptedSource {
        user_queue: Mutex<VecDeque<StubFetch>>,
        operator_queue: Mutex<VecDeque<StubFetch>>,
        user_fallback: Mutex<Vec<Booking>>,
        operator_fallback: Mutex<Vec<Booking>>,
        user_calls: AtomicUsize,
        operator_calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn push_user(&self, item: StubFetch) {
            self.user_queue.lock().unwrap().push_back(item);
        }

        fn push_operator(&self, item: StubFetch) {
            self.operator_queue.lock().unwrap().push_back(item);
        }

        fn set_user_fallback(&self, list: Vec<Booking>) {
            *self.user_fallback.lock().unwrap() = list;
        }

        fn next(
            queue: &Mutex<VecDeque<StubFetch>>,
            fallback: &Mutex<Vec<Booking>>,
        ) -> ApiResult<Vec<Booking>> {
            match queue.lock().unwrap().pop_front() {
                Some(StubFetch::Deliver(list)) => Ok(list),
                Some(StubFetch::Fail) => Err(ApiError::Status {
                    status: 500,
                    message: "Internal error".to_string(),
                }),
                None => Ok(fallback.lock().unwrap().clone()),
            }
        }
    }

    impl PollSource for Arc<ScriptedSource> {
        async fn fetch_user_bookings(&self, _session: &Session) -> ApiResult<Vec<Booking>> {
            self.user_calls.fetch_add(1, Ordering::SeqCst);
            ScriptedSource::next(&self.user_queue, &self.user_fallback)
        }

        async fn fetch_operator_bookings(&self, _session: &Session) -> ApiResult<Vec<Booking>> {
            self.operator_calls.fetch_add(1, Ordering::SeqCst);
            ScriptedSource::next(&self.operator_queue, &self.operator_fallback)
        }
    }

    fn booking(id: i64, status: BookingStatus) -> Booking {
        Booking {
            id,
            user_id: 7,
            operator_id: Some(12),
            machine_id: 3,
            machine_type: "Excavator".to_string(),
            machine_model: "JCB 3DX".to_string(),
            location: "Baner Road".to_string(),
            scheduled_date: NaiveDate::from_ymd_opt(2024, 7, 14).unwrap(),
            scheduled_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            duration_minutes: 150,
            total_hours: 2.5,
            total_amount: 1500.0,
            status,
        }
    }

    fn session(role: Role) -> Session {
        Session {
            user_id: 7,
            name: "Ravi Kumar".to_string(),
            phone: "9876501234".to_string(),
            email: None,
            role,
        }
    }

    /// Intervals long enough that only immediate passes and explicit
    /// refreshes can fire during a test.
    fn slow_config() -> PollerConfig {
        PollerConfig {
            normal_interval: Duration::from_secs(60),
            fast_interval: Duration::from_secs(60),
        }
    }

    fn poller_for(
        role: Role,
        config: PollerConfig,
    ) -> (Poller<Arc<ScriptedSource>>, Arc<ScriptedSource>) {
        let source = Arc::new(ScriptedSource::default());
        let handle = SessionHandle::with_session(session(role));
        let poller = Poller::new(Arc::clone(&source), handle, config);
        (poller, source)
    }

    async fn expect_event<T>(subscription: &mut Subscription<T>) -> T {
        timeout(Duration::from_secs(2), subscription.recv())
            .await
            .expect("timed out waiting for a poll event")
            .expect("feed closed unexpectedly")
    }

    async fn expect_silence<T>(subscription: &mut Subscription<T>) {
        assert!(
            timeout(Duration::from_millis(150), subscription.recv())
                .await
                .is_err(),
            "unexpected event delivered"
        );
    }

    #[tokio::test]
    async fn no_subscribers_means_no_network() {
        let (poller, source) = poller_for(Role::Customer, slow_config());
        poller.refresh_now();
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(source.user_calls.load(Ordering::SeqCst), 0);
        assert_eq!(source.operator_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn refresh_works_while_stopped() {
        let (poller, source) = poller_for(Role::Customer, slow_config());
        source.push_user(StubFetch::Deliver(vec![booking(
            41,
            BookingStatus::Pending,
        )]));

        let mut bookings = poller.subscribe_user_bookings();
        poller.refresh_now();

        let list = expect_event(&mut bookings).await;
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, 41);
        // No schedule was started; one pass is all we get.
        expect_silence(&mut bookings).await;
        assert_eq!(source.user_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refresh_while_running_keeps_the_cadence() {
        let config = PollerConfig {
            normal_interval: Duration::from_millis(200),
            fast_interval: Duration::from_millis(200),
        };
        let (poller, source) = poller_for(Role::Customer, config);
        source.set_user_fallback(vec![booking(41, BookingStatus::Pending)]);

        let mut bookings = poller.subscribe_user_bookings();
        let started = Instant::now();
        poller.start_polling();
        let _ = expect_event(&mut bookings).await;

        // An extra pass mid-period, well before the scheduled tick.
        tokio::time::sleep(Duration::from_millis(100)).await;
        poller.refresh_now();
        let _ = expect_event(&mut bookings).await;
        assert!(
            started.elapsed() < Duration::from_millis(190),
            "refresh pass should land before the scheduled tick"
        );

        // The scheduled pass still arrives one period after start, not one
        // period after the refresh.
        let _ = expect_event(&mut bookings).await;
        let elapsed = started.elapsed();
        assert!(
            elapsed >= Duration::from_millis(150) && elapsed <= Duration::from_millis(290),
            "scheduled pass drifted off the original cadence: {elapsed:?}"
        );
        assert_eq!(source.user_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn repeated_start_does_not_stack_passes() {
        let (poller, source) = poller_for(Role::Customer, slow_config());
        let mut bookings = poller.subscribe_user_bookings();

        poller.start_polling();
        poller.start_polling();
        poller.start_polling();

        let _ = expect_event(&mut bookings).await;
        expect_silence(&mut bookings).await;
        assert_eq!(source.user_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn passes_without_a_session_fetch_nothing() {
        let source = Arc::new(ScriptedSource::default());
        let poller = Poller::new(Arc::clone(&source), SessionHandle::new(), slow_config());
        let mut bookings = poller.subscribe_user_bookings();

        poller.refresh_now();
        expect_silence(&mut bookings).await;
        assert_eq!(source.user_calls.load(Ordering::SeqCst), 0);

        poller.set_session(Some(session(Role::Customer)));
        poller.refresh_now();
        let _ = expect_event(&mut bookings).await;
        assert_eq!(source.user_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_fetch_skips_delivery_and_cycle_continues() {
        let (poller, source) = poller_for(Role::Customer, slow_config());
        source.push_user(StubFetch::Fail);
        source.push_user(StubFetch::Deliver(vec![booking(
            41,
            BookingStatus::Accepted,
        )]));

        let mut bookings = poller.subscribe_user_bookings();
        poller.refresh_now();
        expect_silence(&mut bookings).await;

        poller.refresh_now();
        let list = expect_event(&mut bookings).await;
        assert_eq!(list[0].status, BookingStatus::Accepted);
        assert_eq!(source.user_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn watch_delivers_then_clamps_after_terminal() {
        let (poller, source) = poller_for(Role::Customer, slow_config());
        source.push_user(StubFetch::Deliver(vec![booking(
            41,
            BookingStatus::Completed,
        )]));
        source.push_user(StubFetch::Deliver(vec![booking(
            41,
            BookingStatus::Cancelled,
        )]));

        let mut watched = poller.watch_booking(41);
        poller.refresh_now();
        let update = expect_event(&mut watched).await;
        assert_eq!(update.status, BookingStatus::Completed);

        // A later pass contradicting the terminal status is not delivered.
        poller.refresh_now();
        expect_silence(&mut watched).await;
    }

    #[tokio::test]
    async fn new_requests_seed_silently_then_emit() {
        let (poller, source) = poller_for(Role::Operator, slow_config());
        source.push_operator(StubFetch::Deliver(vec![booking(
            41,
            BookingStatus::Pending,
        )]));
        source.push_operator(StubFetch::Deliver(vec![
            booking(41, BookingStatus::Pending),
            booking(52, BookingStatus::Pending),
            booking(53, BookingStatus::Accepted),
        ]));

        let mut requests = poller.subscribe_new_requests();
        poller.refresh_now();
        expect_silence(&mut requests).await;

        poller.refresh_now();
        let fresh = expect_event(&mut requests).await;
        assert_eq!(fresh.id, 52);
        expect_silence(&mut requests).await;
    }

    #[tokio::test]
    async fn summary_feeds_share_one_fetch_per_pass() {
        let (poller, source) = poller_for(Role::Operator, slow_config());
        source.push_operator(StubFetch::Deliver(vec![
            booking(41, BookingStatus::Completed),
            booking(52, BookingStatus::Pending),
        ]));

        let mut dashboard = poller.subscribe_dashboard();
        let mut earnings = poller.subscribe_earnings();
        let mut jobs = poller.subscribe_operator_bookings();
        poller.refresh_now();

        assert_eq!(expect_event(&mut dashboard).await.total_bookings, 2);
        assert_eq!(expect_event(&mut earnings).await.completed_jobs, 1);
        assert_eq!(expect_event(&mut jobs).await.len(), 2);
        assert_eq!(source.operator_calls.load(Ordering::SeqCst), 1);
        assert_eq!(source.user_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn resubscribing_replaces_the_previous_feed() {
        let (poller, _source) = poller_for(Role::Customer, slow_config());
        let mut first = poller.subscribe_user_bookings();
        let mut second = poller.subscribe_user_bookings();

        // The replaced handle observes its channel closing.
        assert_eq!(first.recv().await, None);

        poller.refresh_now();
        let _ = expect_event(&mut second).await;
    }

    #[tokio::test]
    async fn dropped_subscription_stops_fetching() {
        let (poller, source) = poller_for(Role::Customer, slow_config());
        let bookings = poller.subscribe_user_bookings();
        drop(bookings);

        poller.refresh_now();
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(source.user_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fast_polling_reschedules_ticks() {
        let config = PollerConfig {
            normal_interval: Duration::from_secs(60),
            fast_interval: Duration::from_millis(25),
        };
        let (poller, source) = poller_for(Role::Customer, config);
        source.set_user_fallback(vec![booking(41, BookingStatus::Pending)]);

        let mut bookings = poller.subscribe_user_bookings();
        poller.start_fast_polling();

        let _ = expect_event(&mut bookings).await;
        let _ = expect_event(&mut bookings).await;
        let _ = expect_event(&mut bookings).await;
        assert!(source.user_calls.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn stop_halts_the_schedule() {
        let config = PollerConfig {
            normal_interval: Duration::from_millis(40),
            fast_interval: Duration::from_millis(40),
        };
        let (poller, _source) = poller_for(Role::Customer, config);

        let mut bookings = poller.subscribe_user_bookings();
        poller.start_polling();
        let _ = expect_event(&mut bookings).await;
        let _ = expect_event(&mut bookings).await;

        poller.stop_polling();
        // Drain anything already in flight; silence must follow quickly.
        let mut drained = 0;
        while drained < 10 {
            if timeout(Duration::from_millis(150), bookings.recv())
                .await
                .is_err()
            {
                break;
            }
            drained += 1;
        }
        assert!(drained < 10, "schedule kept ticking after stop");
    }

    #[tokio::test]
    async fn shutdown_closes_every_feed() {
        let (poller, _source) = poller_for(Role::Customer, slow_config());
        let mut bookings = poller.subscribe_user_bookings();
        poller.start_polling();
        let _ = expect_event(&mut bookings).await;

        drop(poller);
        assert_eq!(bookings.recv().await, None);
    }
}
