pub mod menu;
pub mod orders;
pub mod reports;
pub mod seating;

use chrono::{DateTime, Duration, Local, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;

/// All core services wired against one pool.
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<orders::OrderService>,
    pub seating: Arc<seating::SeatingService>,
    pub menu: Arc<menu::MenuService>,
    pub reports: Arc<reports::ReportService>,
}

impl AppServices {
    pub fn build(
        db: Arc<DbPool>,
        config: &AppConfig,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        Self {
            orders: Arc::new(orders::OrderService::new(
                db.clone(),
                config.orders.clone(),
                event_sender,
            )),
            seating: Arc::new(seating::SeatingService::new(db.clone())),
            menu: Arc::new(menu::MenuService::new(db.clone())),
            reports: Arc::new(reports::ReportService::new(db)),
        }
    }
}

/// UTC bounds `[start, end)` of a server-local calendar date.
pub(crate) fn local_day_range(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start_naive = date.and_time(NaiveTime::MIN);
    let start = match Local.from_local_datetime(&start_naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        // midnight can fall in a DST gap; interpret the naive time as UTC then
        LocalResult::None => DateTime::<Utc>::from_naive_utc_and_offset(start_naive, Utc),
    };
    (start, start + Duration::days(1))
}

/// Boundary timestamp format: `YYYY-MM-DDTHH:MM:SSZ`.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
