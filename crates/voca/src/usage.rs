//! Daily usage cap for the AI mnemonic feature.

use crate::storage::{read_json, write_json, KeyValueStore, StoreError};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DAILY_LIMIT: u32 = 10;
pub const USAGE_KEY: &str = "gemini_api_usage";

#[derive(Debug, Error)]
pub enum UsageError {
    #[error("하루 AI 연상고리 생성 횟수({limit}회)를 초과했습니다. 내일 다시 이용해주세요.")]
    LimitExceeded { limit: u32 },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Usage {
    date: NaiveDate,
    count: u32,
}

/// Counts requests per calendar date and refuses them past the limit.
#[derive(Debug)]
pub struct UsageLimiter<S> {
    store: S,
    limit: u32,
}

impl<S: KeyValueStore> UsageLimiter<S> {
    pub fn new(store: S) -> Self {
        Self::with_limit(store, DAILY_LIMIT)
    }

    pub fn with_limit(store: S, limit: u32) -> Self {
        Self { store, limit }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// The UTC calendar date, which is what the counter is keyed on.
    pub fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    /// Requests already counted on `today`.
    pub fn used_on(&self, today: NaiveDate) -> Result<u32, UsageError> {
        Ok(self.current(today)?.count)
    }

    pub fn remaining_on(&self, today: NaiveDate) -> Result<u32, UsageError> {
        Ok(self.limit.saturating_sub(self.used_on(today)?))
    }

    /// Counts one request on `today`, or fails without counting if the limit is reached.
    ///
    /// Returns the number of requests counted on `today` including this one.
    pub fn check_and_increment(&self, today: NaiveDate) -> Result<u32, UsageError> {
        let mut usage = self.current(today)?;
        if usage.count >= self.limit {
            tracing::info!("Daily limit of {} reached on {today}", self.limit);
            return Err(UsageError::LimitExceeded { limit: self.limit });
        }
        usage.count += 1;
        write_json(&self.store, USAGE_KEY, &usage)?;
        Ok(usage.count)
    }

    fn current(&self, today: NaiveDate) -> Result<Usage, UsageError> {
        let fresh = Usage {
            date: today,
            count: 0,
        };
        let stored = match read_json::<Usage, _>(&self.store, USAGE_KEY) {
            Ok(stored) => stored,
            Err(StoreError::Json(err)) => {
                tracing::warn!("Resetting unreadable usage counter: {err}");
                None
            }
            Err(err) => return Err(err.into()),
        };
        Ok(stored.filter(|usage| usage.date == today).unwrap_or(fresh))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::MemoryStore;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    #[test]
    fn eleventh_request_is_rejected() {
        let limiter = UsageLimiter::new(MemoryStore::new());
        for n in 1..=10 {
            assert_eq!(limiter.check_and_increment(date(1)).unwrap(), n);
        }
        let err = limiter.check_and_increment(date(1)).unwrap_err();
        assert!(matches!(err, UsageError::LimitExceeded { limit: 10 }));
        assert!(err.to_string().contains("10회"));
        assert_eq!(limiter.used_on(date(1)).unwrap(), 10);
        assert_eq!(limiter.remaining_on(date(1)).unwrap(), 0);
    }

    #[test]
    fn resets_on_a_new_date() {
        let limiter = UsageLimiter::with_limit(MemoryStore::new(), 2);
        limiter.check_and_increment(date(1)).unwrap();
        limiter.check_and_increment(date(1)).unwrap();
        assert!(limiter.check_and_increment(date(1)).is_err());
        assert_eq!(limiter.check_and_increment(date(2)).unwrap(), 1);
        assert_eq!(limiter.remaining_on(date(2)).unwrap(), 1);
    }

    #[test]
    fn stored_format() {
        let store = MemoryStore::new();
        let limiter = UsageLimiter::new(&store);
        limiter.check_and_increment(date(14)).unwrap();
        assert_eq!(
            store.get(USAGE_KEY).unwrap().as_deref(),
            Some(r#"{"date":"2025-06-14","count":1}"#)
        );
    }

    #[test]
    fn corrupt_counter_starts_fresh() {
        let store = MemoryStore::new();
        store.set(USAGE_KEY, "{\"date\":").unwrap();
        let limiter = UsageLimiter::new(&store);
        assert_eq!(limiter.check_and_increment(date(3)).unwrap(), 1);
    }
}
