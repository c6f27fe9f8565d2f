//! Acquisition quota database model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::time::date_to_text;

/// The single row of the `acquisition_quota` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct AcquisitionQuotaDbModel {
    /// `YYYY-MM-DD` the budget applies to.
    pub quota_date: String,
    pub daily_cap: i64,
    pub remaining: i64,
}

impl AcquisitionQuotaDbModel {
    /// A fresh budget for `date`.
    pub fn fresh(date: NaiveDate, daily_cap: usize) -> Self {
        let cap = daily_cap as i64;
        Self {
            quota_date: date_to_text(date),
            daily_cap: cap,
            remaining: cap,
        }
    }

    /// The budget as it stands on `today` under `daily_cap`.
    ///
    /// A new day starts from the full cap. Within the same day a changed cap
    /// keeps the number of requests already spent, and the remainder never
    /// exceeds the cap.
    pub fn rebased(&self, today: NaiveDate, daily_cap: usize) -> Self {
        if self.quota_date != date_to_text(today) {
            return Self::fresh(today, daily_cap);
        }

        let cap = daily_cap as i64;
        let spent = (self.daily_cap - self.remaining).max(0);
        Self {
            quota_date: self.quota_date.clone(),
            daily_cap: cap,
            remaining: (cap - spent).clamp(0, cap),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn test_new_day_resets() {
        let mut row = AcquisitionQuotaDbModel::fresh(date(1), 5);
        row.remaining = 0;

        let rebased = row.rebased(date(2), 5);
        assert_eq!(rebased.quota_date, "2024-06-02");
        assert_eq!(rebased.remaining, 5);
    }

    #[test]
    fn test_same_day_keeps_spent_requests() {
        let mut row = AcquisitionQuotaDbModel::fresh(date(1), 5);
        row.remaining = 2;

        assert_eq!(row.rebased(date(1), 5), row);
        // Three already spent.
        assert_eq!(row.rebased(date(1), 10).remaining, 7);
        assert_eq!(row.rebased(date(1), 2).remaining, 0);
    }
}
