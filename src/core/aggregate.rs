use crate::domain::model::{DomainCounts, ManagedAccount, UserRef, UserUsageReport, WindowSummary};
use chrono::{Days, NaiveDate};

pub const CONFLUENCE_PRODUCT: &str = "Confluence";

/// 以天數表示的活躍期間，各期間互相重疊（30 天內活躍者也算進 60、90 天）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityWindow {
    days: u32,
}

impl ActivityWindow {
    pub const LAST_MONTH: Self = Self::new(30);
    pub const LAST_2_MONTHS: Self = Self::new(60);
    pub const LAST_3_MONTHS: Self = Self::new(90);

    pub const fn new(days: u32) -> Self {
        Self { days }
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn cutoff(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_sub_days(Days::new(u64::from(self.days)))
            .unwrap_or(NaiveDate::MIN)
    }

    /// 活動日以當天 00:00 計，只要執行時刻不是午夜，界線那一天就落在期間外：`date > today - days`
    pub fn contains(&self, today: NaiveDate, date: NaiveDate) -> bool {
        date > self.cutoff(today)
    }
}

/// `@` 之後的字串；沒有 `@` 時整個字串即為 key
pub fn email_domain(email: &str) -> &str {
    email.rsplit('@').next().unwrap_or(email)
}

/// ISO 8601 時間戳只取日期部分
pub fn activity_date(timestamp: &str) -> Option<NaiveDate> {
    let date_part = timestamp.split('T').next()?.trim();
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

pub fn count_by_domain<'a>(emails: impl IntoIterator<Item = &'a str>) -> DomainCounts {
    let mut counts = DomainCounts::new();
    for email in emails {
        *counts.entry(email_domain(email).to_string()).or_insert(0) += 1;
    }
    counts
}

pub fn summarize_window(
    accounts: &[ManagedAccount],
    window: ActivityWindow,
    today: NaiveDate,
) -> WindowSummary {
    let users: Vec<UserRef> = accounts
        .iter()
        .filter(|account| {
            account
                .last_active
                .as_deref()
                .and_then(activity_date)
                .is_some_and(|date| window.contains(today, date))
        })
        .filter_map(|account| {
            account.email.as_ref().map(|email| UserRef {
                name: account.name.clone(),
                email: email.clone(),
            })
        })
        .collect();

    WindowSummary {
        days: window.days(),
        domain_counts: count_by_domain(users.iter().map(|user| user.email.as_str())),
        users,
    }
}

/// 單次掃描帳號清單，產生使用量報表
pub fn summarize_accounts(accounts: Vec<ManagedAccount>, today: NaiveDate) -> UserUsageReport {
    let active: Vec<ManagedAccount> = accounts
        .into_iter()
        .filter(ManagedAccount::is_active)
        .collect();

    let confluence_users: Vec<&ManagedAccount> = active
        .iter()
        .filter(|account| account.has_product(CONFLUENCE_PRODUCT))
        .collect();
    let confluence_domain_counts = count_by_domain(
        confluence_users
            .iter()
            .filter_map(|account| account.email.as_deref()),
    );

    // 與網域統計一致：只算有 email 的帳號
    let confluence_users_count: u64 = confluence_domain_counts.values().sum();

    let last_3_months = summarize_window(&active, ActivityWindow::LAST_3_MONTHS, today);
    let last_2_months = summarize_window(&active, ActivityWindow::LAST_2_MONTHS, today);
    let last_month = summarize_window(&active, ActivityWindow::LAST_MONTH, today);

    tracing::debug!(
        "Active accounts: {}, Confluence: {}, 90d/60d/30d: {}/{}/{}",
        active.len(),
        confluence_users_count,
        last_3_months.total(),
        last_2_months.total(),
        last_month.total()
    );

    UserUsageReport {
        active_users: active.len(),
        confluence_users_count,
        active_in_last_3_months: last_3_months.total(),
        active_in_last_2_months: last_2_months.total(),
        active_in_last_month: last_month.total(),
        confluence_domain_counts,
        active_in_last_3_months_domain_counts: last_3_months.domain_counts,
        active_in_last_2_months_domain_counts: last_2_months.domain_counts,
        active_in_last_month_domain_counts: last_month.domain_counts,
        users_in_last_3_months: last_3_months.users,
        users_in_last_2_months: last_2_months.users,
        users_in_last_month: last_month.users,
        accounts: active,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn account(value: serde_json::Value) -> ManagedAccount {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_email_domain() {
        assert_eq!(email_domain("ada@example.com"), "example.com");
        assert_eq!(email_domain("odd@name@corp.eu"), "corp.eu");
        assert_eq!(email_domain("no-at-sign"), "no-at-sign");
    }

    #[test]
    fn test_activity_date_uses_date_part_only() {
        assert_eq!(
            activity_date("2024-06-01T23:59:59.000Z"),
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
        assert_eq!(activity_date("2024-06-01"), NaiveDate::from_ymd_opt(2024, 6, 1));
        assert_eq!(activity_date(""), None);
        assert_eq!(activity_date("yesterday"), None);
    }

    #[test]
    fn test_window_cutoff_day_is_excluded() {
        let window = ActivityWindow::LAST_MONTH;
        assert_eq!(window.cutoff(today()), NaiveDate::from_ymd_opt(2024, 5, 31).unwrap());
        assert!(window.contains(today(), NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()));
        assert!(!window.contains(today(), NaiveDate::from_ymd_opt(2024, 5, 31).unwrap()));
        assert!(!window.contains(today(), NaiveDate::from_ymd_opt(2024, 5, 30).unwrap()));
    }

    #[test]
    fn test_late_activity_on_cutoff_day_is_outside_window() {
        let accounts = vec![account(json!({
            "email": "late@example.com", "account_status": "active",
            "last_active": "2024-05-31T23:00:00Z"
        }))];

        let report = summarize_accounts(accounts, today());

        assert_eq!(report.active_in_last_month, 0);
        assert_eq!(report.active_in_last_2_months, 1);
    }

    #[test]
    fn test_windows_overlap() {
        let accounts = vec![
            account(json!({"email": "a@one.com", "account_status": "active", "last_active": "2024-06-20T10:00:00Z"})),
            account(json!({"email": "b@two.com", "account_status": "active", "last_active": "2024-05-10T10:00:00Z"})),
            account(json!({"email": "c@two.com", "account_status": "active", "last_active": "2024-04-10T10:00:00Z"})),
            account(json!({"email": "d@two.com", "account_status": "active", "last_active": "2023-01-01T10:00:00Z"})),
        ];

        let month = summarize_window(&accounts, ActivityWindow::LAST_MONTH, today());
        let two_months = summarize_window(&accounts, ActivityWindow::LAST_2_MONTHS, today());
        let three_months = summarize_window(&accounts, ActivityWindow::LAST_3_MONTHS, today());

        assert_eq!(month.total(), 1);
        assert_eq!(two_months.total(), 2);
        assert_eq!(three_months.total(), 3);
        assert_eq!(three_months.domain_counts.get("one.com"), Some(&1));
        assert_eq!(three_months.domain_counts.get("two.com"), Some(&2));
        assert_eq!(month.days, 30);
    }

    #[test]
    fn test_summarize_accounts() {
        let accounts = vec![
            account(json!({
                "name": "Ada", "email": "ada@example.com", "account_status": "active",
                "last_active": "2024-06-29T08:00:00Z",
                "product_access": [{"name": "Jira Software"}, {"name": "Confluence"}]
            })),
            account(json!({
                "name": "Bob", "email": "bob@partner.org", "account_status": "active",
                "last_active": "2024-04-15T08:00:00Z",
                "product_access": [{"name": "Confluence"}]
            })),
            account(json!({
                "name": "Cy", "email": "cy@example.com", "account_status": "inactive",
                "last_active": "2024-06-29T08:00:00Z",
                "product_access": [{"name": "Confluence"}]
            })),
            account(json!({
                "name": "Service", "account_status": "active",
                "last_active": "2024-06-29T08:00:00Z",
                "product_access": [{"name": "Confluence"}]
            })),
        ];

        let report = summarize_accounts(accounts, today());

        assert_eq!(report.active_users, 3);
        // 沒有 email 的帳號不進網域統計，也不計入 Confluence 使用者數
        assert_eq!(report.confluence_users_count, 2);
        assert_eq!(
            report.confluence_users_count,
            report.confluence_domain_counts.values().sum::<u64>()
        );
        assert_eq!(report.confluence_domain_counts.len(), 2);
        assert_eq!(report.confluence_domain_counts["example.com"], 1);
        assert_eq!(report.confluence_domain_counts["partner.org"], 1);
        assert_eq!(report.active_in_last_month, 1);
        assert_eq!(report.active_in_last_2_months, 1);
        assert_eq!(report.active_in_last_3_months, 2);
        assert_eq!(
            report.users_in_last_month,
            vec![UserRef {
                name: Some("Ada".to_string()),
                email: "ada@example.com".to_string()
            }]
        );
        assert_eq!(report.accounts.len(), 3);
        assert!(report.accounts.iter().all(ManagedAccount::is_active));
    }
}
