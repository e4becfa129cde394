use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::platform::Platform;

/// Clock jitter between scheduler ticks that `is_due` tolerates.
const DUE_SLACK_SECS: i64 = 5;

/// Per-tenant moderation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantSettings {
    /// Master switch for the scheduler. Default: false.
    #[serde(default)]
    pub is_enabled: bool,
    #[serde(default = "default_true")]
    pub monitor_instagram: bool,
    #[serde(default = "default_true")]
    pub monitor_facebook: bool,
    /// Delete comments the analysis marks unauthorized. Default: true.
    #[serde(default = "default_true")]
    pub delete_unauthorized_comments: bool,
    /// Send a summary notification when a pass deleted anything. Default: true.
    #[serde(default = "default_true")]
    pub notify_on_deletion: bool,
    /// Author ids whose comments are never processed.
    #[serde(default)]
    pub whitelisted_users: Vec<String>,
    /// Extra phrases the keyword policy treats as unauthorized.
    #[serde(default)]
    pub blocked_keywords: Vec<String>,
    /// Minutes between monitoring passes for this tenant. Default: 5.
    #[serde(default = "default_poll_interval_minutes")]
    pub poll_interval_minutes: u32,
}

fn default_true() -> bool {
    true
}
fn default_poll_interval_minutes() -> u32 {
    5
}

impl Default for TenantSettings {
    fn default() -> Self {
        Self {
            is_enabled: false,
            monitor_instagram: default_true(),
            monitor_facebook: default_true(),
            delete_unauthorized_comments: default_true(),
            notify_on_deletion: default_true(),
            whitelisted_users: Vec::new(),
            blocked_keywords: Vec::new(),
            poll_interval_minutes: default_poll_interval_minutes(),
        }
    }
}

impl TenantSettings {
    pub fn monitors(&self, platform: Platform) -> bool {
        match platform {
            Platform::Instagram => self.monitor_instagram,
            Platform::Facebook => self.monitor_facebook,
        }
    }

    pub fn is_whitelisted(&self, author_id: &str) -> bool {
        self.whitelisted_users.iter().any(|u| u == author_id)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::minutes(i64::from(self.poll_interval_minutes.max(1)))
    }
}

/// Refresh entry kept alongside a long-lived token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Opaque per-platform credentials. Never logged.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantCredentials {
    #[serde(default)]
    pub instagram_access_token: Option<String>,
    #[serde(default)]
    pub instagram_business_account_id: Option<String>,
    #[serde(default)]
    pub facebook_access_token: Option<String>,
    #[serde(default)]
    pub facebook_page_id: Option<String>,
    #[serde(default)]
    pub refresh_tokens: Vec<RefreshToken>,
}

impl std::fmt::Debug for TenantCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantCredentials")
            .field("instagram_business_account_id", &self.instagram_business_account_id)
            .field("facebook_page_id", &self.facebook_page_id)
            .field("refresh_tokens", &self.refresh_tokens.len())
            .finish_non_exhaustive()
    }
}

/// Token plus the tenant's own account id on one platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformCredential<'a> {
    pub access_token: &'a str,
    pub account_id: &'a str,
}

impl TenantCredentials {
    pub fn for_platform(&self, platform: Platform) -> Option<PlatformCredential<'_>> {
        let (token, account) = match platform {
            Platform::Instagram => (
                &self.instagram_access_token,
                &self.instagram_business_account_id,
            ),
            Platform::Facebook => (&self.facebook_access_token, &self.facebook_page_id),
        };
        match (token.as_deref(), account.as_deref()) {
            (Some(t), Some(a)) if !t.is_empty() && !a.is_empty() => Some(PlatformCredential {
                access_token: t,
                account_id: a,
            }),
            _ => None,
        }
    }

    /// Drops refresh entries that expired before `now`; returns how many were removed.
    pub fn prune_expired_refresh_tokens(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.refresh_tokens.len();
        self.refresh_tokens.retain(|t| t.expires_at > now);
        before - self.refresh_tokens.len()
    }
}

/// Running counters updated at the end of every monitoring pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    #[serde(default)]
    pub comments_processed: u64,
    #[serde(default)]
    pub comments_deleted: u64,
    #[serde(default)]
    pub posts_scanned: u64,
    #[serde(default)]
    pub bot_runs: u64,
    /// Tick that started the most recent pass.
    #[serde(default)]
    pub last_run_at: Option<DateTime<Utc>>,
}

impl UsageStats {
    pub fn record_run(&mut self, processed: u64, deleted: u64, posts_scanned: u64, at: DateTime<Utc>) {
        self.comments_processed += processed;
        self.comments_deleted += deleted;
        self.posts_scanned += posts_scanned;
        self.bot_runs += 1;
        self.last_run_at = Some(at);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    #[serde(default)]
    pub settings: TenantSettings,
    #[serde(default)]
    pub credentials: TenantCredentials,
    #[serde(default)]
    pub usage: UsageStats,
    /// End of the paid or trial period. `None` means no entitlement.
    #[serde(default)]
    pub entitlement_expires_at: Option<DateTime<Utc>>,
}

impl Tenant {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            settings: TenantSettings::default(),
            credentials: TenantCredentials::default(),
            usage: UsageStats::default(),
            entitlement_expires_at: None,
        }
    }

    pub fn has_entitlement(&self, now: DateTime<Utc>) -> bool {
        self.entitlement_expires_at.is_some_and(|exp| exp > now)
    }

    /// Platforms that are both monitored and have usable credentials.
    pub fn monitorable_platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|p| self.settings.monitors(*p) && self.credentials.for_platform(*p).is_some())
            .collect()
    }

    pub fn is_eligible(&self, now: DateTime<Utc>) -> bool {
        self.settings.is_enabled
            && self.has_entitlement(now)
            && !self.monitorable_platforms().is_empty()
    }

    /// Whether the tenant's own poll interval has elapsed since its last
    /// pass started. Intervals are measured tick to tick.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.usage.last_run_at {
            Some(last) => now - last + Duration::seconds(DUE_SLACK_SECS) >= self.settings.poll_interval(),
            None => true,
        }
    }
}
