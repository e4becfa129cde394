use async_trait::async_trait;
use common::comment::{Analysis, AnalysisFlag, CommentRecord, FlagType};
use common::tenant::TenantSettings;

/// Decision inputs produced by an analysis policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisVerdict {
    pub is_authorized: bool,
    pub suspicious_score: u8,
    pub flags: Vec<AnalysisFlag>,
    pub detected_keywords: Vec<String>,
}

impl AnalysisVerdict {
    pub fn clean() -> Self {
        Self {
            is_authorized: true,
            suspicious_score: 0,
            flags: Vec::new(),
            detected_keywords: Vec::new(),
        }
    }

    /// Copies the verdict onto a record's analysis block, keeping the
    /// entities extracted at discovery.
    pub fn apply_to(self, analysis: &mut Analysis) {
        analysis.is_authorized = self.is_authorized;
        analysis.suspicious_score = self.suspicious_score.min(100);
        analysis.flags = self.flags;
        analysis.detected_keywords = self.detected_keywords;
    }
}

/// Pluggable comment classifier.
#[async_trait]
pub trait AnalysisPolicy: Send + Sync {
    async fn analyze(&self, record: &CommentRecord, settings: &TenantSettings) -> AnalysisVerdict;
}

const URL_SHORTENERS: &[&str] = &[
    "bit.ly", "tinyurl.com", "t.co", "goo.gl", "ow.ly", "is.gd", "buff.ly", "cutt.ly", "rb.gy",
    "tiny.cc",
];

const FAKE_SUPPORT_PHRASES: &[&str] = &[
    "customer service",
    "customer support",
    "support team",
    "contact our help desk",
    "whatsapp us",
    "official support",
];

const PHISHING_PHRASES: &[&str] = &[
    "verify your account",
    "confirm your password",
    "login to claim",
    "account will be suspended",
    "account has been compromised",
    "click the link",
];

const SCAM_PHRASES: &[&str] = &[
    "dm me",
    "send me a message",
    "investment opportunity",
    "double your money",
    "guaranteed profit",
    "you have been selected",
    "claim your prize",
    "crypto",
];

const PROMOTIONAL_PHRASES: &[&str] = &[
    "follow me",
    "check my page",
    "check out my profile",
    "free followers",
    "promo code",
    "discount code",
];

/// Phrase and link heuristics, plus each tenant's blocked keywords.
///
/// A comment with any flag is unauthorized. The score is the average flag
/// confidence.
#[derive(Debug, Clone, Default)]
pub struct KeywordPolicy;

impl KeywordPolicy {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, record: &CommentRecord, settings: &TenantSettings) -> AnalysisVerdict {
        let text = record.text.to_lowercase();
        let mut flags = Vec::new();
        let mut keywords = Vec::new();

        for url in &record.analysis.detected_urls {
            let lower = url.to_lowercase();
            match URL_SHORTENERS.iter().find(|s| host_matches(&lower, s)) {
                Some(shortener) => flags.push(AnalysisFlag::new(
                    FlagType::SuspiciousLink,
                    90,
                    format!("shortened link via {shortener}"),
                )),
                None => flags.push(AnalysisFlag::new(
                    FlagType::SuspiciousLink,
                    50,
                    format!("contains link {url}"),
                )),
            }
        }

        let phrase_rules: [(&[&str], FlagType, u8); 4] = [
            (FAKE_SUPPORT_PHRASES, FlagType::FakeCustomerService, 75),
            (PHISHING_PHRASES, FlagType::Phishing, 85),
            (SCAM_PHRASES, FlagType::Scam, 80),
            (PROMOTIONAL_PHRASES, FlagType::Promotional, 60),
        ];
        for (phrases, flag_type, confidence) in phrase_rules {
            let hits: Vec<&str> = phrases
                .iter()
                .copied()
                .filter(|p| text.contains(p))
                .collect();
            if !hits.is_empty() {
                flags.push(AnalysisFlag::new(
                    flag_type,
                    confidence,
                    format!("matched \"{}\"", hits.join("\", \"")),
                ));
                keywords.extend(hits.into_iter().map(str::to_string));
            }
        }

        for blocked in &settings.blocked_keywords {
            let needle = blocked.trim().to_lowercase();
            if !needle.is_empty() && text.contains(&needle) {
                flags.push(AnalysisFlag::new(
                    FlagType::Spam,
                    95,
                    format!("blocked keyword \"{blocked}\""),
                ));
                keywords.push(blocked.clone());
            }
        }

        AnalysisVerdict {
            is_authorized: flags.is_empty(),
            suspicious_score: Analysis::score_from_flags(&flags),
            flags,
            detected_keywords: keywords,
        }
    }
}

/// True if `url`'s host is `host` or a subdomain of it.
fn host_matches(url: &str, host: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    authority == host || authority.ends_with(&format!(".{host}"))
}

#[async_trait]
impl AnalysisPolicy for KeywordPolicy {
    async fn analyze(&self, record: &CommentRecord, settings: &TenantSettings) -> AnalysisVerdict {
        self.evaluate(record, settings)
    }
}
