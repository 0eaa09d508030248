//! Client classification: coarse client families and a bot verdict.
//!
//! Families are derived from the client signature (the `User-Agent` string)
//! with the `woothee` pattern library. The bot verdict comes from an ordered
//! list of [`BotTier`]s; the first tier that returns a verdict decides.
//! New signal sources (denylisted addresses, denylisted referrers, ...) are
//! added by appending a tier, not by editing the existing ones.

use woothee::parser::Parser;

/// Parser names for generic matches that do not identify a specific crawler.
const GENERIC_CRAWLER_NAMES: &[&str] = &["HTTP Library", "misc crawler", "UNKNOWN"];

/// Case-insensitive substrings that mark a signature as automated.
const BOT_KEYWORDS: &[&str] = &["bot", "spider"];

/// Family name used when the parser cannot tell.
const OTHER: &str = "Other";

/// Signals available to bot tiers for one request.
#[derive(Debug, Clone, Copy)]
pub struct ClientSignals<'a> {
    /// Raw client signature; empty when the client sent none.
    pub signature: &'a str,
    pub parsed: &'a ParsedSignature,
    pub source_address: Option<&'a str>,
    pub referrer: Option<&'a str>,
}

/// Result of running the signature through the pattern library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSignature {
    /// Parser's product name (e.g. `Chrome`, `Googlebot`), `UNKNOWN` if unmatched.
    pub name: String,
    /// Parser's category (`pc`, `smartphone`, `crawler`, ...).
    pub category: String,
    pub os: String,
}

impl ParsedSignature {
    pub fn parse(signature: &str) -> Self {
        let parser = Parser::new();
        let result = parser.parse(signature).unwrap_or_default();

        Self {
            name: result.name.to_string(),
            category: result.category.to_string(),
            os: result.os.to_string(),
        }
    }

    /// Returns true if the library matched a named automated client.
    pub fn is_known_crawler(&self) -> bool {
        self.category == "crawler" && !GENERIC_CRAWLER_NAMES.contains(&self.name.as_str())
    }

    pub fn device_family(&self) -> &'static str {
        match self.category.as_str() {
            "pc" => "desktop",
            "smartphone" | "mobilephone" => "mobile",
            "appliance" => "appliance",
            "crawler" => "bot",
            _ => "other",
        }
    }

    pub fn browser_family(&self) -> String {
        known_or_other(&self.name)
    }

    pub fn platform_family(&self) -> String {
        known_or_other(&self.os)
    }
}

fn known_or_other(value: &str) -> String {
    if value.is_empty() || value == "UNKNOWN" {
        OTHER.to_string()
    } else {
        value.to_string()
    }
}

/// An explainable bot decision. Every positive verdict carries a reason.
#[derive(Debug, Clone, PartialEq)]
pub struct BotVerdict {
    pub is_bot: bool,
    pub confidence: f64,
    pub reason: Option<String>,
}

impl BotVerdict {
    pub fn bot(confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            is_bot: true,
            confidence,
            reason: Some(reason.into()),
        }
    }

    pub fn human() -> Self {
        Self {
            is_bot: false,
            confidence: 0.0,
            reason: None,
        }
    }
}

/// One heuristic in the ordered bot-detection chain.
pub trait BotTier: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Returns a verdict, or `None` to defer to the next tier.
    fn assess(&self, signals: &ClientSignals<'_>) -> Option<BotVerdict>;
}

/// Tier 1: the pattern library recognises a named crawler.
pub struct KnownBotSignature;

impl BotTier for KnownBotSignature {
    fn name(&self) -> &'static str {
        "known_signature"
    }

    fn assess(&self, signals: &ClientSignals<'_>) -> Option<BotVerdict> {
        signals
            .parsed
            .is_known_crawler()
            .then(|| BotVerdict::bot(0.9, "known bot signature"))
    }
}

/// Tier 2: the raw signature contains a bot keyword.
pub struct KeywordMatch;

impl BotTier for KeywordMatch {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn assess(&self, signals: &ClientSignals<'_>) -> Option<BotVerdict> {
        let lowered = signals.signature.to_ascii_lowercase();

        BOT_KEYWORDS
            .iter()
            .any(|k| lowered.contains(k))
            .then(|| BotVerdict::bot(0.7, "keyword match"))
    }
}

/// Full classification written onto a tracking event.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub device_family: String,
    pub browser_family: String,
    pub platform_family: String,
    pub is_bot: bool,
    pub bot_confidence: f64,
    pub bot_reason: Option<String>,
}

/// Pure, I/O-free client classifier.
pub struct ClientClassifier {
    tiers: Vec<Box<dyn BotTier>>,
}

impl Default for ClientClassifier {
    fn default() -> Self {
        Self::with_tiers(vec![Box::new(KnownBotSignature), Box::new(KeywordMatch)])
    }
}

impl ClientClassifier {
    /// Builds a classifier with an explicit tier order.
    pub fn with_tiers(tiers: Vec<Box<dyn BotTier>>) -> Self {
        Self { tiers }
    }

    /// Appends a tier consulted only when every earlier tier deferred.
    pub fn push_tier(&mut self, tier: Box<dyn BotTier>) {
        self.tiers.push(tier);
    }

    /// Classifies a bare client signature.
    pub fn classify(&self, signature: Option<&str>) -> Classification {
        self.classify_request(signature, None, None)
    }

    /// Classifies a client signature together with auxiliary request signals.
    pub fn classify_request(
        &self,
        signature: Option<&str>,
        source_address: Option<&str>,
        referrer: Option<&str>,
    ) -> Classification {
        let signature = signature.unwrap_or_default();
        let parsed = ParsedSignature::parse(signature);

        let signals = ClientSignals {
            signature,
            parsed: &parsed,
            source_address,
            referrer,
        };

        let verdict = self
            .tiers
            .iter()
            .find_map(|tier| {
                tier.assess(&signals).inspect(|v| {
                    tracing::trace!(tier = tier.name(), is_bot = v.is_bot, "bot tier decided");
                })
            })
            .unwrap_or_else(BotVerdict::human);

        Classification {
            device_family: parsed.device_family().to_string(),
            browser_family: parsed.browser_family(),
            platform_family: parsed.platform_family(),
            is_bot: verdict.is_bot,
            bot_confidence: verdict.confidence,
            bot_reason: verdict.reason,
        }
    }
}
