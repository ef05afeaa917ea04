//! Transaction ledger: data model and ingest validation
//!
//! A ledger document is validated and normalized once, here. Everything
//! downstream works on the canonical types and never re-inspects raw JSON.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::constants;
use crate::error::LedgerError;
use crate::period::{local_to_utc, start_of_day};

const REQUIRED_METADATA_FIELDS: [&str; 3] = ["userName", "utcOffset", "operationalStatus"];
const REQUIRED_TRANSACTION_FIELDS: [&str; 4] = ["id", "timestamp", "channel", "creatorAlias"];

// =============================================================================
// Channels
// =============================================================================

/// Earnings category of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Subscriptions,
    Tips,
    Posts,
    Messages,
    Referrals,
    Streams,
}

impl Channel {
    pub const ALL: [Channel; 6] = [
        Self::Subscriptions,
        Self::Tips,
        Self::Posts,
        Self::Messages,
        Self::Referrals,
        Self::Streams,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subscriptions => "subscriptions",
            Self::Tips => "tips",
            Self::Posts => "posts",
            Self::Messages => "messages",
            Self::Referrals => "referrals",
            Self::Streams => "streams",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown channel '{}'", s))
    }
}

// =============================================================================
// Amounts
// =============================================================================

/// How a transaction's money was recorded in the document
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AmountInput {
    /// Only the gross amount; fee and net are derived from the ledger fee rate
    Raw { amount: f64 },
    /// Already split by the exporter; trusted verbatim
    Precomputed { gross: f64, net: f64, fee: Option<f64> },
}

/// Canonical gross / net / fee triple
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Amounts {
    pub gross: f64,
    pub net: f64,
    pub platform_fee: f64,
}

impl AmountInput {
    pub fn normalize(&self, platform_fee_rate: f64) -> Amounts {
        match *self {
            Self::Raw { amount } => {
                let platform_fee = amount * platform_fee_rate;
                Amounts {
                    gross: amount,
                    net: amount - platform_fee,
                    platform_fee,
                }
            }
            Self::Precomputed { gross, net, fee } => Amounts {
                gross,
                net,
                platform_fee: fee.unwrap_or(gross - net),
            },
        }
    }
}

impl From<Amounts> for AmountInput {
    fn from(amounts: Amounts) -> Self {
        Self::Precomputed {
            gross: amounts.gross,
            net: amounts.net,
            fee: Some(amounts.platform_fee),
        }
    }
}

// =============================================================================
// Records
// =============================================================================

/// Ledger header
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub user_name: String,
    pub utc_offset: String,
    pub operational_status: bool,
    #[serde(default)]
    pub platform_fee: Option<f64>,
    #[serde(default)]
    pub total_messages: u64,
    #[serde(default)]
    pub generated_at: Option<String>,
}

/// A transaction that was refunded after the fact
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Refund {
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
}

/// One immutable earnings fact
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub channel: Channel,
    pub creator_alias: String,
    pub fan_id: Option<String>,
    #[serde(flatten)]
    pub amounts: Amounts,
    pub refund: Option<Refund>,
}

impl Transaction {
    pub fn is_refunded(&self) -> bool {
        self.refund.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionType {
    New,
    Recurring,
}

/// Subscription relationship between a fan and a creator
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fan {
    pub fan_id: String,
    pub creator_alias: String,
    pub subscription_start: DateTime<Utc>,
    pub subscription_status: SubscriptionStatus,
    pub subscription_type: SubscriptionType,
    pub renew_on: bool,
    pub last_transaction: Option<DateTime<Utc>>,
}

/// Creator profile; descriptive fields beyond the known ones are kept as-is
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    pub alias: String,
    #[serde(default)]
    pub of_ranking: Option<Value>,
    #[serde(default)]
    pub following: Option<Value>,
    #[serde(flatten)]
    pub details: BTreeMap<String, Value>,
}

/// Earliest and latest transaction instants
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRange {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSummary {
    pub total_messages: u64,
}

// =============================================================================
// Options
// =============================================================================

/// Knobs applied while adopting a document
#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerOptions {
    /// Reporting offset; overrides `metadata.utcOffset` when set
    pub utc_offset: Option<FixedOffset>,
    /// Reproduce the legacy behavior where an explicit `platformFee: 0`
    /// falls back to the default rate
    pub zero_fee_means_default: bool,
}

// =============================================================================
// Ledger
// =============================================================================

/// Root document, read-only after load
#[derive(Debug, Clone)]
pub struct Ledger {
    pub metadata: Metadata,
    pub transactions: Vec<Transaction>,
    pub fans: Vec<Fan>,
    pub creators: Vec<Creator>,
    platform_fee_rate: f64,
    offset: FixedOffset,
}

#[derive(Deserialize)]
struct RawLedger {
    metadata: Metadata,
    transactions: Vec<RawTransaction>,
    #[serde(default)]
    fans: Option<Vec<RawFan>>,
    #[serde(default)]
    creators: Option<Vec<Creator>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTransaction {
    id: String,
    timestamp: String,
    channel: String,
    creator_alias: String,
    #[serde(default)]
    fan_id: Option<String>,
    #[serde(default)]
    amount: Option<f64>,
    #[serde(default)]
    gross_amount: Option<f64>,
    #[serde(default)]
    net_amount: Option<f64>,
    #[serde(default)]
    platform_fee: Option<f64>,
    #[serde(default)]
    is_refunded: bool,
    #[serde(default)]
    refund_amount: Option<f64>,
    #[serde(default)]
    refund_timestamp: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFan {
    fan_id: String,
    creator_alias: String,
    subscription_start_date: String,
    subscription_status: SubscriptionStatus,
    subscription_type: SubscriptionType,
    #[serde(default)]
    renew_on: bool,
    #[serde(default)]
    last_transaction_date: Option<String>,
}

impl Ledger {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str, options: &LedgerOptions) -> Result<Self, LedgerError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value, options)
    }

    /// Validate an already-parsed JSON document
    pub fn from_value(value: Value, options: &LedgerOptions) -> Result<Self, LedgerError> {
        validate_shape(&value)?;
        let raw: RawLedger = serde_json::from_value(value)?;

        let offset = match options.utc_offset {
            Some(offset) => offset,
            None => parse_utc_offset(&raw.metadata.utc_offset).ok_or_else(|| {
                LedgerError::invalid("metadata.utcOffset", format!("'{}' is not a UTC offset", raw.metadata.utc_offset))
            })?,
        };
        let platform_fee_rate = resolve_fee_rate(raw.metadata.platform_fee, options.zero_fee_means_default)?;

        let transactions = raw
            .transactions
            .into_iter()
            .enumerate()
            .map(|(i, tx)| convert_transaction(i, tx, platform_fee_rate, &offset))
            .collect::<Result<Vec<_>, _>>()?;

        let fans = raw
            .fans
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, fan)| convert_fan(i, fan, &offset))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            metadata: raw.metadata,
            transactions,
            fans,
            creators: raw.creators.unwrap_or_default(),
            platform_fee_rate,
            offset,
        })
    }

    /// Fee rate used to derive net amounts for raw transactions
    pub fn platform_fee_rate(&self) -> f64 {
        self.platform_fee_rate
    }

    /// Offset in which day boundaries are cut
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Span of transaction timestamps, `None` when there are no transactions
    pub fn data_range(&self) -> Option<DataRange> {
        let start_date = self.transactions.iter().map(|tx| tx.timestamp).min()?;
        let end_date = self.transactions.iter().map(|tx| tx.timestamp).max()?;
        Some(DataRange { start_date, end_date })
    }

    pub fn notification_summary(&self) -> NotificationSummary {
        NotificationSummary {
            total_messages: self.metadata.total_messages,
        }
    }

    /// Profile lookup by alias
    pub fn creator(&self, alias: &str) -> Option<&Creator> {
        self.creators.iter().find(|c| c.alias == alias)
    }

    /// Distinct creator aliases in order of first appearance
    pub fn creator_aliases(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.transactions
            .iter()
            .map(|tx| tx.creator_alias.as_str())
            .filter(|alias| seen.insert(*alias))
            .collect()
    }
}

// =============================================================================
// Validation helpers
// =============================================================================

fn has_value(object: &Map<String, Value>, key: &str) -> bool {
    object.get(key).is_some_and(|v| !v.is_null())
}

/// Structural checks with field-level messages, before typed decoding
fn validate_shape(value: &Value) -> Result<(), LedgerError> {
    let root = value
        .as_object()
        .ok_or_else(|| LedgerError::invalid("$", "expected a JSON object"))?;

    let metadata = root
        .get("metadata")
        .ok_or_else(|| LedgerError::MissingField("metadata".into()))?
        .as_object()
        .ok_or_else(|| LedgerError::invalid("metadata", "expected an object"))?;
    for field in REQUIRED_METADATA_FIELDS {
        if !has_value(metadata, field) {
            return Err(LedgerError::MissingField(format!("metadata.{}", field)));
        }
    }

    let transactions = root
        .get("transactions")
        .ok_or_else(|| LedgerError::MissingField("transactions".into()))?
        .as_array()
        .ok_or_else(|| LedgerError::invalid("transactions", "expected an array"))?;

    for (i, tx) in transactions.iter().enumerate() {
        let tx = tx
            .as_object()
            .ok_or_else(|| LedgerError::invalid(format!("transactions[{}]", i), "expected an object"))?;
        for field in REQUIRED_TRANSACTION_FIELDS {
            if !has_value(tx, field) {
                return Err(LedgerError::MissingField(format!("transactions[{}].{}", i, field)));
            }
        }
        let has_raw = has_value(tx, "amount");
        let has_precomputed = has_value(tx, "grossAmount") && has_value(tx, "netAmount");
        if !has_raw && !has_precomputed {
            let id = tx.get("id").map(display_id).unwrap_or_default();
            return Err(LedgerError::MissingAmount { id });
        }
    }

    Ok(())
}

fn display_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn resolve_fee_rate(configured: Option<f64>, zero_means_default: bool) -> Result<f64, LedgerError> {
    match configured {
        None => Ok(constants::DEFAULT_PLATFORM_FEE_RATE),
        Some(rate) if rate == 0.0 && zero_means_default => Ok(constants::DEFAULT_PLATFORM_FEE_RATE),
        Some(rate) if !(0.0..=1.0).contains(&rate) => Err(LedgerError::invalid(
            "metadata.platformFee",
            format!("{} is outside 0.0..=1.0", rate),
        )),
        Some(rate) => Ok(rate),
    }
}

fn convert_transaction(
    index: usize,
    raw: RawTransaction,
    platform_fee_rate: f64,
    offset: &FixedOffset,
) -> Result<Transaction, LedgerError> {
    let field = |name: &str| format!("transactions[{}].{}", index, name);

    let timestamp = parse_instant(&raw.timestamp, offset)
        .ok_or_else(|| LedgerError::invalid(field("timestamp"), format!("'{}' is not a timestamp", raw.timestamp)))?;
    let channel = raw
        .channel
        .parse::<Channel>()
        .map_err(|reason| LedgerError::invalid(field("channel"), reason))?;

    let input = match (raw.gross_amount, raw.net_amount, raw.amount) {
        (Some(gross), Some(net), _) => AmountInput::Precomputed {
            gross,
            net,
            fee: raw.platform_fee,
        },
        (_, _, Some(amount)) => AmountInput::Raw { amount },
        _ => return Err(LedgerError::MissingAmount { id: raw.id }),
    };
    let amounts = input.normalize(platform_fee_rate);

    let refund = if raw.is_refunded {
        let stamp = raw
            .refund_timestamp
            .as_deref()
            .ok_or_else(|| LedgerError::MissingRefundTimestamp { id: raw.id.clone() })?;
        let timestamp = parse_instant(stamp, offset)
            .ok_or_else(|| LedgerError::invalid(field("refundTimestamp"), format!("'{}' is not a timestamp", stamp)))?;
        Some(Refund {
            // 0 is the exporter's placeholder for "not recorded"
            amount: raw
                .refund_amount
                .filter(|amount| *amount != 0.0)
                .unwrap_or(amounts.gross),
            timestamp,
        })
    } else {
        None
    };

    Ok(Transaction {
        id: raw.id,
        timestamp,
        channel,
        creator_alias: raw.creator_alias,
        fan_id: raw.fan_id,
        amounts,
        refund,
    })
}

fn convert_fan(index: usize, raw: RawFan, offset: &FixedOffset) -> Result<Fan, LedgerError> {
    let field = |name: &str| format!("fans[{}].{}", index, name);

    let subscription_start = parse_instant(&raw.subscription_start_date, offset).ok_or_else(|| {
        LedgerError::invalid(
            field("subscriptionStartDate"),
            format!("'{}' is not a timestamp", raw.subscription_start_date),
        )
    })?;
    let last_transaction = match raw.last_transaction_date.as_deref() {
        Some(stamp) => Some(parse_instant(stamp, offset).ok_or_else(|| {
            LedgerError::invalid(field("lastTransactionDate"), format!("'{}' is not a timestamp", stamp))
        })?),
        None => None,
    };

    Ok(Fan {
        fan_id: raw.fan_id,
        creator_alias: raw.creator_alias,
        subscription_start,
        subscription_status: raw.subscription_status,
        subscription_type: raw.subscription_type,
        renew_on: raw.renew_on,
        last_transaction,
    })
}

/// Parse `±HH:MM`, `±HHMM`, `Z` or `UTC`
pub fn parse_utc_offset(s: &str) -> Option<FixedOffset> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Parse RFC 3339, a naive date-time (in `offset`) or a bare date (local midnight)
pub fn parse_instant(s: &str, offset: &FixedOffset) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(local_to_utc(naive, offset));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|date| start_of_day(date, offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn document(transactions: Value) -> Value {
        json!({
            "metadata": {
                "userName": "Agency",
                "utcOffset": "+00:00",
                "operationalStatus": true,
                "platformFee": 0.2
            },
            "transactions": transactions
        })
    }

    fn load(value: Value) -> Result<Ledger, LedgerError> {
        Ledger::from_value(value, &LedgerOptions::default())
    }

    #[test]
    fn raw_amount_derives_fee_and_net() {
        let amounts = AmountInput::Raw { amount: 100.0 }.normalize(0.2);
        assert_eq!(
            amounts,
            Amounts {
                gross: 100.0,
                net: 80.0,
                platform_fee: 20.0
            }
        );
    }

    #[test]
    fn normalizing_normalized_amounts_is_identity() {
        let first = AmountInput::Raw { amount: 100.0 }.normalize(0.2);
        let again = AmountInput::from(first).normalize(0.35);
        assert_eq!(first, again);
    }

    #[test]
    fn precomputed_amounts_are_trusted() {
        let ledger = load(document(json!([{
            "id": "t1", "timestamp": "2025-01-01T10:00:00Z", "channel": "tips",
            "creatorAlias": "@a", "grossAmount": 50.0, "netAmount": 45.0, "platformFee": 5.0
        }])))
        .unwrap();
        let amounts = ledger.transactions[0].amounts;
        assert_eq!(amounts.gross, 50.0);
        assert_eq!(amounts.net, 45.0);
        assert_eq!(amounts.platform_fee, 5.0);
    }

    #[test]
    fn missing_metadata_is_rejected() {
        let err = load(json!({ "transactions": [] })).unwrap_err();
        assert!(matches!(err, LedgerError::MissingField(ref f) if f == "metadata"));
    }

    #[test]
    fn missing_transaction_field_names_location() {
        let err = load(document(json!([{
            "id": "t1", "timestamp": "2025-01-01T10:00:00Z", "creatorAlias": "@a", "amount": 1.0
        }])))
        .unwrap_err();
        assert_eq!(err.to_string(), "missing required field `transactions[0].channel`");
    }

    #[test]
    fn transaction_without_any_amount_is_rejected() {
        let err = load(document(json!([{
            "id": "t9", "timestamp": "2025-01-01T10:00:00Z", "channel": "tips",
            "creatorAlias": "@a", "grossAmount": 3.0
        }])))
        .unwrap_err();
        assert!(matches!(err, LedgerError::MissingAmount { ref id } if id == "t9"));
    }

    #[test]
    fn refunded_transaction_needs_refund_timestamp() {
        let err = load(document(json!([{
            "id": "t2", "timestamp": "2025-01-01T10:00:00Z", "channel": "tips",
            "creatorAlias": "@a", "amount": 10.0, "isRefunded": true
        }])))
        .unwrap_err();
        assert!(matches!(err, LedgerError::MissingRefundTimestamp { .. }));
    }

    #[test]
    fn refund_amount_defaults_to_gross() {
        let ledger = load(document(json!([{
            "id": "t3", "timestamp": "2025-01-01T10:00:00Z", "channel": "tips",
            "creatorAlias": "@a", "amount": 12.5, "isRefunded": true,
            "refundTimestamp": "2025-01-03T10:00:00Z"
        }])))
        .unwrap();
        let refund = ledger.transactions[0].refund.unwrap();
        assert_eq!(refund.amount, 12.5);
        assert_eq!(refund.timestamp, Utc.with_ymd_and_hms(2025, 1, 3, 10, 0, 0).unwrap());
    }

    #[test]
    fn zero_refund_amount_falls_back_to_gross() {
        let ledger = load(document(json!([{
            "id": "t5", "timestamp": "2025-01-01T10:00:00Z", "channel": "tips",
            "creatorAlias": "@a", "amount": 30.0, "isRefunded": true,
            "refundAmount": 0, "refundTimestamp": "2025-01-02T10:00:00Z"
        }, {
            "id": "t6", "timestamp": "2025-01-01T11:00:00Z", "channel": "tips",
            "creatorAlias": "@a", "amount": 30.0, "isRefunded": true,
            "refundAmount": 7.5, "refundTimestamp": "2025-01-02T11:00:00Z"
        }])))
        .unwrap();
        assert_eq!(ledger.transactions[0].refund.unwrap().amount, 30.0);
        assert_eq!(ledger.transactions[1].refund.unwrap().amount, 7.5);
    }

    #[test]
    fn unknown_channel_is_invalid() {
        let err = load(document(json!([{
            "id": "t4", "timestamp": "2025-01-01T10:00:00Z", "channel": "merch",
            "creatorAlias": "@a", "amount": 1.0
        }])))
        .unwrap_err();
        assert!(err.to_string().contains("transactions[0].channel"));
    }

    #[test]
    fn fee_rate_defaults_only_when_unset() {
        assert_eq!(resolve_fee_rate(None, false).unwrap(), 0.2);
        assert_eq!(resolve_fee_rate(Some(0.0), false).unwrap(), 0.0);
        assert_eq!(resolve_fee_rate(Some(0.0), true).unwrap(), 0.2);
        assert_eq!(resolve_fee_rate(Some(0.3), true).unwrap(), 0.3);
        assert!(resolve_fee_rate(Some(1.5), false).is_err());
    }

    #[test]
    fn optional_collections_default_to_empty() {
        let ledger = load(document(json!([]))).unwrap();
        assert!(ledger.fans.is_empty());
        assert!(ledger.creators.is_empty());
        assert!(ledger.data_range().is_none());
    }

    #[test]
    fn naive_timestamps_use_ledger_offset() {
        let offset = parse_utc_offset("-07:00").unwrap();
        let instant = parse_instant("2025-01-01T09:00:00", &offset).unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2025, 1, 1, 16, 0, 0).unwrap());

        let midnight = parse_instant("2025-01-01", &offset).unwrap();
        assert_eq!(midnight, Utc.with_ymd_and_hms(2025, 1, 1, 7, 0, 0).unwrap());
    }

    #[test]
    fn utc_offset_formats() {
        assert_eq!(parse_utc_offset("+05:30").unwrap().local_minus_utc(), 5 * 3600 + 30 * 60);
        assert_eq!(parse_utc_offset("-0700").unwrap().local_minus_utc(), -7 * 3600);
        assert_eq!(parse_utc_offset("Z").unwrap().local_minus_utc(), 0);
        assert!(parse_utc_offset("07:00").is_none());
        assert!(parse_utc_offset("+25:00").is_none());
    }

    #[test]
    fn creator_aliases_keep_first_appearance_order() {
        let ledger = load(document(json!([
            { "id": "1", "timestamp": "2025-01-01", "channel": "tips", "creatorAlias": "@b", "amount": 1.0 },
            { "id": "2", "timestamp": "2025-01-02", "channel": "tips", "creatorAlias": "@a", "amount": 1.0 },
            { "id": "3", "timestamp": "2025-01-03", "channel": "tips", "creatorAlias": "@b", "amount": 1.0 }
        ])))
        .unwrap();
        assert_eq!(ledger.creator_aliases(), vec!["@b", "@a"]);
    }
}
