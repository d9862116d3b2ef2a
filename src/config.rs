//! Node/processor configuration shapes (spec §6 "Configuration enums",
//! `[ADD]` ambient config expansion). These are plain, `serde`-deserializable
//! structs — parsing a request body into them is the host's job (spec
//! Non-goals).

use serde::{Deserialize, Serialize};

pub use crate::interpolate::{FillPolicy, FillWithRealPolicy};

impl Serialize for FillPolicy {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            FillPolicy::None => serializer.serialize_str("NONE"),
            FillPolicy::Null => serializer.serialize_str("NULL"),
            FillPolicy::Nan => serializer.serialize_str("NAN"),
            FillPolicy::Zero => serializer.serialize_str("ZERO"),
            FillPolicy::Min => serializer.serialize_str("MIN"),
            FillPolicy::Max => serializer.serialize_str("MAX"),
            FillPolicy::Scalar(v) => serializer.serialize_f64(*v),
        }
    }
}

impl<'de> Deserialize<'de> for FillPolicy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Named(String),
            Scalar(f64),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Scalar(v) => Ok(FillPolicy::Scalar(v)),
            Repr::Named(s) => match s.as_str() {
                "NONE" => Ok(FillPolicy::None),
                "NULL" => Ok(FillPolicy::Null),
                "NAN" => Ok(FillPolicy::Nan),
                "ZERO" => Ok(FillPolicy::Zero),
                "MIN" => Ok(FillPolicy::Min),
                "MAX" => Ok(FillPolicy::Max),
                other => Err(serde::de::Error::custom(format!("unknown FillPolicy: {other}"))),
            },
        }
    }
}

impl Serialize for FillWithRealPolicy {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let s = match self {
            FillWithRealPolicy::None => "NONE",
            FillWithRealPolicy::PreviousOnly => "PREVIOUS_ONLY",
            FillWithRealPolicy::NextOnly => "NEXT_ONLY",
            FillWithRealPolicy::PreferPrevious => "PREFER_PREVIOUS",
            FillWithRealPolicy::PreferNext => "PREFER_NEXT",
        };
        serializer.serialize_str(s)
    }
}

impl<'de> Deserialize<'de> for FillWithRealPolicy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "NONE" => Ok(FillWithRealPolicy::None),
            "PREVIOUS_ONLY" => Ok(FillWithRealPolicy::PreviousOnly),
            "NEXT_ONLY" => Ok(FillWithRealPolicy::NextOnly),
            "PREFER_PREVIOUS" => Ok(FillWithRealPolicy::PreferPrevious),
            "PREFER_NEXT" => Ok(FillWithRealPolicy::PreferNext),
            other => Err(serde::de::Error::custom(format!(
                "unknown FillWithRealPolicy: {other}"
            ))),
        }
    }
}

/// Merge node mode (spec §4.6 "Merge").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MergeMode {
    Split,
    Ha,
}

/// Expression operand kind (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperandType {
    LiteralBool,
    LiteralNumeric,
    LiteralString,
    Variable,
    SubExp,
}

/// Rollup fallback behavior when a rollup interval is requested but raw
/// data is (un)available (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RollupUsage {
    RollupRaw,
    RollupNofallback,
    RollupFallback,
    RollupFallbackRaw,
}

/// Expression operator set (spec §4.6 "Expression").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpressionOp {
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl ExpressionOp {
    pub fn is_logical(&self) -> bool {
        matches!(self, ExpressionOp::And | ExpressionOp::Or)
    }

    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            ExpressionOp::Eq
                | ExpressionOp::Ne
                | ExpressionOp::Lt
                | ExpressionOp::Le
                | ExpressionOp::Gt
                | ExpressionOp::Ge
        )
    }
}

use crate::aggregate::Reducer;

/// Rate processor configuration (spec §4.6 "Rate").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateConfig {
    /// Nanoseconds the emitted rate is expressed per (the `denom` divisor's
    /// numerator scale).
    pub interval_ns: i64,
    pub counter: bool,
    pub counter_max: i64,
    pub reset_value: i64,
    pub drop_resets: bool,
    pub delta_only: bool,
    pub rate_to_count: bool,
    pub data_interval_ms: i64,
}

impl RateConfig {
    /// Default reset-value sentinel: a `reset_value` at or below this is
    /// treated as "not configured" (spec §4.6 "then if reset_value >
    /// default_reset && rate[i] > reset_value").
    pub const DEFAULT_RESET: i64 = 0;
}

/// Expression processor configuration (spec §4.6 "Expression").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpressionConfig {
    pub op: ExpressionOp,
    pub infectious_nan: bool,
}

/// Merge processor configuration (spec §4.6 "Merge").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    pub mode: MergeMode,
    /// Per-source timeout budgets, in HA mode, indexed the same as
    /// `sortedDataSources`.
    pub timeouts_ms: Vec<u64>,
    #[serde(skip, default = "default_reducer")]
    pub reducer: Reducer,
}

fn default_reducer() -> Reducer {
    Reducer::Sum
}

/// Top-N processor configuration (spec §4.6 "Top-N").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopNConfig {
    pub count: usize,
    pub is_top: bool,
    #[serde(skip, default = "default_reducer")]
    pub aggregator: Reducer,
}

/// Time-shift processor configuration (spec §4.6 "Time-shift").
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeShiftConfig {
    pub amount_seconds: i64,
    pub previous: bool,
}

/// Dedup processor configuration (spec §4.6 "Dedup").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DedupPolicy {
    KeepEarliest,
    KeepLatest,
}
