//! Pattern matchers - one independent recognizer per instruction category.
//!
//! Every matcher receives the lowercased instruction and returns `None` when its category is not
//! mentioned, or a typed capture built from the FIRST regex match. Matchers never look at the
//! table; resolving captured tokens to columns is the resolver's job.

use crate::vocabulary::{self, mentions_any};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ARITHMETIC: Regex =
        Regex::new(r"calculate\s+(\w+)\s*=\s*(\w+)\s*([-+*/])\s*(\w+)").expect("valid regex");
    static ref FILTER: Regex = Regex::new(
        r#"filter\s+(?:by\s+|where\s+)?(\w+)\s*([<>=!]+)\s*['"]?([\w.\-]+)['"]?"#
    )
    .expect("valid regex");
    static ref CASE: Regex =
        Regex::new(r"\b(uppercase|lowercase|upper case|lower case)\s+(?:the\s+)?(\w+)")
            .expect("valid regex");
    static ref RENAME: Regex = Regex::new(r"rename\s+(\w+)\s+to\s+(\w+)").expect("valid regex");
    static ref DATE: Regex =
        Regex::new(r"convert\s+(\w+)\s+to\s+(?:datetime|date)\b").expect("valid regex");
    static ref GROUP: Regex = Regex::new(
        r"group\s+by\s+(\w+)(?:\s+and)?(?:\s+(sum|mean|count|max|min|average)\s+(?:of\s+)?(\w+))?"
    )
    .expect("valid regex");
    static ref SORT: Regex = Regex::new(
        r"sort\s+by\s+(\w+)(?:\s+(?:in\s+)?(ascending|descending|asc|desc)\b)?"
    )
    .expect("valid regex");
    static ref DROP_NULL: Regex =
        Regex::new(r"\b(?:remove|drop|exclude|filter)\s+(?:all\s+)?nulls?\b").expect("valid regex");
    static ref FILL_NULL: Regex = Regex::new(
        r"\b(?:fill|replace|handle)\s+(?:all\s+)?nulls?(?:\s+(?:with|using)\s+(?:the\s+)?(?:column\s+)?(?:mean|average|avg|zero|0)\b)?"
    )
    .expect("valid regex");
    static ref REVENUE: Regex =
        Regex::new(r"\brevenue|\btotal\b.*\bvalue|\bamount").expect("valid regex");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithmeticOp {
    fn parse(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(ArithmeticOp::Add),
            "-" => Some(ArithmeticOp::Subtract),
            "*" => Some(ArithmeticOp::Multiply),
            "/" => Some(ArithmeticOp::Divide),
            _ => None,
        }
    }

    /// Applies the operator; division by zero yields `None` instead of infinity.
    pub fn apply(&self, left: f64, right: f64) -> Option<f64> {
        match self {
            ArithmeticOp::Add => Some(left + right),
            ArithmeticOp::Subtract => Some(left - right),
            ArithmeticOp::Multiply => Some(left * right),
            ArithmeticOp::Divide if right == 0.0 => None,
            ArithmeticOp::Divide => Some(left / right),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArithmeticCapture {
    pub target: String,
    pub left: String,
    pub op: ArithmeticOp,
    pub right: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Lt,
    GtEq,
    LtEq,
    Eq,
    NotEq,
}

impl CompareOp {
    pub fn parse(symbol: &str) -> Option<Self> {
        match symbol {
            ">" => Some(CompareOp::Gt),
            "<" => Some(CompareOp::Lt),
            ">=" => Some(CompareOp::GtEq),
            "<=" => Some(CompareOp::LtEq),
            "=" | "==" => Some(CompareOp::Eq),
            "!=" | "<>" => Some(CompareOp::NotEq),
            _ => None,
        }
    }

    pub fn holds<T: PartialOrd + ?Sized>(&self, left: &T, right: &T) -> bool {
        match self {
            CompareOp::Gt => left > right,
            CompareOp::Lt => left < right,
            CompareOp::GtEq => left >= right,
            CompareOp::LtEq => left <= right,
            CompareOp::Eq => left == right,
            CompareOp::NotEq => left != right,
        }
    }
}

/// A `filter <col> <op> <value>` clause. The operator symbol is kept raw so that the applier can
/// tell an unsupported operator apart from a missing clause.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCapture {
    pub column: String,
    pub operator: String,
    pub value: String,
}

impl FilterCapture {
    pub fn op(&self) -> Option<CompareOp> {
        CompareOp::parse(&self.operator)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseMode {
    Upper,
    Lower,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseCapture {
    pub mode: CaseMode,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenameCapture {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateCapture {
    pub column: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggFunction {
    Sum,
    Mean,
    Count,
    Max,
    Min,
}

impl AggFunction {
    /// Maps a function word to an aggregation; unknown words fall back to `Sum`.
    pub fn from_word(word: &str) -> Self {
        match word {
            "mean" | "average" | "avg" => AggFunction::Mean,
            "count" => AggFunction::Count,
            "max" => AggFunction::Max,
            "min" => AggFunction::Min,
            _ => AggFunction::Sum,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AggFunction::Sum => "sum",
            AggFunction::Mean => "mean",
            AggFunction::Count => "count",
            AggFunction::Max => "max",
            AggFunction::Min => "min",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupCapture {
    pub group: String,
    pub aggregate: Option<(AggFunction, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortCapture {
    pub column: String,
    pub descending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillNullCapture {
    pub use_mean: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryCapture {
    pub performance: bool,
    pub inventory: bool,
}

/// Instruction text with every clause that names its own columns removed (`calculate x = ...`,
/// `group by ... sum y`, `fill nulls with mean`, `filter total > 5`, `sort by total`, ...), so
/// that a trigger word used as a column token does not fire a row-wise derive.
fn without_explicit_clauses(text: &str) -> String {
    [
        &*ARITHMETIC,
        &*GROUP,
        &*FILL_NULL,
        &*FILTER,
        &*SORT,
        &*RENAME,
        &*CASE,
        &*DATE,
    ]
    .iter()
    .fold(text.to_string(), |acc, re| re.replace_all(&acc, " ").into_owned())
}

pub fn match_sum_derive(text: &str) -> bool {
    mentions_any(&without_explicit_clauses(text), vocabulary::SUM_TRIGGERS)
}

pub fn match_mean_derive(text: &str) -> bool {
    mentions_any(&without_explicit_clauses(text), vocabulary::MEAN_TRIGGERS)
}

pub fn match_revenue_derive(text: &str) -> bool {
    REVENUE.is_match(&without_explicit_clauses(text))
}

pub fn match_arithmetic(text: &str) -> Option<ArithmeticCapture> {
    let caps = ARITHMETIC.captures(text)?;
    Some(ArithmeticCapture {
        target: caps[1].to_string(),
        left: caps[2].to_string(),
        op: ArithmeticOp::parse(&caps[3])?,
        right: caps[4].to_string(),
    })
}

pub fn match_cleaning(text: &str) -> bool {
    mentions_any(text, vocabulary::CLEAN_TRIGGERS)
}

pub fn match_drop_null(text: &str) -> bool {
    DROP_NULL.is_match(text)
}

pub fn match_fill_null(text: &str) -> Option<FillNullCapture> {
    if !FILL_NULL.is_match(text) {
        return None;
    }
    Some(FillNullCapture {
        use_mean: text.contains("mean"),
    })
}

pub fn match_case(text: &str) -> Option<CaseCapture> {
    let caps = CASE.captures(text)?;
    let mode = if caps[1].starts_with("upper") {
        CaseMode::Upper
    } else {
        CaseMode::Lower
    };
    Some(CaseCapture {
        mode,
        column: caps[2].to_string(),
    })
}

pub fn match_filter(text: &str) -> Option<FilterCapture> {
    let caps = FILTER.captures(text)?;
    Some(FilterCapture {
        column: caps[1].to_string(),
        operator: caps[2].to_string(),
        value: caps[3].to_string(),
    })
}

pub fn match_active_only(text: &str) -> bool {
    mentions_any(text, vocabulary::ACTIVE_TRIGGERS)
}

pub fn match_rename(text: &str) -> Option<RenameCapture> {
    let caps = RENAME.captures(text)?;
    Some(RenameCapture {
        from: caps[1].to_string(),
        to: caps[2].to_string(),
    })
}

pub fn match_full_name(text: &str) -> bool {
    mentions_any(text, vocabulary::FULL_NAME_TRIGGERS)
}

pub fn match_category(text: &str) -> Option<CategoryCapture> {
    if !mentions_any(text, vocabulary::CATEGORY_TRIGGERS) {
        return None;
    }
    let capture = CategoryCapture {
        performance: mentions_any(text, vocabulary::PERFORMANCE_DOMAIN),
        inventory: mentions_any(text, vocabulary::INVENTORY_DOMAIN),
    };
    (capture.performance || capture.inventory).then_some(capture)
}

pub fn match_date_convert(text: &str) -> Option<DateCapture> {
    let caps = DATE.captures(text)?;
    Some(DateCapture {
        column: caps[1].to_string(),
    })
}

pub fn match_timestamp(text: &str) -> bool {
    mentions_any(text, vocabulary::TIMESTAMP_TRIGGERS)
}

pub fn match_group(text: &str) -> Option<GroupCapture> {
    let caps = GROUP.captures(text)?;
    let aggregate = match (caps.get(2), caps.get(3)) {
        (Some(func), Some(column)) => Some((
            AggFunction::from_word(func.as_str()),
            column.as_str().to_string(),
        )),
        _ => None,
    };
    Some(GroupCapture {
        group: caps[1].to_string(),
        aggregate,
    })
}

pub fn match_sort(text: &str) -> Option<SortCapture> {
    let caps = SORT.captures(text)?;
    let descending = matches!(
        caps.get(2).map(|m| m.as_str()),
        Some("desc") | Some("descending")
    );
    Some(SortCapture {
        column: caps[1].to_string(),
        descending,
    })
}
