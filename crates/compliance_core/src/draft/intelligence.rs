//! Structured extraction of a regulatory notice.
//!
//! Every field is optional on the wire: the extractor reports what it could not
//! find through `critical_missing_fields` rather than by omitting keys.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticeSnapshot {
    pub authority: Option<String>,
    pub notice_number: Option<String>,
    pub din_rfn: Option<String>,
    pub period: Option<String>,
    pub response_deadline: Option<String>,
    pub invoked_provisions: Vec<String>,
    /// Number or formatted string, as the notice states it.
    pub demand_total: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Allegation {
    pub scn_para: Option<Value>,
    pub allegation: String,
    pub amount: Option<Value>,
    pub department_basis: Option<String>,
    pub rebuttal_direction: Option<String>,
    pub evidence_expected: Vec<String>,
    pub legal_hooks: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticeIntelligence {
    pub notice_snapshot: NoticeSnapshot,
    pub allegations: Vec<Allegation>,
    pub critical_missing_fields: Vec<String>,
}

impl NoticeIntelligence {
    /// Parses the extractor's reply. Only a JSON object is accepted.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(strip_code_fences(raw))
    }
}

/// Removes a surrounding Markdown code fence (with or without a `json` tag).
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXTRACTED: &str = r#"{
        "notice_snapshot": {
            "authority": "Superintendent, CGST Range-IV",
            "notice_number": "SCN/23/2024",
            "din_rfn": "DIN2024011234",
            "period": "FY 2019-20",
            "response_deadline": "30 days",
            "invoked_provisions": ["Section 73", "Section 16(2)(c)"],
            "demand_total": 482000
        },
        "allegations": [{
            "scn_para": "4.1",
            "allegation": "Excess ITC claimed vs GSTR-2A",
            "amount": "4,82,000",
            "department_basis": "GSTR-2A mismatch",
            "rebuttal_direction": "Supplier filed returns late",
            "evidence_expected": ["invoices", "payment proof"],
            "legal_hooks": ["Section 16(2)"]
        }],
        "critical_missing_fields": []
    }"#;

    #[test]
    fn fenced_json_is_unwrapped() {
        let fenced = format!("```json\n{EXTRACTED}\n```");
        let parsed = NoticeIntelligence::parse(&fenced).unwrap();
        assert_eq!(parsed.allegations.len(), 1);
        assert_eq!(
            parsed.notice_snapshot.invoked_provisions,
            vec!["Section 73", "Section 16(2)(c)"]
        );
        assert!(parsed.critical_missing_fields.is_empty());
    }

    #[test]
    fn prose_is_rejected() {
        assert!(NoticeIntelligence::parse("Here is the summary of the notice you sent.").is_err());
    }

    #[test]
    fn missing_keys_default_to_empty() {
        let parsed =
            NoticeIntelligence::parse(r#"{"critical_missing_fields":["response_deadline"]}"#)
                .unwrap();
        assert_eq!(parsed.critical_missing_fields, vec!["response_deadline"]);
        assert_eq!(parsed.notice_snapshot, NoticeSnapshot::default());
    }

    #[test]
    fn plain_fence_is_unwrapped() {
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  {}  "), "{}");
    }
}
