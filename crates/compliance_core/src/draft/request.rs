//! The drafting request value object and its mode/type selectors.

use serde::Serialize;

/// Tone of the generated filing. Unknown values fall back to `Balanced`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftMode {
    Conservative,
    #[default]
    Balanced,
    Aggressive,
}

impl DraftMode {
    pub fn parse_or_default(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "conservative" => DraftMode::Conservative,
            "aggressive" => DraftMode::Aggressive,
            _ => DraftMode::Balanced,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DraftMode::Conservative => "conservative",
            DraftMode::Balanced => "balanced",
            DraftMode::Aggressive => "aggressive",
        }
    }
}

/// The regulatory domain a document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentType {
    Gst,
    IncomeTax,
    Mca,
    Rbi,
    Sebi,
    Customs,
    ContractReview,
    General,
}

impl DocumentType {
    /// Classifies a free-form document type label such as `gst_scn_reply`.
    pub fn classify(raw: &str) -> Self {
        let label = raw.to_ascii_lowercase();
        let has = |needle: &str| label.contains(needle);

        if has("gst") {
            DocumentType::Gst
        } else if has("income") || has("itr") || has("tds") || has("143") || has("148") {
            DocumentType::IncomeTax
        } else if has("mca") || has("roc") || has("companies act") {
            DocumentType::Mca
        } else if has("rbi") || has("fema") {
            DocumentType::Rbi
        } else if has("sebi") {
            DocumentType::Sebi
        } else if has("customs") {
            DocumentType::Customs
        } else if has("contract") {
            DocumentType::ContractReview
        } else {
            DocumentType::General
        }
    }
}

/// One drafting invocation. Never persisted.
#[derive(Debug, Clone)]
pub struct DraftRequest {
    /// The label exactly as the caller sent it; echoed back in metadata.
    pub document_type: String,
    pub company_name: String,
    pub draft_mode: DraftMode,
    pub industry: Option<String>,
    pub context: Option<String>,
    pub notice_details: Option<String>,
    pub advanced_mode: bool,
    pub strict_validation: bool,
    pub stream: bool,
}

impl DraftRequest {
    pub fn kind(&self) -> DocumentType {
        DocumentType::classify(&self.document_type)
    }

    /// Notice text with surrounding whitespace removed; `None` when blank.
    pub fn notice_text(&self) -> Option<&str> {
        self.notice_details
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_mode_falls_back_to_balanced() {
        assert_eq!(DraftMode::parse_or_default("extreme"), DraftMode::Balanced);
        assert_eq!(DraftMode::parse_or_default(" Aggressive "), DraftMode::Aggressive);
    }

    #[test]
    fn document_labels_are_classified() {
        assert_eq!(DocumentType::classify("gst_scn_reply"), DocumentType::Gst);
        assert_eq!(DocumentType::classify("Income Tax 148 notice"), DocumentType::IncomeTax);
        assert_eq!(DocumentType::classify("roc_annual_filing"), DocumentType::Mca);
        assert_eq!(DocumentType::classify("FEMA compounding"), DocumentType::Rbi);
        assert_eq!(DocumentType::classify("contract_review"), DocumentType::ContractReview);
        assert_eq!(DocumentType::classify("board_resolution"), DocumentType::General);
    }
}
