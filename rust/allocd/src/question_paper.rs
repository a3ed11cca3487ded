use crate::allocation::{AllocationItem, AllocationResult, InvalidItemError, Validator};
use crate::issue::Issue;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    OneWord,
    FillBlanks,
    TrueFalse,
    Mcq,
    ShortAnswer,
    Matching,
    Descriptive,
    Application,
}

impl SectionType {
    pub const ALL: [SectionType; 8] = [
        SectionType::OneWord,
        SectionType::FillBlanks,
        SectionType::TrueFalse,
        SectionType::Mcq,
        SectionType::ShortAnswer,
        SectionType::Matching,
        SectionType::Descriptive,
        SectionType::Application,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SectionType::OneWord => "one_word",
            SectionType::FillBlanks => "fill_blanks",
            SectionType::TrueFalse => "true_false",
            SectionType::Mcq => "mcq",
            SectionType::ShortAnswer => "short_answer",
            SectionType::Matching => "matching",
            SectionType::Descriptive => "descriptive",
            SectionType::Application => "application",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    pub fn default_marks(self) -> Decimal {
        match self {
            SectionType::ShortAnswer => Decimal::from(2),
            SectionType::Descriptive | SectionType::Application => Decimal::from(5),
            _ => Decimal::ONE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    pub section_type: SectionType,
    pub marks_per_question: Option<Decimal>,
    pub question_count: Option<i64>,
    pub question_ids: Vec<String>,
}

impl Section {
    pub fn new(title: impl Into<String>, section_type: SectionType) -> Self {
        Self {
            title: title.into(),
            section_type,
            marks_per_question: None,
            question_count: None,
            question_ids: Vec::new(),
        }
    }

    /// Attached questions win over a planned count.
    pub fn effective_count(&self) -> i64 {
        if !self.question_ids.is_empty() {
            return i64::try_from(self.question_ids.len()).unwrap_or(i64::MAX);
        }
        self.question_count.unwrap_or(0)
    }

    pub fn effective_marks(&self) -> Decimal {
        self.marks_per_question
            .unwrap_or_else(|| self.section_type.default_marks())
    }

    fn label(&self) -> String {
        if self.title.trim().is_empty() {
            self.section_type.as_str().to_string()
        } else {
            self.title.clone()
        }
    }

    fn as_item(&self) -> AllocationItem {
        AllocationItem::new(self.label(), self.effective_count(), self.effective_marks())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionPaper {
    pub total_marks: Decimal,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassRules {
    pub mcq_allowed: bool,
    pub max_mcq_marks: Option<Decimal>,
    /// Empty means every type is allowed.
    pub allowed_question_types: Vec<SectionType>,
}

impl Default for ClassRules {
    fn default() -> Self {
        Self::permissive()
    }
}

impl ClassRules {
    pub fn permissive() -> Self {
        Self {
            mcq_allowed: true,
            max_mcq_marks: None,
            allowed_question_types: Vec::new(),
        }
    }

    fn allows(&self, t: SectionType) -> bool {
        self.allowed_question_types.is_empty() || self.allowed_question_types.contains(&t)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionBreakdown {
    pub label: String,
    pub section_type: SectionType,
    pub question_count: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub marks_per_question: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperReport {
    pub ok: bool,
    pub allocation: AllocationResult,
    pub sections: Vec<SectionBreakdown>,
    pub issues: Vec<Issue>,
}

/// Checks a paper's section marks against its total and the class rules.
///
/// Rule violations land in `PaperReport::issues`; only a malformed section
/// (negative count or marks) is an error.
pub fn check_paper(
    paper: &QuestionPaper,
    rules: &ClassRules,
    validator: &Validator,
) -> Result<PaperReport, InvalidItemError> {
    let items: Vec<AllocationItem> = paper.sections.iter().map(Section::as_item).collect();
    let allocation = validator.validate(&items, paper.total_marks)?;

    let mut issues = Vec::new();
    if let Some(msg) = allocation.message() {
        issues.push(Issue::new("marks_total_mismatch", msg));
    }
    if !paper.sections.iter().any(|s| s.effective_count() > 0) {
        issues.push(Issue::new(
            "no_questions",
            "add at least one question to a section",
        ));
    }

    let mut mcq_marks = Decimal::ZERO;
    let mut mcq_used = false;
    let mut sections = Vec::with_capacity(items.len());
    for (section, item) in paper.sections.iter().zip(items) {
        // validate() already rejected overflowing products.
        let subtotal = Decimal::from(item.quantity) * item.unit_value;
        if section.section_type == SectionType::Mcq && item.quantity > 0 {
            mcq_used = true;
            mcq_marks += subtotal;
        }
        if !rules.allows(section.section_type) {
            issues.push(Issue::for_label(
                "question_type_not_allowed",
                item.label.clone(),
                format!(
                    "{} questions are not allowed for this class",
                    section.section_type.as_str()
                ),
            ));
        }
        sections.push(SectionBreakdown {
            label: item.label,
            section_type: section.section_type,
            question_count: item.quantity,
            marks_per_question: item.unit_value,
            subtotal,
        });
    }

    if mcq_used {
        if !rules.mcq_allowed {
            issues.push(Issue::new("mcq_not_allowed", "MCQ is not allowed for this class"));
        } else if let Some(max) = rules.max_mcq_marks {
            if mcq_marks > max {
                issues.push(Issue::new(
                    "mcq_marks_exceeded",
                    format!(
                        "MCQ marks may not exceed {} (currently {})",
                        max.normalize(),
                        mcq_marks.normalize()
                    ),
                ));
            }
        }
    }

    Ok(PaperReport {
        ok: issues.is_empty(),
        allocation,
        sections,
        issues,
    })
}
