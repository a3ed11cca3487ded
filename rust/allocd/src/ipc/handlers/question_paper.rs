use crate::ipc::error::ok;
use crate::ipc::helpers::{item_decimal, item_quantity, optional_decimal, to_result, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::question_paper::{check_paper, ClassRules, QuestionPaper, Section, SectionType};
use serde_json::{json, Value};

fn parse_section_type(v: &Value, at: &str) -> Result<SectionType, HandlerErr> {
    let raw = v
        .get("sectionType")
        .and_then(|t| t.as_str())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {at}.sectionType")))?;
    SectionType::parse(raw).ok_or_else(|| HandlerErr {
        code: "bad_params",
        message: format!("unknown section type: {raw}"),
        details: Some(json!({
            "allowed": SectionType::ALL.iter().map(|t| t.as_str()).collect::<Vec<_>>()
        })),
    })
}

fn parse_section(v: &Value, i: usize) -> Result<Section, HandlerErr> {
    let at = format!("sections[{i}]");
    let section_type = parse_section_type(v, &at)?;
    let title = v
        .get("title")
        .and_then(|t| t.as_str())
        .unwrap_or("")
        .trim()
        .to_string();
    let mut section = Section::new(title, section_type);
    let label = if section.title.is_empty() {
        section_type.as_str().to_string()
    } else {
        section.title.clone()
    };

    if v.get("marksPerQuestion").is_some_and(|m| !m.is_null()) {
        section.marks_per_question = Some(item_decimal(v, "marksPerQuestion", &label)?);
    }
    if v.get("questionCount").is_some_and(|c| !c.is_null()) {
        section.question_count = Some(item_quantity(v, "questionCount", &label)?);
    }
    if let Some(ids) = v.get("questionIds").and_then(|q| q.as_array()) {
        section.question_ids = ids
            .iter()
            .map(|id| match id {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
    }
    Ok(section)
}

fn parse_rules(v: Option<&Value>) -> Result<ClassRules, HandlerErr> {
    let Some(v) = v.filter(|v| !v.is_null()) else {
        return Ok(ClassRules::permissive());
    };
    let mut allowed = Vec::new();
    if let Some(types) = v.get("allowedQuestionTypes").and_then(|t| t.as_array()) {
        for t in types {
            let raw = t.as_str().unwrap_or_default();
            let parsed = SectionType::parse(raw).ok_or_else(|| {
                HandlerErr::bad_params(format!("unknown question type in classRules: {t}"))
            })?;
            allowed.push(parsed);
        }
    }
    Ok(ClassRules {
        mcq_allowed: v.get("mcqAllowed").and_then(|b| b.as_bool()).unwrap_or(true),
        max_mcq_marks: optional_decimal(v, "maxMcqMarks")?.filter(|m| !m.is_zero()),
        allowed_question_types: allowed,
    })
}

fn check(state: &AppState, req: &Request) -> Result<Value, HandlerErr> {
    let paper = req
        .params
        .get("paper")
        .filter(|p| p.is_object())
        .ok_or_else(|| HandlerErr::bad_params("missing paper"))?;
    let total_marks = optional_decimal(paper, "totalMarks")?
        .unwrap_or(state.config.default_total_marks);
    let sections = paper
        .get("sections")
        .and_then(|s| s.as_array())
        .map(|s| {
            s.iter()
                .enumerate()
                .map(|(i, v)| parse_section(v, i))
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?
        .unwrap_or_default();
    let rules = parse_rules(req.params.get("classRules"))?;

    let report = check_paper(
        &QuestionPaper {
            total_marks,
            sections,
        },
        &rules,
        &state.validator,
    )?;
    to_result(&report)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "questionPaper.check" => Some(match check(state, req) {
            Ok(v) => ok(&req.id, v),
            Err(e) => e.response(&req.id),
        }),
        _ => None,
    }
}
