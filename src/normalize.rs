//! Normalizer: converts one external post object into the internal [`Post`]
//! record. Stateless, no I/O.

use scraper::Html;
use sha2::{Digest, Sha256};

use crate::db::{Answer, Followup, Post};
use crate::forum::{ChildType, RawChild, RawPost};
use crate::text::stringify_followups;

/// Normalize a raw source post into the flat record schema: strip HTML,
/// pull answers and followups out of the child tree, derive counters and
/// the content fingerprint.
#[must_use]
pub fn normalize(course_id: &str, raw: &RawPost) -> Post {
    let body = strip_html(&raw.content);
    let (student_answer, instructor_answer) = extract_answers(&raw.children);
    let followups = extract_followups(&raw.children);
    let num_unresolved_followups = raw
        .children
        .iter()
        .filter(|c| c.child_type == ChildType::Followup && !c.resolved)
        .count() as i64;

    let content_hash = compute_content_hash(
        &raw.subject,
        &body,
        student_answer.as_ref().map(|a| a.text.as_str()),
        instructor_answer.as_ref().map(|a| a.text.as_str()),
        &followups,
    );

    Post {
        course_id: course_id.to_string(),
        post_id: raw.id,
        created: raw.created.clone(),
        modified: raw.modified.clone(),
        subject: raw.subject.clone(),
        body,
        tags: raw.folders.clone(),
        post_type: raw.post_type.clone(),
        student_answer,
        instructor_answer,
        followups,
        num_views: raw.num_views,
        num_unresolved_followups,
        resolved: raw.resolved,
        assignees: raw.assignees.clone(),
        content_hash,
    }
}

/// Reduce an HTML fragment to its text content, with whitespace collapsed.
#[must_use]
pub fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: Vec<&str> = fragment.root_element().text().collect();
    text.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn extract_answers(children: &[RawChild]) -> (Option<Answer>, Option<Answer>) {
    let mut student_answer = None;
    let mut instructor_answer = None;

    for child in children {
        match child.child_type {
            ChildType::StudentAnswer => {
                student_answer = Some(answer_from_child(child));
            }
            ChildType::InstructorAnswer => {
                instructor_answer = Some(answer_from_child(child));
            }
            ChildType::Followup | ChildType::Feedback => {}
        }
    }

    (student_answer, instructor_answer)
}

fn answer_from_child(child: &RawChild) -> Answer {
    Answer {
        text: strip_html(&child.content),
        author_id: child.author_id.clone(),
        created: child.created.clone(),
    }
}

fn extract_followups(children: &[RawChild]) -> Vec<Followup> {
    children
        .iter()
        .filter(|c| c.child_type == ChildType::Followup)
        .map(|followup| Followup {
            text: strip_html(&followup.content),
            responses: followup
                .children
                .iter()
                .map(|response| strip_html(&response.content))
                .collect(),
        })
        .collect()
}

/// SHA-256 over the watched fields. Two normalizations of the same upstream
/// content always agree, so an unchanged re-fetch stages no upsert.
fn compute_content_hash(
    subject: &str,
    body: &str,
    student_answer: Option<&str>,
    instructor_answer: Option<&str>,
    followups: &[Followup],
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(subject.as_bytes());
    hasher.update([0u8]);
    hasher.update(body.as_bytes());
    hasher.update([0u8]);
    hasher.update(student_answer.unwrap_or("").as_bytes());
    hasher.update([0u8]);
    hasher.update(instructor_answer.unwrap_or("").as_bytes());
    hasher.update([0u8]);
    hasher.update(stringify_followups(followups).as_bytes());
    hex::encode(hasher.finalize())
}
