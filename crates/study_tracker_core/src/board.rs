//! crates/study_tracker_core/src/board.rs
//!
//! Pure doubt board rules: posting questions and answers, the status a doubt
//! moves through, and answer acceptance.

use crate::domain::{Doubt, DoubtAnswer, DoubtStatus, NewDoubt, NewDoubtAnswer};
use crate::lifecycle::required_text;
use crate::ports::{PortError, PortResult};
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const MAX_TAGS: usize = 10;

pub fn post(new: NewDoubt, now: DateTime<Utc>) -> PortResult<Doubt> {
    let title = required_text("title", &new.title)?;
    let description = required_text("description", &new.description)?;
    let subject = required_text("subject", &new.subject)?;

    Ok(Doubt {
        id: Uuid::new_v4(),
        user_id: new.user_id,
        title,
        description,
        subject,
        tags: normalize_tags(new.tags)?,
        status: DoubtStatus::Open,
        upvotes: 0,
        is_anonymous: new.is_anonymous,
        ai_answer: None,
        created_at: now,
        version: 0,
    })
}

/// Trimmed, without blanks or repeats, in the order given.
fn normalize_tags(tags: Vec<String>) -> PortResult<Vec<String>> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    if out.len() > MAX_TAGS {
        return Err(PortError::validation(
            "tags",
            format!("at most {} tags are allowed", MAX_TAGS),
        ));
    }
    Ok(out)
}

pub fn answer(doubt: &Doubt, new: NewDoubtAnswer, now: DateTime<Utc>) -> PortResult<DoubtAnswer> {
    Ok(DoubtAnswer {
        id: Uuid::new_v4(),
        doubt_id: doubt.id,
        user_id: new.user_id,
        content: required_text("content", &new.content)?,
        upvotes: 0,
        is_accepted: false,
        created_at: now,
    })
}

/// The first answer moves an open doubt to `InProgress`.
pub fn mark_answered(doubt: &Doubt) -> Option<Doubt> {
    if doubt.status != DoubtStatus::Open {
        return None;
    }
    let mut next = doubt.clone();
    next.status = DoubtStatus::InProgress;
    next.version += 1;
    Some(next)
}

/// Stores the tutor's draft. Blank drafts and doubts that already carry one
/// are left alone.
pub fn attach_ai_answer(doubt: &Doubt, text: &str) -> Option<Doubt> {
    let text = text.trim();
    if text.is_empty() || doubt.ai_answer.is_some() {
        return None;
    }
    let mut next = doubt.clone();
    next.ai_answer = Some(text.to_string());
    next.version += 1;
    Some(next)
}

/// Marks `answer` accepted and the doubt solved.
///
/// Returns `None` when the answer is already accepted. A doubt holds at most
/// one accepted answer, so accepting a second one is `InvalidState`.
pub fn accept(doubt: &Doubt, answer: &DoubtAnswer) -> PortResult<Option<(Doubt, DoubtAnswer)>> {
    if answer.doubt_id != doubt.id {
        return Err(PortError::Unexpected(format!(
            "answer {} does not belong to doubt {}",
            answer.id, doubt.id
        )));
    }
    if answer.is_accepted {
        return Ok(None);
    }
    if doubt.status == DoubtStatus::Solved {
        return Err(PortError::InvalidState(format!(
            "doubt {} already has an accepted answer",
            doubt.id
        )));
    }

    let mut solved = doubt.clone();
    solved.status = DoubtStatus::Solved;
    solved.version += 1;
    let mut accepted = answer.clone();
    accepted.is_accepted = true;
    Ok(Some((solved, accepted)))
}
