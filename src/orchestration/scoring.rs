use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::MarkingScheme;
use crate::models::{Session, Subject};

/// Aggregate score for one finished session under a marking scheme.
/// Percentile/rank against other learners belongs to the external ranking
/// collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionScore {
    pub correct: u32,
    pub incorrect: u32,
    pub unattempted: u32,
    pub total_marks: i32,
    pub max_marks: i32,
    /// total_marks as a share of max_marks.
    pub percentage: f64,
    /// correct answers as a share of attempted questions.
    pub accuracy: f64,
    pub subjects: Vec<SubjectScore>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectScore {
    pub subject: Subject,
    pub correct: u32,
    pub incorrect: u32,
    pub unattempted: u32,
    pub marks: i32,
}

/// Scores a session: +correct / -incorrect / 0 per the scheme, question by
/// question, with subject-wise breakdown. Unanswered slots (including those
/// auto-submitted on expiry) count as unattempted.
pub fn score_session(session: &Session, scheme: &MarkingScheme) -> SessionScore {
    let mut subjects: Vec<SubjectScore> = SUBJECT_ORDER
        .iter()
        .map(|&subject| SubjectScore {
            subject,
            correct: 0,
            incorrect: 0,
            unattempted: 0,
            marks: 0,
        })
        .collect();

    for assigned in &session.questions {
        let idx = match assigned.subject {
            Subject::Physics => 0,
            Subject::Chemistry => 1,
            Subject::Mathematics => 2,
        };
        let bucket = &mut subjects[idx];
        match &assigned.response {
            Some(response) if response.is_correct => {
                bucket.correct += 1;
                bucket.marks += scheme.correct;
            }
            Some(_) => {
                bucket.incorrect += 1;
                bucket.marks += scheme.incorrect;
            }
            None => {
                bucket.unattempted += 1;
                bucket.marks += scheme.unattempted;
            }
        }
    }
    subjects.retain(|s| s.correct + s.incorrect + s.unattempted > 0);

    let correct: u32 = subjects.iter().map(|s| s.correct).sum();
    let incorrect: u32 = subjects.iter().map(|s| s.incorrect).sum();
    // Slots the session never got to assign (adaptive sessions ended early)
    // count as unattempted, outside any subject bucket.
    let unassigned = session.total_questions.saturating_sub(session.questions.len()) as u32;
    let unattempted: u32 = subjects.iter().map(|s| s.unattempted).sum::<u32>() + unassigned;
    let total_marks: i32 = subjects.iter().map(|s| s.marks).sum::<i32>()
        + scheme.unattempted * unassigned as i32;
    let attempted = correct + incorrect;

    let percentage = if scheme.max_marks > 0 {
        f64::from(total_marks) / f64::from(scheme.max_marks) * 100.0
    } else {
        0.0
    };
    let accuracy = if attempted > 0 {
        f64::from(correct) / f64::from(attempted) * 100.0
    } else {
        0.0
    };

    SessionScore {
        correct,
        incorrect,
        unattempted,
        total_marks,
        max_marks: scheme.max_marks,
        percentage,
        accuracy,
        subjects,
    }
}

/// Per-chapter (correct, attempted) counts for the analytics listener.
pub fn chapter_accuracy(session: &Session) -> BTreeMap<String, (u32, u32)> {
    let mut chapters: BTreeMap<String, (u32, u32)> = BTreeMap::new();
    for assigned in &session.questions {
        if let Some(response) = &assigned.response {
            let entry = chapters.entry(assigned.chapter.clone()).or_insert((0, 0));
            entry.1 += 1;
            if response.is_correct {
                entry.0 += 1;
            }
        }
    }
    chapters
}

const SUBJECT_ORDER: [Subject; 3] = [Subject::Physics, Subject::Chemistry, Subject::Mathematics];
