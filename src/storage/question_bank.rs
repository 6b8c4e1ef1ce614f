use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

pub use crate::models::question::PoolFilter;

use crate::models::Question;
use crate::storage::QuestionBank;

/// In-memory bank, used by tests and by callers that assemble pools
/// themselves.
pub struct MemoryQuestionBank {
    by_id: HashMap<String, Question>,
    ordered: Vec<Question>,
}

impl MemoryQuestionBank {
    pub fn new(questions: Vec<Question>) -> Result<Self> {
        let mut by_id = HashMap::new();
        for question in &questions {
            question.validate()?;
            if by_id.insert(question.id.clone(), question.clone()).is_some() {
                bail!("Duplicate question id {} in bank", question.id);
            }
        }
        Ok(Self {
            by_id,
            ordered: questions,
        })
    }
}

impl QuestionBank for MemoryQuestionBank {
    fn load_pool(&self, filter: &PoolFilter) -> Result<Vec<Question>> {
        Ok(self
            .ordered
            .iter()
            .filter(|q| filter.matches(q))
            .cloned()
            .collect())
    }

    fn get(&self, question_id: &str) -> Result<Option<Question>> {
        Ok(self.by_id.get(question_id).cloned())
    }
}

/// Bank loaded from a directory tree of JSON files. Each file holds either a
/// single question object or an array of them. Everything is validated at
/// ingress; a malformed file fails the load rather than being skipped.
pub struct JsonQuestionBank {
    inner: MemoryQuestionBank,
}

impl JsonQuestionBank {
    pub fn load(questions_dir: &Path) -> Result<Self> {
        let mut questions = Vec::new();
        for entry in WalkDir::new(questions_dir).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let data = fs::read(entry.path())
                .with_context(|| format!("Failed to read question file {:?}", entry.path()))?;
            let batch = parse_question_file(&data)
                .with_context(|| format!("Failed to parse question file {:?}", entry.path()))?;
            questions.extend(batch);
        }
        // Stable order regardless of directory traversal.
        questions.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(Self {
            inner: MemoryQuestionBank::new(questions)?,
        })
    }

    pub fn len(&self) -> usize {
        self.inner.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.ordered.is_empty()
    }
}

fn parse_question_file(data: &[u8]) -> Result<Vec<Question>> {
    let value: serde_json::Value = serde_json::from_slice(data)?;
    let questions = if value.is_array() {
        serde_json::from_value::<Vec<Question>>(value)?
    } else {
        vec![serde_json::from_value::<Question>(value)?]
    };
    Ok(questions)
}

impl QuestionBank for JsonQuestionBank {
    fn load_pool(&self, filter: &PoolFilter) -> Result<Vec<Question>> {
        self.inner.load_pool(filter)
    }

    fn get(&self, question_id: &str) -> Result<Option<Question>> {
        self.inner.get(question_id)
    }
}
