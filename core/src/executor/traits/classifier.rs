use serde::Serialize;

/// Whether a failed attempt is worth repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Transient,
    Permanent,
}

/// A failed attempt as seen by a classifier.
#[derive(Debug, Clone, Copy)]
pub struct Failure<'a> {
    pub exit_code: Option<i32>,
    pub error: &'a str,
    pub output: &'a str,
    /// Attempts made so far, including this one.
    pub attempt: u32,
}

impl Failure<'_> {
    pub fn combined_text(&self) -> String {
        if self.output.is_empty() {
            self.error.to_string()
        } else {
            format!("{}\n{}", self.error, self.output)
        }
    }
}

/// Decides whether a failure is transient. One classifier per task family.
pub trait OutcomeClassifier: Send + Sync {
    fn name(&self) -> &str;
    fn classify(&self, failure: &Failure<'_>) -> Classification;
}
