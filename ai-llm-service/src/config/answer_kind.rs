/// What the caller expects back from the assistant.
///
/// Every invocation runs in the assistant's ask (read/advise) mode, so the
/// workspace is never edited. The kind only selects output sanitation:
/// free-form answers additionally lose the assistant's banner, token and
/// progress lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnswerKind {
    /// Structured report (review, overview, chunk analysis, aggregation).
    Report,
    /// Free-form answer to a reviewer's question.
    Question,
}

impl AnswerKind {
    pub fn is_question(self) -> bool {
        matches!(self, AnswerKind::Question)
    }
}
