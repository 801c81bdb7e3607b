//! Prompt for AI report drafting.
//!
//! The prompt is Russian because the generated report is: asking in the
//! target language keeps the model from mixing languages in headings.
//! Callers can override it via [`crate::config::GenerationConfig::prompt_template`].

use crate::model::WorkType;

/// Default report-drafting prompt.
///
/// Placeholders: `{work_type_label}` (e.g. "Лабораторная работа") and
/// `{text}` (the extracted source material).
pub const REPORT_PROMPT: &str = "\
Ты — помощник для написания академических отчётов.
На основе предоставленного материала напиши структурированный отчёт
в формате Markdown.

Требования:
- Используй заголовки: # для основных разделов, ## для подразделов
- Включи: Введение, основную часть, Заключение
- Пиши на русском языке, академический стиль
- Тип работы: {work_type_label}
- НЕ добавляй YAML frontmatter

Исходный материал:
{text}";

/// Fill a prompt template for the given work type and source text.
///
/// The source text is substituted last so braces inside it are never
/// mistaken for placeholders.
pub fn report_prompt(template: Option<&str>, work_type: WorkType, text: &str) -> String {
    template
        .unwrap_or(REPORT_PROMPT)
        .replace("{work_type_label}", work_type.label())
        .replace("{text}", text)
}
