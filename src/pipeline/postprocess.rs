//! Deterministic clean-up of LLM-generated report drafts.
//!
//! The prompt asks for plain Markdown without frontmatter, but models still
//! wrap the answer in ```` ```markdown ```` fences, add a YAML header, invent
//! image links or emit tables without a separator row. Each rule below fixes
//! one such quirk; none of them rewrites prose.
//!
//! Rules that look at line starts (`#`, `|`) skip fenced code so listings
//! with `# comments` or shell pipes survive untouched.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

type Rule = fn(&str) -> String;

/// Rules in application order. Fences and line endings go first so later
/// rules see clean `\n`-separated lines.
const RULES: &[(&str, Rule)] = &[
    ("outer fences", strip_outer_fences),
    ("line endings", normalise_line_endings),
    ("trailing whitespace", trim_trailing_whitespace),
    ("stray frontmatter", strip_leading_frontmatter),
    ("blank lines", collapse_blank_lines),
    ("heading spacing", space_headings),
    ("table separators", repair_tables),
    ("placeholder images", drop_placeholder_images),
    ("invisible characters", remove_invisible_chars),
    ("final newline", ensure_final_newline),
];

/// Apply every clean-up rule to a generated draft.
pub fn clean_markdown(input: &str) -> String {
    let mut text = input.to_string();
    for (name, rule) in RULES {
        let next = rule(&text);
        if next != text {
            debug!("Draft clean-up: {} rule changed the text", name);
        }
        text = next;
    }
    text
}

/// Split `input` into lines, each tagged with whether it sits inside a
/// fenced code block (fence lines themselves count as inside).
fn tag_fenced(input: &str) -> Vec<(bool, &str)> {
    let mut fence: Option<&str> = None;
    input
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            let marker = if trimmed.starts_with("```") {
                Some("```")
            } else if trimmed.starts_with("~~~") {
                Some("~~~")
            } else {
                None
            };
            match (fence, marker) {
                (None, Some(m)) => {
                    fence = Some(m);
                    (true, line)
                }
                (Some(open), Some(m)) if open == m => {
                    fence = None;
                    (true, line)
                }
                (inside, _) => (inside.is_some(), line),
            }
        })
        .collect()
}

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\A```(?:markdown|md)?[ \t]*\r?\n(.*)\r?\n```\s*\z").unwrap());

fn strip_outer_fences(input: &str) -> String {
    match RE_OUTER_FENCES.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

static RE_LEADING_FRONTMATTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\A\s*---\n.*?\n---(?:\n|\z)").unwrap());

/// Metadata comes from the user, never from the model.
fn strip_leading_frontmatter(input: &str) -> String {
    RE_LEADING_FRONTMATTER.replace(input, "").into_owned()
}

static RE_BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// At most one blank line between blocks.
fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_RUN.replace_all(input, "\n\n").into_owned()
}

static RE_ATX_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#{1,6}(?:\s|$)").unwrap());

/// A heading glued to the previous paragraph would be parsed as text.
fn space_headings(input: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for (fenced, line) in tag_fenced(input) {
        let needs_gap = !fenced
            && RE_ATX_HEADING.is_match(line)
            && out.last().is_some_and(|prev| !prev.is_empty());
        if needs_gap {
            out.push("");
        }
        out.push(line);
    }
    out.join("\n")
}

fn is_table_row(line: &str) -> bool {
    let t = line.trim();
    t.len() > 2 && t.starts_with('|') && t.ends_with('|')
}

fn is_separator_row(line: &str) -> bool {
    is_table_row(line)
        && line.contains('-')
        && line.trim().chars().all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

/// Insert the missing header separator and drop extra separators that models
/// scatter through the table body.
fn repair_tables(input: &str) -> String {
    let tagged = tag_fenced(input);
    let mut out: Vec<String> = Vec::with_capacity(tagged.len() + 4);
    let mut row_in_table = 0usize;

    for (i, &(fenced, line)) in tagged.iter().enumerate() {
        if fenced || !is_table_row(line) {
            row_in_table = 0;
            out.push(line.to_string());
            continue;
        }
        row_in_table += 1;

        if is_separator_row(line) {
            if row_in_table == 2 {
                out.push(line.to_string());
            }
            continue;
        }

        out.push(line.to_string());
        if row_in_table == 1 {
            let next_is_separator = tagged
                .get(i + 1)
                .is_some_and(|&(f, next)| !f && is_separator_row(next));
            if !next_is_separator {
                let columns = line.trim().trim_matches('|').split('|').count();
                out.push(format!("|{}", " --- |".repeat(columns)));
                row_in_table += 1;
            }
        }
    }
    out.join("\n")
}

static RE_IMAGE_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)\s]*)(?:\s+[^)]*)?\)").unwrap());

/// Hosts models use when they make up a picture.
const PLACEHOLDER_HOSTS: &[&str] = &[
    "example.com",
    "example.org",
    "placeholder.com",
    "placehold.co",
    "placehold.it",
    "dummyimage.com",
    "picsum.photos",
];

fn is_placeholder_url(url: &str) -> bool {
    let Ok(parsed) = reqwest::Url::parse(url.trim()) else {
        return true;
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return true;
    }
    let host = parsed.host_str().unwrap_or_default();
    PLACEHOLDER_HOSTS
        .iter()
        .any(|fake| host == *fake || host.ends_with(&format!(".{fake}")))
}

/// A generated draft has no attachments, so relative or made-up image links
/// can only ever render as placeholders. Keep the description as italics.
fn drop_placeholder_images(input: &str) -> String {
    RE_IMAGE_LINK
        .replace_all(input, |caps: &regex::Captures<'_>| {
            if !is_placeholder_url(&caps[2]) {
                return caps[0].to_string();
            }
            match caps[1].trim() {
                "" => String::new(),
                alt => format!("*{alt}*"),
            }
        })
        .into_owned()
}

fn remove_invisible_chars(input: &str) -> String {
    input
        .chars()
        .filter(|c| !matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}'))
        .collect()
}

fn ensure_final_newline(input: &str) -> String {
    let body = input.trim_end();
    if body.is_empty() {
        "\n".to_string()
    } else {
        format!("{body}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outer_fences_are_removed() {
        assert_eq!(strip_outer_fences("```markdown\n# A\nB\n```"), "# A\nB");
        assert_eq!(strip_outer_fences("```\n# A\n```\n"), "# A");
        assert_eq!(strip_outer_fences("# A\n```\nx\n```"), "# A\n```\nx\n```");
    }

    #[test]
    fn leading_frontmatter_is_removed() {
        assert_eq!(
            strip_leading_frontmatter("---\ntitle: X\n---\n# Введение"),
            "# Введение"
        );
        assert_eq!(strip_leading_frontmatter("# A\n---\nb\n---\n"), "# A\n---\nb\n---\n");
    }

    #[test]
    fn blank_runs_collapse_to_one_blank_line() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn headings_get_a_blank_line_but_code_comments_do_not() {
        let input = "text\n# Heading\n```python\nx = 1\n# comment\n```";
        assert_eq!(
            space_headings(input),
            "text\n\n# Heading\n```python\nx = 1\n# comment\n```"
        );
        assert_eq!(space_headings("#hashtag\nx"), "#hashtag\nx");
    }

    #[test]
    fn table_without_separator_is_repaired() {
        assert_eq!(
            repair_tables("| A | B |\n| 1 | 2 |"),
            "| A | B |\n| --- | --- |\n| 1 | 2 |"
        );
    }

    #[test]
    fn extra_separators_are_dropped() {
        let input = "| A | B |\n|---|---|\n| 1 | 2 |\n|---|---|\n| 3 | 4 |";
        assert_eq!(
            repair_tables(input),
            "| A | B |\n|---|---|\n| 1 | 2 |\n| 3 | 4 |"
        );
    }

    #[test]
    fn tables_inside_code_are_untouched() {
        let input = "```\n| a | b |\n| c | d |\n```";
        assert_eq!(repair_tables(input), input);
    }

    #[test]
    fn placeholder_images_become_italic_alt() {
        assert_eq!(drop_placeholder_images("![График](chart.png)"), "*График*");
        assert_eq!(
            drop_placeholder_images("![Схема](https://example.com/a.png)"),
            "*Схема*"
        );
        assert_eq!(drop_placeholder_images("![](image-url)"), "");
        let real = "![Рис. 1](https://upload.wikimedia.org/a.png \"t\")";
        assert_eq!(drop_placeholder_images(real), real);
    }

    #[test]
    fn invisible_chars_and_final_newline() {
        assert_eq!(remove_invisible_chars("a\u{200B}b\u{FEFF}c"), "abc");
        assert_eq!(ensure_final_newline("x\n\n\n"), "x\n");
        assert_eq!(ensure_final_newline(""), "\n");
    }

    #[test]
    fn full_draft_clean_up() {
        let draft = "```markdown\r\n---\r\ntitle: AI\r\n---\r\n# Введение   \r\nТекст\r\n\r\n\r\n\r\n## Цель\r\n| A | B |\r\n| 1 | 2 |\r\n```";
        assert_eq!(
            clean_markdown(draft),
            "# Введение\nТекст\n\n## Цель\n| A | B |\n| --- | --- |\n| 1 | 2 |\n"
        );
    }
}
