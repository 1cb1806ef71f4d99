//! Markdown to styled terminal text
//!
//! Covers what the model puts in `details`: headings, paragraphs, emphasis,
//! lists, code and tables. Table columns are padded by display width so CJK
//! cells line up.

use console::{Alignment, measure_text_width, pad_str, style};
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// Render a Markdown document for the terminal
pub fn render_markdown(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut renderer = MarkdownRenderer::default();
    for event in Parser::new_ext(text, options) {
        renderer.event(event);
    }
    renderer.finish()
}

#[derive(Default)]
struct TableBuffer {
    rows: Vec<Vec<String>>,
    header_rows: usize,
    row: Vec<String>,
    cell: String,
}

#[derive(Default)]
struct MarkdownRenderer {
    out: String,
    strong: usize,
    emphasis: usize,
    heading: Option<HeadingLevel>,
    in_code_block: bool,
    /// Next item number per open list, `None` for bullet lists
    lists: Vec<Option<u64>>,
    table: Option<TableBuffer>,
}

impl MarkdownRenderer {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                let styled = self.styled(&text);
                self.push(&styled);
            }
            Event::Code(code) => {
                let styled = style(&*code).yellow().to_string();
                self.push(&styled);
            }
            Event::SoftBreak | Event::HardBreak => {
                if self.table.is_some() {
                    self.push(" ");
                } else {
                    self.out.push('\n');
                }
            }
            Event::Rule => {
                self.blank_line();
                self.out.push_str(&style("─".repeat(40)).dim().to_string());
                self.out.push_str("\n\n");
            }
            Event::Html(html) | Event::InlineHtml(html) => self.push(&html),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.blank_line();
                self.heading = Some(level);
            }
            Tag::Strong => self.strong += 1,
            Tag::Emphasis => self.emphasis += 1,
            Tag::CodeBlock(_) => {
                self.blank_line();
                self.in_code_block = true;
            }
            Tag::List(start) => {
                self.newline();
                self.lists.push(start);
            }
            Tag::Item => {
                self.newline();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}. ", n);
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.out.push_str(&"  ".repeat(depth));
                self.out.push_str(&marker);
            }
            Tag::Table(_) => {
                self.blank_line();
                self.table = Some(TableBuffer::default());
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                self.heading = None;
                self.out.push_str("\n\n");
            }
            TagEnd::Paragraph => {
                if self.lists.is_empty() {
                    self.out.push_str("\n\n");
                } else {
                    self.newline();
                }
            }
            TagEnd::Strong => self.strong = self.strong.saturating_sub(1),
            TagEnd::Emphasis => self.emphasis = self.emphasis.saturating_sub(1),
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.newline();
                self.out.push('\n');
            }
            TagEnd::List(_) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.newline();
                    self.out.push('\n');
                }
            }
            TagEnd::Item => self.newline(),
            TagEnd::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    let cell = std::mem::take(&mut table.cell);
                    table.row.push(cell.trim().to_string());
                }
            }
            TagEnd::TableHead => {
                // Header cells arrive without a TableRow wrapper
                if let Some(table) = self.table.as_mut() {
                    let row = std::mem::take(&mut table.row);
                    table.rows.push(row);
                    table.header_rows = table.rows.len();
                }
            }
            TagEnd::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    let row = std::mem::take(&mut table.row);
                    table.rows.push(row);
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    self.out.push_str(&render_table(&table));
                    self.out.push('\n');
                }
            }
            _ => {}
        }
    }

    fn styled(&self, text: &str) -> String {
        if self.in_code_block {
            return text
                .lines()
                .map(|line| format!("    {}\n", style(line).dim()))
                .collect();
        }
        if let Some(level) = self.heading {
            let s = style(text).bold();
            return match level {
                HeadingLevel::H1 | HeadingLevel::H2 => s.cyan().underlined().to_string(),
                _ => s.cyan().to_string(),
            };
        }
        let mut s = style(text);
        if self.strong > 0 {
            s = s.bold();
        }
        if self.emphasis > 0 {
            s = s.italic();
        }
        s.to_string()
    }

    fn push(&mut self, text: &str) {
        match self.table.as_mut() {
            Some(table) => table.cell.push_str(text),
            None => self.out.push_str(text),
        }
    }

    fn newline(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn blank_line(&mut self) {
        self.newline();
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    fn finish(self) -> String {
        let mut out = self.out.trim_end().to_string();
        out.push('\n');
        out
    }
}

fn render_table(table: &TableBuffer) -> String {
    let columns = table.rows.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return String::new();
    }

    let mut widths = vec![0usize; columns];
    for row in &table.rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(measure_text_width(cell));
        }
    }

    let mut out = String::new();
    for (idx, row) in table.rows.iter().enumerate() {
        let cells: Vec<String> = (0..columns)
            .map(|i| {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                let padded = pad_str(cell, widths[i], Alignment::Left, None).to_string();
                if idx < table.header_rows {
                    style(padded).bold().to_string()
                } else {
                    padded
                }
            })
            .collect();
        out.push_str("│ ");
        out.push_str(&cells.join(" │ "));
        out.push_str(" │\n");

        if idx + 1 == table.header_rows {
            let rule: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            out.push('├');
            out.push_str(&rule.join("┼"));
            out.push_str("┤\n");
        }
    }
    out
}
