use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::{Datelike, Local, NaiveDate};
use notecab_shared::{Cabinet, CalendarEntries, CalendarViewMode, Note, NoteKind};
use unicode_width::UnicodeWidthStr;
use uuid::Uuid;

use crate::calendar::{month_grid, period_label, week_dates};
use crate::config::Config;

const PREVIEW_WIDTH: usize = 40;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => io::stdout().is_terminal(),
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    #[tracing::instrument(skip(self, out, cabinets))]
    pub fn cabinet_table<W: Write>(
        &self,
        out: W,
        cabinets: &[Cabinet],
        current: Option<Uuid>,
    ) -> anyhow::Result<()> {
        let headers = vec!["".to_string(), "Name".to_string(), "ID".to_string()];
        let rows = cabinets
            .iter()
            .map(|cabinet| {
                let marker = if Some(cabinet.id) == current {
                    self.paint("*", "32")
                } else {
                    String::new()
                };
                vec![marker, cabinet.name.clone(), cabinet.id.to_string()]
            })
            .collect();
        write_table(out, headers, rows)
    }

    #[tracing::instrument(skip(self, out, notes))]
    pub fn note_table<W: Write>(&self, out: W, notes: &[Note]) -> anyhow::Result<()> {
        let headers = vec![
            "#".to_string(),
            "Type".to_string(),
            "Title".to_string(),
            "Order".to_string(),
            "Updated".to_string(),
            "Summary".to_string(),
        ];

        let rows = notes
            .iter()
            .enumerate()
            .map(|(idx, note)| {
                let title = if note.title.trim().is_empty() {
                    self.paint(note.display_title(), "2")
                } else {
                    note.title.clone()
                };
                vec![
                    self.paint(&(idx + 1).to_string(), "33"),
                    note.kind.as_str().to_string(),
                    title,
                    note.order.to_string(),
                    note.timestamp
                        .with_timezone(&Local)
                        .format("%Y-%m-%d %H:%M")
                        .to_string(),
                    summary(note),
                ]
            })
            .collect();

        write_table(out, headers, rows)
    }

    #[tracing::instrument(skip(self, out, note))]
    pub fn note_detail<W: Write>(&self, mut out: W, note: &Note) -> anyhow::Result<()> {
        writeln!(out, "id        {}", note.id)?;
        writeln!(out, "type      {}", note.kind.as_str())?;
        writeln!(out, "title     {}", note.display_title())?;
        writeln!(out, "order     {}", note.order)?;
        writeln!(out, "updated   {}", note.timestamp.to_rfc3339())?;

        match note.kind {
            NoteKind::Standard => {
                writeln!(out)?;
                writeln!(out, "{}", note.content)?;
            }
            NoteKind::Task => {
                writeln!(out)?;
                for (idx, task) in note.tasks.iter().flatten().enumerate() {
                    let mark = if task.completed {
                        self.paint("[x]", "32")
                    } else {
                        "[ ]".to_string()
                    };
                    writeln!(out, "{:>3}. {mark} {}", idx + 1, task.text)?;
                }
            }
            NoteKind::Calendar => {
                let entries = note.calendar_data.clone().unwrap_or_default();
                for view in note.views.iter().flatten() {
                    writeln!(
                        out,
                        "view      {} ({:?}) {}",
                        view.id,
                        view.view_type,
                        period_label(view.view_type, view.selected_date)
                    )?;
                    match view.view_type {
                        CalendarViewMode::Month => month_block(&mut out, view.selected_date, &entries)?,
                        CalendarViewMode::Week => week_block(&mut out, view.selected_date, &entries)?,
                    }
                }
                writeln!(out)?;
                for (date, text) in &entries {
                    writeln!(out, "{date}  {text}")?;
                }
            }
        }
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

const DETAIL_INDENT: &str = "          ";

/// Month grid; days with an entry carry a `*`.
fn month_block<W: Write>(out: &mut W, date: NaiveDate, entries: &CalendarEntries) -> anyhow::Result<()> {
    writeln!(out, "{DETAIL_INDENT}Su  Mo  Tu  We  Th  Fr  Sa")?;
    for row in month_grid(date) {
        let cells: Vec<String> = row
            .iter()
            .map(|cell| match cell {
                Some(day) => {
                    let mark = if entries.contains_key(day) { '*' } else { ' ' };
                    format!("{:>2}{mark}", day.day())
                }
                None => "   ".to_string(),
            })
            .collect();
        writeln!(out, "{DETAIL_INDENT}{}", cells.join(" ").trim_end())?;
    }
    Ok(())
}

fn week_block<W: Write>(out: &mut W, date: NaiveDate, entries: &CalendarEntries) -> anyhow::Result<()> {
    for day in week_dates(date) {
        let text = entries.get(&day).map(String::as_str).unwrap_or("");
        let line = format!("{DETAIL_INDENT}{}  {text}", day.format("%a %b %-d"));
        writeln!(out, "{}", line.trim_end())?;
    }
    Ok(())
}

fn summary(note: &Note) -> String {
    match note.kind {
        NoteKind::Standard => truncate(&strip_tags(&note.content), PREVIEW_WIDTH),
        NoteKind::Task => {
            let tasks = note.tasks.as_deref().unwrap_or_default();
            let done = tasks.iter().filter(|t| t.completed).count();
            format!("{done}/{} done", tasks.len())
        }
        NoteKind::Calendar => {
            let views = note.views.as_ref().map_or(0, Vec::len);
            let days = note.calendar_data.as_ref().map_or(0, |d| d.len());
            format!("{views} view(s), {days} day(s)")
        }
    }
}

/// Text content of sanitized markup, for one-line previews.
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                out.push(' ');
            }
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(text: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut width = 0;
    for ch in text.chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + w + 1 > max_width {
            break;
        }
        out.push(ch);
        width += w;
    }
    out.push('…');
    out
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use notecab_shared::{CalendarView, TaskItem};

    use super::*;

    fn plain() -> Renderer {
        Renderer { color: false }
    }

    fn note(kind: NoteKind, title: &str) -> Note {
        Note {
            id: Uuid::new_v4(),
            cabinet_id: Uuid::new_v4(),
            kind,
            title: title.to_string(),
            content: "<p>Hello <strong>there</strong></p>".to_string(),
            order: 999,
            timestamp: Utc::now(),
            tasks: None,
            views: None,
            calendar_data: None,
        }
    }

    #[test]
    fn wide_titles_keep_columns_aligned() {
        let notes = vec![note(NoteKind::Standard, "日本語"), note(NoteKind::Standard, "")];
        let mut out = Vec::new();
        plain().note_table(&mut out, &notes).expect("render");
        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[3].contains("Untitled"));
        let type_col = |line: &str| UnicodeWidthStr::width(&line[..line.find("Hello").expect("summary")]);
        assert_eq!(type_col(lines[2]), type_col(lines[3]));
    }

    #[test]
    fn task_detail_lists_checkboxes() {
        let mut task_note = note(NoteKind::Task, "Chores");
        task_note.tasks = Some(vec![
            TaskItem {
                id: Uuid::new_v4(),
                text: "dishes".to_string(),
                completed: true,
            },
            TaskItem {
                id: Uuid::new_v4(),
                text: "laundry".to_string(),
                completed: false,
            },
        ]);
        let mut out = Vec::new();
        plain().note_detail(&mut out, &task_note).expect("render");
        let text = String::from_utf8(out).expect("utf8");

        assert!(text.contains("  1. [x] dishes"));
        assert!(text.contains("  2. [ ] laundry"));
        assert_eq!(summary(&task_note), "1/2 done");
    }

    #[test]
    fn calendar_detail_draws_each_view() {
        let mut plans = note(NoteKind::Calendar, "Plans");
        let day = |d: u32| NaiveDate::from_ymd_opt(2026, 1, d).expect("date");
        plans.views = Some(vec![
            CalendarView {
                id: "view-1".to_string(),
                view_type: CalendarViewMode::Month,
                selected_date: day(15),
            },
            CalendarView {
                id: "view-2".to_string(),
                view_type: CalendarViewMode::Week,
                selected_date: day(7),
            },
        ]);
        plans.calendar_data = Some(CalendarEntries::from([(day(2), "ski".to_string()), (day(6), "dentist".to_string())]));
        let mut out = Vec::new();
        plain().note_detail(&mut out, &plans).expect("render");
        let text = String::from_utf8(out).expect("utf8");

        assert!(text.contains("Su  Mo  Tu  We  Th  Fr  Sa"));
        assert!(text.contains(" 1   2*  3\n"));
        assert!(text.contains(" 4   5   6*  7   8   9  10\n"));
        assert!(text.contains("Tue Jan 6  dentist"));
        assert!(text.contains("Sat Jan 10\n"));
        assert!(text.contains("2026-01-02  ski"));
    }

    #[test]
    fn previews_drop_markup() {
        assert_eq!(strip_tags("<p>a <em>b</em></p><p>c</p>"), "a b c");
        assert_eq!(truncate("abcdef", 4), "abc…");
    }
}
