use super::pdf::{fit_text, Font, PdfDocument, Rgb, PAGE_WIDTH_MM};
use super::ReportContext;
use crate::domain::{Election, Voter};
use crate::repository::ElectionBundle;
use crate::results::tally::{aggregate, format_percentage, group_by_position};
use crate::timefmt::long_datetime;

const LEFT_MARGIN: f32 = 14.0;
const VALUE_COLUMN: f32 = 50.0;
const TOP_MARGIN: f32 = 20.0;
const METADATA_START: f32 = 38.0;
const SECTION_BREAK: f32 = 250.0;
const TABLE_BOTTOM: f32 = 277.0;
const FOOTER_BASELINE: f32 = 287.0;
const CELL_PADDING: f32 = 1.8;
const HEADER_FILL: Rgb = Rgb(66, 139, 202);
const GRID: Rgb = Rgb(200, 200, 200);

struct Column {
    title: &'static str,
    width: f32,
    bold: bool,
}

const fn column(title: &'static str, width: f32) -> Column {
    Column {
        title,
        width,
        bold: false,
    }
}

struct TableStyle {
    head_size: f32,
    body_size: f32,
}

impl TableStyle {
    fn head_height(&self) -> f32 {
        row_height(self.head_size)
    }

    fn body_height(&self) -> f32 {
        row_height(self.body_size)
    }
}

fn row_height(font_size: f32) -> f32 {
    font_size * 0.3528 * 1.15 + CELL_PADDING * 2.0
}

/// Cursor over a growing document.
struct Layout {
    doc: PdfDocument,
    y: f32,
}

impl Layout {
    fn new(title: &str, subtitle: Option<&str>) -> Self {
        let mut doc = PdfDocument::new(title);
        let page = doc.current_page();
        page.text(LEFT_MARGIN, 20.0, Font::Bold, 20.0, Rgb::BLACK, title);
        if let Some(subtitle) = subtitle {
            page.text(LEFT_MARGIN, 28.0, Font::Regular, 12.0, Rgb::gray(100), subtitle);
        }
        Self {
            doc,
            y: METADATA_START,
        }
    }

    fn field(&mut self, label: &str, value: &str) {
        let y = self.y;
        let page = self.doc.current_page();
        page.text(LEFT_MARGIN, y, Font::Bold, 11.0, Rgb::BLACK, label);
        page.text(VALUE_COLUMN, y, Font::Regular, 11.0, Rgb::BLACK, value);
        self.y += 7.0;
    }

    fn gap(&mut self, amount: f32) {
        self.y += amount;
    }

    fn section(&mut self, index: usize, title: &str) {
        if index > 0 && self.y > SECTION_BREAK {
            self.doc.add_page();
            self.y = TOP_MARGIN;
        }
        let y = self.y;
        self.doc
            .current_page()
            .text(LEFT_MARGIN, y, Font::Bold, 13.0, Rgb::BLACK, title);
        self.y += 8.0;
    }

    fn table(&mut self, columns: &[Column], rows: &[Vec<String>], style: &TableStyle) {
        if self.y + style.head_height() + style.body_height() > TABLE_BOTTOM {
            self.doc.add_page();
            self.y = TOP_MARGIN;
        }
        self.table_head(columns, style);

        for row in rows {
            if self.y + style.body_height() > TABLE_BOTTOM {
                self.doc.add_page();
                self.y = TOP_MARGIN;
                self.table_head(columns, style);
            }
            self.table_row(columns, row, style);
        }

        self.y += 10.0;
    }

    fn table_head(&mut self, columns: &[Column], style: &TableStyle) {
        let height = style.head_height();
        let top = self.y;
        let total_width: f32 = columns.iter().map(|c| c.width).sum();
        let page = self.doc.current_page();
        page.fill_rect(LEFT_MARGIN, top, total_width, height, HEADER_FILL);

        let mut x = LEFT_MARGIN;
        for column in columns {
            let label = fit_text(
                column.title,
                Font::Bold,
                style.head_size,
                column.width - CELL_PADDING * 2.0,
            );
            page.text(
                x + CELL_PADDING,
                top + height - CELL_PADDING - 0.4,
                Font::Bold,
                style.head_size,
                Rgb::WHITE,
                &label,
            );
            x += column.width;
        }
        self.y += height;
    }

    fn table_row(&mut self, columns: &[Column], cells: &[String], style: &TableStyle) {
        let height = style.body_height();
        let top = self.y;
        let page = self.doc.current_page();

        let mut x = LEFT_MARGIN;
        for (column, cell) in columns.iter().zip(cells) {
            page.stroke_rect(x, top, column.width, height, GRID);
            let font = if column.bold { Font::Bold } else { Font::Regular };
            let text = fit_text(cell, font, style.body_size, column.width - CELL_PADDING * 2.0);
            page.text(
                x + CELL_PADDING,
                top + height - CELL_PADDING - 0.4,
                font,
                style.body_size,
                Rgb::BLACK,
                &text,
            );
            x += column.width;
        }
        self.y += height;
    }

    /// Stamp page numbers and the generation time on every page.
    fn finish(mut self, context: &ReportContext) -> Vec<u8> {
        let total = self.doc.page_count();
        let generated = format!(
            "Generated on {}",
            long_datetime(context.generated_at, context.zone)
        );
        for (index, page) in self.doc.pages_mut().enumerate() {
            page.text_centered(
                PAGE_WIDTH_MM / 2.0,
                FOOTER_BASELINE,
                Font::Regular,
                9.0,
                Rgb::gray(128),
                &format!("Page {} of {}", index + 1, total),
            );
            page.text(
                LEFT_MARGIN,
                FOOTER_BASELINE,
                Font::Regular,
                9.0,
                Rgb::gray(128),
                &generated,
            );
        }
        self.doc.to_bytes()
    }
}

const GRID_STYLE: TableStyle = TableStyle {
    head_size: 10.0,
    body_size: 9.0,
};

pub(super) fn results(bundle: &ElectionBundle, context: &ReportContext) -> Vec<u8> {
    let election = &bundle.election;
    let mut layout = Layout::new("Election Results Report", Some(bundle.association_name()));

    layout.field("Election:", &election.title);
    layout.field(
        "Period:",
        &format!(
            "{} - {}",
            long_datetime(election.start_at, context.zone),
            long_datetime(election.end_at, context.zone)
        ),
    );
    layout.field("Total Votes:", &bundle.total_votes().to_string());
    layout.gap(5.0);

    let columns = [
        column("Rank", 15.0),
        column("Candidate", 70.0),
        column("Votes", 25.0),
        column("Percentage", 30.0),
        Column {
            title: "Status",
            width: 30.0,
            bold: true,
        },
    ];

    for (index, position) in aggregate(group_by_position(&bundle.candidates))
        .iter()
        .enumerate()
    {
        layout.section(index, &position.name);
        let rows: Vec<Vec<String>> = position
            .candidates
            .iter()
            .map(|standing| {
                vec![
                    standing.rank.to_string(),
                    standing.name.clone(),
                    standing.votes.to_string(),
                    format_percentage(standing.percentage),
                    position.status_label(&standing.id).to_string(),
                ]
            })
            .collect();
        layout.table(&columns, &rows, &GRID_STYLE);
    }

    layout.finish(context)
}

pub(super) fn voters(voters: &[Voter], election: &Election, context: &ReportContext) -> Vec<u8> {
    let mut layout = Layout::new("Voters List Report", Some(&election.title));

    let voted = voters.iter().filter(|voter| voter.has_voted).count();
    let turnout = if voters.is_empty() {
        0.0
    } else {
        voted as f64 / voters.len() as f64 * 100.0
    };
    layout.field("Total Voters:", &voters.len().to_string());
    layout.field("Voted:", &format!("{} ({:.1}%)", voted, turnout));
    layout.gap(5.0);

    let columns = [
        column("#", 10.0),
        column("Student ID", 25.0),
        column("Name", 45.0),
        column("Email", 55.0),
        column("Level", 20.0),
        column("Voted", 15.0),
    ];

    let mut ordered: Vec<&Voter> = voters.iter().collect();
    ordered.sort_by(|a, b| a.email.cmp(&b.email));
    let rows: Vec<Vec<String>> = ordered
        .iter()
        .enumerate()
        .map(|(index, voter)| {
            vec![
                (index + 1).to_string(),
                voter.student_id.clone(),
                voter.full_name(),
                voter.email.clone(),
                voter.level.clone().unwrap_or_else(|| "N/A".to_string()),
                if voter.has_voted { "Yes" } else { "No" }.to_string(),
            ]
        })
        .collect();

    layout.table(
        &columns,
        &rows,
        &TableStyle {
            head_size: 9.0,
            body_size: 8.0,
        },
    );

    layout.finish(context)
}

pub(super) fn candidates(bundle: &ElectionBundle, context: &ReportContext) -> Vec<u8> {
    let mut layout = Layout::new("Candidates Report", Some(bundle.association_name()));

    layout.field("Election:", &bundle.election.title);
    layout.field("Total Candidates:", &bundle.candidates.len().to_string());
    layout.gap(5.0);

    let columns = [
        column("#", 10.0),
        column("Candidate Name", 70.0),
        column("Has Manifesto", 35.0),
        column("Registered", 55.0),
    ];

    for (index, group) in group_by_position(&bundle.candidates).iter().enumerate() {
        layout.section(index, &group.position.name);
        let rows: Vec<Vec<String>> = group
            .candidates
            .iter()
            .enumerate()
            .map(|(row, tally)| {
                vec![
                    (row + 1).to_string(),
                    tally.candidate.name.clone(),
                    if tally.candidate.manifesto.is_some() { "Yes" } else { "No" }.to_string(),
                    long_datetime(tally.candidate.created_at, context.zone),
                ]
            })
            .collect();
        layout.table(&columns, &rows, &GRID_STYLE);
    }

    layout.finish(context)
}
