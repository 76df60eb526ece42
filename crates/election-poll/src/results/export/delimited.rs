use super::{ExportError, ReportContext};
use crate::domain::Voter;
use crate::repository::ElectionBundle;
use crate::results::tally::{aggregate, format_percentage, group_by_position};
use crate::timefmt::short_datetime;

/// Rows of a delimited report. An empty row renders as a blank line.
#[derive(Debug, Default)]
struct Sheet {
    rows: Vec<Vec<String>>,
}

impl Sheet {
    fn row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    fn blank(&mut self) {
        self.rows.push(Vec::new());
    }

    fn encode(&self) -> Result<Vec<u8>, ExportError> {
        let lines = self
            .rows
            .iter()
            .map(|row| encode_row(row))
            .collect::<Result<Vec<String>, ExportError>>()?;
        Ok(lines.join("\n").into_bytes())
    }
}

/// Every field quoted, embedded quotes doubled.
fn encode_row(row: &[String]) -> Result<String, ExportError> {
    if row.is_empty() {
        return Ok(String::new());
    }

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(row)?;
    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Io(err.into_error()))?;

    let mut line = String::from_utf8(bytes)?;
    if line.ends_with('\n') {
        line.pop();
    }
    Ok(line)
}

pub(super) fn results(bundle: &ElectionBundle, context: &ReportContext) -> Result<Vec<u8>, ExportError> {
    let mut sheet = Sheet::default();
    let election = &bundle.election;

    sheet.row(["Election Results Report"]);
    sheet.row(["Election:", election.title.as_str()]);
    sheet.row(["Association:", bundle.association_name()]);
    sheet.row([
        "Start Date:".to_string(),
        short_datetime(election.start_at, context.zone),
    ]);
    sheet.row([
        "End Date:".to_string(),
        short_datetime(election.end_at, context.zone),
    ]);
    sheet.row([
        "Total Votes:".to_string(),
        bundle.total_votes().to_string(),
    ]);
    sheet.blank();

    sheet.row(["Position", "Candidate", "Votes", "Percentage"]);
    for position in aggregate(group_by_position(&bundle.candidates)) {
        for (index, standing) in position.candidates.iter().enumerate() {
            let position_cell = if index == 0 { position.name.as_str() } else { "" };
            sheet.row([
                position_cell.to_string(),
                standing.name.clone(),
                standing.votes.to_string(),
                format_percentage(standing.percentage),
            ]);
        }
        sheet.blank();
    }

    sheet.encode()
}

pub(super) fn voters(voters: &[Voter], context: &ReportContext) -> Result<Vec<u8>, ExportError> {
    let mut sheet = Sheet::default();

    sheet.row(["Voter List Report"]);
    sheet.row(["Total Voters:".to_string(), voters.len().to_string()]);
    sheet.row([
        "Generated:".to_string(),
        short_datetime(context.generated_at, context.zone),
    ]);
    sheet.blank();

    sheet.row([
        "Email",
        "Student ID",
        "First Name",
        "Last Name",
        "Level",
        "Has Voted",
        "Created At",
    ]);

    let mut ordered: Vec<&Voter> = voters.iter().collect();
    ordered.sort_by(|a, b| a.email.cmp(&b.email));
    for voter in ordered {
        sheet.row([
            voter.email.clone(),
            voter.student_id.clone(),
            voter.first_name.clone(),
            voter.last_name.clone(),
            voter.level.clone().unwrap_or_else(|| "N/A".to_string()),
            if voter.has_voted { "Yes" } else { "No" }.to_string(),
            short_datetime(voter.created_at, context.zone),
        ]);
    }

    sheet.encode()
}

pub(super) fn candidates(
    bundle: &ElectionBundle,
    context: &ReportContext,
) -> Result<Vec<u8>, ExportError> {
    let mut sheet = Sheet::default();

    sheet.row(["Candidates Report"]);
    sheet.row(["Election:", bundle.election.title.as_str()]);
    sheet.row(["Association:", bundle.association_name()]);
    sheet.row([
        "Total Candidates:".to_string(),
        bundle.candidates.len().to_string(),
    ]);
    sheet.blank();

    sheet.row([
        "Position",
        "Candidate Name",
        "Photo URL",
        "Manifesto URL",
        "Created At",
    ]);

    for group in group_by_position(&bundle.candidates) {
        for (index, tally) in group.candidates.iter().enumerate() {
            let candidate = &tally.candidate;
            let position_cell = if index == 0 { group.position.name.as_str() } else { "" };
            sheet.row([
                position_cell.to_string(),
                candidate.name.clone(),
                candidate.photo_url.clone().unwrap_or_else(|| "N/A".to_string()),
                candidate.manifesto.clone().unwrap_or_else(|| "N/A".to_string()),
                short_datetime(candidate.created_at, context.zone),
            ]);
        }
        sheet.blank();
    }

    sheet.encode()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_every_field_and_doubles_embedded_quotes() {
        let row = vec!["plain".to_string(), "say \"hi\"".to_string(), String::new()];
        assert_eq!(
            encode_row(&row).expect("row encodes"),
            "\"plain\",\"say \"\"hi\"\"\",\"\""
        );
    }

    #[test]
    fn blank_rows_become_empty_lines() {
        let mut sheet = Sheet::default();
        sheet.row(["a"]);
        sheet.blank();
        sheet.row(["b", "c"]);
        let text = String::from_utf8(sheet.encode().expect("encodes")).expect("utf8");
        assert_eq!(text, "\"a\"\n\n\"b\",\"c\"");
    }
}
