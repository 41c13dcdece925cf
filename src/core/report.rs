use crate::domain::model::ReportRow;
use crate::utils::error::Result;
use std::io::Write;

pub const HEADER_BANNER: &str = "--- RESPOSTA DA API (JSON) ---";
pub const FOOTER_BANNER: &str = "------------------------------";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn format_row(row: &ReportRow) -> String {
    format!(
        "{{ nome: '{}', saldo: R$ {}, categoria: '{}' }}",
        row.display_name, row.net_balance, row.segment
    )
}

/// Banner, one line per row in the given order, banner.
pub fn render_text(rows: &[ReportRow]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(HEADER_BANNER.to_string());
    lines.extend(rows.iter().map(format_row));
    lines.push(FOOTER_BANNER.to_string());

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

pub fn write_report<W: Write>(rows: &[ReportRow], format: OutputFormat, mut writer: W) -> Result<()> {
    match format {
        OutputFormat::Text => writer.write_all(render_text(rows).as_bytes())?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, rows)?;
            writer.write_all(b"\n")?;
        }
    }
    writer.flush()?;
    Ok(())
}
